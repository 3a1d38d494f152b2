mod commands;
mod config;
mod interactive;
mod session;
mod transcript;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use tracing_subscriber::EnvFilter;

use config::ScenarioConfig;
use session::Session;
use transcript::TranscriptLogger;

struct Options {
    config: Option<PathBuf>,
    transcript: Option<PathBuf>,
    interactive: bool,
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let options = parse_options().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!(
            "Usage: treadmill-simulator [--config <scenario.toml>] [--transcript <path>] [--interactive]"
        );
        process::exit(2);
    });

    let scenario = match options.config.as_deref() {
        Some(path) => ScenarioConfig::load_from_file(path).unwrap_or_else(|err| {
            eprintln!("{err}");
            process::exit(2);
        }),
        None => ScenarioConfig::default(),
    };

    let transcript = match options.transcript.as_deref() {
        Some(path) => Some(TranscriptLogger::create(path)?),
        None => None,
    };

    let mut session = Session::new(&scenario, transcript).unwrap_or_else(|err| {
        eprintln!("invalid scenario configuration: {err}");
        process::exit(2);
    });

    if options.interactive {
        return interactive::run(&mut session);
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Treadmill simulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        let responses = session.handle_command(trimmed)?;
        for response in responses {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options {
        config: None,
        transcript: None,
        interactive: false,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--config=") {
            options.config = Some(PathBuf::from(value));
        } else if arg == "--config" {
            let value = args.next().ok_or("Expected value after --config")?;
            options.config = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--transcript=") {
            options.transcript = Some(PathBuf::from(value));
        } else if arg == "--transcript" {
            let value = args.next().ok_or("Expected value after --transcript")?;
            options.transcript = Some(PathBuf::from(value));
        } else if arg == "--interactive" {
            options.interactive = true;
        } else {
            return Err(format!("Unknown argument `{arg}`"));
        }
    }

    Ok(options)
}
