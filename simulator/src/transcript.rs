//! Session transcript capture.
//!
//! The simulator can append every console exchange and notable control
//! event to a log file, stamped with simulated elapsed time, so a session
//! can be attached to a bug report or diffed against an expected run.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Side of the conversation a transcript line belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TranscriptRole {
    Host,
    Sim,
}

impl TranscriptRole {
    const fn label(self) -> &'static str {
        match self {
            TranscriptRole::Host => "host",
            TranscriptRole::Sim => "sim ",
        }
    }
}

/// Appends elapsed-stamped session lines to a log file.
pub struct TranscriptLogger {
    writer: BufWriter<File>,
}

impl TranscriptLogger {
    /// Creates (or appends to) the transcript file, including any missing
    /// parent directories.
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "Treadmill simulator transcript")?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Appends one line stamped with the simulated elapsed time.
    pub fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:9.3}s] {}> {}",
            elapsed.as_secs_f64(),
            role.label(),
            line
        )?;
        self.writer.flush()
    }
}
