//! Live key-driven mode.
//!
//! Runs the control loop at the configured cadence while mapping keys to
//! the grab lifecycle, so the surfaces can be manipulated without typing
//! commands: `h` toggles the handle grab, `l` the lever grab, Up/Down nudge
//! the pull, Left/Right the lever, and `q` (or Esc) leaves. The status line
//! repaints in place every cycle.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType};

use crate::session::Session;

/// Pull fraction change per arrow press.
const PULL_STEP: f32 = 0.05;
/// Lever deflection change per arrow press, in degrees.
const ANGLE_STEP: f32 = 2.5;

/// Drives the session from the keyboard until the operator quits.
pub fn run(session: &mut Session) -> io::Result<()> {
    let mut stdout = io::stdout();
    writeln!(
        stdout,
        "Interactive mode: h/l toggle grabs, arrows move, q quits."
    )?;

    terminal::enable_raw_mode()?;
    let result = drive(session, &mut stdout);
    terminal::disable_raw_mode()?;
    writeln!(stdout)?;
    result
}

fn drive(session: &mut Session, stdout: &mut io::Stdout) -> io::Result<()> {
    loop {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('h') => {
                        session.toggle_handle_grab();
                    }
                    KeyCode::Char('l') => {
                        session.toggle_lever_grab();
                    }
                    KeyCode::Up => session.nudge_pull(PULL_STEP),
                    KeyCode::Down => session.nudge_pull(-PULL_STEP),
                    KeyCode::Right => session.nudge_lever(ANGLE_STEP),
                    KeyCode::Left => session.nudge_lever(-ANGLE_STEP),
                    _ => {}
                }
            }
        }

        session.advance_one();
        execute!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        write!(stdout, "{}", session.status_line())?;
        stdout.flush()?;
        thread::sleep(session.tick_length());
    }
}
