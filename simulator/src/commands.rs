//! Console command grammar for the simulator session.
//!
//! Commands are parsed with `winnow` combinators straight off the input
//! line into typed values, so the session only ever dispatches on
//! structured commands. Keywords are case-insensitive; durations accept an
//! optional `ms` or `s` suffix and default to seconds.

use std::fmt;
use std::time::Duration;

use winnow::ascii::{Caseless, float, space1};
use winnow::combinator::{alt, eof, opt, preceded, terminated};
use winnow::error::{ContextError, ErrMode};
use winnow::token::take_while;
use winnow::{ModalResult, Parser};

/// Control surface addressed by a grab or release command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SurfaceTarget {
    Handle,
    Lever,
}

impl fmt::Display for SurfaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceTarget::Handle => f.write_str("handle"),
            SurfaceTarget::Lever => f.write_str("lever"),
        }
    }
}

/// Structured commands produced by the parser.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Grab(SurfaceTarget),
    Release(SurfaceTarget),
    /// Set the handle pull as a fraction of full travel.
    Pull(f32),
    /// Set the lever deflection in degrees.
    Turn(f32),
    /// Programmatic speed override, as a fraction.
    Speed(f32),
    /// Advance one control cycle, optionally with an explicit step.
    Tick(Option<Duration>),
    /// Advance repeatedly until the given span has elapsed.
    Run(Duration),
    Status,
    Events,
    Help(Option<String>),
}

/// Parse failure with the byte offset where the grammar gave up.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParseFailure {
    pub offset: usize,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized input at column {}", self.offset + 1)
    }
}

/// Parses one console line into a command.
pub fn parse_command(line: &str) -> Result<Command, ParseFailure> {
    command.parse(line.trim()).map_err(|err| ParseFailure {
        offset: err.offset(),
    })
}

fn command(input: &mut &str) -> ModalResult<Command> {
    terminated(
        alt((
            grab, release, pull, turn, speed, tick, run, status, events, help,
        )),
        eof,
    )
    .parse_next(input)
}

fn surface_target(input: &mut &str) -> ModalResult<SurfaceTarget> {
    alt((
        Caseless("handle").value(SurfaceTarget::Handle),
        Caseless("lever").value(SurfaceTarget::Lever),
    ))
    .parse_next(input)
}

fn grab(input: &mut &str) -> ModalResult<Command> {
    preceded((Caseless("grab"), space1), surface_target)
        .map(Command::Grab)
        .parse_next(input)
}

fn release(input: &mut &str) -> ModalResult<Command> {
    preceded((Caseless("release"), space1), surface_target)
        .map(Command::Release)
        .parse_next(input)
}

fn pull(input: &mut &str) -> ModalResult<Command> {
    preceded((Caseless("pull"), space1), float)
        .map(Command::Pull)
        .parse_next(input)
}

fn turn(input: &mut &str) -> ModalResult<Command> {
    preceded((Caseless("turn"), space1), float)
        .map(Command::Turn)
        .parse_next(input)
}

fn speed(input: &mut &str) -> ModalResult<Command> {
    preceded((Caseless("speed"), space1), float)
        .map(Command::Speed)
        .parse_next(input)
}

fn tick(input: &mut &str) -> ModalResult<Command> {
    preceded(Caseless("tick"), opt(preceded(space1, duration)))
        .map(Command::Tick)
        .parse_next(input)
}

fn run(input: &mut &str) -> ModalResult<Command> {
    preceded((Caseless("run"), space1), duration)
        .map(Command::Run)
        .parse_next(input)
}

fn status(input: &mut &str) -> ModalResult<Command> {
    Caseless("status").value(Command::Status).parse_next(input)
}

fn events(input: &mut &str) -> ModalResult<Command> {
    Caseless("events").value(Command::Events).parse_next(input)
}

fn help(input: &mut &str) -> ModalResult<Command> {
    preceded(
        Caseless("help"),
        opt(preceded(
            space1,
            take_while(1.., |c: char| !c.is_whitespace()),
        )),
    )
    .map(|topic: Option<&str>| Command::Help(topic.map(str::to_string)))
    .parse_next(input)
}

/// Duration literal: a non-negative number with an optional `ms`/`s`
/// suffix, defaulting to seconds.
fn duration(input: &mut &str) -> ModalResult<Duration> {
    let value: f64 = float.parse_next(input)?;
    let millis = opt(alt((
        Caseless("ms").value(true),
        Caseless("s").value(false),
    )))
    .parse_next(input)?;

    let seconds = if millis == Some(true) {
        value / 1_000.0
    } else {
        value
    };
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ErrMode::Cut(ContextError::new()));
    }
    Ok(Duration::from_secs_f64(seconds))
}
