//! Operator console.
//!
//! Line-oriented stand-in for a control panel: each input line becomes a
//! [`Command`] applied to a [`PlaybackController`]. Chunk positions are shown
//! and entered 1-based; the controller works 0-based.

use std::io::{self, BufRead, Write};

use crate::controller::PlaybackController;
use crate::playback::PlaybackState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PauseToggle,
    Next,
    Previous,
    /// 1-based position from the chunk list.
    Jump(usize),
    Reset,
    /// Raw interval text, validated by the controller.
    Interval(String),
    List,
    Status,
    Help,
    Quit,
}

/// Whether the console loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse one input line. Blank lines parse to `Status`.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "" | "s" | "status" => Command::Status,
        "p" | "pause" | "resume" => Command::PauseToggle,
        "n" | "next" => Command::Next,
        "b" | "prev" | "previous" => Command::Previous,
        "r" | "reset" => Command::Reset,
        "l" | "list" => Command::List,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        "j" | "jump" => {
            let position = rest
                .parse()
                .map_err(|_| format!("jump needs a chunk number, got {rest:?}"))?;
            Command::Jump(position)
        }
        "i" | "interval" => {
            if rest.is_empty() {
                return Err("interval needs a value in milliseconds".to_string());
            }
            Command::Interval(rest.to_string())
        }
        other => return Err(format!("unknown command: {other}")),
    };

    Ok(command)
}

/// Labels for the chunk list: `"Chunk 1/3"`, `"Chunk 2/3"`, ...
pub fn position_labels(total: usize) -> Vec<String> {
    (1..=total).map(|i| format!("Chunk {i}/{total}")).collect()
}

/// Map a 1-based list position to a chunk index.
pub fn position_to_index(position: usize) -> Option<usize> {
    position.checked_sub(1)
}

/// Human-readable size: `"512 B"`, `"2.4 KB"`, `"1.5 MB"`.
pub fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn describe(state: &PlaybackState, total: usize) -> String {
    format!(
        "{} chunk {}/{} every {} ms",
        if state.paused { "paused at" } else { "playing" },
        state.current_index + 1,
        total,
        state.interval_ms
    )
}

pub fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "commands:")?;
    writeln!(out, "    p, pause        pause or resume autoplay")?;
    writeln!(out, "    n, next         show the next chunk")?;
    writeln!(out, "    b, prev         show the previous chunk")?;
    writeln!(out, "    j <N>           jump to chunk N (see list)")?;
    writeln!(out, "    r, reset        go back to the first chunk")?;
    writeln!(out, "    i <MS>          set the interval (100-30000 ms)")?;
    writeln!(out, "    l, list         list chunk positions")?;
    writeln!(out, "    s, status       show the current position")?;
    writeln!(out, "    q, quit         stop transmitting")?;
    Ok(())
}

/// Apply one command and report the outcome to `out`.
pub fn apply(
    controller: &PlaybackController,
    command: Command,
    out: &mut impl Write,
) -> io::Result<Flow> {
    let total = controller.chunks().len();

    match command {
        Command::PauseToggle => {
            let state = controller.pause_toggle();
            writeln!(out, "{}", describe(&state, total))?;
        }
        Command::Next => {
            let state = controller.next();
            writeln!(out, "{}", describe(&state, total))?;
        }
        Command::Previous => {
            let state = controller.previous();
            writeln!(out, "{}", describe(&state, total))?;
        }
        Command::Jump(position) => {
            let result = match position_to_index(position) {
                Some(index) => controller.jump_to(index).map_err(|e| e.to_string()),
                None => Err("chunk numbers start at 1".to_string()),
            };
            match result {
                Ok(state) => writeln!(out, "{}", describe(&state, total))?,
                Err(message) => writeln!(out, "error: {message}")?,
            }
        }
        Command::Reset => {
            let state = controller.reset();
            writeln!(out, "{}", describe(&state, total))?;
        }
        Command::Interval(text) => match controller.set_interval_text(&text) {
            Ok(state) => writeln!(out, "interval set to {} ms", state.interval_ms)?,
            Err(e) => writeln!(out, "error: {e}")?,
        },
        Command::List => {
            let current = controller.state().current_index;
            for (i, label) in position_labels(total).iter().enumerate() {
                let marker = if i == current { '>' } else { ' ' };
                writeln!(out, "{marker} {label}")?;
            }
        }
        Command::Status => {
            writeln!(out, "{}", describe(&controller.state(), total))?;
        }
        Command::Help => print_help(out)?,
        Command::Quit => return Ok(Flow::Quit),
    }

    Ok(Flow::Continue)
}

/// Read commands until `quit` or end of input.
pub fn run(
    controller: &PlaybackController,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let flow = match parse_command(&line) {
            Ok(command) => apply(controller, command, out)?,
            Err(message) => {
                writeln!(out, "error: {message} (type 'help' for commands)")?;
                Flow::Continue
            }
        };
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}
