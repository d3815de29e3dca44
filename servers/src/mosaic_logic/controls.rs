//! Line-based viewer controls read from stdin.
//!
//! Reading runs on a plain OS thread: a blocking read on the runtime's
//! blocking pool would hold up runtime shutdown until the next line arrives.

use lib_mosaic::configs::Viewport;
use lib_mosaic::core::EngineHandle;
use std::io::BufRead;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Toggle the global pause.
    Pause,
    /// Pointer entered a slot.
    Hover(usize),
    /// Pointer left a slot.
    Leave(usize),
    Resize(Viewport),
    Quit,
}

pub fn parse_control(line: &str) -> Result<Control, String> {
    let mut words = line.split_whitespace();
    let command = words.next().ok_or_else(|| "empty command".to_string())?;
    let args: Vec<&str> = words.collect();

    let number = |i: usize| -> Result<u32, String> {
        args.get(i)
            .ok_or_else(|| format!("'{}' needs {} argument(s)", command, i + 1))?
            .parse::<u32>()
            .map_err(|e| format!("bad argument for '{}': {}", command, e))
    };

    match command.to_lowercase().as_str() {
        "pause" | "p" | "space" => Ok(Control::Pause),
        "hover" => Ok(Control::Hover(number(0)? as usize)),
        "leave" => Ok(Control::Leave(number(0)? as usize)),
        "resize" => Ok(Control::Resize(Viewport::new(number(0)?, number(1)?))),
        "quit" | "exit" => Ok(Control::Quit),
        other => Err(format!("unknown command '{}'", other)),
    }
}

/// Forwards stdin commands to the engine until `quit`, end of input, or the
/// engine going away. The thread is left detached.
pub fn spawn(handle: EngineHandle) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("mosaic-controls".to_string())
        .spawn(move || read_controls(std::io::stdin().lock(), &handle))
}

fn read_controls<R: BufRead>(input: R, handle: &EngineHandle) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to read control input: {}", e);
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let sent = match parse_control(&line) {
            Ok(Control::Pause) => handle.toggle_pause(),
            Ok(Control::Hover(slot)) => handle.set_slot_paused(slot, true),
            Ok(Control::Leave(slot)) => handle.set_slot_paused(slot, false),
            Ok(Control::Resize(viewport)) => handle.reconfigure(viewport),
            Ok(Control::Quit) => {
                let _ = handle.shutdown();
                return;
            }
            Err(e) => {
                log::warn!("{}", e);
                continue;
            }
        };

        if sent.is_err() {
            return;
        }
    }
    log::info!("stdin closed; controls disabled.");
}
