//! Console input source for the interactive mode.
//!
//! A reader thread forwards stdin lines over a channel so that polling never
//! blocks the idle loop. `+`, `q` or `quit` request exit; any other line
//! (an empty one included) counts as a button press.

use super::InputSource;
use crossbeam_channel::{unbounded, Receiver, TryRecvError};
use log::{debug, warn};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Lines that request exit
const EXIT_COMMANDS: [&str; 3] = ["+", "q", "quit"];

/// What one console line means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Input,
    Exit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if EXIT_COMMANDS.iter().any(|cmd| trimmed.eq_ignore_ascii_case(cmd)) {
            ConsoleCommand::Exit
        } else {
            ConsoleCommand::Input
        }
    }
}

/// Non-blocking stdin-driven input source
pub struct ConsoleInput {
    receiver: Receiver<ConsoleCommand>,
    pressed: AtomicBool,
    exit_requested: AtomicBool,
}

impl ConsoleInput {
    /// Spawn the stdin reader thread
    pub fn spawn() -> std::io::Result<Self> {
        let (sender, receiver) = unbounded();

        thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    match line {
                        Ok(line) => {
                            if sender.send(ConsoleCommand::parse(&line)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Failed to read console input: {}", e);
                            break;
                        }
                    }
                }
                debug!("Console input closed");
            })?;

        Ok(Self::from_receiver(receiver))
    }

    /// Build from an existing command channel
    pub fn from_receiver(receiver: Receiver<ConsoleCommand>) -> Self {
        Self {
            receiver,
            pressed: AtomicBool::new(false),
            exit_requested: AtomicBool::new(false),
        }
    }

    /// Move everything queued on the channel into the flags
    fn drain(&self) {
        loop {
            match self.receiver.try_recv() {
                Ok(ConsoleCommand::Input) => self.pressed.store(true, Ordering::SeqCst),
                Ok(ConsoleCommand::Exit) => self.exit_requested.store(true, Ordering::SeqCst),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}

impl InputSource for ConsoleInput {
    fn poll_exit_requested(&self) -> bool {
        self.drain();
        self.exit_requested.load(Ordering::SeqCst)
    }

    fn poll_any_input(&self) -> bool {
        self.drain();
        self.pressed.swap(false, Ordering::SeqCst)
    }
}
