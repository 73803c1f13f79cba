//! Raw-mode terminal keyboard input.

use std::{
    io::{self, Read, Write},
    sync::{
        atomic::{AtomicBool, Ordering::Relaxed},
        Arc,
    },
};

use teleop_core::{Direction, InputEvent};
use termios::{tcsetattr, Termios};
use tracing::{debug, error};

use crate::Error;

/// Scale factor applied by `+` (and its inverse by `-`).
pub const LIMIT_SCALE_STEP: f64 = 1.1;

const CTRL_C: u8 = 0x03;
const ESC: u8 = 0x1b;

#[rustfmt::skip]
const MOTION_KEYS: &[char] = &[
    'q', 'w', 'e',
    'a',      'd',
    'z', 'x', 'c',
];

pub const USAGE: &str = "\
Moving around:
   q    w    e
   a    s    d
   z    x    c

s: stop, space: toggle E-stop
+/-: increase/decrease max speeds by 10%
Esc or Ctrl-C: quit
";

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    Input(InputEvent),
    /// Multiply both velocity limits by the factor.
    ScaleLimits(f64),
    Quit,
}

#[derive(Debug)]
struct State {
    sender: flume::Sender<KeyAction>,
}

impl State {
    fn new(sender: flume::Sender<KeyAction>) -> Self {
        Self { sender }
    }

    fn send(&self, action: KeyAction) {
        debug!("sending {action:?}");
        if let Err(e) = self.sender.send(action) {
            error!("{e}");
        }
    }

    /// Motion keys replace the whole input, like a latched joystick.
    fn send_motion(&self, ch: char) {
        let (linear, angular) = match ch {
            'q' => (Some(Direction::Forward), Some(Direction::Left)),
            'w' => (Some(Direction::Forward), None),
            'e' => (Some(Direction::Forward), Some(Direction::Right)),
            'a' => (None, Some(Direction::Left)),
            'd' => (None, Some(Direction::Right)),
            'z' => (Some(Direction::Backward), Some(Direction::Left)),
            'x' => (Some(Direction::Backward), None),
            'c' => (Some(Direction::Backward), Some(Direction::Right)),
            _ => unreachable!(),
        };
        self.send(KeyAction::Input(InputEvent::Stop));
        for direction in [linear, angular].into_iter().flatten() {
            self.send(KeyAction::Input(InputEvent::DirectionPressed(direction)));
        }
    }

    fn send_event(&self, b: u8) {
        match b {
            CTRL_C | ESC => self.send(KeyAction::Quit),
            b' ' => self.send(KeyAction::Input(InputEvent::ToggleEmergencyStop)),
            b's' | b'S' => self.send(KeyAction::Input(InputEvent::Stop)),
            b'+' | b'=' => self.send(KeyAction::ScaleLimits(LIMIT_SCALE_STEP)),
            b'-' | b'_' => self.send(KeyAction::ScaleLimits(1.0 / LIMIT_SCALE_STEP)),
            _ => {
                let ch = (b as char).to_ascii_lowercase();
                if MOTION_KEYS.contains(&ch) {
                    self.send_motion(ch);
                } else {
                    debug!("ignored key: {b:#04x}");
                }
            }
        }
    }
}

/// Reads single key presses from stdin in a background thread.
///
/// The terminal is switched to non-canonical, no-echo mode and restored on
/// drop.
pub struct KeyboardInput {
    receiver: flume::Receiver<KeyAction>,
    is_running: Arc<AtomicBool>,
    original: Termios,
}

impl std::fmt::Debug for KeyboardInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardInput")
            .field("is_running", &self.is_running)
            .finish_non_exhaustive()
    }
}

impl KeyboardInput {
    pub fn new() -> Result<Self, Error> {
        let (sender, receiver) = flume::unbounded();
        let is_running = Arc::new(AtomicBool::new(true));
        let is_running_cloned = is_running.clone();

        let stdin = 0;
        let original = Termios::from_fd(stdin).map_err(Error::Terminal)?;
        let mut raw = original;
        // ISIG is cleared so that Ctrl-C arrives as a key and the terminal is
        // restored before exiting.
        raw.c_lflag &= !(termios::ICANON | termios::ECHO | termios::ISIG);
        tcsetattr(stdin, termios::TCSANOW, &raw).map_err(Error::Terminal)?;
        io::stdout().lock().flush().map_err(Error::Terminal)?;

        std::thread::spawn(move || {
            let state = State::new(sender);
            let mut reader = io::stdin();
            while is_running_cloned.load(Relaxed) {
                let mut buffer = [0; 1];
                if let Err(e) = reader.read_exact(&mut buffer) {
                    error!("failed to read stdin: {e}");
                    state.send(KeyAction::Quit);
                    break;
                }
                let b = buffer[0];
                if b.is_ascii() {
                    state.send_event(b);
                    continue;
                }
                debug!("non-ascii input: {b}");
            }
        });

        Ok(Self {
            receiver,
            is_running,
            original,
        })
    }

    /// Waits for the next key action. `None` once the reader has stopped.
    pub async fn next_action(&self) -> Option<KeyAction> {
        self.receiver.recv_async().await.ok()
    }
}

impl Drop for KeyboardInput {
    fn drop(&mut self) {
        self.is_running.store(false, Relaxed);
        if let Err(e) = tcsetattr(0, termios::TCSANOW, &self.original) {
            error!("failed to restore terminal: {e}");
        }
    }
}
