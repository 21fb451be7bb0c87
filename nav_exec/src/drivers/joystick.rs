//! # Joystick driver
//!
//! Reads a game controller through the Linux input event interface
//! (`/dev/input/event*`) into an [`InputLatch`] which the control loop polls
//! once per cycle.
//!
//! Button and axis codes are those reported by a PS3 controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use byteorder::{NativeEndian, ReadBytesExt};
use log::{debug, error};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use thiserror::Error;

// Internal
use robot_if::input::{Axis, Button, InputEvent, InputLatch, InputSnapshot};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Size of a `struct input_event` on a 64 bit system.
pub const EVENT_SIZE: usize = 24;

const EV_KEY: u16 = 0x01;
const EV_ABS: u16 = 0x03;

const KEY_UP: i32 = 0;
const KEY_DOWN: i32 = 1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct JoystickParams {
    /// Input event device of the controller.
    pub device: PathBuf,
}

/// One record read from the event device, without its timestamp.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RawEvent {
    pub ev_type: u16,
    pub code: u16,
    pub value: i32,
}

/// A controller read by a background thread.
pub struct Joystick {
    latch: Arc<Mutex<InputLatch>>,
    connected: Arc<AtomicBool>,
    _handle: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum JoystickError {
    #[error("Could not open the joystick device {0:?}: {1}")]
    OpenFailed(PathBuf, io::Error),

    #[error("Could not start the joystick thread: {0}")]
    ThreadSpawnFailed(io::Error),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Read one event record.
pub fn read_event<R: Read>(reader: &mut R) -> io::Result<RawEvent> {
    // struct timeval, unused
    let _tv_sec = reader.read_i64::<NativeEndian>()?;
    let _tv_usec = reader.read_i64::<NativeEndian>()?;

    Ok(RawEvent {
        ev_type: reader.read_u16::<NativeEndian>()?,
        code: reader.read_u16::<NativeEndian>()?,
        value: reader.read_i32::<NativeEndian>()?,
    })
}

/// Translate a raw event into a controller event, if it is one we use.
///
/// Key repeats (value 2) and sync events are dropped.
pub fn decode(raw: &RawEvent) -> Option<InputEvent> {
    match raw.ev_type {
        EV_KEY => {
            let button = button_from_code(raw.code)?;
            match raw.value {
                KEY_DOWN => Some(InputEvent::Press(button)),
                KEY_UP => Some(InputEvent::Release(button)),
                _ => None,
            }
        }
        EV_ABS => Some(InputEvent::Axis {
            axis: axis_from_code(raw.code)?,
            value: raw.value,
        }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Joystick {
    /// Open the event device and start reading it.
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, JoystickError> {
        let path = device.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| JoystickError::OpenFailed(path.clone(), e))?;

        debug!("Opened joystick device {:?}", path);

        Self::spawn(file)
    }

    /// Start reading events from any byte source.
    pub fn spawn<R: Read + Send + 'static>(mut reader: R) -> Result<Self, JoystickError> {
        let latch = Arc::new(Mutex::new(InputLatch::default()));
        let connected = Arc::new(AtomicBool::new(true));

        let thread_latch = latch.clone();
        let thread_connected = connected.clone();

        let handle = thread::Builder::new()
            .name("joystick".into())
            .spawn(move || {
                loop {
                    let raw = match read_event(&mut reader) {
                        Ok(r) => r,
                        Err(e) => {
                            if e.kind() != io::ErrorKind::UnexpectedEof {
                                error!("Joystick read failed: {}", e);
                            }
                            break;
                        }
                    };

                    if let Some(event) = decode(&raw) {
                        let mut l = match thread_latch.lock() {
                            Ok(l) => l,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        l.apply(&event);
                    }
                }

                thread_connected.store(false, Ordering::SeqCst);
            })
            .map_err(JoystickError::ThreadSpawnFailed)?;

        Ok(Self {
            latch,
            connected,
            _handle: handle,
        })
    }

    /// The controller's state for this poll.
    ///
    /// Buttons pressed since the previous call are reported as held even if
    /// they have already been released.
    pub fn snapshot(&self) -> InputSnapshot {
        match self.latch.lock() {
            Ok(mut l) => l.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// False once the device has stopped delivering events.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn button_from_code(code: u16) -> Option<Button> {
    let button = match code {
        288 => Button::Select,
        289 => Button::LeftStick,
        290 => Button::RightStick,
        291 => Button::Start,
        292 => Button::Up,
        293 => Button::Right,
        294 => Button::Down,
        295 => Button::Left,
        296 => Button::L2,
        297 => Button::R2,
        298 => Button::L1,
        299 => Button::R1,
        300 => Button::Triangle,
        301 => Button::Circle,
        302 => Button::Cross,
        303 => Button::Square,
        704 => Button::Ps,
        _ => return None,
    };

    Some(button)
}

fn axis_from_code(code: u16) -> Option<Axis> {
    match code {
        0 => Some(Axis::LeftX),
        1 => Some(Axis::LeftY),
        2 => Some(Axis::RightX),
        5 => Some(Axis::RightY),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
