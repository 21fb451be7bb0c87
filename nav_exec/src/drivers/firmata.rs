//! # Firmata board driver
//!
//! Drives the motor H-bridges and the sonar through a microcontroller
//! running the Firmata firmware, connected over a serial port.
//!
//! Only the handful of messages the rover needs are implemented: pin mode,
//! digital port writes, analog (PWM) writes and the sonar extension.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, trace, warn};
use serde::Deserialize;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

// Internal
use robot_if::eqpt::{
    Direction, DistanceSample, DriverError, MotorDriver, SampleSendError, SampleSender, WheelId,
    NUM_WHEELS,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const DIGITAL_MESSAGE: u8 = 0x90;
const ANALOG_MESSAGE: u8 = 0xE0;
const SET_PIN_MODE: u8 = 0xF4;
const START_SYSEX: u8 = 0xF0;
const END_SYSEX: u8 = 0xF7;

const EXTENDED_ANALOG: u8 = 0x6F;
const SONAR_CONFIG: u8 = 0x62;
const SONAR_DATA: u8 = 0x63;

/// Highest pin addressable by the protocol.
pub const MAX_PIN: u8 = 127;

/// Number of 8 pin digital ports.
const NUM_PORTS: usize = 16;

/// Highest pin which can use the short analog message.
const MAX_ANALOG_MESSAGE_PIN: u8 = 15;

/// Longest sysex body accepted by the reply parser.
const MAX_SYSEX_LEN: usize = 32;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pins driving one wheel's H-bridge.
#[derive(Debug, Copy, Clone, Deserialize)]
pub struct WheelPins {
    pub dir_pin_1: u8,
    pub dir_pin_2: u8,

    /// PWM pin setting the wheel's power
    pub enable_pin: u8,
}

/// Parameters of the Firmata board.
#[derive(Debug, Clone, Deserialize)]
pub struct FirmataParams {
    /// Serial port the board is attached to, for example `/dev/ttyACM0`.
    pub port: String,

    pub baud_rate: u32,

    /// Read timeout on the serial port.
    ///
    /// Units: milliseconds
    pub timeout_ms: u64,

    pub front_left: WheelPins,
    pub rear_left: WheelPins,
    pub rear_right: WheelPins,
    pub front_right: WheelPins,
}

/// Firmata message encoder.
pub struct Firmata<W: Write> {
    writer: W,

    /// Last written value of each digital port, since a port message sets
    /// all eight pins at once.
    port_states: [u8; NUM_PORTS],
}

/// [`MotorDriver`] implementation on a Firmata board.
pub struct FirmataMotorDriver<W: Write> {
    board: Firmata<W>,
    pins: [WheelPins; NUM_WHEELS],
}

/// Decodes sonar replies from the board's byte stream.
#[derive(Debug, Default)]
pub struct SonarReplyParser {
    in_sysex: bool,
    buf: Vec<u8>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PinMode {
    Output = 1,
    Pwm = 3,
}

#[derive(Debug, Error)]
pub enum FirmataError {
    #[error("Could not open the serial port: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("I/O error talking to the board: {0}")]
    Io(#[from] io::Error),

    #[error("Pin {0} is outside the addressable range (0 to 127)")]
    InvalidPin(u8),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Open the serial port to the board.
pub fn open_serial(params: &FirmataParams) -> Result<Box<dyn SerialPort>, FirmataError> {
    let port = serialport::new(&params.port, params.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(Duration::from_millis(params.timeout_ms))
        .open()?;

    debug!("Opened Firmata board on {} at {} baud", params.port, params.baud_rate);

    Ok(port)
}

/// Spawn a thread decoding sonar replies from `reader` into `tx`.
///
/// The thread ends when `running` is cleared, the reader reaches its end or
/// fails, or the receiver is dropped. Read timeouts are expected and
/// ignored.
pub fn spawn_sonar_reader<R>(
    mut reader: R,
    tx: SampleSender,
    running: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("sonar_reader".into())
        .spawn(move || {
            let mut parser = SonarReplyParser::default();
            let mut buf = [0u8; 64];

            while running.load(Ordering::SeqCst) {
                let n = match reader.read(&mut buf) {
                    Ok(0) => {
                        warn!("Sonar reader reached the end of the stream");
                        break;
                    }
                    Ok(n) => n,
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::TimedOut
                                | io::ErrorKind::WouldBlock
                                | io::ErrorKind::Interrupted
                        ) =>
                    {
                        continue
                    }
                    Err(e) => {
                        error!("Sonar reader failed: {}", e);
                        break;
                    }
                };

                for &byte in &buf[..n] {
                    if let Some(sample) = parser.push(byte) {
                        match tx.push(sample) {
                            Ok(()) => (),
                            Err(SampleSendError::QueueFull) => {
                                trace!("Sample queue full, dropped {:?}", sample)
                            }
                            Err(SampleSendError::Disconnected) => return,
                        }
                    }
                }
            }
        })
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FirmataParams {
    pub fn wheel_pins(&self, wheel: WheelId) -> WheelPins {
        match wheel {
            WheelId::FrontLeft => self.front_left,
            WheelId::RearLeft => self.rear_left,
            WheelId::RearRight => self.rear_right,
            WheelId::FrontRight => self.front_right,
        }
    }

    pub fn are_valid(&self) -> Result<(), FirmataError> {
        for wheel in WheelId::ALL {
            let p = self.wheel_pins(wheel);
            for pin in [p.dir_pin_1, p.dir_pin_2, p.enable_pin] {
                if pin > MAX_PIN {
                    return Err(FirmataError::InvalidPin(pin));
                }
            }
        }

        Ok(())
    }
}

impl<W: Write> Firmata<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            port_states: [0; NUM_PORTS],
        }
    }

    pub fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> io::Result<()> {
        check_pin(pin)?;
        self.writer.write_all(&[SET_PIN_MODE, pin, mode as u8])
    }

    /// Set a single digital output, keeping the rest of its port unchanged.
    pub fn digital_write(&mut self, pin: u8, high: bool) -> io::Result<()> {
        check_pin(pin)?;

        let port = (pin / 8) as usize;
        let bit = 1u8 << (pin % 8);

        if high {
            self.port_states[port] |= bit;
        } else {
            self.port_states[port] &= !bit;
        }

        let mask = self.port_states[port];
        self.writer
            .write_all(&[DIGITAL_MESSAGE | port as u8, mask & 0x7F, mask >> 7])
    }

    /// Write a PWM value to a pin.
    pub fn analog_write(&mut self, pin: u8, value: u16) -> io::Result<()> {
        check_pin(pin)?;

        let lsb = (value & 0x7F) as u8;
        let msb = ((value >> 7) & 0x7F) as u8;

        if pin <= MAX_ANALOG_MESSAGE_PIN {
            self.writer.write_all(&[ANALOG_MESSAGE | pin, lsb, msb])
        } else {
            self.writer
                .write_all(&[START_SYSEX, EXTENDED_ANALOG, pin, lsb, msb, END_SYSEX])
        }
    }

    /// Configure the board to ping the sonar and report distances.
    pub fn sonar_config(
        &mut self,
        trigger_pin: u8,
        echo_pin: u8,
        ping_interval_ms: u8,
        max_distance_cm: u16,
    ) -> io::Result<()> {
        check_pin(trigger_pin)?;
        check_pin(echo_pin)?;

        self.writer.write_all(&[
            START_SYSEX,
            SONAR_CONFIG,
            trigger_pin,
            echo_pin,
            ping_interval_ms & 0x7F,
            (max_distance_cm & 0x7F) as u8,
            ((max_distance_cm >> 7) & 0x7F) as u8,
            END_SYSEX,
        ])?;
        self.writer.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> FirmataMotorDriver<W> {
    /// Set up the motor pins on the board.
    pub fn new(writer: W, params: &FirmataParams) -> Result<Self, FirmataError> {
        params.are_valid()?;

        let mut board = Firmata::new(writer);
        let pins = WheelId::ALL.map(|w| params.wheel_pins(w));

        for p in pins.iter() {
            board.set_pin_mode(p.dir_pin_1, PinMode::Output)?;
            board.set_pin_mode(p.dir_pin_2, PinMode::Output)?;
            board.set_pin_mode(p.enable_pin, PinMode::Pwm)?;
        }
        board.flush()?;

        Ok(Self { board, pins })
    }

    pub fn board(&self) -> &Firmata<W> {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Firmata<W> {
        &mut self.board
    }
}

impl<W: Write> MotorDriver for FirmataMotorDriver<W> {
    fn set_direction(&mut self, wheel: WheelId, dir: Direction) -> Result<(), DriverError> {
        let p = self.pins[wheel.index()];
        let (pin_1, pin_2) = match dir {
            Direction::Forward => (false, true),
            Direction::Backward => (true, false),
        };

        self.board.digital_write(p.dir_pin_1, pin_1)?;
        self.board.digital_write(p.dir_pin_2, pin_2)?;
        self.board.flush()?;

        Ok(())
    }

    fn set_power(&mut self, wheel: WheelId, power: u16) -> Result<(), DriverError> {
        let p = self.pins[wheel.index()];

        self.board.analog_write(p.enable_pin, power)?;
        self.board.flush()?;

        Ok(())
    }
}

impl SonarReplyParser {
    /// Feed one byte, returning a sample when a complete sonar reply has been
    /// read. Other messages are skipped.
    pub fn push(&mut self, byte: u8) -> Option<DistanceSample> {
        if byte == START_SYSEX {
            self.in_sysex = true;
            self.buf.clear();
            return None;
        }

        if !self.in_sysex {
            return None;
        }

        if byte == END_SYSEX {
            self.in_sysex = false;

            // Body is: SONAR_DATA, pin, lsb, msb
            return match self.buf.as_slice() {
                [SONAR_DATA, _pin, lsb, msb, ..] => Some(DistanceSample(
                    ((*msb as u16 & 0x7F) << 7) | (*lsb as u16 & 0x7F),
                )),
                _ => None,
            };
        }

        if self.buf.len() < MAX_SYSEX_LEN {
            self.buf.push(byte);
        } else {
            // Runaway message, drop it
            self.in_sysex = false;
        }

        None
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_pin(pin: u8) -> io::Result<()> {
    if pin > MAX_PIN {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            FirmataError::InvalidPin(pin).to_string(),
        ))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use robot_if::eqpt::sample_channel;
    use std::io::Cursor;

    fn params() -> FirmataParams {
        FirmataParams {
            port: "/dev/null".into(),
            baud_rate: 57600,
            timeout_ms: 100,
            front_left: WheelPins {
                dir_pin_1: 30,
                dir_pin_2: 31,
                enable_pin: 7,
            },
            rear_left: WheelPins {
                dir_pin_1: 34,
                dir_pin_2: 35,
                enable_pin: 3,
            },
            rear_right: WheelPins {
                dir_pin_1: 39,
                dir_pin_2: 38,
                enable_pin: 44,
            },
            front_right: WheelPins {
                dir_pin_1: 41,
                dir_pin_2: 40,
                enable_pin: 45,
            },
        }
    }

    #[test]
    fn test_pin_setup() {
        let driver = FirmataMotorDriver::new(Vec::new(), &params()).unwrap();
        let bytes = driver.board().writer();

        assert_eq!(bytes.len(), 12 * 3);
        assert_eq!(&bytes[..9], &[0xF4, 30, 1, 0xF4, 31, 1, 0xF4, 7, 3]);
    }

    #[test]
    fn test_digital_port_state() {
        let mut board = Firmata::new(Vec::new());

        // Pins 30 and 31 share port 3 as bits 6 and 7
        board.digital_write(30, true).unwrap();
        board.digital_write(31, true).unwrap();
        board.digital_write(30, false).unwrap();

        assert_eq!(
            board.writer().as_slice(),
            &[0x93, 0x40, 0x00, 0x93, 0x40, 0x01, 0x93, 0x00, 0x01]
        );
    }

    #[test]
    fn test_analog_write() {
        let mut board = Firmata::new(Vec::new());

        board.analog_write(7, 255).unwrap();
        board.analog_write(44, 200).unwrap();

        assert_eq!(
            board.writer().as_slice(),
            &[0xE7, 0x7F, 0x01, 0xF0, 0x6F, 44, 0x48, 0x01, 0xF7]
        );

        assert!(board.analog_write(200, 1).is_err());
    }

    #[test]
    fn test_motor_writes() {
        let mut driver = FirmataMotorDriver::new(Vec::new(), &params()).unwrap();
        let setup_len = driver.board().writer().len();

        driver
            .set_direction(WheelId::FrontLeft, Direction::Forward)
            .unwrap();
        driver.set_power(WheelId::FrontLeft, 100).unwrap();

        // Pin 30 low, pin 31 high, then PWM on pin 7
        assert_eq!(
            &driver.board().writer()[setup_len..],
            &[0x93, 0x00, 0x00, 0x93, 0x00, 0x01, 0xE7, 100, 0]
        );
    }

    #[test]
    fn test_sonar_config() {
        let mut board = Firmata::new(Vec::new());
        board.sonar_config(22, 23, 50, 200).unwrap();

        assert_eq!(
            board.writer().as_slice(),
            &[0xF0, 0x62, 22, 23, 50, 0x48, 0x01, 0xF7]
        );
    }

    #[test]
    fn test_sonar_parser() {
        let mut parser = SonarReplyParser::default();

        // Noise, an unrelated sysex, a digital message then a sonar reply of
        // 150 cm
        let stream = [
            0x12, 0xF0, 0x79, 0x02, 0x05, 0xF7, 0x93, 0x01, 0x00, 0xF0, 0x63, 23, 0x16, 0x01, 0xF7,
        ];

        let samples: Vec<_> = stream.iter().filter_map(|&b| parser.push(b)).collect();
        assert_eq!(samples, vec![DistanceSample(150)]);
    }

    #[test]
    fn test_sonar_reader_thread() {
        let stream = vec![0xF0, 0x63, 23, 35, 0, 0xF7, 0xF0, 0x63, 23, 0x48, 0x01, 0xF7];
        let (tx, rx) = sample_channel(8);
        let running = Arc::new(AtomicBool::new(true));

        let handle = spawn_sonar_reader(Cursor::new(stream), tx, running).unwrap();
        handle.join().unwrap();

        let samples: Vec<_> = rx.try_iter().collect();
        assert_eq!(samples, vec![DistanceSample(35), DistanceSample(200)]);
    }
}
