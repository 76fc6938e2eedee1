// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Device session driving a radar board over its control and data ports.
//!
//! The session owns the control channel, to which it writes command lines,
//! and the data channel, from which it accumulates binary frames into a raw
//! buffer.  Two cycles run against the raw buffer: buffering appends bytes
//! read from the data channel and parsing decodes at most one frame from the
//! front of the buffer.  The cycles either run on two background threads
//! started with the sensor, or are called directly through
//! [`Session::buffer_once`] and [`Session::parse_once`].
//!
//! Decoded frames are kept as the latest frame and published on a bounded
//! channel.  Frames are dropped rather than queued when consumers lag.

use crate::{
    command::{normalize, Command, CommandKind},
    common::set_thread_priority,
    config::{Configuration, Platform},
    frame::{self, DecodeError, Frame, MAGIC_WORD, MAX_PACKET_LEN},
};
use kanal::{Receiver, Sender};
use serialport::SerialPort;
use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{debug, error, info, instrument, trace, warn};

/// Frames held for consumers before new frames are dropped.
const FRAME_QUEUE_LEN: usize = 16;
const CONTROL_TIMEOUT: Duration = Duration::from_millis(500);
const DATA_TIMEOUT: Duration = Duration::from_millis(10);
const DEFAULT_CYCLE_PERIOD: Duration = Duration::from_millis(100);

/// Errors raised by the session channels.
#[derive(Debug)]
pub enum Error {
    /// Control, data or capture file I/O failed.
    Io(io::Error),
    /// A serial port could not be opened or configured.
    Serial(serialport::Error),
    /// A cycle thread panicked.
    CyclePanicked(&'static str),
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Error {
        Error::Serial(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::Serial(err) => write!(f, "serial port error: {}", err),
            Error::CyclePanicked(name) => write!(f, "{} cycle panicked", name),
        }
    }
}

/// Sensor state as last commanded by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Opened, sensor stopped and never started
    Initialized,
    /// `sensorStart` sent
    SensorStarted,
    /// `sensorStop` sent after a start
    SensorStopped,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            State::Initialized => write!(f, "initialized"),
            State::SensorStarted => write!(f, "sensor started"),
            State::SensorStopped => write!(f, "sensor stopped"),
        }
    }
}

/// Session tuning, [`Default`] suits an xWR16xx board.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Radar device family of the board
    pub platform: Platform,
    /// Pause after each command line written to the control port
    pub send_interval: Duration,
    /// Period of the buffering cycle, defaults to a tenth of the frame period
    pub buffering_interval: Option<Duration>,
    /// Period of the parsing cycle, defaults to the frame period
    pub parse_interval: Option<Duration>,
    /// Bytes requested from the data port per read
    pub chunk_size: usize,
    /// Raw buffer cap, the oldest bytes are dropped past it
    pub max_buffer: usize,
    /// Run the buffering cycle with real-time priority
    pub realtime: bool,
    /// Record every byte read from the data port to this file
    pub record: Option<PathBuf>,
    /// Run the cycles on background threads while the sensor is started
    pub threaded: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            platform: Platform::Xwr16xx,
            send_interval: Duration::from_millis(25),
            buffering_interval: None,
            parse_interval: None,
            chunk_size: 4096,
            max_buffer: MAX_PACKET_LEN,
            realtime: false,
            record: None,
            threaded: true,
        }
    }
}

struct Shared<D> {
    data: Mutex<D>,
    buffer: Mutex<Vec<u8>>,
    latest: Mutex<Option<Frame>>,
    frames: Sender<Frame>,
    capture: Mutex<Option<BufWriter<File>>>,
    chunk_size: usize,
    max_buffer: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<D: Read> Shared<D> {
    fn buffer_once(&self) -> Result<usize, Error> {
        let mut chunk = vec![0u8; self.chunk_size];
        let len = match lock(&self.data).read(&mut chunk) {
            Ok(len) => len,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                0
            }
            Err(err) => return Err(err.into()),
        };
        if len == 0 {
            return Ok(0);
        }
        let chunk = &chunk[..len];

        if let Some(capture) = lock(&self.capture).as_mut() {
            capture.write_all(chunk)?;
        }

        let mut buffer = lock(&self.buffer);
        buffer.extend_from_slice(chunk);
        if buffer.len() > self.max_buffer {
            let excess = buffer.len() - self.max_buffer;
            warn!("raw buffer full, dropping {} oldest bytes", excess);
            buffer.drain(..excess);
        }
        trace!("buffered {} bytes, {} pending", len, buffer.len());

        Ok(len)
    }

    #[instrument(skip_all, level = "trace")]
    fn parse_once(&self) -> Option<Frame> {
        let mut buffer = lock(&self.buffer);

        let frame = match frame::decode(&buffer, 0) {
            Ok((frame, consumed)) => {
                buffer.drain(..consumed);
                frame
            }
            Err(DecodeError::FrameNotFound) => return None,
            Err(DecodeError::Incomplete { offset, .. }) => {
                buffer.drain(..offset);
                return None;
            }
            Err(err) => {
                warn!("skipping false frame start: {}", err);
                let skip = match err {
                    DecodeError::InvalidPacketLength { offset, .. } => offset,
                    _ => frame::scan(&buffer).unwrap_or(0),
                };
                let end = (skip + MAGIC_WORD.len()).min(buffer.len());
                buffer.drain(..end);
                return None;
            }
        };
        drop(buffer);

        if !frame.is_complete {
            warn!("dropping incomplete frame {}", frame.header.frame_number);
            return None;
        }
        debug!("{}", frame);

        *lock(&self.latest) = Some(frame.clone());
        match self.frames.try_send(frame.clone()) {
            Ok(true) => (),
            Ok(false) => trace!("frame queue full, frame {} dropped", frame.header.frame_number),
            Err(err) => debug!("frame queue closed: {:?}", err),
        }

        Some(frame)
    }
}

/// Connection to a radar board, generic over the control and data channels.
pub struct Session<C: Write, D: Read + Send + 'static> {
    control: C,
    config: Configuration,
    options: SessionOptions,
    state: State,
    shared: Arc<Shared<D>>,
    frames: Receiver<Frame>,
    running: Arc<AtomicBool>,
    workers: Vec<(&'static str, JoinHandle<Result<(), Error>>)>,
}

impl Session<Box<dyn SerialPort>, Box<dyn SerialPort>> {
    /// Opens the control and data serial ports of a board.
    pub fn open(
        control_port: &str,
        control_baud: u32,
        data_port: &str,
        data_baud: u32,
        options: SessionOptions,
    ) -> Result<Self, Error> {
        let control = serialport::new(control_port, control_baud)
            .timeout(CONTROL_TIMEOUT)
            .open()?;
        let data = serialport::new(data_port, data_baud)
            .timeout(DATA_TIMEOUT)
            .open()?;
        info!(
            "opened {} control {} at {} data {} at {}",
            options.platform, control_port, control_baud, data_port, data_baud
        );

        Session::new(control, data, options)
    }
}

impl<C: Write, D: Read + Send + 'static> Session<C, D> {
    /// Creates a session over the channels and stops the sensor, which may
    /// still be running from a previous session.
    pub fn new(control: C, data: D, options: SessionOptions) -> Result<Self, Error> {
        let capture = match &options.record {
            Some(path) => {
                info!("recording data port to {}", path.display());
                Some(BufWriter::new(File::create(path)?))
            }
            None => None,
        };
        let (tx, rx) = kanal::bounded(FRAME_QUEUE_LEN);

        let shared = Arc::new(Shared {
            data: Mutex::new(data),
            buffer: Mutex::new(Vec::with_capacity(options.chunk_size * 4)),
            latest: Mutex::new(None),
            frames: tx,
            capture: Mutex::new(capture),
            chunk_size: options.chunk_size.max(1),
            max_buffer: options.max_buffer,
        });

        let mut session = Session {
            control,
            config: Configuration::new(options.platform),
            options,
            state: State::Initialized,
            shared,
            frames: rx,
            running: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
        };
        let stop = session.config.commands.sensor_stop.render();
        session.send_line(&stop)?;

        Ok(session)
    }

    /// Current sensor state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The configuration sent by [`Session::send_config`].
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Mutable access for setters, the changes reach the board with the next
    /// [`Session::send_config`].
    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    /// The control channel.
    pub fn control(&self) -> &C {
        &self.control
    }

    /// The most recent complete frame.
    pub fn latest_frame(&self) -> Option<Frame> {
        lock(&self.shared.latest).clone()
    }

    /// A receiver of decoded frames.  Receivers share one queue, each frame
    /// goes to one of them.
    pub fn frames(&self) -> Receiver<Frame> {
        self.frames.clone()
    }

    /// Number of raw bytes waiting to be parsed.
    pub fn buffered_len(&self) -> usize {
        lock(&self.shared.buffer).len()
    }

    /// Parses command lines into the configuration without sending them.
    /// Returns the number of accepted lines.
    pub fn load<'a, I>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.config.load(lines)
    }

    /// Parses a command line and sends it to the board.  `sensorStart` and
    /// `sensorStop` lines start and stop the session cycles.  Lines the
    /// configuration rejects are not sent.
    pub fn configure_line(&mut self, line: &str) -> Result<Option<CommandKind>, Error> {
        let Some(kind) = self.config.parse_line(line) else {
            return Ok(None);
        };

        match kind {
            CommandKind::SensorStart => self.sensor_start()?,
            CommandKind::SensorStop => self.sensor_stop()?,
            _ => self.send_line(line)?,
        }
        Ok(Some(kind))
    }

    /// Sends each accepted line, returning the number of accepted lines.
    pub fn configure<'a, I>(&mut self, lines: I) -> Result<usize, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut accepted = 0;
        for line in lines {
            if self.configure_line(line)?.is_some() {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Sends the full configuration, without `sensorStop` or `sensorStart`.
    pub fn send_config(&mut self) -> Result<(), Error> {
        for line in self.config.render_all(false, false) {
            self.send_line(&line)?;
        }
        Ok(())
    }

    /// Starts the sensor then the session cycles.
    pub fn sensor_start(&mut self) -> Result<(), Error> {
        let line = self.config.commands.sensor_start.render();
        self.send_line(&line)?;
        self.set_state(State::SensorStarted);

        if self.options.threaded {
            self.start_cycles()?;
        }
        Ok(())
    }

    /// Stops the session cycles then the sensor.  An error returned by a
    /// cycle is reported after the sensor has been stopped.
    pub fn sensor_stop(&mut self) -> Result<(), Error> {
        let cycles = self.stop_cycles();

        let line = self.config.commands.sensor_stop.render();
        self.send_line(&line)?;
        self.set_state(State::SensorStopped);

        cycles
    }

    /// Reads one chunk from the data channel into the raw buffer.  Returns
    /// the number of bytes read, zero when the read timed out.
    pub fn buffer_once(&self) -> Result<usize, Error> {
        self.shared.buffer_once()
    }

    /// Decodes at most one frame from the front of the raw buffer.  Returns
    /// the frame when a complete one was published.
    pub fn parse_once(&self) -> Option<Frame> {
        self.shared.parse_once()
    }

    fn send_line(&mut self, line: &str) -> Result<(), Error> {
        let line = normalize(line);
        debug!("send: {}", line);

        self.control.write_all(line.as_bytes())?;
        self.control.write_all(b"\n")?;
        self.control.flush()?;

        if !self.options.send_interval.is_zero() {
            thread::sleep(self.options.send_interval);
        }
        Ok(())
    }

    fn set_state(&mut self, state: State) {
        if self.state != state {
            info!("session {} -> {}", self.state, state);
            self.state = state;
        }
    }

    fn intervals(&self) -> (Duration, Duration) {
        let period = self.config.frame_period().unwrap_or(DEFAULT_CYCLE_PERIOD);
        (
            self.options.buffering_interval.unwrap_or(period / 10),
            self.options.parse_interval.unwrap_or(period),
        )
    }

    fn start_cycles(&mut self) -> Result<(), Error> {
        if !self.workers.is_empty() {
            return Ok(());
        }

        let (buffering_interval, parse_interval) = self.intervals();
        debug!(
            "starting cycles, buffering every {:?} parsing every {:?}",
            buffering_interval, parse_interval
        );
        self.running.store(true, Ordering::Release);

        let buffering = spawn_cycle(
            "buffering",
            self.shared.clone(),
            self.running.clone(),
            buffering_interval,
            self.options.realtime,
            |shared| shared.buffer_once().map(|_| ()),
        )?;
        self.workers.push(("buffering", buffering));

        let parsing = spawn_cycle(
            "parsing",
            self.shared.clone(),
            self.running.clone(),
            parse_interval,
            false,
            |shared| {
                shared.parse_once();
                Ok(())
            },
        )?;
        self.workers.push(("parsing", parsing));

        Ok(())
    }

    fn stop_cycles(&mut self) -> Result<(), Error> {
        self.running.store(false, Ordering::Release);

        let mut result = Ok(());
        for (name, worker) in self.workers.drain(..) {
            let outcome = worker
                .join()
                .unwrap_or_else(|_| Err(Error::CyclePanicked(name)));
            if let Err(err) = outcome {
                error!("{} cycle failed: {}", name, err);
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }
}

fn spawn_cycle<D, F>(
    name: &'static str,
    shared: Arc<Shared<D>>,
    running: Arc<AtomicBool>,
    interval: Duration,
    realtime: bool,
    cycle: F,
) -> Result<JoinHandle<Result<(), Error>>, Error>
where
    D: Read + Send + 'static,
    F: Fn(&Shared<D>) -> Result<(), Error> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            if realtime {
                set_thread_priority();
            }
            while running.load(Ordering::Acquire) {
                let started = Instant::now();
                cycle(&shared)?;
                if let Some(rest) = interval.checked_sub(started.elapsed()) {
                    thread::sleep(rest);
                }
            }
            Ok(())
        })?;
    Ok(handle)
}

impl<C: Write, D: Read + Send + 'static> Drop for Session<C, D> {
    fn drop(&mut self) {
        if let Err(err) = self.stop_cycles() {
            warn!("cycle error at shutdown: {}", err);
        }
        if let Err(err) = self.send_line("sensorStop") {
            warn!("unable to stop sensor: {}", err);
        }
        if let Some(capture) = lock(&self.shared.capture).as_mut() {
            if let Err(err) = capture.flush() {
                warn!("unable to flush capture: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::cfg_lines,
        frame::{FrameBuilder, FrameHeader},
        tlv::{DetectedObject, DetectedObjects, TlvType},
    };
    use std::io::Cursor;

    const XWR14XX: u32 = 0x000A1443;

    #[derive(Clone, Default)]
    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl SharedWriter {
        fn text(&self) -> String {
            String::from_utf8_lossy(&lock(&self.0)).into_owned()
        }
    }

    impl Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            lock(&self.0).extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn options() -> SessionOptions {
        SessionOptions {
            platform: Platform::Xwr14xx,
            send_interval: Duration::ZERO,
            buffering_interval: Some(Duration::from_millis(1)),
            parse_interval: Some(Duration::from_millis(1)),
            chunk_size: 16,
            threaded: false,
            ..Default::default()
        }
    }

    fn packet(frame_number: u32) -> Vec<u8> {
        let header = FrameHeader {
            version: 0x01000005,
            platform: XWR14XX,
            frame_number,
            num_detected_objects: 1,
            ..Default::default()
        };
        let objects = DetectedObjects::new(
            8,
            vec![DetectedObject {
                range_idx: frame_number as u16,
                doppler_idx: 0,
                peak_val: 100,
                x: 256,
                y: 256,
                z: 0,
            }],
        );
        FrameBuilder::new(header)
            .tlv(TlvType::DetectedObjects as u32, objects.encode())
            .build()
    }

    fn stream() -> Vec<u8> {
        let mut data = vec![0xAA, 0x02, 0x01, 0x55, 0x07];
        data.extend(packet(1));
        data.extend(packet(2));
        data
    }

    #[test]
    fn test_sensor_stop_on_open_and_drop() -> Result<(), Error> {
        let control = SharedWriter::default();
        let session = Session::new(control.clone(), Cursor::new(Vec::new()), options())?;

        assert_eq!(session.state(), State::Initialized);
        assert_eq!(control.text(), "sensorStop\n");

        drop(session);
        assert_eq!(control.text(), "sensorStop\nsensorStop\n");
        Ok(())
    }

    #[test]
    fn test_cooperative_cycles() -> Result<(), Error> {
        let session = Session::new(SharedWriter::default(), Cursor::new(stream()), options())?;
        let rx = session.frames();

        assert_eq!(session.parse_once(), None);
        while session.buffer_once()? > 0 {}
        assert_eq!(session.buffered_len(), stream().len());

        let first = session.parse_once().map(|frame| frame.header.frame_number);
        assert_eq!(first, Some(1));
        assert_eq!(session.buffered_len(), packet(2).len());

        let second = session.parse_once().map(|frame| frame.header.frame_number);
        assert_eq!(second, Some(2));
        assert_eq!(session.buffered_len(), 0);
        assert_eq!(session.parse_once(), None);

        let latest = session.latest_frame().map(|frame| frame.header.frame_number);
        assert_eq!(latest, Some(2));

        let queued: Vec<u32> = std::iter::from_fn(|| rx.try_recv().ok().flatten())
            .map(|frame| frame.header.frame_number)
            .collect();
        assert_eq!(queued, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn test_partial_frame() -> Result<(), Error> {
        let data = packet(7);
        let split = data.len() - 1;
        let session = Session::new(
            SharedWriter::default(),
            Cursor::new(data[..split].to_vec()),
            options(),
        )?;

        while session.buffer_once()? > 0 {}
        assert_eq!(session.parse_once(), None);
        assert_eq!(session.buffered_len(), split);

        lock(&session.shared.buffer).push(data[split]);
        let frame = session.parse_once().map(|frame| frame.header.frame_number);
        assert_eq!(frame, Some(7));
        Ok(())
    }

    #[test]
    fn test_invalid_packet_length() -> Result<(), Error> {
        let mut data = MAGIC_WORD.to_vec();
        data.extend([0u8; 28]);
        data.extend(packet(3));
        let session = Session::new(SharedWriter::default(), Cursor::new(data), options())?;

        while session.buffer_once()? > 0 {}
        assert_eq!(session.parse_once(), None);
        assert_eq!(session.buffered_len(), 28 + packet(3).len());

        let frame = session.parse_once().map(|frame| frame.header.frame_number);
        assert_eq!(frame, Some(3));
        Ok(())
    }

    #[test]
    fn test_buffer_cap() -> Result<(), Error> {
        let data: Vec<u8> = (0..200u8).collect();
        let session = Session::new(
            SharedWriter::default(),
            Cursor::new(data),
            SessionOptions {
                max_buffer: 64,
                ..options()
            },
        )?;

        while session.buffer_once()? > 0 {}
        let buffer = lock(&session.shared.buffer).clone();
        assert_eq!(buffer.len(), 64);
        assert_eq!(buffer.first(), Some(&136));
        assert_eq!(buffer.last(), Some(&199));
        Ok(())
    }

    #[test]
    fn test_send_config() -> Result<(), Error> {
        let control = SharedWriter::default();
        let mut session = Session::new(control.clone(), Cursor::new(Vec::new()), options())?;

        let accepted = session.load(cfg_lines(include_str!("../testdata/xwr14xx.cfg")));
        assert_eq!(accepted, 24);
        assert_eq!(control.text(), "sensorStop\n");

        session.config_mut().set_clutter_removal(true);
        session.send_config()?;
        session.sensor_start()?;
        assert_eq!(session.state(), State::SensorStarted);

        let mut expected = session.config().render_all(true, true);
        assert!(expected.contains(&"clutterRemoval 1".to_string()));
        expected.push(String::new());
        assert_eq!(control.text(), expected.join("\n"));

        session.sensor_stop()?;
        assert_eq!(session.state(), State::SensorStopped);
        assert!(control.text().ends_with("sensorStart\nsensorStop\n"));
        Ok(())
    }

    #[test]
    fn test_configure_lines() -> Result<(), Error> {
        let control = SharedWriter::default();
        let mut session = Session::new(control.clone(), Cursor::new(Vec::new()), options())?;

        let accepted = session.configure([
            "% comment",
            "channelCfg   15 5 0",
            "bogusCmd 1",
            "frameCfg 0 1 16 0 50 1 0",
            "sensorStart",
        ])?;
        assert_eq!(accepted, 3);
        assert_eq!(session.state(), State::SensorStarted);
        assert_eq!(session.config().derived.num_virtual_antennas, Some(8));
        assert_eq!(
            control.text(),
            "sensorStop\nchannelCfg 15 5 0\nframeCfg 0 1 16 0 50 1 0\nsensorStart\n"
        );
        Ok(())
    }

    #[test]
    fn test_threaded_cycles() -> Result<(), Error> {
        let mut session = Session::new(
            SharedWriter::default(),
            Cursor::new(stream()),
            SessionOptions {
                threaded: true,
                ..options()
            },
        )?;
        let rx = session.frames();

        session.sensor_start()?;
        let first = rx.recv_timeout(Duration::from_secs(5)).ok();
        let second = rx.recv_timeout(Duration::from_secs(5)).ok();
        session.sensor_stop()?;

        assert_eq!(first.map(|frame| frame.header.frame_number), Some(1));
        assert_eq!(second.map(|frame| frame.header.frame_number), Some(2));
        assert_eq!(session.state(), State::SensorStopped);
        Ok(())
    }

    #[test]
    fn test_capture() -> Result<(), Error> {
        let path = std::env::temp_dir().join(format!("mmwave-capture-{}.bin", std::process::id()));
        let session = Session::new(
            SharedWriter::default(),
            Cursor::new(stream()),
            SessionOptions {
                record: Some(path.clone()),
                ..options()
            },
        )?;

        while session.buffer_once()? > 0 {}
        drop(session);

        let captured = std::fs::read(&path)?;
        std::fs::remove_file(&path)?;
        assert_eq!(captured, stream());
        Ok(())
    }
}
