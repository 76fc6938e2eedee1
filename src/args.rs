// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use std::{fmt, path::PathBuf, time::Duration};

use clap::Parser;
use mmwave::{config::Platform, session::SessionOptions};
use tracing::level_filters::LevelFilter;

#[derive(Debug)]
pub enum Error {
    InvalidCfarThreshold(f64),
    InvalidFramePeriodicity(f64),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidCfarThreshold(value) => {
                write!(f, "invalid cfar threshold: {} dB (expected 0 to 100)", value)
            }
            Error::InvalidFramePeriodicity(value) => {
                write!(f, "invalid frame periodicity: {} ms", value)
            }
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The radar device family.
    #[arg(long, env, default_value = "xwr16xx")]
    pub platform: Platform,

    /// Serial port of the command line interface.
    #[arg(long, env, default_value = "/dev/ttyACM0")]
    pub control_port: String,

    /// Serial port streaming binary frames.
    #[arg(long, env, default_value = "/dev/ttyACM1")]
    pub data_port: String,

    /// Baud rate of the control port.
    #[arg(long, env, default_value = "115200")]
    pub control_baud: u32,

    /// Baud rate of the data port.
    #[arg(long, env, default_value = "921600")]
    pub data_baud: u32,

    /// Configuration file of command lines, `%` starts a comment.
    #[arg(long, env)]
    pub config: Option<PathBuf>,

    /// Override the CFAR detection threshold in dB.
    #[arg(long, env)]
    pub cfar_threshold_db: Option<f64>,

    /// Override static clutter removal.
    #[arg(long, env)]
    pub clutter_removal: Option<bool>,

    /// Override the frame period in milliseconds.
    #[arg(long, env)]
    pub frame_periodicity: Option<f64>,

    /// Pause after each command sent to the board in milliseconds.
    #[arg(long, env, default_value = "25")]
    pub send_interval_ms: u64,

    /// Period of the buffering cycle in milliseconds, defaults to a tenth
    /// of the frame period.
    #[arg(long, env)]
    pub buffering_interval_ms: Option<u64>,

    /// Period of the parsing cycle in milliseconds, defaults to the frame
    /// period.
    #[arg(long, env)]
    pub parse_interval_ms: Option<u64>,

    /// Record the raw data port stream to this file.
    #[arg(long, env)]
    pub record: Option<PathBuf>,

    /// Decode a recorded data port stream instead of opening the board.
    #[arg(long, env)]
    pub replay: Option<PathBuf>,

    /// Print the rendered command sequence and exit.
    #[arg(long)]
    pub render: bool,

    /// Print frames as JSON lines.
    #[arg(long, env)]
    pub json: bool,

    /// Read the data port with real-time priority.
    #[arg(long, env)]
    pub realtime: bool,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,

    /// Enable Tracy profiler broadcast
    #[arg(long, env)]
    pub tracy: bool,
}

impl Args {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(db) = self.cfar_threshold_db {
            if !(0.0..=100.0).contains(&db) {
                return Err(Error::InvalidCfarThreshold(db));
            }
        }

        if let Some(ms) = self.frame_periodicity {
            if !ms.is_finite() || ms <= 0.0 {
                return Err(Error::InvalidFramePeriodicity(ms));
            }
        }

        Ok(())
    }
}

impl From<&Args> for SessionOptions {
    fn from(args: &Args) -> Self {
        SessionOptions {
            platform: args.platform,
            send_interval: Duration::from_millis(args.send_interval_ms),
            buffering_interval: args.buffering_interval_ms.map(Duration::from_millis),
            parse_interval: args.parse_interval_ms.map(Duration::from_millis),
            realtime: args.realtime,
            record: args.record.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["mmwavectl"]);
        assert_eq!(args.platform, Platform::Xwr16xx);
        assert_eq!(args.control_port, "/dev/ttyACM0");
        assert_eq!(args.data_baud, 921600);
        assert!(args.validate().is_ok());

        let options = SessionOptions::from(&args);
        assert_eq!(options.send_interval, Duration::from_millis(25));
        assert_eq!(options.parse_interval, None);
        assert!(options.threaded);
    }

    #[test]
    fn test_validate() {
        let args = Args::parse_from(["mmwavectl", "--platform", "xwr14xx", "--cfar-threshold-db", "150"]);
        assert_eq!(args.platform, Platform::Xwr14xx);
        assert!(matches!(
            args.validate(),
            Err(Error::InvalidCfarThreshold(_))
        ));

        let args = Args::parse_from(["mmwavectl", "--frame-periodicity", "0"]);
        assert!(matches!(
            args.validate(),
            Err(Error::InvalidFramePeriodicity(_))
        ));

        let args = Args::parse_from(["mmwavectl", "--clutter-removal", "true"]);
        assert_eq!(args.clutter_removal, Some(true));
    }
}
