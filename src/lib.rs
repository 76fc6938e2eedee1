// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! mmWave Library
//!
//! This library drives TI xWR14xx and xWR16xx mmWave radar evaluation boards
//! running the out-of-box demo firmware.  The board is configured with ASCII
//! command lines over its control port and streams binary frames of
//! Type-Length-Value records over its data port.
//!
//! # Features
//!
//! - **Frame Decoding** - Magic word scanning, headers and TLV payloads
//! - **Command Model** - Parse and render every configuration command
//! - **Derived Parameters** - Range and velocity resolution, CFAR threshold
//! - **Device Session** - Serial channels, raw buffering and frame parsing
//!
//! # Examples
//!
//! Decoding a frame from a raw capture:
//!
//! ```no_run
//! let capture = std::fs::read("capture.bin").unwrap();
//! if let Ok((frame, consumed)) = mmwave::frame::decode(&capture, 0) {
//!     println!("{} consumed {} bytes", frame, consumed);
//! }
//! ```
//!
//! Configuring a board from a `.cfg` file:
//!
//! ```no_run
//! use mmwave::{config::cfg_lines, session::{Session, SessionOptions}};
//!
//! let text = std::fs::read_to_string("profile.cfg").unwrap();
//! let mut session = Session::open(
//!     "/dev/ttyACM0",
//!     115200,
//!     "/dev/ttyACM1",
//!     921600,
//!     SessionOptions::default(),
//! )
//! .unwrap();
//! session.load(cfg_lines(&text));
//! session.send_config().unwrap();
//! session.sensor_start().unwrap();
//! ```

#![warn(missing_docs)]

/// Little-endian reads and Q-format conversion
pub mod codec;

/// Frame scanning, decoding and encoding
pub mod frame;

/// TLV payload types
pub mod tlv;

/// Configuration command records
pub mod command;

/// Platforms, the command bank and configuration loading
pub mod config;

/// Parameters derived from the configuration
pub mod params;

/// Device session over the control and data serial ports
pub mod session;

/// Common OS utilities
pub mod common;
