// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Records for the ASCII configuration commands of the mmWave demo firmware.
//!
//! Each record parses the arguments of its own keyword and renders itself back
//! into a canonical command line.  Parsing is tolerant: a line for another
//! keyword, a line with the wrong number of arguments, or a line with an
//! unparsable value leaves the record untouched.  Unset fields render as
//! empty strings which collapse during whitespace normalization.
//!
//! Several xWR16xx commands take a leading `subFrameIdx` which the xWR14xx
//! firmware does not accept.  Those records parse either form and only render
//! the index when it was set, the command bank rejects the index for xWR14xx.

use log::{debug, trace};
use std::{fmt, str::FromStr};

/// Errors raised while naming commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The keyword does not name a known command.
    UnknownCommand(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::UnknownCommand(keyword) => write!(f, "unknown command: {}", keyword),
        }
    }
}

/// Every command keyword understood by the firmware command line interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `sensorStart`
    SensorStart,
    /// `sensorStop`
    SensorStop,
    /// `flushCfg`
    FlushCfg,
    /// `dfeDataOutputMode`
    DfeDataOutputMode,
    /// `channelCfg`
    ChannelCfg,
    /// `adcCfg`
    AdcCfg,
    /// `adcbufCfg`
    AdcbufCfg,
    /// `profileCfg`
    ProfileCfg,
    /// `chirpCfg`
    ChirpCfg,
    /// `bpmCfg`
    BpmCfg,
    /// `lowPower`
    LowPower,
    /// `frameCfg`
    FrameCfg,
    /// `advFrameCfg`
    AdvFrameCfg,
    /// `subFrameCfg`
    SubFrameCfg,
    /// `guiMonitor`
    GuiMonitor,
    /// `cfarCfg`
    CfarCfg,
    /// `peakGrouping`
    PeakGrouping,
    /// `multiObjBeamForming`
    MultiObjBeamForming,
    /// `calibDcRangeSig`
    CalibDcRangeSig,
    /// `extendedMaxVelocity`
    ExtendedMaxVelocity,
    /// `clutterRemoval`
    ClutterRemoval,
    /// `compRangeBiasAndRxChanPhase`
    CompRangeBiasAndRxChanPhase,
    /// `measureRangeBiasAndRxChanPhase`
    MeasureRangeBiasAndRxChanPhase,
    /// `nearFieldCfg`
    NearFieldCfg,
    /// `CQRxSatMonitor`
    CqRxSatMonitor,
    /// `CQSigImgMonitor`
    CqSigImgMonitor,
    /// `analogMonitor`
    AnalogMonitor,
    /// `lvdsStreamCfg`
    LvdsStreamCfg,
}

impl CommandKind {
    /// All keywords in declaration order.
    pub const ALL: [CommandKind; 28] = [
        CommandKind::SensorStart,
        CommandKind::SensorStop,
        CommandKind::FlushCfg,
        CommandKind::DfeDataOutputMode,
        CommandKind::ChannelCfg,
        CommandKind::AdcCfg,
        CommandKind::AdcbufCfg,
        CommandKind::ProfileCfg,
        CommandKind::ChirpCfg,
        CommandKind::BpmCfg,
        CommandKind::LowPower,
        CommandKind::FrameCfg,
        CommandKind::AdvFrameCfg,
        CommandKind::SubFrameCfg,
        CommandKind::GuiMonitor,
        CommandKind::CfarCfg,
        CommandKind::PeakGrouping,
        CommandKind::MultiObjBeamForming,
        CommandKind::CalibDcRangeSig,
        CommandKind::ExtendedMaxVelocity,
        CommandKind::ClutterRemoval,
        CommandKind::CompRangeBiasAndRxChanPhase,
        CommandKind::MeasureRangeBiasAndRxChanPhase,
        CommandKind::NearFieldCfg,
        CommandKind::CqRxSatMonitor,
        CommandKind::CqSigImgMonitor,
        CommandKind::AnalogMonitor,
        CommandKind::LvdsStreamCfg,
    ];

    /// The keyword token as sent on the control port.
    pub fn keyword(&self) -> &'static str {
        match self {
            CommandKind::SensorStart => "sensorStart",
            CommandKind::SensorStop => "sensorStop",
            CommandKind::FlushCfg => "flushCfg",
            CommandKind::DfeDataOutputMode => "dfeDataOutputMode",
            CommandKind::ChannelCfg => "channelCfg",
            CommandKind::AdcCfg => "adcCfg",
            CommandKind::AdcbufCfg => "adcbufCfg",
            CommandKind::ProfileCfg => "profileCfg",
            CommandKind::ChirpCfg => "chirpCfg",
            CommandKind::BpmCfg => "bpmCfg",
            CommandKind::LowPower => "lowPower",
            CommandKind::FrameCfg => "frameCfg",
            CommandKind::AdvFrameCfg => "advFrameCfg",
            CommandKind::SubFrameCfg => "subFrameCfg",
            CommandKind::GuiMonitor => "guiMonitor",
            CommandKind::CfarCfg => "cfarCfg",
            CommandKind::PeakGrouping => "peakGrouping",
            CommandKind::MultiObjBeamForming => "multiObjBeamForming",
            CommandKind::CalibDcRangeSig => "calibDcRangeSig",
            CommandKind::ExtendedMaxVelocity => "extendedMaxVelocity",
            CommandKind::ClutterRemoval => "clutterRemoval",
            CommandKind::CompRangeBiasAndRxChanPhase => "compRangeBiasAndRxChanPhase",
            CommandKind::MeasureRangeBiasAndRxChanPhase => "measureRangeBiasAndRxChanPhase",
            CommandKind::NearFieldCfg => "nearFieldCfg",
            CommandKind::CqRxSatMonitor => "CQRxSatMonitor",
            CommandKind::CqSigImgMonitor => "CQSigImgMonitor",
            CommandKind::AnalogMonitor => "analogMonitor",
            CommandKind::LvdsStreamCfg => "lvdsStreamCfg",
        }
    }

    /// Returns the kind named by the first token of a command line.
    pub fn of_line(line: &str) -> Option<CommandKind> {
        line.split_whitespace().next()?.parse().ok()
    }
}

impl FromStr for CommandKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .iter()
            .find(|kind| kind.keyword() == s)
            .copied()
            .ok_or_else(|| Error::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// A configuration command record.
pub trait Command {
    /// Keyword handled by the record.
    const KIND: CommandKind;

    /// Assigns the record fields from the arguments following the keyword.
    /// Returns false and leaves the record unchanged when the arguments do
    /// not fit the record.
    fn assign(&mut self, args: &[&str]) -> bool;

    /// Renders each field, unset fields as empty strings.
    fn values(&self) -> Vec<String>;

    /// Leading sub-frame index, set only by the xWR16xx form of a command.
    fn sub_frame_idx(&self) -> Option<i64> {
        None
    }

    /// Parses a command line into the record.  Returns true when the line
    /// carried this record's keyword and its arguments were accepted.
    fn parse(&mut self, line: &str) -> bool {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some(Self::KIND.keyword()) {
            return false;
        }

        let args: Vec<&str> = tokens.collect();
        if self.assign(&args) {
            trace!("{} <= {:?}", Self::KIND, args);
            true
        } else {
            debug!("{} ignored, arguments do not match: {}", Self::KIND, line.trim());
            false
        }
    }

    /// Renders the record as a command line with single spaces.
    fn render(&self) -> String {
        let mut line = String::from(Self::KIND.keyword());
        for value in self.values() {
            line.push(' ');
            line.push_str(&value);
        }
        normalize(&line)
    }
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn normalize(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Formats a float the way the firmware parser expects, integral values
/// without a fractional part.
pub fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    // Display already prints the shortest round-trip form without ".0".
    value.to_string()
}

fn int(token: &str) -> Option<i64> {
    token.parse().ok()
}

fn float(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn mask(token: &str) -> Option<u32> {
    match token.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}

fn text<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn float_text(value: &Option<f64>) -> String {
    value.map(format_float).unwrap_or_default()
}

/// Splits the optional leading subFrameIdx from the arguments of a record
/// taking arity further fields.
fn split_sub_frame<'a, 'b>(
    args: &'a [&'b str],
    arity: usize,
) -> Option<(Option<i64>, &'a [&'b str])> {
    if args.len() == arity + 1 {
        Some((Some(int(args[0])?), &args[1..]))
    } else if args.len() == arity {
        Some((None, args))
    } else {
        None
    }
}

/// `sensorStart [doReconfig]`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorStart {
    /// Reloads the configuration before starting when set
    pub do_reconfig: Option<i64>,
}

impl Command for SensorStart {
    const KIND: CommandKind = CommandKind::SensorStart;

    fn assign(&mut self, args: &[&str]) -> bool {
        match args {
            [] => true,
            [do_reconfig] => match int(do_reconfig) {
                Some(do_reconfig) => {
                    self.do_reconfig = Some(do_reconfig);
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    fn values(&self) -> Vec<String> {
        vec![text(&self.do_reconfig)]
    }
}

/// `sensorStop`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorStop;

impl Command for SensorStop {
    const KIND: CommandKind = CommandKind::SensorStop;

    fn assign(&mut self, args: &[&str]) -> bool {
        args.is_empty()
    }

    fn values(&self) -> Vec<String> {
        vec![]
    }
}

/// `flushCfg`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlushCfg;

impl Command for FlushCfg {
    const KIND: CommandKind = CommandKind::FlushCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        args.is_empty()
    }

    fn values(&self) -> Vec<String> {
        vec![]
    }
}

/// `dfeDataOutputMode modeType`, mode 3 selects advanced frame configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DfeDataOutputMode {
    /// Data output mode
    pub mode_type: Option<i64>,
}

impl DfeDataOutputMode {
    /// Mode selecting `advFrameCfg` and `subFrameCfg`.
    pub const ADVANCED_FRAME: i64 = 3;
}

impl Command for DfeDataOutputMode {
    const KIND: CommandKind = CommandKind::DfeDataOutputMode;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [mode_type] = args else { return false };
        let Some(mode_type) = int(mode_type) else {
            return false;
        };

        self.mode_type = Some(mode_type);
        true
    }

    fn values(&self) -> Vec<String> {
        vec![text(&self.mode_type)]
    }
}

/// `channelCfg rxChannelEn txChannelEn cascading`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelCfg {
    /// Receive antenna enable mask
    pub rx_channel_en: Option<u32>,
    /// Transmit antenna enable mask
    pub tx_channel_en: Option<u32>,
    /// Cascading mode, zero for a single chip
    pub cascading: Option<i64>,
}

impl Command for ChannelCfg {
    const KIND: CommandKind = CommandKind::ChannelCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [rx_channel_en, tx_channel_en, cascading] = args else {
            return false;
        };
        let (Some(rx_channel_en), Some(tx_channel_en), Some(cascading)) =
            (mask(rx_channel_en), mask(tx_channel_en), int(cascading))
        else {
            return false;
        };

        *self = ChannelCfg {
            rx_channel_en: Some(rx_channel_en),
            tx_channel_en: Some(tx_channel_en),
            cascading: Some(cascading),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.rx_channel_en),
            text(&self.tx_channel_en),
            text(&self.cascading),
        ]
    }
}

/// `adcCfg numADCBits adcOutputFmt`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdcCfg {
    /// ADC resolution, 2 selects 16 bits
    pub num_adc_bits: Option<i64>,
    /// ADC output format, real or complex
    pub adc_output_fmt: Option<i64>,
}

impl Command for AdcCfg {
    const KIND: CommandKind = CommandKind::AdcCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [num_adc_bits, adc_output_fmt] = args else {
            return false;
        };
        let (Some(num_adc_bits), Some(adc_output_fmt)) = (int(num_adc_bits), int(adc_output_fmt))
        else {
            return false;
        };

        *self = AdcCfg {
            num_adc_bits: Some(num_adc_bits),
            adc_output_fmt: Some(adc_output_fmt),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![text(&self.num_adc_bits), text(&self.adc_output_fmt)]
    }
}

/// `adcbufCfg [subFrameIdx] adcOutputFmt sampleSwap chanInterleave chirpThreshold`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdcbufCfg {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// ADC output format, real or complex
    pub adc_output_fmt: Option<i64>,
    /// I/Q sample order
    pub sample_swap: Option<i64>,
    /// Channel interleaving in the ADC buffer
    pub chan_interleave: Option<i64>,
    /// Chirps buffered before processing
    pub chirp_threshold: Option<i64>,
}

impl Command for AdcbufCfg {
    const KIND: CommandKind = CommandKind::AdcbufCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, args)) = split_sub_frame(args, 4) else {
            return false;
        };
        let [adc_output_fmt, sample_swap, chan_interleave, chirp_threshold] = args else {
            return false;
        };
        let (Some(adc_output_fmt), Some(sample_swap), Some(chan_interleave), Some(chirp_threshold)) = (
            int(adc_output_fmt),
            int(sample_swap),
            int(chan_interleave),
            int(chirp_threshold),
        ) else {
            return false;
        };

        *self = AdcbufCfg {
            sub_frame_idx: sub_frame_idx.or(self.sub_frame_idx),
            adc_output_fmt: Some(adc_output_fmt),
            sample_swap: Some(sample_swap),
            chan_interleave: Some(chan_interleave),
            chirp_threshold: Some(chirp_threshold),
        };
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_idx),
            text(&self.adc_output_fmt),
            text(&self.sample_swap),
            text(&self.chan_interleave),
            text(&self.chirp_threshold),
        ]
    }
}

/// `profileCfg`, the chirp profile shared by the chirps referencing it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileCfg {
    /// Profile identifier
    pub profile_id: Option<i64>,
    /// Start frequency in GHz
    pub start_freq: Option<f64>,
    /// Idle time in microseconds
    pub idle_time: Option<f64>,
    /// ADC valid start time in microseconds
    pub adc_start_time: Option<f64>,
    /// Ramp end time in microseconds
    pub ramp_end_time: Option<f64>,
    /// Transmit power back-off
    pub tx_out_power: Option<i64>,
    /// Transmit phase shifter
    pub tx_phase_shifter: Option<i64>,
    /// Frequency slope in MHz/us
    pub freq_slope_const: Option<f64>,
    /// Transmit start time in microseconds
    pub tx_start_time: Option<f64>,
    /// ADC samples per chirp
    pub num_adc_samples: Option<i64>,
    /// ADC sampling rate in ksps
    pub dig_out_sample_rate: Option<i64>,
    /// First high pass filter corner
    pub hpf_corner_freq1: Option<i64>,
    /// Second high pass filter corner
    pub hpf_corner_freq2: Option<i64>,
    /// Receiver gain in dB
    pub rx_gain: Option<i64>,
}

impl Command for ProfileCfg {
    const KIND: CommandKind = CommandKind::ProfileCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [profile_id, start_freq, idle_time, adc_start_time, ramp_end_time, tx_out_power, tx_phase_shifter, freq_slope_const, tx_start_time, num_adc_samples, dig_out_sample_rate, hpf_corner_freq1, hpf_corner_freq2, rx_gain] =
            args
        else {
            return false;
        };
        let (
            Some(profile_id),
            Some(start_freq),
            Some(idle_time),
            Some(adc_start_time),
            Some(ramp_end_time),
            Some(tx_out_power),
            Some(tx_phase_shifter),
            Some(freq_slope_const),
            Some(tx_start_time),
            Some(num_adc_samples),
            Some(dig_out_sample_rate),
            Some(hpf_corner_freq1),
            Some(hpf_corner_freq2),
            Some(rx_gain),
        ) = (
            int(profile_id),
            float(start_freq),
            float(idle_time),
            float(adc_start_time),
            float(ramp_end_time),
            int(tx_out_power),
            int(tx_phase_shifter),
            float(freq_slope_const),
            float(tx_start_time),
            int(num_adc_samples),
            int(dig_out_sample_rate),
            int(hpf_corner_freq1),
            int(hpf_corner_freq2),
            int(rx_gain),
        )
        else {
            return false;
        };

        *self = ProfileCfg {
            profile_id: Some(profile_id),
            start_freq: Some(start_freq),
            idle_time: Some(idle_time),
            adc_start_time: Some(adc_start_time),
            ramp_end_time: Some(ramp_end_time),
            tx_out_power: Some(tx_out_power),
            tx_phase_shifter: Some(tx_phase_shifter),
            freq_slope_const: Some(freq_slope_const),
            tx_start_time: Some(tx_start_time),
            num_adc_samples: Some(num_adc_samples),
            dig_out_sample_rate: Some(dig_out_sample_rate),
            hpf_corner_freq1: Some(hpf_corner_freq1),
            hpf_corner_freq2: Some(hpf_corner_freq2),
            rx_gain: Some(rx_gain),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.profile_id),
            float_text(&self.start_freq),
            float_text(&self.idle_time),
            float_text(&self.adc_start_time),
            float_text(&self.ramp_end_time),
            text(&self.tx_out_power),
            text(&self.tx_phase_shifter),
            float_text(&self.freq_slope_const),
            float_text(&self.tx_start_time),
            text(&self.num_adc_samples),
            text(&self.dig_out_sample_rate),
            text(&self.hpf_corner_freq1),
            text(&self.hpf_corner_freq2),
            text(&self.rx_gain),
        ]
    }
}

/// `chirpCfg`, one per transmit antenna mask.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChirpCfg {
    /// First chirp index
    pub chirp_start_index: Option<i64>,
    /// Last chirp index
    pub chirp_end_index: Option<i64>,
    /// Profile identifier
    pub profile_id: Option<i64>,
    /// Start frequency variation in Hz
    pub start_freq_variation: Option<f64>,
    /// Frequency slope variation in kHz/us
    pub freq_slope_variation: Option<f64>,
    /// Idle time variation in microseconds
    pub idle_time_variation: Option<f64>,
    /// ADC start time variation in microseconds
    pub adc_start_time_variation: Option<f64>,
    /// Transmit antennas driven by the chirp, keys the chirp list
    pub tx_antenna_enable_mask: Option<u32>,
}

impl Command for ChirpCfg {
    const KIND: CommandKind = CommandKind::ChirpCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [chirp_start_index, chirp_end_index, profile_id, start_freq_variation, freq_slope_variation, idle_time_variation, adc_start_time_variation, tx_antenna_enable_mask] =
            args
        else {
            return false;
        };
        let (
            Some(chirp_start_index),
            Some(chirp_end_index),
            Some(profile_id),
            Some(start_freq_variation),
            Some(freq_slope_variation),
            Some(idle_time_variation),
            Some(adc_start_time_variation),
            Some(tx_antenna_enable_mask),
        ) = (
            int(chirp_start_index),
            int(chirp_end_index),
            int(profile_id),
            float(start_freq_variation),
            float(freq_slope_variation),
            float(idle_time_variation),
            float(adc_start_time_variation),
            mask(tx_antenna_enable_mask),
        )
        else {
            return false;
        };

        *self = ChirpCfg {
            chirp_start_index: Some(chirp_start_index),
            chirp_end_index: Some(chirp_end_index),
            profile_id: Some(profile_id),
            start_freq_variation: Some(start_freq_variation),
            freq_slope_variation: Some(freq_slope_variation),
            idle_time_variation: Some(idle_time_variation),
            adc_start_time_variation: Some(adc_start_time_variation),
            tx_antenna_enable_mask: Some(tx_antenna_enable_mask),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.chirp_start_index),
            text(&self.chirp_end_index),
            text(&self.profile_id),
            float_text(&self.start_freq_variation),
            float_text(&self.freq_slope_variation),
            float_text(&self.idle_time_variation),
            float_text(&self.adc_start_time_variation),
            text(&self.tx_antenna_enable_mask),
        ]
    }
}

/// `bpmCfg [subFrameIdx] enabled chirp0Idx chirp1Idx`, xWR16xx only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BpmCfg {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// Enable flag
    pub enabled: Option<i64>,
    /// Chirp index of the first BPM phase
    pub chirp0_idx: Option<i64>,
    /// Chirp index of the second BPM phase
    pub chirp1_idx: Option<i64>,
}

impl Command for BpmCfg {
    const KIND: CommandKind = CommandKind::BpmCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, args)) = split_sub_frame(args, 3) else {
            return false;
        };
        let [enabled, chirp0_idx, chirp1_idx] = args else {
            return false;
        };
        let (Some(enabled), Some(chirp0_idx), Some(chirp1_idx)) =
            (int(enabled), int(chirp0_idx), int(chirp1_idx))
        else {
            return false;
        };

        *self = BpmCfg {
            sub_frame_idx: sub_frame_idx.or(self.sub_frame_idx),
            enabled: Some(enabled),
            chirp0_idx: Some(chirp0_idx),
            chirp1_idx: Some(chirp1_idx),
        };
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_idx),
            text(&self.enabled),
            text(&self.chirp0_idx),
            text(&self.chirp1_idx),
        ]
    }
}

/// `lowPower dontCare adcMode`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LowPower {
    /// Ignored by the firmware
    pub dont_care: Option<i64>,
    /// ADC power mode
    pub adc_mode: Option<i64>,
}

impl Command for LowPower {
    const KIND: CommandKind = CommandKind::LowPower;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [dont_care, adc_mode] = args else {
            return false;
        };
        let (Some(dont_care), Some(adc_mode)) = (int(dont_care), int(adc_mode)) else {
            return false;
        };

        *self = LowPower {
            dont_care: Some(dont_care),
            adc_mode: Some(adc_mode),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![text(&self.dont_care), text(&self.adc_mode)]
    }
}

/// `frameCfg`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameCfg {
    /// First chirp index
    pub chirp_start_index: Option<i64>,
    /// Last chirp index
    pub chirp_end_index: Option<i64>,
    /// Chirp loops per frame
    pub number_of_loops: Option<i64>,
    /// Number of frames, zero runs forever
    pub number_of_frames: Option<i64>,
    /// Frame period in milliseconds
    pub frame_periodicity: Option<f64>,
    /// Software or hardware trigger
    pub trigger_select: Option<i64>,
    /// Trigger delay in milliseconds
    pub frame_trigger_delay: Option<f64>,
}

impl Command for FrameCfg {
    const KIND: CommandKind = CommandKind::FrameCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [chirp_start_index, chirp_end_index, number_of_loops, number_of_frames, frame_periodicity, trigger_select, frame_trigger_delay] =
            args
        else {
            return false;
        };
        let (
            Some(chirp_start_index),
            Some(chirp_end_index),
            Some(number_of_loops),
            Some(number_of_frames),
            Some(frame_periodicity),
            Some(trigger_select),
            Some(frame_trigger_delay),
        ) = (
            int(chirp_start_index),
            int(chirp_end_index),
            int(number_of_loops),
            int(number_of_frames),
            float(frame_periodicity),
            int(trigger_select),
            float(frame_trigger_delay),
        )
        else {
            return false;
        };

        *self = FrameCfg {
            chirp_start_index: Some(chirp_start_index),
            chirp_end_index: Some(chirp_end_index),
            number_of_loops: Some(number_of_loops),
            number_of_frames: Some(number_of_frames),
            frame_periodicity: Some(frame_periodicity),
            trigger_select: Some(trigger_select),
            frame_trigger_delay: Some(frame_trigger_delay),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.chirp_start_index),
            text(&self.chirp_end_index),
            text(&self.number_of_loops),
            text(&self.number_of_frames),
            float_text(&self.frame_periodicity),
            text(&self.trigger_select),
            float_text(&self.frame_trigger_delay),
        ]
    }
}

/// `advFrameCfg numOfSubFrames forceProfile numFrames triggerSelect frameTrigDelay`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdvFrameCfg {
    /// Number of sub-frames
    pub num_of_sub_frames: Option<i64>,
    /// Forces a single profile
    pub force_profile: Option<i64>,
    /// Number of frames, zero runs forever
    pub num_frames: Option<i64>,
    /// Software or hardware trigger
    pub trigger_select: Option<i64>,
    /// Trigger delay in milliseconds
    pub frame_trig_delay: Option<f64>,
}

impl Command for AdvFrameCfg {
    const KIND: CommandKind = CommandKind::AdvFrameCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [num_of_sub_frames, force_profile, num_frames, trigger_select, frame_trig_delay] = args
        else {
            return false;
        };
        let (
            Some(num_of_sub_frames),
            Some(force_profile),
            Some(num_frames),
            Some(trigger_select),
            Some(frame_trig_delay),
        ) = (
            int(num_of_sub_frames),
            int(force_profile),
            int(num_frames),
            int(trigger_select),
            float(frame_trig_delay),
        )
        else {
            return false;
        };

        *self = AdvFrameCfg {
            num_of_sub_frames: Some(num_of_sub_frames),
            force_profile: Some(force_profile),
            num_frames: Some(num_frames),
            trigger_select: Some(trigger_select),
            frame_trig_delay: Some(frame_trig_delay),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.num_of_sub_frames),
            text(&self.force_profile),
            text(&self.num_frames),
            text(&self.trigger_select),
            float_text(&self.frame_trig_delay),
        ]
    }
}

/// `subFrameCfg`, used with advanced frame configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubFrameCfg {
    /// Sub-frame being configured
    pub sub_frame_num: Option<i64>,
    /// Profile forced for the sub-frame
    pub force_profile_idx: Option<i64>,
    /// First chirp index
    pub chirp_start_idx: Option<i64>,
    /// Chirps per burst
    pub num_of_chirps: Option<i64>,
    /// Chirp loops per burst
    pub num_loops: Option<i64>,
    /// Burst period in milliseconds
    pub burst_periodicity: Option<f64>,
    /// Chirp index offset between bursts
    pub chirp_start_idx_offset: Option<i64>,
    /// Bursts per sub-frame
    pub num_of_burst: Option<i64>,
    /// Burst loops per sub-frame
    pub num_of_burst_loops: Option<i64>,
    /// Sub-frame period in milliseconds
    pub sub_frame_periodicity: Option<f64>,
}

impl Command for SubFrameCfg {
    const KIND: CommandKind = CommandKind::SubFrameCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [sub_frame_num, force_profile_idx, chirp_start_idx, num_of_chirps, num_loops, burst_periodicity, chirp_start_idx_offset, num_of_burst, num_of_burst_loops, sub_frame_periodicity] =
            args
        else {
            return false;
        };
        let (
            Some(sub_frame_num),
            Some(force_profile_idx),
            Some(chirp_start_idx),
            Some(num_of_chirps),
            Some(num_loops),
            Some(burst_periodicity),
            Some(chirp_start_idx_offset),
            Some(num_of_burst),
            Some(num_of_burst_loops),
            Some(sub_frame_periodicity),
        ) = (
            int(sub_frame_num),
            int(force_profile_idx),
            int(chirp_start_idx),
            int(num_of_chirps),
            int(num_loops),
            float(burst_periodicity),
            int(chirp_start_idx_offset),
            int(num_of_burst),
            int(num_of_burst_loops),
            float(sub_frame_periodicity),
        )
        else {
            return false;
        };

        *self = SubFrameCfg {
            sub_frame_num: Some(sub_frame_num),
            force_profile_idx: Some(force_profile_idx),
            chirp_start_idx: Some(chirp_start_idx),
            num_of_chirps: Some(num_of_chirps),
            num_loops: Some(num_loops),
            burst_periodicity: Some(burst_periodicity),
            chirp_start_idx_offset: Some(chirp_start_idx_offset),
            num_of_burst: Some(num_of_burst),
            num_of_burst_loops: Some(num_of_burst_loops),
            sub_frame_periodicity: Some(sub_frame_periodicity),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_num),
            text(&self.force_profile_idx),
            text(&self.chirp_start_idx),
            text(&self.num_of_chirps),
            text(&self.num_loops),
            float_text(&self.burst_periodicity),
            text(&self.chirp_start_idx_offset),
            text(&self.num_of_burst),
            text(&self.num_of_burst_loops),
            float_text(&self.sub_frame_periodicity),
        ]
    }
}

/// `guiMonitor`, selects the TLVs streamed on the data port.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GuiMonitor {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// Stream detected objects
    pub detected_objects: Option<i64>,
    /// Stream the range profile
    pub log_mag_range: Option<i64>,
    /// Stream the noise profile
    pub noise_profile: Option<i64>,
    /// Stream the range-azimuth heat map
    pub range_azimuth_heat_map: Option<i64>,
    /// Stream the range-doppler heat map
    pub range_doppler_heat_map: Option<i64>,
    /// Stream statistics
    pub stats_info: Option<i64>,
}

impl Command for GuiMonitor {
    const KIND: CommandKind = CommandKind::GuiMonitor;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, args)) = split_sub_frame(args, 6) else {
            return false;
        };
        let [detected_objects, log_mag_range, noise_profile, range_azimuth_heat_map, range_doppler_heat_map, stats_info] =
            args
        else {
            return false;
        };
        let (
            Some(detected_objects),
            Some(log_mag_range),
            Some(noise_profile),
            Some(range_azimuth_heat_map),
            Some(range_doppler_heat_map),
            Some(stats_info),
        ) = (
            int(detected_objects),
            int(log_mag_range),
            int(noise_profile),
            int(range_azimuth_heat_map),
            int(range_doppler_heat_map),
            int(stats_info),
        )
        else {
            return false;
        };

        *self = GuiMonitor {
            sub_frame_idx: sub_frame_idx.or(self.sub_frame_idx),
            detected_objects: Some(detected_objects),
            log_mag_range: Some(log_mag_range),
            noise_profile: Some(noise_profile),
            range_azimuth_heat_map: Some(range_azimuth_heat_map),
            range_doppler_heat_map: Some(range_doppler_heat_map),
            stats_info: Some(stats_info),
        };
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_idx),
            text(&self.detected_objects),
            text(&self.log_mag_range),
            text(&self.noise_profile),
            text(&self.range_azimuth_heat_map),
            text(&self.range_doppler_heat_map),
            text(&self.stats_info),
        ]
    }
}

/// `cfarCfg`, the CFAR detector configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CfarCfg {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// 0 for range, 1 for doppler
    pub proc_direction: Option<i64>,
    /// CFAR averaging mode
    pub mode: Option<i64>,
    /// Noise window length in samples
    pub noise_win: Option<i64>,
    /// Guard length in samples
    pub guard_len: Option<i64>,
    /// Noise sum divisor as a power of two
    pub div_shift: Option<i64>,
    /// Wrap the window at the edges
    pub cyclic_mode: Option<i64>,
    /// Detection threshold in the platform's CFAR scale
    pub threshold_scale: Option<i64>,
}

impl Command for CfarCfg {
    const KIND: CommandKind = CommandKind::CfarCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, args)) = split_sub_frame(args, 7) else {
            return false;
        };
        let [proc_direction, mode, noise_win, guard_len, div_shift, cyclic_mode, threshold_scale] =
            args
        else {
            return false;
        };
        let (
            Some(proc_direction),
            Some(mode),
            Some(noise_win),
            Some(guard_len),
            Some(div_shift),
            Some(cyclic_mode),
            Some(threshold_scale),
        ) = (
            int(proc_direction),
            int(mode),
            int(noise_win),
            int(guard_len),
            int(div_shift),
            int(cyclic_mode),
            int(threshold_scale),
        )
        else {
            return false;
        };

        *self = CfarCfg {
            sub_frame_idx: sub_frame_idx.or(self.sub_frame_idx),
            proc_direction: Some(proc_direction),
            mode: Some(mode),
            noise_win: Some(noise_win),
            guard_len: Some(guard_len),
            div_shift: Some(div_shift),
            cyclic_mode: Some(cyclic_mode),
            threshold_scale: Some(threshold_scale),
        };
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_idx),
            text(&self.proc_direction),
            text(&self.mode),
            text(&self.noise_win),
            text(&self.guard_len),
            text(&self.div_shift),
            text(&self.cyclic_mode),
            text(&self.threshold_scale),
        ]
    }
}

/// `peakGrouping [subFrameIdx] scheme inRange inDoppler startRangeIndex endRangeIndex`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeakGrouping {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// Grouping scheme
    pub scheme: Option<i64>,
    /// Group peaks along range
    pub in_range: Option<i64>,
    /// Group peaks along doppler
    pub in_doppler: Option<i64>,
    /// First range bin
    pub start_range_index: Option<i64>,
    /// Last range bin
    pub end_range_index: Option<i64>,
}

impl Command for PeakGrouping {
    const KIND: CommandKind = CommandKind::PeakGrouping;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, args)) = split_sub_frame(args, 5) else {
            return false;
        };
        let [scheme, in_range, in_doppler, start_range_index, end_range_index] = args else {
            return false;
        };
        let (
            Some(scheme),
            Some(in_range),
            Some(in_doppler),
            Some(start_range_index),
            Some(end_range_index),
        ) = (
            int(scheme),
            int(in_range),
            int(in_doppler),
            int(start_range_index),
            int(end_range_index),
        )
        else {
            return false;
        };

        *self = PeakGrouping {
            sub_frame_idx: sub_frame_idx.or(self.sub_frame_idx),
            scheme: Some(scheme),
            in_range: Some(in_range),
            in_doppler: Some(in_doppler),
            start_range_index: Some(start_range_index),
            end_range_index: Some(end_range_index),
        };
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_idx),
            text(&self.scheme),
            text(&self.in_range),
            text(&self.in_doppler),
            text(&self.start_range_index),
            text(&self.end_range_index),
        ]
    }
}

/// `multiObjBeamForming [subFrameIdx] featureEnabled threshold`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiObjBeamForming {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// Enable flag
    pub feature_enabled: Option<i64>,
    /// Second peak threshold relative to the first
    pub threshold: Option<f64>,
}

impl Command for MultiObjBeamForming {
    const KIND: CommandKind = CommandKind::MultiObjBeamForming;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, args)) = split_sub_frame(args, 2) else {
            return false;
        };
        let [feature_enabled, threshold] = args else {
            return false;
        };
        let (Some(feature_enabled), Some(threshold)) = (int(feature_enabled), float(threshold))
        else {
            return false;
        };

        *self = MultiObjBeamForming {
            sub_frame_idx: sub_frame_idx.or(self.sub_frame_idx),
            feature_enabled: Some(feature_enabled),
            threshold: Some(threshold),
        };
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_idx),
            text(&self.feature_enabled),
            float_text(&self.threshold),
        ]
    }
}

/// `calibDcRangeSig [subFrameIdx] enabled negativeBinIdx positiveBinIdx numAvg`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalibDcRangeSig {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// Enable flag
    pub enabled: Option<i64>,
    /// First negative frequency bin
    pub negative_bin_idx: Option<i64>,
    /// Last positive frequency bin
    pub positive_bin_idx: Option<i64>,
    /// Chirps averaged during calibration
    pub num_avg: Option<i64>,
}

impl Command for CalibDcRangeSig {
    const KIND: CommandKind = CommandKind::CalibDcRangeSig;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, args)) = split_sub_frame(args, 4) else {
            return false;
        };
        let [enabled, negative_bin_idx, positive_bin_idx, num_avg] = args else {
            return false;
        };
        let (Some(enabled), Some(negative_bin_idx), Some(positive_bin_idx), Some(num_avg)) = (
            int(enabled),
            int(negative_bin_idx),
            int(positive_bin_idx),
            int(num_avg),
        ) else {
            return false;
        };

        *self = CalibDcRangeSig {
            sub_frame_idx: sub_frame_idx.or(self.sub_frame_idx),
            enabled: Some(enabled),
            negative_bin_idx: Some(negative_bin_idx),
            positive_bin_idx: Some(positive_bin_idx),
            num_avg: Some(num_avg),
        };
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_idx),
            text(&self.enabled),
            text(&self.negative_bin_idx),
            text(&self.positive_bin_idx),
            text(&self.num_avg),
        ]
    }
}

/// `extendedMaxVelocity [subFrameIdx] enabled`, xWR16xx only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendedMaxVelocity {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// Enable flag
    pub enabled: Option<i64>,
}

impl Command for ExtendedMaxVelocity {
    const KIND: CommandKind = CommandKind::ExtendedMaxVelocity;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, [enabled])) = split_sub_frame(args, 1) else {
            return false;
        };
        let Some(enabled) = int(enabled) else {
            return false;
        };

        self.sub_frame_idx = sub_frame_idx.or(self.sub_frame_idx);
        self.enabled = Some(enabled);
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![text(&self.sub_frame_idx), text(&self.enabled)]
    }
}

/// `clutterRemoval [subFrameIdx] enabled`, static clutter removal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClutterRemoval {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// Enable flag
    pub enabled: Option<i64>,
}

impl Command for ClutterRemoval {
    const KIND: CommandKind = CommandKind::ClutterRemoval;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, [enabled])) = split_sub_frame(args, 1) else {
            return false;
        };
        let Some(enabled) = int(enabled) else {
            return false;
        };

        self.sub_frame_idx = sub_frame_idx.or(self.sub_frame_idx);
        self.enabled = Some(enabled);
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![text(&self.sub_frame_idx), text(&self.enabled)]
    }
}

/// `compRangeBiasAndRxChanPhase rangeBias phase...`, a range bias followed by
/// the Q15 (real, imag) compensation pair of every virtual antenna.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompRangeBiasAndRxChanPhase {
    /// Range bias in meters
    pub range_bias: Option<f64>,
    /// Compensation values, a (real, imag) pair per virtual antenna
    pub rx_chan_phase: Vec<f64>,
}

impl Command for CompRangeBiasAndRxChanPhase {
    const KIND: CommandKind = CommandKind::CompRangeBiasAndRxChanPhase;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [range_bias, phase @ ..] = args else {
            return false;
        };
        if phase.is_empty() {
            return false;
        }

        let Some(range_bias) = float(range_bias) else {
            return false;
        };
        let Some(rx_chan_phase) = phase
            .iter()
            .map(|value| float(value))
            .collect::<Option<Vec<f64>>>()
        else {
            return false;
        };

        self.range_bias = Some(range_bias);
        self.rx_chan_phase = rx_chan_phase;
        true
    }

    fn values(&self) -> Vec<String> {
        let mut values = vec![float_text(&self.range_bias)];
        values.extend(self.rx_chan_phase.iter().map(|value| format_float(*value)));
        values
    }
}

/// `measureRangeBiasAndRxChanPhase enabled targetDistance searchWin`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasureRangeBiasAndRxChanPhase {
    /// Enable flag
    pub enabled: Option<i64>,
    /// Calibration target distance in meters
    pub target_distance: Option<f64>,
    /// Search window in meters
    pub search_win: Option<f64>,
}

impl Command for MeasureRangeBiasAndRxChanPhase {
    const KIND: CommandKind = CommandKind::MeasureRangeBiasAndRxChanPhase;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [enabled, target_distance, search_win] = args else {
            return false;
        };
        let (Some(enabled), Some(target_distance), Some(search_win)) =
            (int(enabled), float(target_distance), float(search_win))
        else {
            return false;
        };

        *self = MeasureRangeBiasAndRxChanPhase {
            enabled: Some(enabled),
            target_distance: Some(target_distance),
            search_win: Some(search_win),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.enabled),
            float_text(&self.target_distance),
            float_text(&self.search_win),
        ]
    }
}

/// `nearFieldCfg [subFrameIdx] enabled startRangeIndex endRangeIndex`, xWR16xx only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NearFieldCfg {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// Enable flag
    pub enabled: Option<i64>,
    /// First range bin
    pub start_range_index: Option<i64>,
    /// Last range bin
    pub end_range_index: Option<i64>,
}

impl Command for NearFieldCfg {
    const KIND: CommandKind = CommandKind::NearFieldCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, args)) = split_sub_frame(args, 3) else {
            return false;
        };
        let [enabled, start_range_index, end_range_index] = args else {
            return false;
        };
        let (Some(enabled), Some(start_range_index), Some(end_range_index)) =
            (int(enabled), int(start_range_index), int(end_range_index))
        else {
            return false;
        };

        *self = NearFieldCfg {
            sub_frame_idx: sub_frame_idx.or(self.sub_frame_idx),
            enabled: Some(enabled),
            start_range_index: Some(start_range_index),
            end_range_index: Some(end_range_index),
        };
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_idx),
            text(&self.enabled),
            text(&self.start_range_index),
            text(&self.end_range_index),
        ]
    }
}

/// `CQRxSatMonitor profile satMonSel priSliceDuration numSlices rxChanMask`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CqRxSatMonitor {
    /// Profile being monitored
    pub profile: Option<i64>,
    /// Saturation monitor selection
    pub sat_mon_sel: Option<i64>,
    /// Primary slice duration
    pub pri_slice_duration: Option<i64>,
    /// Number of slices
    pub num_slices: Option<i64>,
    /// Receive channels monitored
    pub rx_chan_mask: Option<u32>,
}

impl Command for CqRxSatMonitor {
    const KIND: CommandKind = CommandKind::CqRxSatMonitor;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [profile, sat_mon_sel, pri_slice_duration, num_slices, rx_chan_mask] = args else {
            return false;
        };
        let (
            Some(profile),
            Some(sat_mon_sel),
            Some(pri_slice_duration),
            Some(num_slices),
            Some(rx_chan_mask),
        ) = (
            int(profile),
            int(sat_mon_sel),
            int(pri_slice_duration),
            int(num_slices),
            mask(rx_chan_mask),
        )
        else {
            return false;
        };

        *self = CqRxSatMonitor {
            profile: Some(profile),
            sat_mon_sel: Some(sat_mon_sel),
            pri_slice_duration: Some(pri_slice_duration),
            num_slices: Some(num_slices),
            rx_chan_mask: Some(rx_chan_mask),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.profile),
            text(&self.sat_mon_sel),
            text(&self.pri_slice_duration),
            text(&self.num_slices),
            text(&self.rx_chan_mask),
        ]
    }
}

/// `CQSigImgMonitor profile numSlices numSamplePerSlice`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CqSigImgMonitor {
    /// Profile being monitored
    pub profile: Option<i64>,
    /// Number of slices
    pub num_slices: Option<i64>,
    /// Samples per slice
    pub num_sample_per_slice: Option<i64>,
}

impl Command for CqSigImgMonitor {
    const KIND: CommandKind = CommandKind::CqSigImgMonitor;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [profile, num_slices, num_sample_per_slice] = args else {
            return false;
        };
        let (Some(profile), Some(num_slices), Some(num_sample_per_slice)) =
            (int(profile), int(num_slices), int(num_sample_per_slice))
        else {
            return false;
        };

        *self = CqSigImgMonitor {
            profile: Some(profile),
            num_slices: Some(num_slices),
            num_sample_per_slice: Some(num_sample_per_slice),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.profile),
            text(&self.num_slices),
            text(&self.num_sample_per_slice),
        ]
    }
}

/// `analogMonitor rxSaturation sigImgBand`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalogMonitor {
    /// Enable the saturation monitor
    pub rx_saturation: Option<i64>,
    /// Enable the signal and image band monitor
    pub sig_img_band: Option<i64>,
}

impl Command for AnalogMonitor {
    const KIND: CommandKind = CommandKind::AnalogMonitor;

    fn assign(&mut self, args: &[&str]) -> bool {
        let [rx_saturation, sig_img_band] = args else {
            return false;
        };
        let (Some(rx_saturation), Some(sig_img_band)) = (int(rx_saturation), int(sig_img_band))
        else {
            return false;
        };

        *self = AnalogMonitor {
            rx_saturation: Some(rx_saturation),
            sig_img_band: Some(sig_img_band),
        };
        true
    }

    fn values(&self) -> Vec<String> {
        vec![text(&self.rx_saturation), text(&self.sig_img_band)]
    }
}

/// `lvdsStreamCfg [subFrameIdx] enableHeader dataFmt enableSW`, xWR16xx only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LvdsStreamCfg {
    /// Sub-frame the command applies to, -1 for all
    pub sub_frame_idx: Option<i64>,
    /// Send the LVDS header
    pub enable_header: Option<i64>,
    /// LVDS data format
    pub data_fmt: Option<i64>,
    /// Send the software session
    pub enable_sw: Option<i64>,
}

impl Command for LvdsStreamCfg {
    const KIND: CommandKind = CommandKind::LvdsStreamCfg;

    fn assign(&mut self, args: &[&str]) -> bool {
        let Some((sub_frame_idx, args)) = split_sub_frame(args, 3) else {
            return false;
        };
        let [enable_header, data_fmt, enable_sw] = args else {
            return false;
        };
        let (Some(enable_header), Some(data_fmt), Some(enable_sw)) =
            (int(enable_header), int(data_fmt), int(enable_sw))
        else {
            return false;
        };

        *self = LvdsStreamCfg {
            sub_frame_idx: sub_frame_idx.or(self.sub_frame_idx),
            enable_header: Some(enable_header),
            data_fmt: Some(data_fmt),
            enable_sw: Some(enable_sw),
        };
        true
    }

    fn sub_frame_idx(&self) -> Option<i64> {
        self.sub_frame_idx
    }

    fn values(&self) -> Vec<String> {
        vec![
            text(&self.sub_frame_idx),
            text(&self.enable_header),
            text(&self.data_fmt),
            text(&self.enable_sw),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    fn finite(g: &mut Gen) -> f64 {
        let value = f64::arbitrary(g);
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    fn some<T: Arbitrary>(g: &mut Gen) -> Option<T> {
        Some(T::arbitrary(g))
    }

    impl Arbitrary for ChannelCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            ChannelCfg {
                rx_channel_en: some(g),
                tx_channel_en: some(g),
                cascading: some(g),
            }
        }
    }

    impl Arbitrary for ProfileCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            ProfileCfg {
                profile_id: some(g),
                start_freq: Some(finite(g)),
                idle_time: Some(finite(g)),
                adc_start_time: Some(finite(g)),
                ramp_end_time: Some(finite(g)),
                tx_out_power: some(g),
                tx_phase_shifter: some(g),
                freq_slope_const: Some(finite(g)),
                tx_start_time: Some(finite(g)),
                num_adc_samples: some(g),
                dig_out_sample_rate: some(g),
                hpf_corner_freq1: some(g),
                hpf_corner_freq2: some(g),
                rx_gain: some(g),
            }
        }
    }

    impl Arbitrary for ChirpCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            ChirpCfg {
                chirp_start_index: some(g),
                chirp_end_index: some(g),
                profile_id: some(g),
                start_freq_variation: Some(finite(g)),
                freq_slope_variation: Some(finite(g)),
                idle_time_variation: Some(finite(g)),
                adc_start_time_variation: Some(finite(g)),
                tx_antenna_enable_mask: some(g),
            }
        }
    }

    impl Arbitrary for FrameCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            FrameCfg {
                chirp_start_index: some(g),
                chirp_end_index: some(g),
                number_of_loops: some(g),
                number_of_frames: some(g),
                frame_periodicity: Some(finite(g)),
                trigger_select: some(g),
                frame_trigger_delay: Some(finite(g)),
            }
        }
    }

    impl Arbitrary for CfarCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            CfarCfg {
                sub_frame_idx: Option::arbitrary(g),
                proc_direction: some(g),
                mode: some(g),
                noise_win: some(g),
                guard_len: some(g),
                div_shift: some(g),
                cyclic_mode: some(g),
                threshold_scale: some(g),
            }
        }
    }

    impl Arbitrary for GuiMonitor {
        fn arbitrary(g: &mut Gen) -> Self {
            GuiMonitor {
                sub_frame_idx: Option::arbitrary(g),
                detected_objects: some(g),
                log_mag_range: some(g),
                noise_profile: some(g),
                range_azimuth_heat_map: some(g),
                range_doppler_heat_map: some(g),
                stats_info: some(g),
            }
        }
    }

    impl Arbitrary for MultiObjBeamForming {
        fn arbitrary(g: &mut Gen) -> Self {
            MultiObjBeamForming {
                sub_frame_idx: Option::arbitrary(g),
                feature_enabled: some(g),
                threshold: Some(finite(g)),
            }
        }
    }

    impl Arbitrary for SubFrameCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            SubFrameCfg {
                sub_frame_num: some(g),
                force_profile_idx: some(g),
                chirp_start_idx: some(g),
                num_of_chirps: some(g),
                num_loops: some(g),
                burst_periodicity: Some(finite(g)),
                chirp_start_idx_offset: some(g),
                num_of_burst: some(g),
                num_of_burst_loops: some(g),
                sub_frame_periodicity: Some(finite(g)),
            }
        }
    }

    impl Arbitrary for CompRangeBiasAndRxChanPhase {
        fn arbitrary(g: &mut Gen) -> Self {
            let len = usize::arbitrary(g) % 24 + 1;
            CompRangeBiasAndRxChanPhase {
                range_bias: Some(finite(g)),
                rx_chan_phase: (0..len).map(|_| finite(g)).collect(),
            }
        }
    }

    impl Arbitrary for SensorStart {
        fn arbitrary(g: &mut Gen) -> Self {
            SensorStart {
                do_reconfig: Option::arbitrary(g),
            }
        }
    }

    impl Arbitrary for SensorStop {
        fn arbitrary(_: &mut Gen) -> Self {
            SensorStop
        }
    }

    impl Arbitrary for FlushCfg {
        fn arbitrary(_: &mut Gen) -> Self {
            FlushCfg
        }
    }

    impl Arbitrary for DfeDataOutputMode {
        fn arbitrary(g: &mut Gen) -> Self {
            DfeDataOutputMode {
                mode_type: some(g),
            }
        }
    }

    impl Arbitrary for AdcCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            AdcCfg {
                num_adc_bits: some(g),
                adc_output_fmt: some(g),
            }
        }
    }

    impl Arbitrary for AdcbufCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            AdcbufCfg {
                sub_frame_idx: Option::arbitrary(g),
                adc_output_fmt: some(g),
                sample_swap: some(g),
                chan_interleave: some(g),
                chirp_threshold: some(g),
            }
        }
    }

    impl Arbitrary for BpmCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            BpmCfg {
                sub_frame_idx: Option::arbitrary(g),
                enabled: some(g),
                chirp0_idx: some(g),
                chirp1_idx: some(g),
            }
        }
    }

    impl Arbitrary for LowPower {
        fn arbitrary(g: &mut Gen) -> Self {
            LowPower {
                dont_care: some(g),
                adc_mode: some(g),
            }
        }
    }

    impl Arbitrary for AdvFrameCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            AdvFrameCfg {
                num_of_sub_frames: some(g),
                force_profile: some(g),
                num_frames: some(g),
                trigger_select: some(g),
                frame_trig_delay: Some(finite(g)),
            }
        }
    }

    impl Arbitrary for PeakGrouping {
        fn arbitrary(g: &mut Gen) -> Self {
            PeakGrouping {
                sub_frame_idx: Option::arbitrary(g),
                scheme: some(g),
                in_range: some(g),
                in_doppler: some(g),
                start_range_index: some(g),
                end_range_index: some(g),
            }
        }
    }

    impl Arbitrary for CalibDcRangeSig {
        fn arbitrary(g: &mut Gen) -> Self {
            CalibDcRangeSig {
                sub_frame_idx: Option::arbitrary(g),
                enabled: some(g),
                negative_bin_idx: some(g),
                positive_bin_idx: some(g),
                num_avg: some(g),
            }
        }
    }

    impl Arbitrary for ExtendedMaxVelocity {
        fn arbitrary(g: &mut Gen) -> Self {
            ExtendedMaxVelocity {
                sub_frame_idx: Option::arbitrary(g),
                enabled: some(g),
            }
        }
    }

    impl Arbitrary for ClutterRemoval {
        fn arbitrary(g: &mut Gen) -> Self {
            ClutterRemoval {
                sub_frame_idx: Option::arbitrary(g),
                enabled: some(g),
            }
        }
    }

    impl Arbitrary for MeasureRangeBiasAndRxChanPhase {
        fn arbitrary(g: &mut Gen) -> Self {
            MeasureRangeBiasAndRxChanPhase {
                enabled: some(g),
                target_distance: Some(finite(g)),
                search_win: Some(finite(g)),
            }
        }
    }

    impl Arbitrary for NearFieldCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            NearFieldCfg {
                sub_frame_idx: Option::arbitrary(g),
                enabled: some(g),
                start_range_index: some(g),
                end_range_index: some(g),
            }
        }
    }

    impl Arbitrary for CqRxSatMonitor {
        fn arbitrary(g: &mut Gen) -> Self {
            CqRxSatMonitor {
                profile: some(g),
                sat_mon_sel: some(g),
                pri_slice_duration: some(g),
                num_slices: some(g),
                rx_chan_mask: some(g),
            }
        }
    }

    impl Arbitrary for CqSigImgMonitor {
        fn arbitrary(g: &mut Gen) -> Self {
            CqSigImgMonitor {
                profile: some(g),
                num_slices: some(g),
                num_sample_per_slice: some(g),
            }
        }
    }

    impl Arbitrary for AnalogMonitor {
        fn arbitrary(g: &mut Gen) -> Self {
            AnalogMonitor {
                rx_saturation: some(g),
                sig_img_band: some(g),
            }
        }
    }

    impl Arbitrary for LvdsStreamCfg {
        fn arbitrary(g: &mut Gen) -> Self {
            LvdsStreamCfg {
                sub_frame_idx: Option::arbitrary(g),
                enable_header: some(g),
                data_fmt: some(g),
                enable_sw: some(g),
            }
        }
    }

    fn round_trip<T: Command + Default + PartialEq>(record: &T) -> bool {
        let mut parsed = T::default();
        parsed.parse(&record.render()) && parsed == *record
    }

    macro_rules! round_trips {
        ($($name:ident: $record:ty,)*) => {
            $(
                #[quickcheck]
                fn $name(record: $record) -> bool {
                    round_trip(&record)
                }
            )*
        };
    }

    round_trips! {
        roundtrip_sensor_start: SensorStart,
        roundtrip_sensor_stop: SensorStop,
        roundtrip_flush_cfg: FlushCfg,
        roundtrip_dfe_data_output_mode: DfeDataOutputMode,
        roundtrip_channel_cfg: ChannelCfg,
        roundtrip_adc_cfg: AdcCfg,
        roundtrip_adcbuf_cfg: AdcbufCfg,
        roundtrip_profile_cfg: ProfileCfg,
        roundtrip_chirp_cfg: ChirpCfg,
        roundtrip_bpm_cfg: BpmCfg,
        roundtrip_low_power: LowPower,
        roundtrip_frame_cfg: FrameCfg,
        roundtrip_adv_frame_cfg: AdvFrameCfg,
        roundtrip_sub_frame_cfg: SubFrameCfg,
        roundtrip_gui_monitor: GuiMonitor,
        roundtrip_cfar_cfg: CfarCfg,
        roundtrip_peak_grouping: PeakGrouping,
        roundtrip_multi_obj_beam_forming: MultiObjBeamForming,
        roundtrip_calib_dc_range_sig: CalibDcRangeSig,
        roundtrip_extended_max_velocity: ExtendedMaxVelocity,
        roundtrip_clutter_removal: ClutterRemoval,
        roundtrip_comp_range_bias: CompRangeBiasAndRxChanPhase,
        roundtrip_measure_range_bias: MeasureRangeBiasAndRxChanPhase,
        roundtrip_near_field_cfg: NearFieldCfg,
        roundtrip_cq_rx_sat_monitor: CqRxSatMonitor,
        roundtrip_cq_sig_img_monitor: CqSigImgMonitor,
        roundtrip_analog_monitor: AnalogMonitor,
        roundtrip_lvds_stream_cfg: LvdsStreamCfg,
    }

    #[test]
    fn test_profile_cfg() {
        let line = "profileCfg 0 77 7 7 58 0 0 68 1 256 5500 0 0 30";
        let mut profile = ProfileCfg::default();

        assert!(profile.parse(line));
        assert_eq!(profile.start_freq, Some(77.0));
        assert_eq!(profile.freq_slope_const, Some(68.0));
        assert_eq!(profile.num_adc_samples, Some(256));
        assert_eq!(profile.render(), line);

        // extra whitespace is normalized
        assert!(profile.parse("  profileCfg 0 77   7 7 58 0 0 68 1 256 5500 0 0  30 "));
        assert_eq!(profile.render(), line);

        let mut fractional = ProfileCfg::default();
        assert!(fractional.parse("profileCfg 0 77 429 7 57.14 0 0 70 1 256 5209 0 0 30"));
        assert_eq!(
            fractional.render(),
            "profileCfg 0 77 429 7 57.14 0 0 70 1 256 5209 0 0 30"
        );
    }

    #[test]
    fn test_parse_mismatch() {
        let mut profile = ProfileCfg::default();
        assert!(profile.parse("profileCfg 0 77 7 7 58 0 0 68 1 256 5500 0 0 30"));
        let before = profile.clone();

        // another keyword
        assert!(!profile.parse("frameCfg 0 0 16 0 100 1 0"));
        // wrong arity
        assert!(!profile.parse("profileCfg 0 77 7 7 58 0 0 68 1 256 5500 0 0"));
        // unparsable value leaves every field untouched
        assert!(!profile.parse("profileCfg 1 78 7 7 58 0 0 68 1 abc 5500 0 0 30"));
        // a longer keyword sharing the prefix
        assert!(!profile.parse("profileCfgX 1 78 7 7 58 0 0 68 1 256 5500 0 0 30"));

        assert_eq!(profile, before);
    }

    #[test]
    fn test_idempotent_parse() {
        let line = "chirpCfg 1 1 0 0 0 0 0 2";
        let mut chirp = ChirpCfg::default();

        assert!(chirp.parse(line));
        let first = chirp.clone();
        assert!(chirp.parse(line));
        assert_eq!(chirp, first);
        assert_eq!(chirp.render(), line);
    }

    #[test]
    fn test_unset_fields() {
        assert_eq!(ProfileCfg::default().render(), "profileCfg");
        assert_eq!(SensorStart::default().render(), "sensorStart");

        let mut chirp = ChirpCfg::default();
        chirp.tx_antenna_enable_mask = Some(4);
        assert_eq!(chirp.render(), "chirpCfg 4");
    }

    #[test]
    fn test_sub_frame_idx() {
        let mut cfar = CfarCfg::default();

        assert!(cfar.parse("cfarCfg 0 2 8 4 3 0 1280"));
        assert_eq!(cfar.sub_frame_idx, None);
        assert_eq!(cfar.render(), "cfarCfg 0 2 8 4 3 0 1280");

        assert!(cfar.parse("cfarCfg -1 0 2 8 4 3 0 15360"));
        assert_eq!(cfar.sub_frame_idx, Some(-1));
        assert_eq!(cfar.threshold_scale, Some(15360));
        assert_eq!(cfar.render(), "cfarCfg -1 0 2 8 4 3 0 15360");

        // a later line without the index keeps the previous index
        assert!(cfar.parse("cfarCfg 0 2 8 4 3 0 1024"));
        assert_eq!(cfar.sub_frame_idx, Some(-1));

        assert!(!cfar.parse("cfarCfg -1 0 2 8 4 3 0 15360 1"));
    }

    #[test]
    fn test_sample_lines() {
        fn check<T: Command + Default>(line: &str) {
            let mut record = T::default();
            assert!(record.parse(line), "{} did not parse", line);
            assert_eq!(record.render(), line);
        }

        check::<SensorStart>("sensorStart");
        check::<SensorStart>("sensorStart 0");
        check::<SensorStop>("sensorStop");
        check::<FlushCfg>("flushCfg");
        check::<DfeDataOutputMode>("dfeDataOutputMode 1");
        check::<ChannelCfg>("channelCfg 15 7 0");
        check::<AdcCfg>("adcCfg 2 1");
        check::<AdcbufCfg>("adcbufCfg -1 0 1 1 1");
        check::<AdcbufCfg>("adcbufCfg 0 1 0 1");
        check::<ProfileCfg>("profileCfg 0 77 7 7 58 0 0 68 1 256 5500 0 0 30");
        check::<ChirpCfg>("chirpCfg 0 0 0 0 0 0 0 1");
        check::<BpmCfg>("bpmCfg -1 0 0 1");
        check::<LowPower>("lowPower 0 0");
        check::<FrameCfg>("frameCfg 0 1 16 0 100 1 0");
        check::<AdvFrameCfg>("advFrameCfg 2 0 0 1 0");
        check::<SubFrameCfg>("subFrameCfg 0 0 0 2 128 20 0 1 1 50");
        check::<GuiMonitor>("guiMonitor 1 1 0 0 0 1");
        check::<GuiMonitor>("guiMonitor -1 1 1 0 0 0 1");
        check::<CfarCfg>("cfarCfg 0 2 8 4 3 0 1280");
        check::<PeakGrouping>("peakGrouping 1 1 1 1 229");
        check::<MultiObjBeamForming>("multiObjBeamForming 1 0.5");
        check::<CalibDcRangeSig>("calibDcRangeSig 0 -5 8 256");
        check::<ExtendedMaxVelocity>("extendedMaxVelocity -1 0");
        check::<ClutterRemoval>("clutterRemoval 0");
        check::<ClutterRemoval>("clutterRemoval -1 1");
        check::<CompRangeBiasAndRxChanPhase>(
            "compRangeBiasAndRxChanPhase 0 1 0 1 0 1 0 1 0 1 0 1 0 1 0 1 0 1 0 1 0 1 0 1 0",
        );
        check::<MeasureRangeBiasAndRxChanPhase>("measureRangeBiasAndRxChanPhase 0 1.5 0.2");
        check::<NearFieldCfg>("nearFieldCfg -1 0 0 0");
        check::<CqRxSatMonitor>("CQRxSatMonitor 0 3 5 121 0");
        check::<CqSigImgMonitor>("CQSigImgMonitor 0 127 4");
        check::<AnalogMonitor>("analogMonitor 0 0");
        check::<LvdsStreamCfg>("lvdsStreamCfg -1 0 0 0");
    }

    #[test]
    fn test_keywords() {
        for kind in CommandKind::ALL {
            assert_eq!(kind.keyword().parse::<CommandKind>(), Ok(kind));
        }

        assert_eq!(
            CommandKind::of_line("  CQRxSatMonitor 0 3 5 121 0"),
            Some(CommandKind::CqRxSatMonitor)
        );
        assert_eq!(CommandKind::of_line("% comment"), None);
        assert_eq!(
            "cQRxSatMonitor".parse::<CommandKind>(),
            Err(Error::UnknownCommand("cQRxSatMonitor".to_string()))
        );
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(77.0), "77");
        assert_eq!(format_float(57.14), "57.14");
        assert_eq!(format_float(-0.0), "0");
        assert_eq!(format_float(-5.5), "-5.5");
        assert_eq!(format_float(0.000125), "0.000125");
    }

    #[test]
    fn test_mask() {
        let mut channel = ChannelCfg::default();
        assert!(channel.parse("channelCfg 0xF 0x5 0"));
        assert_eq!(channel.rx_channel_en, Some(15));
        assert_eq!(channel.tx_channel_en, Some(5));
        assert_eq!(channel.render(), "channelCfg 15 5 0");
    }
}
