// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    command::{
        AdcCfg, AdcbufCfg, AdvFrameCfg, AnalogMonitor, BpmCfg, CalibDcRangeSig, CfarCfg,
        ChannelCfg, ChirpCfg, ClutterRemoval, Command, CommandKind, CompRangeBiasAndRxChanPhase,
        CqRxSatMonitor, CqSigImgMonitor, DfeDataOutputMode, ExtendedMaxVelocity, FlushCfg,
        FrameCfg, GuiMonitor, LowPower, LvdsStreamCfg, MeasureRangeBiasAndRxChanPhase,
        MultiObjBeamForming, NearFieldCfg, PeakGrouping, ProfileCfg, SensorStart, SensorStop,
        SubFrameCfg,
    },
    params::{self, DerivedParameters},
};
use clap::ValueEnum;
use log::{debug, warn, Level};
use std::{fmt, time::Duration};

/// Radar device family.  The xWR16xx adds a sub-frame index to several
/// commands and to the frame header, and supports a few extra commands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Platform {
    /// IWR1443 and AWR1443
    Xwr14xx,
    /// IWR1642 and AWR1642
    Xwr16xx,
}

impl Platform {
    /// Identifies the family from the platform field of a frame header,
    /// `0x000A1642` for an IWR1642 for example.
    pub fn from_device(platform: u32) -> Option<Platform> {
        match (platform >> 8) & 0xFF {
            0x14 => Some(Platform::Xwr14xx),
            0x16 => Some(Platform::Xwr16xx),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Xwr14xx => write!(f, "xWR14xx"),
            Platform::Xwr16xx => write!(f, "xWR16xx"),
        }
    }
}

/// Filters the text of a `.cfg` file into command lines, dropping blank lines
/// and `%` comments.
pub fn cfg_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('%'))
}

/// One record of every configuration command for a platform.  Records which
/// the platform does not support are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandBank {
    platform: Platform,
    /// `sensorStart`
    pub sensor_start: SensorStart,
    /// `sensorStop`
    pub sensor_stop: SensorStop,
    /// `flushCfg`
    pub flush_cfg: FlushCfg,
    /// `dfeDataOutputMode`
    pub dfe_data_output_mode: DfeDataOutputMode,
    /// `channelCfg`
    pub channel_cfg: ChannelCfg,
    /// `adcCfg`
    pub adc_cfg: AdcCfg,
    /// `adcbufCfg`
    pub adcbuf_cfg: AdcbufCfg,
    /// `profileCfg`
    pub profile_cfg: ProfileCfg,
    /// Chirps in insertion order, at most one per transmit antenna mask
    pub chirp_cfgs: Vec<ChirpCfg>,
    /// `bpmCfg`, xWR16xx only
    pub bpm_cfg: Option<BpmCfg>,
    /// `lowPower`
    pub low_power: LowPower,
    /// `frameCfg`
    pub frame_cfg: FrameCfg,
    /// `advFrameCfg`
    pub adv_frame_cfg: AdvFrameCfg,
    /// `subFrameCfg`
    pub sub_frame_cfg: SubFrameCfg,
    /// `guiMonitor`
    pub gui_monitor: GuiMonitor,
    /// `cfarCfg`
    pub cfar_cfg: CfarCfg,
    /// `peakGrouping`
    pub peak_grouping: PeakGrouping,
    /// `multiObjBeamForming`
    pub multi_obj_beam_forming: MultiObjBeamForming,
    /// `calibDcRangeSig`
    pub calib_dc_range_sig: CalibDcRangeSig,
    /// `extendedMaxVelocity`, xWR16xx only
    pub extended_max_velocity: Option<ExtendedMaxVelocity>,
    /// `clutterRemoval`
    pub clutter_removal: ClutterRemoval,
    /// `compRangeBiasAndRxChanPhase`
    pub comp_range_bias_and_rx_chan_phase: CompRangeBiasAndRxChanPhase,
    /// `measureRangeBiasAndRxChanPhase`
    pub measure_range_bias_and_rx_chan_phase: MeasureRangeBiasAndRxChanPhase,
    /// `nearFieldCfg`, xWR16xx only
    pub near_field_cfg: Option<NearFieldCfg>,
    /// `CQRxSatMonitor`
    pub cq_rx_sat_monitor: CqRxSatMonitor,
    /// `CQSigImgMonitor`
    pub cq_sig_img_monitor: CqSigImgMonitor,
    /// `analogMonitor`
    pub analog_monitor: AnalogMonitor,
    /// `lvdsStreamCfg`, xWR16xx only
    pub lvds_stream_cfg: Option<LvdsStreamCfg>,
}

/// Parses into a copy of the record and commits it unless it carries a
/// sub-frame index the platform does not accept.
fn parse_record<T: Command + Clone>(record: &mut T, platform: Platform, line: &str) -> bool {
    let mut parsed = record.clone();
    if !parsed.parse(line) {
        return false;
    }
    if platform == Platform::Xwr14xx && parsed.sub_frame_idx().is_some() {
        warn!("{} does not take a subFrameIdx on {}: {}", T::KIND, platform, line);
        return false;
    }

    *record = parsed;
    true
}

fn parse_optional<T: Command + Clone>(
    record: &mut Option<T>,
    platform: Platform,
    line: &str,
) -> bool {
    match record {
        Some(record) => parse_record(record, platform, line),
        None => {
            warn!("{} is not supported on {}", T::KIND, platform);
            false
        }
    }
}

fn supported<T: Default>(platform: Platform) -> Option<T> {
    match platform {
        Platform::Xwr16xx => Some(T::default()),
        Platform::Xwr14xx => None,
    }
}

impl CommandBank {
    /// Creates an empty bank, records the platform lacks are `None`.
    pub fn new(platform: Platform) -> Self {
        CommandBank {
            platform,
            sensor_start: SensorStart::default(),
            sensor_stop: SensorStop,
            flush_cfg: FlushCfg,
            dfe_data_output_mode: DfeDataOutputMode::default(),
            channel_cfg: ChannelCfg::default(),
            adc_cfg: AdcCfg::default(),
            adcbuf_cfg: AdcbufCfg::default(),
            profile_cfg: ProfileCfg::default(),
            chirp_cfgs: Vec::new(),
            bpm_cfg: supported(platform),
            low_power: LowPower::default(),
            frame_cfg: FrameCfg::default(),
            adv_frame_cfg: AdvFrameCfg::default(),
            sub_frame_cfg: SubFrameCfg::default(),
            gui_monitor: GuiMonitor::default(),
            cfar_cfg: CfarCfg::default(),
            peak_grouping: PeakGrouping::default(),
            multi_obj_beam_forming: MultiObjBeamForming::default(),
            calib_dc_range_sig: CalibDcRangeSig::default(),
            extended_max_velocity: supported(platform),
            clutter_removal: ClutterRemoval::default(),
            comp_range_bias_and_rx_chan_phase: CompRangeBiasAndRxChanPhase::default(),
            measure_range_bias_and_rx_chan_phase: MeasureRangeBiasAndRxChanPhase::default(),
            near_field_cfg: supported(platform),
            cq_rx_sat_monitor: CqRxSatMonitor::default(),
            cq_sig_img_monitor: CqSigImgMonitor::default(),
            analog_monitor: AnalogMonitor::default(),
            lvds_stream_cfg: supported(platform),
        }
    }

    /// The platform the bank renders for.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// True when dfeDataOutputMode selects advanced frame configuration.
    pub fn advanced_frame(&self) -> bool {
        self.dfe_data_output_mode.mode_type == Some(DfeDataOutputMode::ADVANCED_FRAME)
    }

    /// Routes a command line to the record owning its keyword.  Returns the
    /// command kind when the record accepted the line.
    pub fn parse_line(&mut self, line: &str) -> Option<CommandKind> {
        let line = line.trim();
        let Some(kind) = CommandKind::of_line(line) else {
            if !line.is_empty() {
                debug!("unrecognized command: {}", line);
            }
            return None;
        };

        let platform = self.platform;
        let accepted = match kind {
            CommandKind::SensorStart => parse_record(&mut self.sensor_start, platform, line),
            CommandKind::SensorStop => parse_record(&mut self.sensor_stop, platform, line),
            CommandKind::FlushCfg => parse_record(&mut self.flush_cfg, platform, line),
            CommandKind::DfeDataOutputMode => {
                parse_record(&mut self.dfe_data_output_mode, platform, line)
            }
            CommandKind::ChannelCfg => parse_record(&mut self.channel_cfg, platform, line),
            CommandKind::AdcCfg => parse_record(&mut self.adc_cfg, platform, line),
            CommandKind::AdcbufCfg => parse_record(&mut self.adcbuf_cfg, platform, line),
            CommandKind::ProfileCfg => parse_record(&mut self.profile_cfg, platform, line),
            CommandKind::ChirpCfg => self.parse_chirp(line),
            CommandKind::BpmCfg => parse_optional(&mut self.bpm_cfg, platform, line),
            CommandKind::LowPower => parse_record(&mut self.low_power, platform, line),
            CommandKind::FrameCfg => parse_record(&mut self.frame_cfg, platform, line),
            CommandKind::AdvFrameCfg => parse_record(&mut self.adv_frame_cfg, platform, line),
            CommandKind::SubFrameCfg => parse_record(&mut self.sub_frame_cfg, platform, line),
            CommandKind::GuiMonitor => parse_record(&mut self.gui_monitor, platform, line),
            CommandKind::CfarCfg => parse_record(&mut self.cfar_cfg, platform, line),
            CommandKind::PeakGrouping => parse_record(&mut self.peak_grouping, platform, line),
            CommandKind::MultiObjBeamForming => {
                parse_record(&mut self.multi_obj_beam_forming, platform, line)
            }
            CommandKind::CalibDcRangeSig => {
                parse_record(&mut self.calib_dc_range_sig, platform, line)
            }
            CommandKind::ExtendedMaxVelocity => {
                parse_optional(&mut self.extended_max_velocity, platform, line)
            }
            CommandKind::ClutterRemoval => parse_record(&mut self.clutter_removal, platform, line),
            CommandKind::CompRangeBiasAndRxChanPhase => {
                parse_record(&mut self.comp_range_bias_and_rx_chan_phase, platform, line)
            }
            CommandKind::MeasureRangeBiasAndRxChanPhase => {
                parse_record(&mut self.measure_range_bias_and_rx_chan_phase, platform, line)
            }
            CommandKind::NearFieldCfg => parse_optional(&mut self.near_field_cfg, platform, line),
            CommandKind::CqRxSatMonitor => {
                parse_record(&mut self.cq_rx_sat_monitor, platform, line)
            }
            CommandKind::CqSigImgMonitor => {
                parse_record(&mut self.cq_sig_img_monitor, platform, line)
            }
            CommandKind::AnalogMonitor => parse_record(&mut self.analog_monitor, platform, line),
            CommandKind::LvdsStreamCfg => parse_optional(&mut self.lvds_stream_cfg, platform, line),
        };

        accepted.then_some(kind)
    }

    fn parse_chirp(&mut self, line: &str) -> bool {
        let mut chirp = ChirpCfg::default();
        if !chirp.parse(line) {
            return false;
        }

        match self
            .chirp_cfgs
            .iter_mut()
            .find(|existing| existing.tx_antenna_enable_mask == chirp.tx_antenna_enable_mask)
        {
            Some(existing) => *existing = chirp,
            None => self.chirp_cfgs.push(chirp),
        }
        true
    }

    /// Renders the command sequence in the order the firmware requires.
    pub fn render_all(&self, include_sensor_stop: bool, include_sensor_start: bool) -> Vec<String> {
        let mut lines = Vec::with_capacity(32);

        if include_sensor_stop {
            lines.push(self.sensor_stop.render());
        }
        lines.push(self.flush_cfg.render());
        lines.push(self.dfe_data_output_mode.render());
        lines.push(self.channel_cfg.render());
        lines.push(self.adc_cfg.render());
        lines.push(self.adcbuf_cfg.render());
        lines.push(self.profile_cfg.render());
        lines.extend(self.chirp_cfgs.iter().map(|chirp| chirp.render()));
        if let Some(bpm_cfg) = &self.bpm_cfg {
            lines.push(bpm_cfg.render());
        }
        lines.push(self.low_power.render());
        lines.push(self.frame_cfg.render());
        if self.advanced_frame() {
            lines.push(self.adv_frame_cfg.render());
            lines.push(self.sub_frame_cfg.render());
        }
        lines.push(self.gui_monitor.render());
        lines.push(self.cfar_cfg.render());
        lines.push(self.peak_grouping.render());
        lines.push(self.multi_obj_beam_forming.render());
        lines.push(self.calib_dc_range_sig.render());
        if let Some(extended_max_velocity) = &self.extended_max_velocity {
            lines.push(extended_max_velocity.render());
        }
        lines.push(self.clutter_removal.render());
        lines.push(self.comp_range_bias_and_rx_chan_phase.render());
        lines.push(self.measure_range_bias_and_rx_chan_phase.render());
        if let Some(near_field_cfg) = &self.near_field_cfg {
            lines.push(near_field_cfg.render());
        }
        lines.push(self.cq_rx_sat_monitor.render());
        lines.push(self.cq_sig_img_monitor.render());
        lines.push(self.analog_monitor.render());
        if let Some(lvds_stream_cfg) = &self.lvds_stream_cfg {
            lines.push(lvds_stream_cfg.render());
        }
        if include_sensor_start {
            lines.push(self.sensor_start.render());
        }

        lines
    }
}

/// Commands whose lines change the derived parameters.
const RECOMPUTE_ON: [CommandKind; 6] = [
    CommandKind::SensorStart,
    CommandKind::ChannelCfg,
    CommandKind::ProfileCfg,
    CommandKind::FrameCfg,
    CommandKind::CfarCfg,
    CommandKind::DfeDataOutputMode,
];

/// A command bank together with the parameters derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Configuration command records
    pub commands: CommandBank,
    /// Parameters computed from the records
    pub derived: DerivedParameters,
}

impl Configuration {
    /// Creates an empty configuration for the platform.
    pub fn new(platform: Platform) -> Self {
        Configuration {
            commands: CommandBank::new(platform),
            derived: DerivedParameters::default(),
        }
    }

    /// The platform of the command bank.
    pub fn platform(&self) -> Platform {
        self.commands.platform()
    }

    /// Parses a single line, recomputing the derived parameters when the
    /// line changed one of their inputs.
    pub fn parse_line(&mut self, line: &str) -> Option<CommandKind> {
        let kind = self.commands.parse_line(line)?;
        if RECOMPUTE_ON.contains(&kind) {
            self.recompute(Level::Warn);
        }
        Some(kind)
    }

    /// Parses a complete command sequence then recomputes once.  Returns the
    /// number of accepted lines.
    pub fn load<'a, I>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let accepted = lines
            .into_iter()
            .filter(|line| self.commands.parse_line(line).is_some())
            .count();
        self.recompute(Level::Error);
        accepted
    }

    /// Recomputes the derived parameters, logging gaps at level.
    pub fn recompute(&mut self, level: Level) {
        self.derived
            .recompute(&self.commands, self.commands.platform(), level);
    }

    /// Encodes a detection threshold in dB into cfarCfg.  Returns the encoded
    /// threshold scale, or None and leaves cfarCfg untouched when the value is
    /// outside 0 to 100 dB or the antenna configuration is unknown.
    pub fn set_cfar_threshold_db(&mut self, db: f64) -> Option<i64> {
        let Some(num_virtual_antennas) = self.derived.num_virtual_antennas else {
            warn!("cannot set the CFAR threshold before channelCfg");
            return None;
        };
        let platform = self.platform();
        let Some(scale) = params::threshold_scale(platform, db, num_virtual_antennas) else {
            warn!("CFAR threshold {} dB is outside 0 to 100 dB", db);
            return None;
        };

        self.commands.cfar_cfg.threshold_scale = Some(scale);
        self.derived.threshold_scale_db =
            params::threshold_db(platform, scale, num_virtual_antennas);
        Some(scale)
    }

    /// Enables or disables static clutter removal.
    pub fn set_clutter_removal(&mut self, enabled: bool) {
        self.commands.clutter_removal.enabled = Some(enabled as i64);
    }

    /// Sets the frame period in milliseconds.
    pub fn set_frame_periodicity(&mut self, periodicity_ms: f64) {
        self.commands.frame_cfg.frame_periodicity = Some(periodicity_ms);
        self.derived.frame_periodicity_ms = Some(periodicity_ms);
    }

    /// The configured frame period, if known.
    pub fn frame_period(&self) -> Option<Duration> {
        self.derived
            .frame_periodicity_ms
            .filter(|ms| *ms > 0.0)
            .map(|ms| Duration::from_micros((ms * 1000.0).round() as u64))
    }

    /// Renders the command sequence, see [`CommandBank::render_all`].
    pub fn render_all(&self, include_sensor_stop: bool, include_sensor_start: bool) -> Vec<String> {
        self.commands
            .render_all(include_sensor_stop, include_sensor_start)
    }
}
