// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Radar parameters derived from the command bank: antenna counts, FFT sizes,
//! resolutions, limits and the CFAR threshold in dB.

use crate::config::{CommandBank, Platform};
use log::{log, Level};

const SPEED_OF_LIGHT: f64 = 3e8;

/// Largest sample count whose range FFT size fits a u32.
const MAX_ADC_SAMPLES: i64 = (u32::MAX / 2) as i64;

/// Values computed from the configuration commands.  A value stays `None`
/// until the commands it depends on have been seen, and keeps its previous
/// value when a later recompute is missing a prerequisite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedParameters {
    /// Receive antennas enabled by channelCfg
    pub num_rx_antennas: Option<u32>,
    /// Transmit antennas enabled by channelCfg
    pub num_tx_antennas: Option<u32>,
    /// Receive times transmit antennas
    pub num_virtual_antennas: Option<u32>,
    /// Number of chirps per frame per transmit antenna
    pub num_doppler_bins: Option<u32>,
    /// ADC samples rounded up to a power of two
    pub num_range_bins: Option<u32>,
    /// Range resolution in meters
    pub range_resolution_m: Option<f64>,
    /// Meters per range bin of the range FFT
    pub range_idx_to_m: Option<f64>,
    /// Velocity resolution in m/s
    pub doppler_resolution_mps: Option<f64>,
    /// Maximum range in meters
    pub max_range_m: Option<f64>,
    /// Maximum unambiguous velocity in m/s
    pub max_velocity_mps: Option<f64>,
    /// CFAR detection threshold in dB
    pub threshold_scale_db: Option<i64>,
    /// Frame period in milliseconds
    pub frame_periodicity_ms: Option<f64>,
    /// dfeDataOutputMode selects advanced frame configuration
    pub advanced_frame: bool,
}

impl DerivedParameters {
    /// Recomputes from the bank, logging a missing prerequisite at level.
    pub fn recompute(&mut self, bank: &CommandBank, platform: Platform, level: Level) {
        self.advanced_frame = bank.advanced_frame();

        let (Some(rx_channel_en), Some(tx_channel_en)) =
            (bank.channel_cfg.rx_channel_en, bank.channel_cfg.tx_channel_en)
        else {
            log!(level, "channelCfg missing, derived parameters not updated");
            return;
        };

        let num_rx = rx_channel_en.count_ones();
        let num_tx = tx_channel_en.count_ones();
        let num_virtual = num_rx * num_tx;
        self.num_rx_antennas = Some(num_rx);
        self.num_tx_antennas = Some(num_tx);
        self.num_virtual_antennas = Some(num_virtual);

        match bank.cfar_cfg.threshold_scale {
            Some(scale) => match threshold_db(platform, scale, num_virtual) {
                Some(db) => self.threshold_scale_db = Some(db),
                None => log!(level, "cfarCfg threshold {} out of range, not updated", scale),
            },
            None => log!(level, "cfarCfg missing, threshold not updated"),
        }

        if num_tx == 0 {
            log!(level, "channelCfg enables no transmit antennas");
            return;
        }

        let profile = &bank.profile_cfg;
        let (
            Some(start_freq),
            Some(idle_time),
            Some(ramp_end_time),
            Some(freq_slope),
            Some(num_adc_samples),
            Some(sample_rate),
        ) = (
            profile.start_freq,
            profile.idle_time,
            profile.ramp_end_time,
            profile.freq_slope_const,
            profile.num_adc_samples,
            profile.dig_out_sample_rate,
        )
        else {
            log!(level, "profileCfg missing, range parameters not updated");
            return;
        };
        if !(1..=MAX_ADC_SAMPLES).contains(&num_adc_samples)
            || freq_slope == 0.0
            || start_freq <= 0.0
        {
            log!(level, "profileCfg has no usable chirp, range parameters not updated");
            return;
        }

        let sample_rate = sample_rate as f64;
        let num_range_bins = (num_adc_samples as u32).next_power_of_two();
        let chirp_time = (idle_time + ramp_end_time) * 1e-6;

        self.num_range_bins = Some(num_range_bins);
        self.range_resolution_m = Some(
            (SPEED_OF_LIGHT * sample_rate * 1e3)
                / (2.0 * freq_slope * 1e12 * num_adc_samples as f64),
        );
        self.range_idx_to_m = Some(
            (SPEED_OF_LIGHT * sample_rate * 1e3)
                / (2.0 * freq_slope * 1e12 * num_range_bins as f64),
        );
        self.max_range_m = Some((300.0 * 0.9 * sample_rate) / (2.0 * freq_slope * 1e3));
        self.max_velocity_mps =
            Some(SPEED_OF_LIGHT / (4.0 * start_freq * 1e9 * chirp_time * num_tx as f64));

        let frame = &bank.frame_cfg;
        let (Some(chirp_start), Some(chirp_end), Some(num_loops)) = (
            frame.chirp_start_index,
            frame.chirp_end_index,
            frame.number_of_loops,
        ) else {
            log!(level, "frameCfg missing, doppler parameters not updated");
            return;
        };
        if let Some(periodicity) = frame.frame_periodicity {
            self.frame_periodicity_ms = Some(periodicity);
        }

        let Some(num_chirps) = chirp_end
            .checked_sub(chirp_start)
            .and_then(|span| span.checked_add(1))
            .and_then(|chirps| chirps.checked_mul(num_loops))
        else {
            log!(level, "frameCfg chirp count overflows, doppler parameters not updated");
            return;
        };
        let num_doppler_bins = num_chirps / num_tx as i64;
        let Some(num_doppler_bins) = u32::try_from(num_doppler_bins).ok().filter(|bins| *bins > 0)
        else {
            log!(level, "frameCfg has {} chirps, doppler parameters not updated", num_chirps);
            return;
        };

        self.num_doppler_bins = Some(num_doppler_bins);
        self.doppler_resolution_mps = Some(
            SPEED_OF_LIGHT
                / (2.0
                    * start_freq
                    * 1e9
                    * chirp_time
                    * num_doppler_bins as f64
                    * num_tx as f64),
        );
    }
}

fn next_power_of_two(value: u32) -> Option<i64> {
    value.checked_next_power_of_two().map(i64::from)
}

/// Decodes a cfarCfg threshold scale into dB.  Returns None without virtual
/// antennas or when the scale overflows the conversion.
pub fn threshold_db(platform: Platform, scale: i64, num_virtual_antennas: u32) -> Option<i64> {
    if num_virtual_antennas == 0 {
        return None;
    }

    let num_virtual = i64::from(num_virtual_antennas);
    let db = match platform {
        Platform::Xwr14xx => {
            scale
                .checked_mul(6)?
                .checked_mul(next_power_of_two(num_virtual_antennas)?)?
                / (512 * num_virtual)
        }
        Platform::Xwr16xx => scale.checked_mul(6)? / (256 * num_virtual),
    };
    Some(db)
}

/// Encodes a threshold in dB into the cfarCfg threshold scale.  Returns None
/// outside 0 to 100 dB.
pub fn threshold_scale(platform: Platform, db: f64, num_virtual_antennas: u32) -> Option<i64> {
    if !(0.0..=100.0).contains(&db) || num_virtual_antennas == 0 {
        return None;
    }

    let num_virtual = num_virtual_antennas as f64;
    let scale = match platform {
        Platform::Xwr14xx => {
            db * 512.0 * num_virtual / (6.0 * next_power_of_two(num_virtual_antennas)? as f64)
        }
        Platform::Xwr16xx => db * 256.0 * num_virtual / 6.0,
    };
    Some(scale.floor() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cfg_lines;

    fn bank(platform: Platform, lines: &[&str]) -> CommandBank {
        let mut bank = CommandBank::new(platform);
        for line in lines {
            assert!(bank.parse_line(line).is_some(), "{} rejected", line);
        }
        bank
    }

    fn close(actual: Option<f64>, expected: f64) -> bool {
        actual.is_some_and(|actual| (actual - expected).abs() < 1e-3)
    }

    #[test]
    fn test_cfar_threshold() {
        assert_eq!(threshold_scale(Platform::Xwr14xx, 12.0, 8), Some(1024));
        assert_eq!(threshold_db(Platform::Xwr14xx, 1024, 8), Some(12));

        // 12 virtual antennas round up to 16 in the 14xx scale
        assert_eq!(threshold_db(Platform::Xwr14xx, 1280, 12), Some(20));
        assert_eq!(threshold_scale(Platform::Xwr14xx, 20.0, 12), Some(1280));

        assert_eq!(threshold_scale(Platform::Xwr16xx, 15.0, 8), Some(5120));
        assert_eq!(threshold_db(Platform::Xwr16xx, 5120, 8), Some(15));
        assert_eq!(threshold_db(Platform::Xwr16xx, 15360, 8), Some(45));

        assert_eq!(threshold_scale(Platform::Xwr14xx, 100.5, 8), None);
        assert_eq!(threshold_scale(Platform::Xwr14xx, -0.5, 8), None);
        assert_eq!(threshold_scale(Platform::Xwr14xx, 12.0, 0), None);
        assert_eq!(threshold_db(Platform::Xwr16xx, 5120, 0), None);
    }

    #[test]
    fn test_antenna_popcount() {
        let bank = bank(Platform::Xwr14xx, &["channelCfg 15 5 0"]);
        let mut derived = DerivedParameters::default();
        derived.recompute(&bank, Platform::Xwr14xx, Level::Debug);

        assert_eq!(derived.num_rx_antennas, Some(4));
        assert_eq!(derived.num_tx_antennas, Some(2));
        assert_eq!(derived.num_virtual_antennas, Some(8));
    }

    #[test]
    fn test_missing_prerequisites() {
        let mut derived = DerivedParameters::default();

        derived.recompute(&CommandBank::new(Platform::Xwr14xx), Platform::Xwr14xx, Level::Debug);
        assert_eq!(derived, DerivedParameters::default());

        let bank = bank(
            Platform::Xwr14xx,
            &["channelCfg 15 7 0", "frameCfg 0 2 16 0 100 1 0"],
        );
        derived.recompute(&bank, Platform::Xwr14xx, Level::Debug);
        assert_eq!(derived.num_virtual_antennas, Some(12));
        assert_eq!(derived.num_range_bins, None);
        assert_eq!(derived.num_doppler_bins, None);
        assert_eq!(derived.threshold_scale_db, None);

        // previous values survive a recompute missing channelCfg
        derived.num_range_bins = Some(256);
        derived.recompute(&CommandBank::new(Platform::Xwr14xx), Platform::Xwr14xx, Level::Debug);
        assert_eq!(derived.num_virtual_antennas, Some(12));
        assert_eq!(derived.num_range_bins, Some(256));
    }

    #[test]
    fn test_threshold_overflow() {
        assert_eq!(threshold_db(Platform::Xwr14xx, i64::MAX, 12), None);
        assert_eq!(threshold_db(Platform::Xwr16xx, i64::MAX, 8), None);
        assert_eq!(threshold_db(Platform::Xwr14xx, 1024, u32::MAX), None);
        assert_eq!(threshold_scale(Platform::Xwr14xx, 12.0, u32::MAX), None);

        let mut derived = DerivedParameters::default();
        let mut bank = bank(
            Platform::Xwr14xx,
            &["channelCfg 15 7 0", "cfarCfg 0 2 8 4 3 0 1280"],
        );
        derived.recompute(&bank, Platform::Xwr14xx, Level::Debug);
        assert_eq!(derived.threshold_scale_db, Some(20));

        // an unconvertible scale keeps the previous threshold
        assert!(bank.parse_line("cfarCfg 0 2 8 4 3 0 9223372036854775807").is_some());
        derived.recompute(&bank, Platform::Xwr14xx, Level::Debug);
        assert_eq!(derived.threshold_scale_db, Some(20));
        assert_eq!(derived.num_virtual_antennas, Some(12));
    }

    #[test]
    fn test_unusable_adc_samples() {
        let mut derived = DerivedParameters::default();
        for num_adc_samples in ["3000000000", "2147483648", "0", "-256"] {
            let line = format!("profileCfg 0 77 7 7 58 0 0 68 1 {} 5500 0 0 30", num_adc_samples);
            let bank = bank(Platform::Xwr14xx, &["channelCfg 15 7 0", line.as_str()]);
            derived.recompute(&bank, Platform::Xwr14xx, Level::Debug);
            assert_eq!(derived.num_range_bins, None, "{}", line);
            assert_eq!(derived.range_resolution_m, None, "{}", line);
        }

        // the largest accepted count still fits the FFT size
        let bank = bank(
            Platform::Xwr14xx,
            &[
                "channelCfg 15 7 0",
                "profileCfg 0 77 7 7 58 0 0 68 1 2147483647 5500 0 0 30",
            ],
        );
        derived.recompute(&bank, Platform::Xwr14xx, Level::Debug);
        assert_eq!(derived.num_range_bins, Some(1 << 31));
    }

    #[test]
    fn test_chirp_count_overflow() {
        let mut derived = DerivedParameters::default();
        let mut bank = bank(
            Platform::Xwr14xx,
            &[
                "channelCfg 15 7 0",
                "profileCfg 0 77 7 7 58 0 0 68 1 256 5500 0 0 30",
                "frameCfg 0 2 16 0 100 1 0",
            ],
        );
        derived.recompute(&bank, Platform::Xwr14xx, Level::Debug);
        assert_eq!(derived.num_doppler_bins, Some(16));

        for line in [
            "frameCfg 0 2 9223372036854775807 1 33.333 1 0",
            "frameCfg -9223372036854775808 9223372036854775807 1 0 100 1 0",
            "frameCfg 0 2 -16 0 100 1 0",
        ] {
            assert!(bank.parse_line(line).is_some());
            derived.recompute(&bank, Platform::Xwr14xx, Level::Debug);
            assert_eq!(derived.num_doppler_bins, Some(16), "{}", line);
        }
        assert!(close(derived.doppler_resolution_mps, 0.624376));
    }

    #[test]
    fn test_xwr14xx_parameters() {
        let mut bank = CommandBank::new(Platform::Xwr14xx);
        for line in cfg_lines(include_str!("../testdata/xwr14xx.cfg")) {
            bank.parse_line(line);
        }
        let mut derived = DerivedParameters::default();
        derived.recompute(&bank, Platform::Xwr14xx, Level::Error);

        assert_eq!(derived.num_rx_antennas, Some(4));
        assert_eq!(derived.num_tx_antennas, Some(3));
        assert_eq!(derived.num_range_bins, Some(256));
        assert_eq!(derived.num_doppler_bins, Some(16));
        assert_eq!(derived.threshold_scale_db, Some(20));
        assert_eq!(derived.frame_periodicity_ms, Some(100.0));
        assert!(!derived.advanced_frame);

        assert!(close(derived.range_resolution_m, 0.047392));
        assert!(close(derived.range_idx_to_m, 0.047392));
        assert!(close(derived.max_range_m, 10.919118));
        assert!(close(derived.max_velocity_mps, 4.995005));
        assert!(close(derived.doppler_resolution_mps, 0.624376));
    }

    #[test]
    fn test_xwr16xx_parameters() {
        let mut bank = CommandBank::new(Platform::Xwr16xx);
        for line in cfg_lines(include_str!("../testdata/xwr16xx.cfg")) {
            bank.parse_line(line);
        }
        let mut derived = DerivedParameters::default();
        derived.recompute(&bank, Platform::Xwr16xx, Level::Error);

        assert_eq!(derived.num_virtual_antennas, Some(8));
        assert_eq!(derived.num_doppler_bins, Some(16));
        assert_eq!(derived.threshold_scale_db, Some(45));

        // 200 ADC samples fill 256 range bins
        let mut bank = bank.clone();
        bank.profile_cfg.num_adc_samples = Some(200);
        derived.recompute(&bank, Platform::Xwr16xx, Level::Error);
        assert_eq!(derived.num_range_bins, Some(256));
        let ratio = derived.range_idx_to_m.unwrap_or_default()
            / derived.range_resolution_m.unwrap_or(1.0);
        assert!((ratio - 200.0 / 256.0).abs() < 1e-9);
    }
}
