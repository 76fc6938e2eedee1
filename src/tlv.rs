// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    codec::{self, InsufficientBytes},
    frame::DecodeError,
};
use ndarray::Array2;
use num::Complex;
use std::fmt;
use tracing::warn;

/// TLV type identifiers emitted by the mmWave demo firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvType {
    /// Detected object list with Q-format coordinates.
    DetectedObjects = 1,
    /// Log magnitude range profile.
    LogMagRange = 2,
    /// Noise floor profile.
    NoiseProfile = 3,
    /// Range azimuth heat map of complex samples.
    RangeAzimuthHeatMap = 4,
    /// Range doppler heat map.
    RangeDopplerHeatMap = 5,
    /// Processing time and CPU load statistics.
    StatsInfo = 6,
}

impl TryFrom<u32> for TlvType {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TlvType::DetectedObjects),
            2 => Ok(TlvType::LogMagRange),
            3 => Ok(TlvType::NoiseProfile),
            4 => Ok(TlvType::RangeAzimuthHeatMap),
            5 => Ok(TlvType::RangeDopplerHeatMap),
            6 => Ok(TlvType::StatsInfo),
            _ => Err(value),
        }
    }
}

impl fmt::Display for TlvType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TlvType::DetectedObjects => write!(f, "detected objects"),
            TlvType::LogMagRange => write!(f, "log magnitude range"),
            TlvType::NoiseProfile => write!(f, "noise profile"),
            TlvType::RangeAzimuthHeatMap => write!(f, "range azimuth heat map"),
            TlvType::RangeDopplerHeatMap => write!(f, "range doppler heat map"),
            TlvType::StatsInfo => write!(f, "stats info"),
        }
    }
}

/// A single detected object as reported by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetectedObject {
    /// Range bin index
    pub range_idx: u16,
    /// Doppler bin index, signed around zero velocity
    pub doppler_idx: i16,
    /// Peak value of the detection
    pub peak_val: u16,
    /// X coordinate in Q-format
    pub x: i16,
    /// Y coordinate in Q-format
    pub y: i16,
    /// Z coordinate in Q-format
    pub z: i16,
}

impl DetectedObject {
    /// Length of an encoded object in bytes.
    pub const LEN: usize = 12;

    /// Reads one object record starting at index.
    pub fn read(slice: &[u8], index: usize) -> Result<(Self, usize), InsufficientBytes> {
        let (range_idx, index) = codec::read_u16(slice, index)?;
        let (doppler_idx, index) = codec::read_i16(slice, index)?;
        let (peak_val, index) = codec::read_u16(slice, index)?;
        let (x, index) = codec::read_i16(slice, index)?;
        let (y, index) = codec::read_i16(slice, index)?;
        let (z, index) = codec::read_i16(slice, index)?;

        Ok((
            DetectedObject {
                range_idx,
                doppler_idx,
                peak_val,
                x,
                y,
                z,
            },
            index,
        ))
    }

    /// Appends the encoded record to out.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.range_idx.to_le_bytes());
        out.extend_from_slice(&self.doppler_idx.to_le_bytes());
        out.extend_from_slice(&self.peak_val.to_le_bytes());
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out.extend_from_slice(&self.z.to_le_bytes());
    }

    /// Returns the object position in meters for the given Q-format.
    pub fn position(&self, xyz_q_format: u16) -> [f64; 3] {
        [
            codec::from_q(xyz_q_format, self.x as i32),
            codec::from_q(xyz_q_format, self.y as i32),
            codec::from_q(xyz_q_format, self.z as i32),
        ]
    }
}

/// Detected object list, TLV type 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetectedObjects {
    /// Number of objects declared by the sub-header
    pub num_detected: u16,
    /// Fixed point exponent shared by the x, y and z coordinates
    pub xyz_q_format: u16,
    /// Objects in firmware order
    pub objects: Vec<DetectedObject>,
}

impl DetectedObjects {
    /// Length of the sub-header preceding the object records.
    pub const HEADER_LEN: usize = 4;

    /// Creates an object list, deriving the declared count from the objects.
    pub fn new(xyz_q_format: u16, objects: Vec<DetectedObject>) -> Self {
        DetectedObjects {
            num_detected: objects.len() as u16,
            xyz_q_format,
            objects,
        }
    }

    /// Decodes the TLV payload.  A declared length which disagrees with the
    /// object count is only a warning, objects which would read past the
    /// payload abort the decode.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let (num_detected, index) = codec::read_u16(payload, 0)?;
        let (xyz_q_format, mut index) = codec::read_u16(payload, index)?;

        let expected = Self::HEADER_LEN + num_detected as usize * DetectedObject::LEN;
        if expected != payload.len() {
            warn!(
                "detected objects length mismatch: {} objects need {} bytes, tlv declares {}",
                num_detected,
                expected,
                payload.len()
            );
        }

        if expected > payload.len() {
            return Err(DecodeError::MalformedTlv {
                type_id: TlvType::DetectedObjects as u32,
                length: payload.len(),
                reason: format!("{} objects overrun the payload", num_detected),
            });
        }

        let mut objects = Vec::with_capacity(num_detected as usize);
        for _ in 0..num_detected {
            let (object, next) = DetectedObject::read(payload, index)?;
            objects.push(object);
            index = next;
        }

        Ok(DetectedObjects {
            num_detected,
            xyz_q_format,
            objects,
        })
    }

    /// Encodes the TLV payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::HEADER_LEN + self.objects.len() * DetectedObject::LEN);
        out.extend_from_slice(&self.num_detected.to_le_bytes());
        out.extend_from_slice(&self.xyz_q_format.to_le_bytes());
        for object in &self.objects {
            object.write(&mut out);
        }
        out
    }

    /// Returns the position of every object in meters.
    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.objects
            .iter()
            .map(|object| object.position(self.xyz_q_format))
            .collect()
    }
}

/// Decodes a payload of u16 values, used by the range and noise profiles.
pub fn decode_profile(type_id: u32, payload: &[u8]) -> Vec<u16> {
    if payload.len() % 2 != 0 {
        warn!(
            "tlv {} length {} is not a whole number of u16 values",
            type_id,
            payload.len()
        );
    }

    payload
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect()
}

/// Encodes a profile payload.
pub fn encode_profile(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

/// Range azimuth heat map, TLV type 4.  Samples are stored on the wire as
/// (imag, real) i16 pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeAzimuthHeatMap {
    /// Samples shaped as [range bins][virtual azimuth antennas]
    Grid(Array2<Complex<i16>>),
    /// Samples received before the range bin count was known
    Flat(Vec<Complex<i16>>),
}

impl RangeAzimuthHeatMap {
    /// Decodes the payload, reshaping it when the range bin count is known.
    pub fn decode(payload: &[u8], num_range_bins: Option<usize>) -> Result<Self, DecodeError> {
        let samples: Vec<Complex<i16>> = payload
            .chunks_exact(4)
            .map(|chunk| Complex {
                im: i16::from_le_bytes([chunk[0], chunk[1]]),
                re: i16::from_le_bytes([chunk[2], chunk[3]]),
            })
            .collect();

        match grid_shape(TlvType::RangeAzimuthHeatMap, samples.len(), num_range_bins) {
            Some((rows, cols)) => {
                let mut samples = samples;
                samples.truncate(rows * cols);
                Ok(RangeAzimuthHeatMap::Grid(Array2::from_shape_vec(
                    (rows, cols),
                    samples,
                )?))
            }
            None => Ok(RangeAzimuthHeatMap::Flat(samples)),
        }
    }

    /// Encodes the payload in row-major order.
    pub fn encode(&self) -> Vec<u8> {
        let samples: Box<dyn Iterator<Item = &Complex<i16>>> = match self {
            RangeAzimuthHeatMap::Grid(grid) => Box::new(grid.iter()),
            RangeAzimuthHeatMap::Flat(samples) => Box::new(samples.iter()),
        };

        samples
            .flat_map(|sample| {
                let im = sample.im.to_le_bytes();
                let re = sample.re.to_le_bytes();
                [im[0], im[1], re[0], re[1]]
            })
            .collect()
    }

    /// Number of virtual azimuth antennas, when the map is shaped.
    pub fn num_virtual_antennas(&self) -> Option<usize> {
        match self {
            RangeAzimuthHeatMap::Grid(grid) => Some(grid.ncols()),
            RangeAzimuthHeatMap::Flat(_) => None,
        }
    }
}

/// Range doppler heat map, TLV type 5.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeDopplerHeatMap {
    /// Bins shaped as [range bins][doppler bins]
    Grid(Array2<u16>),
    /// Bins received before the range bin count was known
    Flat(Vec<u16>),
}

impl RangeDopplerHeatMap {
    /// Decodes the payload, reshaping it when the range bin count is known.
    pub fn decode(payload: &[u8], num_range_bins: Option<usize>) -> Result<Self, DecodeError> {
        let bins = decode_profile(TlvType::RangeDopplerHeatMap as u32, payload);

        match grid_shape(TlvType::RangeDopplerHeatMap, bins.len(), num_range_bins) {
            Some((rows, cols)) => {
                let mut bins = bins;
                bins.truncate(rows * cols);
                Ok(RangeDopplerHeatMap::Grid(Array2::from_shape_vec(
                    (rows, cols),
                    bins,
                )?))
            }
            None => Ok(RangeDopplerHeatMap::Flat(bins)),
        }
    }

    /// Encodes the payload in row-major order.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RangeDopplerHeatMap::Grid(grid) => {
                grid.iter().flat_map(|value| value.to_le_bytes()).collect()
            }
            RangeDopplerHeatMap::Flat(bins) => encode_profile(bins),
        }
    }

    /// Number of doppler bins, when the map is shaped.
    pub fn num_doppler_bins(&self) -> Option<usize> {
        match self {
            RangeDopplerHeatMap::Grid(grid) => Some(grid.ncols()),
            RangeDopplerHeatMap::Flat(_) => None,
        }
    }
}

/// Returns the (rows, cols) shape for a heat map of count elements, or None
/// when the map must stay flat.
fn grid_shape(
    tlv: TlvType,
    count: usize,
    num_range_bins: Option<usize>,
) -> Option<(usize, usize)> {
    let rows = num_range_bins.filter(|rows| *rows > 0)?;
    let cols = count / rows;

    if cols == 0 {
        warn!(
            "{} has {} elements, fewer than {} range bins",
            tlv, count, rows
        );
        return None;
    }

    if count % rows != 0 {
        warn!(
            "{} has {} elements, not a multiple of {} range bins",
            tlv, count, rows
        );
    }

    Some((rows, cols))
}

/// Processing statistics, TLV type 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsInfo {
    /// Inter-frame processing time in microseconds
    pub inter_frame_processing_time: u32,
    /// Transmit output time in microseconds
    pub transmit_output_time: u32,
    /// Inter-frame processing margin in microseconds
    pub inter_frame_processing_margin: u32,
    /// Inter-chirp processing margin in microseconds
    pub inter_chirp_processing_margin: u32,
    /// Active frame CPU load in percent
    pub active_frame_cpu_load: u32,
    /// Inter-frame CPU load in percent
    pub inter_frame_cpu_load: u32,
}

impl StatsInfo {
    /// Length of the encoded statistics in bytes.
    pub const LEN: usize = 24;

    /// Decodes the payload, the declared length is not strictly enforced.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() != Self::LEN {
            warn!(
                "stats info length {} differs from expected {}",
                payload.len(),
                Self::LEN
            );
        }

        let (inter_frame_processing_time, index) = codec::read_u32(payload, 0)?;
        let (transmit_output_time, index) = codec::read_u32(payload, index)?;
        let (inter_frame_processing_margin, index) = codec::read_u32(payload, index)?;
        let (inter_chirp_processing_margin, index) = codec::read_u32(payload, index)?;
        let (active_frame_cpu_load, index) = codec::read_u32(payload, index)?;
        let (inter_frame_cpu_load, _) = codec::read_u32(payload, index)?;

        Ok(StatsInfo {
            inter_frame_processing_time,
            transmit_output_time,
            inter_frame_processing_margin,
            inter_chirp_processing_margin,
            active_frame_cpu_load,
            inter_frame_cpu_load,
        })
    }

    /// Encodes the payload.
    pub fn encode(&self) -> Vec<u8> {
        [
            self.inter_frame_processing_time,
            self.transmit_output_time,
            self.inter_frame_processing_margin,
            self.inter_chirp_processing_margin,
            self.active_frame_cpu_load,
            self.inter_frame_cpu_load,
        ]
        .iter()
        .flat_map(|value| value.to_le_bytes())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detected_objects() -> Result<(), DecodeError> {
        let objects = DetectedObjects::new(
            8,
            vec![
                DetectedObject {
                    range_idx: 10,
                    doppler_idx: -3,
                    peak_val: 500,
                    x: 256,
                    y: 512,
                    z: -128,
                },
                DetectedObject {
                    range_idx: 11,
                    doppler_idx: 2,
                    peak_val: 700,
                    x: -256,
                    y: 768,
                    z: 0,
                },
            ],
        );

        let payload = objects.encode();
        assert_eq!(payload.len(), 28);

        let decoded = DetectedObjects::decode(&payload)?;
        assert_eq!(decoded, objects);
        assert_eq!(
            decoded.positions(),
            vec![[1.0, 2.0, -0.5], [-1.0, 3.0, 0.0]]
        );

        Ok(())
    }

    #[test]
    fn test_detected_objects_overrun() {
        let mut payload = DetectedObjects::new(0, vec![DetectedObject::default()]).encode();
        payload[0] = 3;

        match DetectedObjects::decode(&payload) {
            Err(DecodeError::MalformedTlv { type_id, .. }) => assert_eq!(type_id, 1),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_detected_objects_padding() -> Result<(), DecodeError> {
        // Trailing padding is tolerated with a warning.
        let mut payload = DetectedObjects::new(4, vec![DetectedObject::default()]).encode();
        payload.extend_from_slice(&[0, 0, 0, 0]);

        let decoded = DetectedObjects::decode(&payload)?;
        assert_eq!(decoded.objects.len(), 1);

        Ok(())
    }

    #[test]
    fn test_range_azimuth_shape() -> Result<(), DecodeError> {
        let samples: Vec<Complex<i16>> = (0..8).map(|i| Complex::new(i, -i)).collect();
        let flat = RangeAzimuthHeatMap::Flat(samples.clone());
        let payload = flat.encode();

        // imag precedes real on the wire
        assert_eq!(&payload[4..8], &[0xFF, 0xFF, 0x01, 0x00]);

        assert_eq!(RangeAzimuthHeatMap::decode(&payload, None)?, flat);

        let grid = RangeAzimuthHeatMap::decode(&payload, Some(4))?;
        assert_eq!(grid.num_virtual_antennas(), Some(2));
        match &grid {
            RangeAzimuthHeatMap::Grid(grid) => {
                assert_eq!(grid.shape(), &[4, 2]);
                assert_eq!(grid[[1, 1]], Complex::new(3, -3));
            }
            RangeAzimuthHeatMap::Flat(_) => panic!("expected a grid"),
        }
        assert_eq!(grid.encode(), payload);

        Ok(())
    }

    #[test]
    fn test_range_doppler_shape() -> Result<(), DecodeError> {
        let bins: Vec<u16> = (0..12).collect();
        let payload = encode_profile(&bins);

        let grid = RangeDopplerHeatMap::decode(&payload, Some(3))?;
        assert_eq!(grid.num_doppler_bins(), Some(4));
        match &grid {
            RangeDopplerHeatMap::Grid(grid) => assert_eq!(grid[[2, 0]], 8),
            RangeDopplerHeatMap::Flat(_) => panic!("expected a grid"),
        }

        // fewer elements than range bins stays flat
        let flat = RangeDopplerHeatMap::decode(&payload, Some(64))?;
        assert_eq!(flat, RangeDopplerHeatMap::Flat(bins));

        Ok(())
    }

    #[test]
    fn test_stats_info() -> Result<(), DecodeError> {
        let stats = StatsInfo {
            inter_frame_processing_time: 1200,
            transmit_output_time: 350,
            inter_frame_processing_margin: 48000,
            inter_chirp_processing_margin: 12,
            active_frame_cpu_load: 45,
            inter_frame_cpu_load: 3,
        };

        let payload = stats.encode();
        assert_eq!(payload.len(), StatsInfo::LEN);
        assert_eq!(StatsInfo::decode(&payload)?, stats);
        assert!(StatsInfo::decode(&payload[..20]).is_err());

        Ok(())
    }

    #[test]
    fn test_tlv_type() {
        assert_eq!(TlvType::try_from(5), Ok(TlvType::RangeDopplerHeatMap));
        assert_eq!(TlvType::try_from(99), Err(99));
    }
}
