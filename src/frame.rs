// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use crate::{
    codec::{self, InsufficientBytes},
    tlv::{
        self, DetectedObjects, RangeAzimuthHeatMap, RangeDopplerHeatMap, StatsInfo, TlvType,
    },
};
use std::fmt;
use tracing::{debug, instrument, warn};

/// Marker preceding every packet on the data port.
pub const MAGIC_WORD: [u8; 8] = [0x02, 0x01, 0x04, 0x03, 0x06, 0x05, 0x08, 0x07];

/// Largest packet length accepted before a magic word is treated as a false
/// match.
pub const MAX_PACKET_LEN: usize = 1024 * 1024;

/// Errors returned while decoding data port packets.
#[derive(Debug)]
pub enum DecodeError {
    /// No magic word in the buffer.
    FrameNotFound,
    /// A magic word was found but the packet has not fully arrived.
    Incomplete {
        /// Index of the magic word
        offset: usize,
        /// Buffer length required to continue decoding
        needed: usize,
        /// Buffer length available
        available: usize,
    },
    /// The declared packet length cannot belong to a real packet.
    InvalidPacketLength {
        /// Index of the magic word
        offset: usize,
        /// Declared total packet length
        length: u32,
    },
    /// A TLV which cannot be decoded without reading out of bounds.
    MalformedTlv {
        /// TLV type identifier
        type_id: u32,
        /// Declared TLV length
        length: usize,
        /// What failed
        reason: String,
    },
    /// A read past the end of the payload.
    InsufficientBytes(InsufficientBytes),
    /// A heat map payload that does not fit its dimensions.
    Shape(ndarray::ShapeError),
}

impl std::error::Error for DecodeError {}

impl From<InsufficientBytes> for DecodeError {
    fn from(err: InsufficientBytes) -> DecodeError {
        DecodeError::InsufficientBytes(err)
    }
}

impl From<ndarray::ShapeError> for DecodeError {
    fn from(err: ndarray::ShapeError) -> DecodeError {
        DecodeError::Shape(err)
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> std::fmt::Result {
        match self {
            DecodeError::FrameNotFound => write!(f, "frame not found"),
            DecodeError::Incomplete {
                offset,
                needed,
                available,
            } => write!(
                f,
                "incomplete frame at {}: [{}/{}] bytes",
                offset, available, needed
            ),
            DecodeError::InvalidPacketLength { offset, length } => {
                write!(f, "invalid packet length {} at {}", length, offset)
            }
            DecodeError::MalformedTlv {
                type_id,
                length,
                reason,
            } => write!(f, "malformed tlv {} length {}: {}", type_id, length, reason),
            DecodeError::InsufficientBytes(err) => write!(f, "{}", err),
            DecodeError::Shape(err) => write!(f, "shape error: {}", err),
        }
    }
}

/// Packet header following the magic word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHeader {
    /// Firmware version
    pub version: u32,
    /// Packet length in bytes, including the magic word
    pub total_packet_length: u32,
    /// Device identifier, the second byte carries the product family
    pub platform: u32,
    /// Sequential frame counter
    pub frame_number: u32,
    /// CPU cycle timestamp of the frame
    pub time_cpu_cycles: u32,
    /// Number of detected objects in the frame
    pub num_detected_objects: u32,
    /// Number of TLVs following the header
    pub num_tlvs: u32,
    /// Sub-frame number, only sent by the xWR16xx family
    pub sub_frame_number: Option<u32>,
}

impl FrameHeader {
    /// Header length after the magic word without a sub-frame number.
    pub const MIN_LEN: usize = 28;
    /// Header length after the magic word with a sub-frame number.
    pub const MAX_LEN: usize = 32;

    /// Returns true when the platform field belongs to the xWR16xx family,
    /// whose headers carry a sub-frame number.
    #[inline]
    pub fn has_sub_frame(platform: u32) -> bool {
        platform & 0x0000FF00 == 0x00001600
    }

    /// Reads the header starting at index, which must point just after the
    /// magic word.
    pub fn read(slice: &[u8], index: usize) -> Result<(Self, usize), InsufficientBytes> {
        let (version, index) = codec::read_u32(slice, index)?;
        let (total_packet_length, index) = codec::read_u32(slice, index)?;
        let (platform, index) = codec::read_u32(slice, index)?;
        let (frame_number, index) = codec::read_u32(slice, index)?;
        let (time_cpu_cycles, index) = codec::read_u32(slice, index)?;
        let (num_detected_objects, index) = codec::read_u32(slice, index)?;
        let (num_tlvs, index) = codec::read_u32(slice, index)?;

        let (sub_frame_number, index) = if Self::has_sub_frame(platform) {
            let (value, index) = codec::read_u32(slice, index)?;
            (Some(value), index)
        } else {
            (None, index)
        };

        Ok((
            FrameHeader {
                version,
                total_packet_length,
                platform,
                frame_number,
                time_cpu_cycles,
                num_detected_objects,
                num_tlvs,
                sub_frame_number,
            },
            index,
        ))
    }

    /// Appends the encoded header to out.
    pub fn write(&self, out: &mut Vec<u8>) {
        for value in [
            self.version,
            self.total_packet_length,
            self.platform,
            self.frame_number,
            self.time_cpu_cycles,
            self.num_detected_objects,
            self.num_tlvs,
        ] {
            out.extend_from_slice(&value.to_le_bytes());
        }

        if Self::has_sub_frame(self.platform) {
            out.extend_from_slice(&self.sub_frame_number.unwrap_or(0).to_le_bytes());
        }
    }

    /// Encoded header length for this header's platform.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        if Self::has_sub_frame(self.platform) {
            Self::MAX_LEN
        } else {
            Self::MIN_LEN
        }
    }
}

/// A decoded radar frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    /// Packet header
    pub header: FrameHeader,
    /// Detected points, TLV type 1
    pub detected_objects: Option<DetectedObjects>,
    /// Range profile, TLV type 2
    pub log_mag_range: Option<Vec<u16>>,
    /// Noise floor profile, TLV type 3
    pub noise_profile: Option<Vec<u16>>,
    /// TLV type 4
    pub range_azimuth_heat_map: Option<RangeAzimuthHeatMap>,
    /// TLV type 5
    pub range_doppler_heat_map: Option<RangeDopplerHeatMap>,
    /// Timing and CPU load, TLV type 6
    pub stats_info: Option<StatsInfo>,
    /// Additive sum of the packet words, zero marks a failed decode.
    pub checksum: u32,
    /// Every TLV decoded within the packet bounds.
    pub is_complete: bool,
}

impl Frame {
    /// Creates an empty frame for the header.
    pub fn new(header: FrameHeader) -> Self {
        Frame {
            header,
            ..Default::default()
        }
    }

    /// Encodes the frame as a data port packet, TLVs in type order.  The
    /// header's length and TLV count are recomputed from the payloads.
    pub fn encode(&self) -> Vec<u8> {
        let mut builder = FrameBuilder::new(self.header);

        if let Some(objects) = &self.detected_objects {
            builder = builder.tlv(TlvType::DetectedObjects as u32, objects.encode());
        }
        if let Some(profile) = &self.log_mag_range {
            builder = builder.tlv(TlvType::LogMagRange as u32, tlv::encode_profile(profile));
        }
        if let Some(profile) = &self.noise_profile {
            builder = builder.tlv(TlvType::NoiseProfile as u32, tlv::encode_profile(profile));
        }
        if let Some(map) = &self.range_azimuth_heat_map {
            builder = builder.tlv(TlvType::RangeAzimuthHeatMap as u32, map.encode());
        }
        if let Some(map) = &self.range_doppler_heat_map {
            builder = builder.tlv(TlvType::RangeDopplerHeatMap as u32, map.encode());
        }
        if let Some(stats) = &self.stats_info {
            builder = builder.tlv(TlvType::StatsInfo as u32, stats.encode());
        }

        builder.build()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Frame {{ number: {}, objects: {}, tlvs: {}, checksum: 0x{:08X}, complete: {} }}",
            self.header.frame_number,
            self.detected_objects
                .as_ref()
                .map_or(0, |objects| objects.objects.len()),
            self.header.num_tlvs,
            self.checksum,
            self.is_complete
        )
    }
}

/// Returns the offset of the first magic word in buffer.
pub fn scan(buffer: &[u8]) -> Option<usize> {
    scan_from(buffer, 0)
}

/// Returns the offset of the first magic word at or after start.
pub fn scan_from(buffer: &[u8], start: usize) -> Option<usize> {
    let mut offset = start;

    while offset < buffer.len() {
        let candidate = buffer[offset..]
            .iter()
            .position(|byte| *byte == MAGIC_WORD[0])?;
        offset += candidate;

        match buffer.get(offset..offset + MAGIC_WORD.len()) {
            Some(window) if window == MAGIC_WORD => return Some(offset),
            Some(_) => offset += 1,
            None => return None,
        }
    }

    None
}

/// Additive sum of the little-endian u32 words in the slice.  This is the
/// completeness sentinel carried by each frame, not an integrity check.
pub fn checksum(slice: &[u8]) -> u32 {
    slice
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .fold(0u32, |sum, word| sum.wrapping_add(word))
}

/// Decodes the first frame found at or after start in buffer.
///
/// On success returns the frame and the absolute index just past the packet,
/// which the caller trims from its buffer.  `FrameNotFound` and `Incomplete`
/// mean more bytes are needed.  Failures inside the packet do not propagate,
/// they return a frame with `is_complete` unset and a zero checksum.
#[instrument(skip_all, level = "debug")]
pub fn decode(buffer: &[u8], start: usize) -> Result<(Frame, usize), DecodeError> {
    let offset = scan_from(buffer, start).ok_or(DecodeError::FrameNotFound)?;
    let header_start = offset + MAGIC_WORD.len();

    let (header, body_start) = match FrameHeader::read(buffer, header_start) {
        Ok(header) => header,
        Err(_) => {
            // platform is the third word, it decides the header length
            let header_len = match codec::read_u32(buffer, header_start + 8) {
                Ok((platform, _)) if FrameHeader::has_sub_frame(platform) => FrameHeader::MAX_LEN,
                _ => FrameHeader::MIN_LEN,
            };
            return Err(DecodeError::Incomplete {
                offset,
                needed: header_start + header_len,
                available: buffer.len(),
            });
        }
    };

    let length = header.total_packet_length as usize;
    if length < MAGIC_WORD.len() + header.encoded_len() || length > MAX_PACKET_LEN {
        return Err(DecodeError::InvalidPacketLength {
            offset,
            length: header.total_packet_length,
        });
    }

    let end = offset + length;
    if end > buffer.len() {
        return Err(DecodeError::Incomplete {
            offset,
            needed: end,
            available: buffer.len(),
        });
    }

    let mut frame = Frame::new(header);
    match decode_tlvs(&mut frame, &buffer[body_start..end]) {
        Ok(()) => {
            frame.checksum = checksum(&buffer[header_start..end]);
            frame.is_complete = frame.checksum != 0;
        }
        Err(err) => {
            warn!("frame {} decode failed: {}", header.frame_number, err);
            frame.checksum = 0;
            frame.is_complete = false;
        }
    }

    Ok((frame, end))
}

/// Range bin count learned from a profile TLV, conditions the shape of the
/// heat maps that follow within the same frame.
#[derive(Debug, Default)]
struct TlvContext {
    num_range_bins: Option<usize>,
}

fn decode_tlvs(frame: &mut Frame, body: &[u8]) -> Result<(), DecodeError> {
    let mut ctx = TlvContext::default();
    let mut index = 0;

    for _ in 0..frame.header.num_tlvs {
        let (type_id, next) = codec::read_u32(body, index)?;
        let (length, next) = codec::read_u32(body, next)?;
        let length = length as usize;

        let payload = next
            .checked_add(length)
            .and_then(|end| body.get(next..end))
            .ok_or_else(|| DecodeError::MalformedTlv {
                type_id,
                length,
                reason: format!(
                    "payload overruns the packet by {} bytes",
                    next.saturating_add(length).saturating_sub(body.len())
                ),
            })?;

        decode_tlv(frame, &mut ctx, type_id, payload)?;
        index = next + length;
    }

    if let Some(objects) = &frame.detected_objects {
        if objects.num_detected as u32 != frame.header.num_detected_objects {
            debug!(
                "header declares {} objects, tlv carries {}",
                frame.header.num_detected_objects, objects.num_detected
            );
        }
    }

    Ok(())
}

fn decode_tlv(
    frame: &mut Frame,
    ctx: &mut TlvContext,
    type_id: u32,
    payload: &[u8],
) -> Result<(), DecodeError> {
    match TlvType::try_from(type_id) {
        Ok(TlvType::DetectedObjects) => {
            frame.detected_objects = Some(DetectedObjects::decode(payload)?);
        }
        Ok(TlvType::LogMagRange) => {
            let profile = tlv::decode_profile(type_id, payload);
            ctx.num_range_bins = Some(profile.len());
            frame.log_mag_range = Some(profile);
        }
        Ok(TlvType::NoiseProfile) => {
            let profile = tlv::decode_profile(type_id, payload);
            ctx.num_range_bins.get_or_insert(profile.len());
            frame.noise_profile = Some(profile);
        }
        Ok(TlvType::RangeAzimuthHeatMap) => {
            frame.range_azimuth_heat_map =
                Some(RangeAzimuthHeatMap::decode(payload, ctx.num_range_bins)?);
        }
        Ok(TlvType::RangeDopplerHeatMap) => {
            frame.range_doppler_heat_map =
                Some(RangeDopplerHeatMap::decode(payload, ctx.num_range_bins)?);
        }
        Ok(TlvType::StatsInfo) => {
            frame.stats_info = Some(StatsInfo::decode(payload)?);
        }
        Err(type_id) => {
            warn!(
                "unknown tlv type {} skipping {} bytes",
                type_id,
                payload.len()
            );
        }
    }

    Ok(())
}

/// Builds data port packets from raw TLV payloads.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    header: FrameHeader,
    tlvs: Vec<(u32, Vec<u8>)>,
}

impl FrameBuilder {
    /// Starts a packet with the header, its length and TLV count are filled in by build.
    pub fn new(header: FrameHeader) -> Self {
        FrameBuilder {
            header,
            tlvs: vec![],
        }
    }

    /// Appends a TLV with an arbitrary type.
    pub fn tlv(mut self, type_id: u32, payload: impl Into<Vec<u8>>) -> Self {
        self.tlvs.push((type_id, payload.into()));
        self
    }

    /// Returns the encoded packet, magic word included.
    pub fn build(&self) -> Vec<u8> {
        let body_len: usize = self
            .tlvs
            .iter()
            .map(|(_, payload)| 8 + payload.len())
            .sum();

        let mut header = self.header;
        header.num_tlvs = self.tlvs.len() as u32;
        header.total_packet_length =
            (MAGIC_WORD.len() + header.encoded_len() + body_len) as u32;

        let mut out = Vec::with_capacity(header.total_packet_length as usize);
        out.extend_from_slice(&MAGIC_WORD);
        header.write(&mut out);
        for (type_id, payload) in &self.tlvs {
            out.extend_from_slice(&type_id.to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(payload);
        }
        out
    }
}
