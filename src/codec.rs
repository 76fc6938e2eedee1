// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Little-endian integer reads and Q-format fixed point conversion.
//!
//! Every read takes a byte slice and a start index and returns the decoded
//! value along with the index of the next unread byte, so decoders can walk a
//! packet without tracking widths by hand.  Reads never panic on short input,
//! they return [`InsufficientBytes`] instead.

use std::fmt;

/// A read extended past the end of the available bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientBytes {
    /// Index the read started at.
    pub index: usize,
    /// Number of bytes the read required.
    pub width: usize,
    /// Number of bytes available in the slice.
    pub len: usize,
}

impl std::error::Error for InsufficientBytes {}

impl fmt::Display for InsufficientBytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "insufficient bytes: {} byte read at {} exceeds length {}",
            self.width, self.index, self.len
        )
    }
}

#[inline]
fn take<const N: usize>(slice: &[u8], index: usize) -> Result<([u8; N], usize), InsufficientBytes> {
    let err = InsufficientBytes {
        index,
        width: N,
        len: slice.len(),
    };
    let end = index.checked_add(N).ok_or(err)?;
    let bytes = slice.get(index..end).ok_or(err)?;

    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok((out, end))
}

/// Reads a little-endian u16 at index.
#[inline]
pub fn read_u16(slice: &[u8], index: usize) -> Result<(u16, usize), InsufficientBytes> {
    let (bytes, next) = take::<2>(slice, index)?;
    Ok((u16::from_le_bytes(bytes), next))
}

/// Reads a little-endian i16 at index.
#[inline]
pub fn read_i16(slice: &[u8], index: usize) -> Result<(i16, usize), InsufficientBytes> {
    let (bytes, next) = take::<2>(slice, index)?;
    Ok((i16::from_le_bytes(bytes), next))
}

/// Reads a little-endian u32 at index.
#[inline]
pub fn read_u32(slice: &[u8], index: usize) -> Result<(u32, usize), InsufficientBytes> {
    let (bytes, next) = take::<4>(slice, index)?;
    Ok((u32::from_le_bytes(bytes), next))
}

/// Reads a little-endian i32 at index.
#[inline]
pub fn read_i32(slice: &[u8], index: usize) -> Result<(i32, usize), InsufficientBytes> {
    let (bytes, next) = take::<4>(slice, index)?;
    Ok((i32::from_le_bytes(bytes), next))
}

/// Converts a raw Q-format value into its real value, `value / 2^q`.
#[inline]
pub fn from_q(q: u16, value: i32) -> f64 {
    value as f64 / 2f64.powi(q as i32)
}

/// Converts a real value into Q-format, `value * 2^q`, rounded to the nearest
/// integer.
#[inline]
pub fn to_q(q: u16, value: f64) -> i32 {
    (value * 2f64.powi(q as i32)).round() as i32
}
