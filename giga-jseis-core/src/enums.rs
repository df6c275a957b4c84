//! This contains the enums that describe the coded fields of a JavaSeis dataset.
//!
//! The JavaSeis sidecar files declare most of their coded values as short upper-case
//! strings (`FLOAT`, `LITTLE_ENDIAN`, ...), so the enums here convert to and from the
//! on-disk spelling rather than a numeric code. The one numeric code is the trace type,
//! which lives in the TRC_TYPE header field of every trace.
use num::FromPrimitive;
#[cfg(any(feature = "to_json", feature = "serde"))]
use serde::{Deserialize, Serialize};

use crate::errors::*;

/// The trace type code stored in the stock TRC_TYPE header field.
///
/// Only live traces carry valid samples; the fold of a frame is the count of its
/// live traces. Codes unknown to the format map to `Invalid` rather than crashing,
/// since a header buffer may legitimately hold garbage beyond the fold.
#[derive(Debug, Clone, Copy, PartialEq, FromPrimitive, ToPrimitive)]
#[repr(C)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum TraceType {
    Live = 1,
    Dead = 2,
    Aux = 3,
    Invalid,
}

impl TraceType {
    /// NB: We return `Invalid` rather than an error to make life simpler for ourselves
    /// down the line.
    pub fn new(source: i32) -> Self {
        Self::from_i32(source).unwrap_or(Self::Invalid)
    }
}

/// The on-disk sample format of the trace stream, from the `TraceFormat` field of
/// `FileProperties.xml`.
///
/// All four names parse, so the metadata of any dataset can be inspected, but the
/// codec moves samples only for `Float32` and `CompressedInt16`. Frame I/O on the
/// other two returns [`JsError::UnsupportedTraceFormat`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum TraceFormat {
    Float32,
    Float64,
    CompressedInt16,
    CompressedInt32,
}

impl std::fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(f, "{}", self.disk_name())
    }
}

impl TraceFormat {
    pub fn new(source: &str) -> Result<Self, JsError> {
        match source {
            "FLOAT" => Ok(Self::Float32),
            "DOUBLE" => Ok(Self::Float64),
            "COMPRESSED_INT16" => Ok(Self::CompressedInt16),
            "COMPRESSED_INT32" => Ok(Self::CompressedInt32),
            _ => Err(JsError::ParseEnum {
                f: "TraceFormat".to_string(),
                code: source.to_string(),
            }),
        }
    }

    /// The spelling used in `FileProperties.xml`.
    pub fn disk_name(self) -> &'static str {
        match self {
            Self::Float32 => "FLOAT",
            Self::Float64 => "DOUBLE",
            Self::CompressedInt16 => "COMPRESSED_INT16",
            Self::CompressedInt32 => "COMPRESSED_INT32",
        }
    }

    /// The on-disk byte length of one trace record.
    ///
    /// The compressed formats carry an 8-byte per-trace prefix holding the scaler,
    /// so their records are a little longer than the bare sample run.
    /// ```
    /// # use giga_jseis_core::enums::TraceFormat;
    /// assert_eq!(TraceFormat::Float32.record_length(100), 400);
    /// assert_eq!(TraceFormat::CompressedInt16.record_length(100), 208);
    /// ```
    pub fn record_length(self, samples_per_trace: usize) -> usize {
        match self {
            Self::Float32 => samples_per_trace * 4,
            Self::Float64 => samples_per_trace * 8,
            Self::CompressedInt16 => 8 + samples_per_trace * 2,
            Self::CompressedInt32 => 8 + samples_per_trace * 4,
        }
    }

    /// Whether the codec can move samples in this format.
    pub fn is_codec_supported(self) -> bool {
        matches!(self, Self::Float32 | Self::CompressedInt16)
    }
}

/// The byte order used for numeric header fields, from the `ByteOrder` field of
/// `FileProperties.xml`.
///
/// NB: This governs headers only. The trace map and the bulk trace samples are
/// little-endian regardless.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    pub fn new(source: &str) -> Result<Self, JsError> {
        match source {
            "LITTLE_ENDIAN" => Ok(Self::LittleEndian),
            "BIG_ENDIAN" => Ok(Self::BigEndian),
            _ => Err(JsError::ParseEnum {
                f: "ByteOrder".to_string(),
                code: source.to_string(),
            }),
        }
    }

    pub fn disk_name(self) -> &'static str {
        match self {
            Self::LittleEndian => "LITTLE_ENDIAN",
            Self::BigEndian => "BIG_ENDIAN",
        }
    }

    pub fn is_le(self) -> bool {
        matches!(self, Self::LittleEndian)
    }
}

/// The scalar format of a trace property, from the `format` field of a
/// TraceProperties entry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub enum PropertyFormat {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    ByteString,
}

impl std::fmt::Display for PropertyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        write!(f, "{}", self.disk_name())
    }
}

impl PropertyFormat {
    pub fn new(source: &str) -> Result<Self, JsError> {
        match source {
            "SHORT" => Ok(Self::Int16),
            "INTEGER" => Ok(Self::Int32),
            "LONG" => Ok(Self::Int64),
            "FLOAT" => Ok(Self::Float32),
            "DOUBLE" => Ok(Self::Float64),
            "BYTESTRING" => Ok(Self::ByteString),
            _ => Err(JsError::ParseEnum {
                f: "PropertyFormat".to_string(),
                code: source.to_string(),
            }),
        }
    }

    pub fn disk_name(self) -> &'static str {
        match self {
            Self::Int16 => "SHORT",
            Self::Int32 => "INTEGER",
            Self::Int64 => "LONG",
            Self::Float32 => "FLOAT",
            Self::Float64 => "DOUBLE",
            Self::ByteString => "BYTESTRING",
        }
    }

    /// The byte length of a single element of this format.
    pub fn byte_length(self) -> usize {
        match self {
            Self::Int16 => 2,
            Self::Int32 => 4,
            Self::Int64 => 8,
            Self::Float32 => 4,
            Self::Float64 => 8,
            Self::ByteString => 1,
        }
    }

    /// Axis properties index a framework axis and so must be a signed integer of
    /// at least 32 bits.
    pub fn is_valid_for_axis(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }
}
