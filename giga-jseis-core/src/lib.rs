//! This library is the foundation for the `giga-jseis-in` and `giga-jseis-out` crates.
//! It holds the data model of a JavaSeis dataset (axes, trace properties, extents,
//! the fold map) together with the leaf mechanics the two I/O crates share: header
//! field bit conversion, the trace codec, logical addressing, and the parset document
//! model behind the XML sidecar files. It can be built either with serialization
//! support, or in a slightly more lightweight manner without it (see features).
#![allow(clippy::derive_partial_eq_without_eq)]
extern crate fnv;
extern crate num;
#[macro_use]
extern crate num_derive;
extern crate quick_xml;
extern crate tinyvec;

#[cfg(any(feature = "to_json", feature = "serde"))]
extern crate serde;
#[cfg(feature = "to_json")]
extern crate serde_json;

pub mod bitconverter;
pub mod compressor;
pub mod enums;
pub mod errors;
pub mod extents;
pub mod grid;
pub mod parset;
pub mod properties;
pub mod settings;
pub mod tracemap;
#[cfg(test)]
mod tests;

pub use errors::JsError;

pub use compressor::TraceCompressor;
pub use enums::*;
pub use extents::Extent;
pub use parset::{Par, Parset};
pub use properties::{HeaderLayout, PropertyDef, TraceProperty};
pub use settings::{JsSettings, LabelDictionary};
pub use tracemap::TraceMap;

#[cfg(any(feature = "to_json", feature = "serde"))]
use serde::{Deserialize, Serialize};

use std::path::PathBuf;

/// The JavaSeis version emitted into `FileProperties.xml`.
pub const JS_VERSION: &str = "2006.3";
/// The virtual-file-IO version emitted into the extent manager sidecars.
pub const VFIO_VERSION: &str = "2006.2";

pub const FILE_PROPERTIES_XML: &str = "FileProperties.xml";
pub const VIRTUAL_FOLDERS_XML: &str = "VirtualFolders.xml";
pub const TRACE_FILE_XML: &str = "TraceFile.xml";
pub const TRACE_HEADERS_XML: &str = "TraceHeaders.xml";
pub const NAME_PROPERTIES: &str = "Name.properties";
pub const STATUS_PROPERTIES: &str = "Status.properties";

/// Base names of the extent files of the two byte streams.
pub const TRACE_FILE_EXTENT: &str = "TraceFile";
pub const TRACE_HEADERS_EXTENT: &str = "TraceHeaders";

pub const MIN_DIMENSIONS: usize = 3;
pub const MAX_DIMENSIONS: usize = 5;

/// Conventional labels of the five framework axes, slow axes last.
pub const DEFAULT_AXIS_LABELS: [&str; 5] = ["TIME", "TRACE", "FRAME", "VOLUME", "HYPRCUBE"];

/// The placeholder for units and domains nobody declared.
pub const UNKNOWN: &str = "unknown";

/// One framework axis of a dataset.
///
/// The logical origin and increment define the integer grid callers address the
/// axis by; the physical origin and increment place that grid in measured units.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub struct Axis {
    pub label: String,
    pub units: String,
    pub domain: String,
    /// Bin count; at least 1.
    pub length: usize,
    pub logical_origin: i64,
    /// Grid increment; never 0.
    pub logical_delta: i64,
    pub physical_origin: f64,
    pub physical_delta: f64,
}

impl Axis {
    /// An axis of `length` bins with the default grid: origin 1, increment 1,
    /// physical origin 0.0, physical increment 1.0, unknown units and domain.
    pub fn with_length<L: Into<String>>(label: L, length: usize) -> Self {
        Axis {
            label: label.into(),
            units: UNKNOWN.to_string(),
            domain: UNKNOWN.to_string(),
            length,
            logical_origin: 1,
            logical_delta: 1,
            physical_origin: 0.0,
            physical_delta: 1.0,
        }
    }

    pub fn validate(&self, axis_index: usize) -> Result<(), JsError> {
        if self.length < 1 {
            return Err(JsError::PreconditionViolated {
                msg: format!("axis {} ('{}') has length 0", axis_index, self.label),
            });
        }
        if self.logical_delta == 0 {
            return Err(JsError::PreconditionViolated {
                msg: format!("axis {} ('{}') has increment 0", axis_index, self.label),
            });
        }
        Ok(())
    }
}

/// The optional three-point survey orientation record. Purely metadata; nothing in
/// the storage engine consumes it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub struct Geometry {
    pub min_i_line: i32,
    pub max_i_line: i32,
    pub min_x_line: i32,
    pub max_x_line: i32,
    pub x_i_line1_start: f64,
    pub y_i_line1_start: f64,
    pub x_i_line1_end: f64,
    pub y_i_line1_end: f64,
    pub x_x_line1_end: f64,
    pub y_x_line1_end: f64,
}

/// One entry of the CustomProperties parset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub struct DataProperty {
    pub label: String,
    /// The parset type string, e.g. `string`, `int`, `boolean`.
    pub format: String,
    pub value: String,
}

impl DataProperty {
    pub fn new<L, F, V>(label: L, format: F, value: V) -> Self
    where
        L: Into<String>,
        F: Into<String>,
        V: Into<String>,
    {
        DataProperty {
            label: label.into(),
            format: format.into(),
            value: value.into(),
        }
    }
}

/// This structure contains all of the metadata of one dataset.
///
/// Both the read and the write handle carry one of these; everything the sidecar
/// files declare ends up here, and everything here can be written back out.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub struct JsMetadata {
    pub descriptive_name: String,
    pub comments: String,
    pub version: String,
    pub data_type: String,
    pub trace_format: TraceFormat,
    pub byte_order: ByteOrder,
    pub mapped: bool,
    pub axes: Vec<Axis>,
    pub layout: HeaderLayout,
    pub data_properties: Vec<DataProperty>,
    pub geometry: Option<Geometry>,
    pub secondaries: Vec<PathBuf>,
    pub has_traces: bool,
}

impl JsMetadata {
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn samples_per_trace(&self) -> usize {
        self.axes[0].length
    }

    pub fn traces_per_frame(&self) -> usize {
        self.axes[1].length
    }

    pub fn frames_per_volume(&self) -> usize {
        self.axes[2].length
    }

    pub fn total_frames(&self) -> u64 {
        grid::total_frames(&self.axes)
    }

    /// The on-disk byte length of one trace record.
    pub fn trace_record_length(&self) -> usize {
        self.trace_format.record_length(self.samples_per_trace())
    }

    /// The byte length of one header record.
    pub fn header_record_length(&self) -> usize {
        self.layout.record_length()
    }

    /// Total byte length of the trace stream.
    pub fn trace_stream_bytes(&self) -> u64 {
        self.total_frames() * self.traces_per_frame() as u64 * self.trace_record_length() as u64
    }

    /// Total byte length of the header stream.
    pub fn header_stream_bytes(&self) -> u64 {
        self.total_frames() * self.traces_per_frame() as u64 * self.header_record_length() as u64
    }

    /// The trace property indexing an axis, resolved through the dictionary.
    ///
    /// For the frame-and-above axes a missing property is a malformed dataset; the
    /// sample and trace axes may legitimately omit theirs.
    pub fn axis_property(
        &self,
        dictionary: &LabelDictionary,
        axis_index: usize,
    ) -> Result<Option<&TraceProperty>, JsError> {
        let axis = &self.axes[axis_index];
        let label = dictionary.property_for(&axis.label);
        match self.layout.get(label) {
            Some(p) => {
                if !p.def.format.is_valid_for_axis() {
                    return Err(JsError::MalformedMetadata {
                        msg: format!(
                            "axis property '{}' has format {}, expected a signed integer",
                            label, p.def.format
                        ),
                    });
                }
                Ok(Some(p))
            }
            None if axis_index < 2 => Ok(None),
            None => Err(JsError::MalformedMetadata {
                msg: format!(
                    "axis {} ('{}') has no matching trace property '{}'",
                    axis_index, axis.label, label
                ),
            }),
        }
    }

    /// Validate the cross-field invariants after parsing or before creation.
    pub fn validate(&self, dictionary: &LabelDictionary) -> Result<(), JsError> {
        if self.ndim() < MIN_DIMENSIONS || self.ndim() > MAX_DIMENSIONS {
            return Err(JsError::PreconditionViolated {
                msg: format!(
                    "dataset has {} dimensions, supported are {}..={}",
                    self.ndim(),
                    MIN_DIMENSIONS,
                    MAX_DIMENSIONS
                ),
            });
        }
        for (i, axis) in self.axes.iter().enumerate() {
            axis.validate(i)?;
        }
        for i in 0..self.ndim() {
            self.axis_property(dictionary, i)?;
        }
        Ok(())
    }

    #[cfg(feature = "to_json")]
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(&self).map_err(|e| e.to_string())
    }
}
