// Copyright (C) 2026 by GiGa infosystems
//! The trace property catalog and the header layout built from it.
//!
//! Every trace in a JavaSeis dataset carries a fixed-length binary header whose fields
//! are declared, rather than hard-wired: `FileProperties.xml` enumerates the properties
//! together with their byte offsets. This module holds the property definitions, the
//! minimal stock set every dataset carries, the per-axis index properties, and the
//! [`HeaderLayout`] which assembles definitions into a validated offset table.
use fnv::FnvHashMap;
#[cfg(any(feature = "to_json", feature = "serde"))]
use serde::{Deserialize, Serialize};

use crate::enums::PropertyFormat;
use crate::errors::*;

/// A trace property definition: what a header field is, without where it lives.
#[derive(Debug, Clone)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub struct PropertyDef {
    pub label: String,
    pub description: String,
    pub format: PropertyFormat,
    /// Number of elements of `format` in the field. Almost always 1.
    pub count: usize,
}

/// Two definitions are the same property iff their labels are the same.
impl PartialEq for PropertyDef {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl PropertyDef {
    pub fn new<L, D>(label: L, description: D, format: PropertyFormat, count: usize) -> Self
    where
        L: Into<String>,
        D: Into<String>,
    {
        PropertyDef {
            label: label.into(),
            description: description.into(),
            format,
            count,
        }
    }

    /// Scalar shorthand for the common `count == 1` case.
    pub fn scalar<L, D>(label: L, description: D, format: PropertyFormat) -> Self
    where
        L: Into<String>,
        D: Into<String>,
    {
        Self::new(label, description, format, 1)
    }

    /// The byte length of the whole field.
    pub fn byte_length(&self) -> usize {
        self.format.byte_length() * self.count
    }
}

/// A property definition pinned to its byte offset inside the header record.
#[derive(Debug, Clone)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub struct TraceProperty {
    pub def: PropertyDef,
    pub byte_offset: usize,
}

impl PartialEq for TraceProperty {
    fn eq(&self, other: &Self) -> bool {
        self.def == other.def
    }
}

impl TraceProperty {
    pub fn label(&self) -> &str {
        &self.def.label
    }

    /// The byte range the field occupies inside a header record.
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.byte_offset..self.byte_offset + self.def.byte_length()
    }
}

/// The minimal stock property set that every dataset carries, in canonical order.
///
/// These are the parent-system identifiers and must be accepted unchanged.
pub fn stock_properties() -> Vec<PropertyDef> {
    use PropertyFormat::*;
    vec![
        PropertyDef::scalar("SEQNO", "Sequence number in ensemble", Int32),
        PropertyDef::scalar("END_ENS", "End-of-ensemble flag*", Int32),
        PropertyDef::scalar("EOJ", "End of job flag*", Int32),
        PropertyDef::scalar("TRACENO", "Trace number in seismic line*", Int32),
        PropertyDef::scalar("TRC_TYPE", "Trace type (data, aux, etc.)", Int32),
        PropertyDef::scalar("TLIVE_S", "Start time of live samples", Float32),
        PropertyDef::scalar("TFULL_S", "Start time of full samples", Float32),
        PropertyDef::scalar("TFULL_E", "End time of full samples", Float32),
        PropertyDef::scalar("TLIVE_E", "End time of live samples", Float32),
        PropertyDef::scalar("LEN_SURG", "Length of surgical mute taper", Float32),
        PropertyDef::scalar("TOT_STAT", "Total static for this trace", Float32),
        PropertyDef::scalar("NA_STAT", "Portion of static not applied", Float32),
        PropertyDef::scalar("AMP_NORM", "Amplitude normalization factor", Float32),
        PropertyDef::scalar("TR_FOLD", "Actual trace fold", Float32),
        PropertyDef::scalar("SKEWSTAT", "Multiplex skew static", Float32),
        PropertyDef::scalar("LINE_NO", "Line number (hashed line name)*", Int32),
        PropertyDef::scalar("LSEG_END", "Line segment end*", Int32),
        PropertyDef::scalar("LSEG_SEQ", "Line segment sequence number*", Int32),
    ]
}

/// The label of the stock trace type field. The fold/empty-frame discipline keys on it.
pub const TRC_TYPE: &str = "TRC_TYPE";

/// The default index property for each of the five conventional framework axes,
/// in axis order (sample, trace, frame, volume, hypercube).
pub fn axis_properties() -> [PropertyDef; 5] {
    use PropertyFormat::*;
    [
        PropertyDef::scalar("SAMPLE", "Sample index", Int32),
        PropertyDef::scalar("TRACE", "Trace index", Int32),
        PropertyDef::scalar("FRAME", "Frame index", Int32),
        PropertyDef::scalar("VOLUME", "Volume index", Int32),
        PropertyDef::scalar("HYPRCUBE", "Hypercube index", Int32),
    ]
}

/// The parent-system definition of a label, for the axis properties and the common
/// bin-number properties an axis may be indexed by.
pub fn known_property(label: &str) -> Option<PropertyDef> {
    use PropertyFormat::*;
    let def = match label {
        "SAMPLE" => PropertyDef::scalar("SAMPLE", "Sample index", Int32),
        "TRACE" => PropertyDef::scalar("TRACE", "Trace index", Int32),
        "FRAME" => PropertyDef::scalar("FRAME", "Frame index", Int32),
        "VOLUME" => PropertyDef::scalar("VOLUME", "Volume index", Int32),
        "HYPRCUBE" => PropertyDef::scalar("HYPRCUBE", "Hypercube index", Int32),
        "ILINE_NO" => PropertyDef::scalar("ILINE_NO", "3D iline number", Int32),
        "XLINE_NO" => PropertyDef::scalar("XLINE_NO", "3D xline number", Int32),
        "CDP" => PropertyDef::scalar("CDP", "CDP bin number", Int32),
        "S_LINE" => PropertyDef::scalar("S_LINE", "Swath or sail line number", Int32),
        "R_LINE" => PropertyDef::scalar("R_LINE", "Receiver line number", Int32),
        "CHAN" => PropertyDef::scalar("CHAN", "Recording channel number", Int32),
        "OFB_NO" => PropertyDef::scalar("OFB_NO", "Offset bin number", Int32),
        _ => return None,
    };
    Some(def)
}

/// An ordered, validated header layout: the properties of a dataset together with
/// their byte offsets, a label lookup, and the total record length.
///
/// The byte ranges of the properties partition `[0, record_length)` with no overlap
/// and no gap. [`HeaderLayout::assemble`] guarantees this by construction;
/// [`HeaderLayout::from_entries`] (used when parsing sidecars) verifies it.
#[derive(Debug, Clone)]
#[cfg_attr(
    any(feature = "to_json", feature = "serde"),
    derive(Serialize, Deserialize)
)]
pub struct HeaderLayout {
    props: Vec<TraceProperty>,
    lookup: FnvHashMap<String, usize>,
    record_length: usize,
}

impl PartialEq for HeaderLayout {
    fn eq(&self, other: &Self) -> bool {
        self.props == other.props && self.record_length == other.record_length
    }
}

impl HeaderLayout {
    /// Build a layout from definitions in order, assigning each a running-sum byte
    /// offset. Duplicate labels (by equality of label only) are silently dropped,
    /// keeping the first occurrence.
    /// ```
    /// # use giga_jseis_core::properties::*;
    /// # use giga_jseis_core::enums::PropertyFormat;
    /// let layout = HeaderLayout::assemble(vec![
    ///     PropertyDef::scalar("TRC_TYPE", "Trace type (data, aux, etc.)", PropertyFormat::Int32),
    ///     PropertyDef::scalar("T0", "Start time", PropertyFormat::Float64),
    ///     PropertyDef::scalar("TRC_TYPE", "again", PropertyFormat::Int32),
    /// ]);
    /// assert_eq!(layout.len(), 2);
    /// assert_eq!(layout.record_length(), 12);
    /// assert_eq!(layout.get("T0").unwrap().byte_offset, 4);
    /// ```
    pub fn assemble<I>(defs: I) -> Self
    where
        I: IntoIterator<Item = PropertyDef>,
    {
        let mut props: Vec<TraceProperty> = Vec::new();
        let mut lookup = FnvHashMap::default();
        let mut offset = 0usize;
        for def in defs {
            if lookup.contains_key(&def.label) {
                continue;
            }
            let len = def.byte_length();
            lookup.insert(def.label.clone(), props.len());
            props.push(TraceProperty {
                def,
                byte_offset: offset,
            });
            offset += len;
        }
        HeaderLayout {
            props,
            lookup,
            record_length: offset,
        }
    }

    /// Build a layout from already-placed properties, e.g. parsed from
    /// `FileProperties.xml`, verifying that the offsets partition the record.
    pub fn from_entries(mut entries: Vec<TraceProperty>) -> Result<Self, JsError> {
        entries.sort_by_key(|p| p.byte_offset);
        let mut lookup = FnvHashMap::default();
        let mut end = 0usize;
        for (i, p) in entries.iter().enumerate() {
            if p.byte_offset != end {
                return Err(JsError::MalformedMetadata {
                    msg: format!(
                        "trace property '{}' starts at byte {} but the previous field ends at {}",
                        p.label(),
                        p.byte_offset,
                        end
                    ),
                });
            }
            if lookup.insert(p.label().to_string(), i).is_some() {
                return Err(JsError::MalformedMetadata {
                    msg: format!("duplicate trace property '{}'", p.label()),
                });
            }
            end = p.byte_offset + p.def.byte_length();
        }
        Ok(HeaderLayout {
            props: entries,
            lookup,
            record_length: end,
        })
    }

    pub fn get(&self, label: &str) -> Option<&TraceProperty> {
        self.lookup.get(label).map(|i| &self.props[*i])
    }

    /// Like [`Self::get`], but raises [`JsError::PropertyNotFound`] for a missing label.
    pub fn require(&self, label: &str) -> Result<&TraceProperty, JsError> {
        self.get(label).ok_or_else(|| JsError::PropertyNotFound {
            label: label.to_string(),
        })
    }

    pub fn contains(&self, label: &str) -> bool {
        self.lookup.contains_key(label)
    }

    pub fn props(&self) -> &[TraceProperty] {
        &self.props
    }

    /// The header record length in bytes.
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}
