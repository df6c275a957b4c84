//! This module contains the [`JsSettings`] structure which can be used to customise
//! how datasets are opened and created, and the axis-label dictionary it carries.
//!
//! NB: The dictionary is deliberately a value on the settings rather than a global:
//! two datasets opened side by side may well belong to processing systems with
//! different label dialects.
use fnv::FnvHashMap;

use crate::errors::*;

/// The parent-system axis-label dictionary.
///
/// JavaSeis axis labels come from the surrounding processing system, and the trace
/// property that indexes an axis is named in that system's dialect. This table maps
/// an axis label to the property label that backs it, falling back to the axis label
/// itself, and answers the reverse question for writing.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDictionary {
    to_property: FnvHashMap<String, String>,
}

impl Default for LabelDictionary {
    fn default() -> Self {
        let pairs = [
            ("TIME", "SAMPLE"),
            ("DEPTH", "SAMPLE"),
            ("CROSSLINE", "XLINE_NO"),
            ("INLINE", "ILINE_NO"),
            ("CMP", "CDP"),
            ("SAIL_LINE", "S_LINE"),
            ("RECEIVER_LINE", "R_LINE"),
            ("CHANNEL", "CHAN"),
            ("OFFSET_BIN", "OFB_NO"),
        ];
        let to_property = pairs
            .iter()
            .map(|(a, p)| (a.to_string(), p.to_string()))
            .collect();
        LabelDictionary { to_property }
    }
}

impl LabelDictionary {
    /// A dictionary with no entries; every axis label is its own property label.
    pub fn empty() -> Self {
        LabelDictionary {
            to_property: FnvHashMap::default(),
        }
    }

    /// Add or replace a mapping.
    pub fn insert<A: Into<String>, P: Into<String>>(&mut self, axis_label: A, property: P) {
        self.to_property.insert(axis_label.into(), property.into());
    }

    /// The trace property label backing an axis label.
    pub fn property_for<'a>(&'a self, axis_label: &'a str) -> &'a str {
        self.to_property
            .get(axis_label)
            .map(String::as_str)
            .unwrap_or(axis_label)
    }

    /// The axis label served by a property label, if the dictionary knows one.
    pub fn label_for(&self, property: &str) -> Option<&str> {
        self.to_property
            .iter()
            .find(|(_, p)| p.as_str() == property)
            .map(|(a, _)| a.as_str())
    }
}

/// Settings shared by the open and create paths.
#[derive(Debug, Clone, PartialEq)]
pub struct JsSettings {
    /// The axis-label dictionary of the surrounding processing system.
    pub(crate) dictionary: LabelDictionary,
    /// Overrides the extent-count heuristic on create. Clamped to the frame count.
    pub(crate) extent_count: Option<usize>,
}

impl Default for JsSettings {
    fn default() -> Self {
        JsSettings {
            dictionary: LabelDictionary::default(),
            extent_count: None,
        }
    }
}

impl JsSettings {
    pub fn set_dictionary(&mut self, dictionary: LabelDictionary) {
        self.dictionary = dictionary;
    }

    pub fn get_dictionary(&self) -> &LabelDictionary {
        &self.dictionary
    }

    /// Overrides the number of extents per stream on create.
    ///
    /// The value must be at least 1; the create path additionally caps it at the
    /// total number of frames.
    pub fn set_extent_count(&mut self, n: usize) -> Result<(), JsError> {
        if n == 0 {
            return Err(JsError::PreconditionViolated {
                msg: "extent count must be at least 1".to_string(),
            });
        }
        self.extent_count = Some(n);
        Ok(())
    }

    pub fn get_extent_count(&self) -> Option<usize> {
        self.extent_count
    }
}
