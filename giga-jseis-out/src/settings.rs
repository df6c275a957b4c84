// Copyright (C) 2026 by GiGa infosystems
//! This module contains the [`CreateOptions`] structure which describes the dataset
//! to be created.
//!
//! NB: Since almost every field of a new dataset has a sensible default, this is a
//! plain settings object with setter functions rather than a pile of constructor
//! arguments. Using the setters is generally safer than building the structure by
//! hand, as several fields constrain each other.
use giga_jseis_core::errors::*;
use giga_jseis_core::{
    ByteOrder, DataProperty, Geometry, JsMetadata, PropertyDef, TraceFormat,
};

use std::path::PathBuf;

/// Trace and data properties carried over from a *similar-to* source.
#[derive(Debug, Clone, Default)]
pub(crate) struct Inherited {
    pub(crate) properties: Vec<PropertyDef>,
    pub(crate) data_properties: Vec<DataProperty>,
}

/// This structure holds everything the create path needs to know about the dataset
/// to be written: the framework axes, formats, storage roots and property edits.
///
/// Only the axis lengths are mandatory. Everything else defaults the way the format
/// expects: float32 samples, little-endian headers, a mapped fold structure, one
/// primary storage root, stock trace properties.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub(crate) descriptive_name: Option<String>,
    pub(crate) data_type: Option<String>,
    pub(crate) comments: Option<String>,
    pub(crate) trace_format: Option<TraceFormat>,
    pub(crate) byte_order: Option<ByteOrder>,
    pub(crate) mapped: Option<bool>,
    pub(crate) axis_lengths: Vec<usize>,
    pub(crate) axis_labels: Option<Vec<String>>,
    pub(crate) axis_units: Option<Vec<String>>,
    pub(crate) axis_domains: Option<Vec<String>>,
    pub(crate) logical_origins: Option<Vec<i64>>,
    pub(crate) logical_deltas: Option<Vec<i64>>,
    pub(crate) physical_origins: Option<Vec<f64>>,
    pub(crate) physical_deltas: Option<Vec<f64>>,
    pub(crate) secondaries: Option<Vec<PathBuf>>,
    pub(crate) properties: Option<Vec<PropertyDef>>,
    pub(crate) properties_add: Vec<PropertyDef>,
    pub(crate) properties_rm: Vec<String>,
    pub(crate) data_properties: Option<Vec<DataProperty>>,
    pub(crate) data_properties_add: Vec<DataProperty>,
    pub(crate) data_properties_rm: Vec<String>,
    pub(crate) geometry: Option<Geometry>,
    pub(crate) inherited: Option<Inherited>,
}

impl CreateOptions {
    /// Seed the options from the metadata of an existing dataset, so the new one
    /// comes out *similar to* it: same axes, formats, properties and geometry.
    /// Every setter still applies on top as an explicit override.
    pub fn similar_to(source: &JsMetadata) -> Self {
        let mut opts = CreateOptions::default();
        opts.data_type = Some(source.data_type.clone());
        opts.comments = Some(source.comments.clone());
        opts.trace_format = Some(source.trace_format);
        opts.byte_order = Some(source.byte_order);
        opts.mapped = Some(source.mapped);
        opts.axis_lengths = source.axes.iter().map(|a| a.length).collect();
        opts.axis_labels = Some(source.axes.iter().map(|a| a.label.clone()).collect());
        opts.axis_units = Some(source.axes.iter().map(|a| a.units.clone()).collect());
        opts.axis_domains = Some(source.axes.iter().map(|a| a.domain.clone()).collect());
        opts.logical_origins = Some(source.axes.iter().map(|a| a.logical_origin).collect());
        opts.logical_deltas = Some(source.axes.iter().map(|a| a.logical_delta).collect());
        opts.physical_origins = Some(source.axes.iter().map(|a| a.physical_origin).collect());
        opts.physical_deltas = Some(source.axes.iter().map(|a| a.physical_delta).collect());
        opts.secondaries = Some(source.secondaries.clone());
        opts.geometry = source.geometry.clone();
        opts.inherited = Some(Inherited {
            properties: source.layout.props().iter().map(|p| p.def.clone()).collect(),
            data_properties: source.data_properties.clone(),
        });
        opts
    }

    /// The bin count of every axis, fastest first. Mandatory; 3 to 5 entries.
    pub fn set_axis_lengths(&mut self, lengths: Vec<usize>) {
        self.axis_lengths = lengths;
    }

    pub fn set_descriptive_name<S: Into<String>>(&mut self, name: S) {
        self.descriptive_name = Some(name.into());
    }

    pub fn set_data_type<S: Into<String>>(&mut self, data_type: S) {
        self.data_type = Some(data_type.into());
    }

    pub fn set_comments<S: Into<String>>(&mut self, comments: S) {
        self.comments = Some(comments.into());
    }

    pub fn set_trace_format(&mut self, format: TraceFormat) {
        self.trace_format = Some(format);
    }

    pub fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = Some(order);
    }

    pub fn set_mapped(&mut self, mapped: bool) {
        self.mapped = Some(mapped);
    }

    pub fn set_axis_labels(&mut self, labels: Vec<String>) {
        self.axis_labels = Some(labels);
    }

    pub fn set_axis_units(&mut self, units: Vec<String>) {
        self.axis_units = Some(units);
    }

    pub fn set_axis_domains(&mut self, domains: Vec<String>) {
        self.axis_domains = Some(domains);
    }

    pub fn set_logical_origins(&mut self, origins: Vec<i64>) {
        self.logical_origins = Some(origins);
    }

    pub fn set_logical_deltas(&mut self, deltas: Vec<i64>) {
        self.logical_deltas = Some(deltas);
    }

    pub fn set_physical_origins(&mut self, origins: Vec<f64>) {
        self.physical_origins = Some(origins);
    }

    pub fn set_physical_deltas(&mut self, deltas: Vec<f64>) {
        self.physical_deltas = Some(deltas);
    }

    /// The secondary storage roots extents rotate over. `.` keeps extents under
    /// the primary directory.
    pub fn set_secondaries(&mut self, secondaries: Vec<PathBuf>) -> Result<(), JsError> {
        if secondaries.is_empty() {
            return Err(JsError::PreconditionViolated {
                msg: "at least one secondary is needed".to_string(),
            });
        }
        self.secondaries = Some(secondaries);
        Ok(())
    }

    /// Replace the user-defined trace properties outright. Mutually exclusive with
    /// [`Self::add_property`]/[`Self::remove_property`]; the create path rejects
    /// the combination.
    pub fn set_properties(&mut self, properties: Vec<PropertyDef>) {
        self.properties = Some(properties);
    }

    /// Add one trace property to the inherited (or stock) set.
    pub fn add_property(&mut self, property: PropertyDef) {
        self.properties_add.push(property);
    }

    /// Remove one trace property, by label, from the inherited (or stock) set.
    /// Removal is an exact set difference; a label that matches nothing makes the
    /// create path fail.
    pub fn remove_property<S: Into<String>>(&mut self, label: S) {
        self.properties_rm.push(label.into());
    }

    /// Replace the data properties outright. Mutually exclusive with the add/rm
    /// edits, like [`Self::set_properties`].
    pub fn set_data_properties(&mut self, properties: Vec<DataProperty>) {
        self.data_properties = Some(properties);
    }

    pub fn add_data_property(&mut self, property: DataProperty) {
        self.data_properties_add.push(property);
    }

    pub fn remove_data_property<S: Into<String>>(&mut self, label: S) {
        self.data_properties_rm.push(label.into());
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = Some(geometry);
    }

    pub fn get_geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }
}
