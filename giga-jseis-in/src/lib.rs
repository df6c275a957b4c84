//! This is a simplified library for reading JavaSeis datasets into rust. It is designed
//! for efficient frame-by-frame reading of trace data and headers without holding a
//! potentially very large dataset in memory.
//!
//! A dataset is a directory of XML sidecar files, a fold map and a set of extent files
//! that may be spread over several filesystem roots. Opening one parses the sidecars
//! and the extent layout; after that, frames are read on demand with one file open per
//! operation.
//!
//! This library is not designed for writing datasets; that is what `giga_jseis_out`
//! is for.
extern crate giga_jseis_core;
extern crate log;

pub mod parse_metadata;
pub mod read_data;

pub use giga_jseis_core::enums;
pub use giga_jseis_core::errors::*;
pub use giga_jseis_core::grid::DimRange;
pub use giga_jseis_core::{
    Axis, DataProperty, Extent, Geometry, HeaderLayout, JsMetadata, JsSettings, PropertyDef,
    TraceProperty,
};

use giga_jseis_core::extents;
use giga_jseis_core::grid;
use giga_jseis_core::{
    ByteOrder, TraceCompressor, TraceFormat, TraceMap, TRACE_FILE_EXTENT, TRACE_FILE_XML,
    TRACE_HEADERS_EXTENT, TRACE_HEADERS_XML,
};

use log::debug;
use std::path::{Path, PathBuf};

use parse_metadata::ExtentInfo;

/// A structure which represents an opened, readable JavaSeis dataset.
///
/// The structure contains:
///
/// - The parsed metadata (axes, header layout, formats, custom properties).
///
/// - The extent layout of the trace and header streams.
///
/// - The trace codec configured for the declared sample format.
///
/// - The fold map with its one-volume cache.
///
/// NB: The handle holds no open extent files; only the fold map keeps a file handle.
#[derive(Debug)]
pub struct JseisDataset {
    pub(crate) path: PathBuf,
    pub(crate) metadata: JsMetadata,
    pub(crate) trace_extents: Vec<Extent>,
    pub(crate) header_extents: Vec<Extent>,
    pub(crate) compressor: TraceCompressor,
    pub(crate) map: TraceMap,
    pub(crate) settings: JsSettings,
}

impl JseisDataset {
    /// Attempts to open the dataset directory at a given location with default
    /// settings, giving a handle for reading headers and data.
    ///
    /// ```
    /// use giga_jseis_in::JseisDataset;
    /// use giga_jseis_out::CreateOptions;
    ///
    /// let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    /// let path = dir.path().join("doc-open.js");
    /// let mut opts = CreateOptions::default();
    /// opts.set_axis_lengths(vec![128, 64, 10]);
    /// giga_jseis_out::JseisDataset::create(&path, opts).unwrap();
    ///
    /// let mut input = JseisDataset::open(&path).unwrap();
    /// assert_eq!(input.total_frames(), 10);
    /// assert_eq!(input.fold(1).unwrap(), 0);
    /// assert!(!input.has_traces());
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, JsError> {
        Self::open_with(path, JsSettings::default())
    }

    /// Like [`Self::open`], with explicit [`JsSettings`] (e.g. a non-default axis
    /// label dictionary).
    pub fn open_with<P: AsRef<Path>>(path: P, settings: JsSettings) -> Result<Self, JsError> {
        let primary = extents::absolute_path(path.as_ref())?;
        debug!("opening dataset {} for read", primary.display());
        let metadata = parse_metadata::read_metadata(&primary, &settings)?;

        let trace_extents = stream_extents(
            &primary,
            &metadata,
            TRACE_FILE_XML,
            TRACE_FILE_EXTENT,
            metadata.trace_stream_bytes(),
            metadata.trace_record_length(),
        )?;
        let header_extents = stream_extents(
            &primary,
            &metadata,
            TRACE_HEADERS_XML,
            TRACE_HEADERS_EXTENT,
            metadata.header_stream_bytes(),
            metadata.header_record_length(),
        )?;

        let compressor = TraceCompressor::new(metadata.trace_format, metadata.samples_per_trace());
        let map = TraceMap::open(
            &primary,
            metadata.frames_per_volume(),
            metadata.total_frames(),
            metadata.traces_per_frame(),
            metadata.mapped,
            false,
        )?;

        Ok(JseisDataset {
            path: primary,
            metadata,
            trace_extents,
            header_extents,
            compressor,
            map,
            settings,
        })
    }

    /// The absolute path of the primary directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a reference to the parsed metadata.
    pub fn get_metadata(&self) -> &JsMetadata {
        &self.metadata
    }

    /// Get a reference to the [`JsSettings`] the dataset was opened with.
    pub fn get_settings(&self) -> &JsSettings {
        &self.settings
    }

    pub fn descriptive_name(&self) -> &str {
        &self.metadata.descriptive_name
    }

    pub fn data_type(&self) -> &str {
        &self.metadata.data_type
    }

    pub fn trace_format(&self) -> TraceFormat {
        self.metadata.trace_format
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.metadata.byte_order
    }

    pub fn is_mapped(&self) -> bool {
        self.metadata.mapped
    }

    pub fn has_traces(&self) -> bool {
        self.metadata.has_traces
    }

    pub fn ndim(&self) -> usize {
        self.metadata.ndim()
    }

    pub fn axes(&self) -> &[Axis] {
        &self.metadata.axes
    }

    pub fn samples_per_trace(&self) -> usize {
        self.metadata.samples_per_trace()
    }

    pub fn traces_per_frame(&self) -> usize {
        self.metadata.traces_per_frame()
    }

    pub fn total_frames(&self) -> u64 {
        self.metadata.total_frames()
    }

    /// The byte length of one header record.
    pub fn header_length(&self) -> usize {
        self.metadata.header_record_length()
    }

    /// Get the header layout of the dataset.
    pub fn header_layout(&self) -> &HeaderLayout {
        &self.metadata.layout
    }

    /// Look a trace property up by label.
    pub fn property(&self, label: &str) -> Result<&TraceProperty, JsError> {
        self.metadata.layout.require(label)
    }

    /// Look a data property (CustomProperties entry) up by label.
    pub fn data_property(&self, label: &str) -> Result<&DataProperty, JsError> {
        self.metadata
            .data_properties
            .iter()
            .find(|p| p.label == label)
            .ok_or_else(|| JsError::DataPropertyNotFound {
                label: label.to_string(),
            })
    }

    pub fn data_properties(&self) -> &[DataProperty] {
        &self.metadata.data_properties
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.metadata.geometry.as_ref()
    }

    /// Allocate a zeroed trace buffer for one frame.
    pub fn alloc_frame_trcs(&self) -> Vec<f32> {
        vec![0f32; self.samples_per_trace() * self.traces_per_frame()]
    }

    /// Allocate a zeroed header buffer for one frame.
    pub fn alloc_frame_hdrs(&self) -> Vec<u8> {
        vec![0u8; self.header_length() * self.traces_per_frame()]
    }

    /// Allocate both frame buffers.
    pub fn alloc_frame(&self) -> (Vec<f32>, Vec<u8>) {
        (self.alloc_frame_trcs(), self.alloc_frame_hdrs())
    }

    /// The 1-based linear frame index of a logical address over the frame-and-above
    /// axes.
    pub fn frame_index(&self, address: &[i64]) -> Result<u64, JsError> {
        grid::frame_index(&self.metadata.axes, address)
    }

    /// The logical address of a 1-based linear frame index.
    pub fn frame_address(&self, frame: u64) -> Vec<i64> {
        grid::frame_address(&self.metadata.axes, frame)
    }

    /// The fold (live-trace count) of a 1-based linear frame index.
    pub fn fold(&mut self, frame: u64) -> Result<usize, JsError> {
        self.map.fold(frame)
    }

    /// The fold of a frame given by logical address.
    pub fn fold_at(&mut self, address: &[i64]) -> Result<usize, JsError> {
        let frame = self.frame_index(address)?;
        self.map.fold(frame)
    }

    /// Whether a frame holds no live traces.
    pub fn is_frame_empty(&mut self, frame: u64) -> Result<bool, JsError> {
        Ok(self.fold(frame)? == 0)
    }

    /// How often the fold map has paged a volume in from disk. Instrumentation
    /// for cache behaviour.
    pub fn map_volume_loads(&self) -> usize {
        self.map.volume_loads()
    }

    /// Read one frame (traces and headers) by linear index.
    ///
    /// Returns the fold. The first `fold` columns of both buffers are the live
    /// traces in left-justified order; the remaining columns are undefined until
    /// [`Self::regularize`] is called. A fold of 0 is an empty frame and the
    /// buffers are left untouched.
    pub fn read_frame(
        &mut self,
        frame: u64,
        trcs: &mut [f32],
        hdrs: &mut [u8],
    ) -> Result<usize, JsError> {
        read_data::read_frame(self, frame, trcs, hdrs)
    }

    /// Read one frame by logical address.
    pub fn read_frame_at(
        &mut self,
        address: &[i64],
        trcs: &mut [f32],
        hdrs: &mut [u8],
    ) -> Result<usize, JsError> {
        let frame = self.frame_index(address)?;
        self.read_frame(frame, trcs, hdrs)
    }

    /// Read the trace bodies of one frame only. Returns the fold.
    pub fn read_frame_trcs(&mut self, frame: u64, trcs: &mut [f32]) -> Result<usize, JsError> {
        read_data::check_frame_buffers(self, Some(trcs.len()), None)?;
        let fold = self.map.fold(frame)?;
        if fold == 0 {
            return Ok(0);
        }
        read_data::read_frame_traces(self, frame, fold, trcs)?;
        Ok(fold)
    }

    /// Read the header records of one frame only. Returns the fold.
    pub fn read_frame_hdrs(&mut self, frame: u64, hdrs: &mut [u8]) -> Result<usize, JsError> {
        read_data::check_frame_buffers(self, None, Some(hdrs.len()))?;
        let fold = self.map.fold(frame)?;
        if fold == 0 {
            return Ok(0);
        }
        read_data::read_frame_headers(self, frame, fold, hdrs)?;
        Ok(fold)
    }

    /// Left-justify a frame in place: live traces to the front, dead traces to the
    /// back, header records along. Returns the fold.
    pub fn left_justify(&self, trcs: &mut [f32], hdrs: &mut [u8]) -> Result<usize, JsError> {
        grid::left_justify(
            &self.metadata.layout,
            self.metadata.byte_order.is_le(),
            self.metadata.samples_per_trace(),
            self.metadata.traces_per_frame(),
            trcs,
            hdrs,
        )
    }

    /// Scatter a left-justified frame back to its framework-declared columns, using
    /// the trace-axis property as the indexing property.
    pub fn regularize(
        &self,
        fold: usize,
        trcs: &mut [f32],
        hdrs: &mut [u8],
    ) -> Result<(), JsError> {
        let prop = self.trace_axis_property()?;
        self.regularize_by_prop(prop, fold, trcs, hdrs)
    }

    /// Like [`Self::regularize`], against an explicitly chosen indexing property.
    pub fn regularize_by(
        &self,
        label: &str,
        fold: usize,
        trcs: &mut [f32],
        hdrs: &mut [u8],
    ) -> Result<(), JsError> {
        let prop = self.metadata.layout.require(label)?;
        self.regularize_by_prop(prop, fold, trcs, hdrs)
    }

    fn regularize_by_prop(
        &self,
        prop: &TraceProperty,
        fold: usize,
        trcs: &mut [f32],
        hdrs: &mut [u8],
    ) -> Result<(), JsError> {
        grid::regularize(
            &self.metadata.layout,
            prop,
            &self.metadata.axes[1],
            self.metadata.byte_order.is_le(),
            self.metadata.samples_per_trace(),
            self.metadata.traces_per_frame(),
            fold,
            trcs,
            hdrs,
        )
    }

    /// The trace property indexing the trace axis, resolved through the dictionary.
    pub fn trace_axis_property(&self) -> Result<&TraceProperty, JsError> {
        let dictionary = self.settings.get_dictionary();
        self.metadata
            .axis_property(dictionary, 1)?
            .ok_or_else(|| JsError::PropertyNotFound {
                label: dictionary
                    .property_for(&self.metadata.axes[1].label)
                    .to_string(),
            })
    }

    /// The shape of the output of a range read with this selection, slowest axis
    /// last.
    pub fn selection_dims(&self, selection: &[DimRange]) -> Result<Vec<usize>, JsError> {
        Ok(read_data::expand_selection(self, selection)?
            .iter()
            .map(Vec::len)
            .collect())
    }

    /// Range read of trace samples over a rectangular subgrid, one selector per
    /// dimension, all in logical coordinates.
    ///
    /// The result is a flat column-major array shaped per
    /// [`Self::selection_dims`]; frames with fold 0 read as zeros. Sparse frames
    /// are regularized internally, so every trace lands in the column its header
    /// declares.
    pub fn read_traces(&mut self, selection: &[DimRange]) -> Result<Vec<f32>, JsError> {
        read_data::read_traces_ranged(self, selection)
    }

    /// Range read of header records, shaped `[header_length, traces, frames...]`.
    pub fn read_headers(&mut self, selection: &[DimRange]) -> Result<Vec<u8>, JsError> {
        read_data::read_headers_ranged(self, selection)
    }

    /// This function gets all the parsed fields of the handle and discards the
    /// instance. Used by `giga_jseis_out` to re-open a dataset writable without
    /// parsing the sidecars twice.
    ///
    /// NB: The fold map handle is discarded in the process.
    pub fn deconstruct(
        self,
    ) -> (
        PathBuf,
        JsMetadata,
        Vec<Extent>,
        Vec<Extent>,
        JsSettings,
    ) {
        let JseisDataset {
            path,
            metadata,
            trace_extents,
            header_extents,
            settings,
            ..
        } = self;
        (path, metadata, trace_extents, header_extents, settings)
    }
}

fn stream_extents(
    primary: &Path,
    metadata: &JsMetadata,
    xml_name: &str,
    base_name: &str,
    stream_bytes: u64,
    record_length: usize,
) -> Result<Vec<Extent>, JsError> {
    let info: ExtentInfo = parse_metadata::read_extent_info(primary, xml_name)?;
    if info.base_name != base_name {
        return Err(JsError::MalformedMetadata {
            msg: format!(
                "'{}' declares extent name '{}', expected '{}'",
                xml_name, info.base_name, base_name
            ),
        });
    }
    let frame_bytes = metadata.traces_per_frame() as u64 * record_length as u64;
    if info.max_pos + 1 != stream_bytes || info.extent_size % frame_bytes != 0 {
        return Err(JsError::MalformedMetadata {
            msg: format!(
                "'{}' declares {} bytes in extents of {}, the framework needs {} in frames of {}",
                xml_name,
                info.max_pos + 1,
                info.extent_size,
                stream_bytes,
                frame_bytes
            ),
        });
    }
    extents::build_extents(
        &info.base_name,
        primary,
        &metadata.secondaries,
        info.max_file,
        info.extent_size,
        stream_bytes,
    )
}
