// Copyright (C) 2026 by GiGa infosystems
//! This is a simplified library for creating and writing JavaSeis datasets from rust.
//! It is designed for frame-by-frame writing and supports sparse frames, fixed-point
//! compressed sample formats, and cloning the shape of an existing dataset
//! (*similar-to* creation).
//!
//! Reading an existing dataset is what `giga_jseis_in` is for; this crate leans on it
//! to re-open a dataset writable and to copy datasets, and otherwise only appends.
extern crate fnv;
extern crate giga_jseis_core;
extern crate giga_jseis_in;
extern crate log;
extern crate num;
#[cfg(test)]
extern crate tempfile;

pub mod create_metadata;
#[cfg(test)]
mod integration_tests;
mod settings;
pub mod write_data;

pub use giga_jseis_core::enums;
pub use giga_jseis_core::errors::*;
pub use giga_jseis_core::grid::DimRange;
pub use giga_jseis_core::{
    Axis, DataProperty, Extent, Geometry, HeaderLayout, JsMetadata, JsSettings, PropertyDef,
    TraceProperty,
};
pub use settings::CreateOptions;

use giga_jseis_core::extents;
use giga_jseis_core::grid;
use giga_jseis_core::{
    ByteOrder, TraceCompressor, TraceFormat, TraceMap, FILE_PROPERTIES_XML, TRACE_FILE_EXTENT,
    TRACE_FILE_XML, TRACE_HEADERS_EXTENT, TRACE_HEADERS_XML, VIRTUAL_FOLDERS_XML,
};

use fnv::FnvHashSet;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// A structure which represents a writable JavaSeis dataset.
///
/// The handle carries the same parsed state as the read handle of
/// `giga_jseis_in`, plus a writable fold map. Extent files are created lazily on
/// the first write that touches them.
#[derive(Debug)]
pub struct JseisDataset {
    pub(crate) path: PathBuf,
    pub(crate) metadata: JsMetadata,
    pub(crate) trace_extents: Vec<extents::Extent>,
    pub(crate) header_extents: Vec<extents::Extent>,
    pub(crate) compressor: TraceCompressor,
    pub(crate) map: TraceMap,
    pub(crate) settings: JsSettings,
}

impl JseisDataset {
    /// Create a new dataset directory and return the writable handle. Frames can
    /// then be written one by one.
    ///
    /// ```
    /// use giga_jseis_out::{CreateOptions, JseisDataset};
    ///
    /// let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    /// let path = dir.path().join("doc-create.js");
    ///
    /// let mut opts = CreateOptions::default();
    /// opts.set_axis_lengths(vec![128, 64, 10]);
    ///
    /// let mut output = JseisDataset::create(&path, opts).unwrap();
    /// let (mut trcs, mut hdrs) = output.alloc_frame();
    /// for t in 0..64 {
    ///     for s in 0..128 {
    ///         trcs[t * 128 + s] = (100 * t + s) as f32;
    ///     }
    /// }
    /// output.fill_frame_headers(&mut hdrs, &[1], 64).unwrap();
    /// output.write_frame(1, &trcs, &hdrs, 64).unwrap();
    /// assert!(output.has_traces());
    /// ```
    pub fn create<P: AsRef<Path>>(path: P, options: CreateOptions) -> Result<Self, JsError> {
        Self::create_with(path, options, JsSettings::default())
    }

    /// Like [`Self::create`], with explicit [`JsSettings`] (dictionary, extent
    /// count override).
    pub fn create_with<P: AsRef<Path>>(
        path: P,
        options: CreateOptions,
        settings: JsSettings,
    ) -> Result<Self, JsError> {
        let primary = extents::absolute_path(path.as_ref())?;
        debug!("creating dataset {}", primary.display());
        let metadata = create_metadata::metadata_from_options(&primary, &options, &settings)?;

        let frames = metadata.total_frames();
        let tpf = metadata.traces_per_frame() as u64;
        let trace_total = metadata.trace_stream_bytes();
        let header_total = metadata.header_stream_bytes();
        let nextents = match settings.get_extent_count() {
            Some(n) => n.max(1).min(frames.max(1) as usize),
            None => extents::extent_count(trace_total, frames),
        };
        let trace_size =
            extents::extent_size(frames, nextents, tpf, metadata.trace_record_length() as u64);
        let header_size =
            extents::extent_size(frames, nextents, tpf, metadata.header_record_length() as u64);

        if primary.exists() {
            fs::remove_dir_all(&primary)?;
        }
        fs::create_dir_all(&primary)?;

        let trace_extents = extents::build_extents(
            TRACE_FILE_EXTENT,
            &primary,
            &metadata.secondaries,
            nextents,
            trace_size,
            trace_total,
        )?;
        let header_extents = extents::build_extents(
            TRACE_HEADERS_EXTENT,
            &primary,
            &metadata.secondaries,
            nextents,
            header_size,
            header_total,
        )?;

        // Remake every extent directory other than the primary itself.
        let mut dirs = FnvHashSet::default();
        for e in trace_extents.iter().chain(header_extents.iter()) {
            if let Some(parent) = e.path.parent() {
                dirs.insert(parent.to_path_buf());
            }
        }
        for dir in dirs {
            if dir == primary {
                continue;
            }
            if dir.exists() {
                fs::remove_dir_all(&dir)?;
            }
            fs::create_dir_all(&dir)?;
        }

        if metadata.mapped {
            TraceMap::initialize(&primary, frames)?;
        }

        create_metadata::file_properties_parset(&metadata)
            .write_file(primary.join(FILE_PROPERTIES_XML))?;
        create_metadata::extent_manager_parset(
            TRACE_FILE_EXTENT,
            trace_size,
            trace_extents.len(),
            trace_total - 1,
        )
        .write_file(primary.join(TRACE_FILE_XML))?;
        create_metadata::extent_manager_parset(
            TRACE_HEADERS_EXTENT,
            header_size,
            header_extents.len(),
            header_total - 1,
        )
        .write_file(primary.join(TRACE_HEADERS_XML))?;
        create_metadata::virtual_folders_parset(&metadata)
            .write_file(primary.join(VIRTUAL_FOLDERS_XML))?;
        create_metadata::write_name_properties(&primary, &metadata.descriptive_name)?;
        create_metadata::write_status_properties(&primary, false)?;

        let compressor = TraceCompressor::new(metadata.trace_format, metadata.samples_per_trace());
        let map = TraceMap::open(
            &primary,
            metadata.frames_per_volume(),
            frames,
            metadata.traces_per_frame(),
            metadata.mapped,
            true,
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

    /// Re-open an existing dataset for writing, parsing the sidecars through
    /// `giga_jseis_in`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, JsError> {
        Self::open_with(path, JsSettings::default())
    }

    /// Like [`Self::open`], with explicit [`JsSettings`].
    pub fn open_with<P: AsRef<Path>>(path: P, settings: JsSettings) -> Result<Self, JsError> {
        let reader = giga_jseis_in::JseisDataset::open_with(path, settings)?;
        let (path, metadata, trace_extents, header_extents, settings) = reader.deconstruct();
        debug!("re-opening dataset {} for write", path.display());
        let compressor = TraceCompressor::new(metadata.trace_format, metadata.samples_per_trace());
        let map = TraceMap::open(
            &path,
            metadata.frames_per_volume(),
            metadata.total_frames(),
            metadata.traces_per_frame(),
            metadata.mapped,
            true,
        )?;
        Ok(JseisDataset {
            path,
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

    pub fn get_metadata(&self) -> &JsMetadata {
        &self.metadata
    }

    pub fn get_settings(&self) -> &JsSettings {
        &self.settings
    }

    pub fn descriptive_name(&self) -> &str {
        &self.metadata.descriptive_name
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

    pub fn header_length(&self) -> usize {
        self.metadata.header_record_length()
    }

    pub fn header_layout(&self) -> &HeaderLayout {
        &self.metadata.layout
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

    /// The 1-based linear frame index of a logical address.
    pub fn frame_index(&self, address: &[i64]) -> Result<u64, JsError> {
        grid::frame_index(&self.metadata.axes, address)
    }

    /// The logical address of a 1-based linear frame index.
    pub fn frame_address(&self, frame: u64) -> Vec<i64> {
        grid::frame_address(&self.metadata.axes, frame)
    }

    /// The fold of a 1-based linear frame index.
    pub fn fold(&mut self, frame: u64) -> Result<usize, JsError> {
        self.map.fold(frame)
    }

    /// The fold of a frame given by logical address.
    pub fn fold_at(&mut self, address: &[i64]) -> Result<usize, JsError> {
        let frame = self.frame_index(address)?;
        self.map.fold(frame)
    }

    /// Fill a frame's header records from its grid position: the first `fold`
    /// columns live, the rest dead, axis properties set throughout.
    pub fn fill_frame_headers(
        &self,
        hdrs: &mut [u8],
        address: &[i64],
        fold: usize,
    ) -> Result<(), JsError> {
        let hl = self.header_length();
        let tpf = self.traces_per_frame();
        if hdrs.len() < hl * tpf {
            return Err(JsError::PreconditionViolated {
                msg: "header buffer does not cover the frame".to_string(),
            });
        }
        // Validates the address as a side effect.
        grid::frame_index(&self.metadata.axes, address)?;
        let trace_axis = &self.metadata.axes[1];
        for c in 0..tpf {
            write_data::synthesize_header(
                self,
                &mut hdrs[c * hl..(c + 1) * hl],
                address,
                grid::grid_to_logical(trace_axis, c + 1),
                c < fold,
            )?;
        }
        Ok(())
    }

    /// Write one left-justified frame to a 1-based linear frame index. Only the
    /// first `fold` traces and headers are persisted; the fold map carries the
    /// rest of the story.
    pub fn write_frame(
        &mut self,
        frame: u64,
        trcs: &[f32],
        hdrs: &[u8],
        fold: usize,
    ) -> Result<(), JsError> {
        write_data::write_frame(self, frame, trcs, hdrs, fold)
    }

    /// Write one left-justified frame to a logical address.
    pub fn write_frame_at(
        &mut self,
        address: &[i64],
        trcs: &[f32],
        hdrs: &[u8],
        fold: usize,
    ) -> Result<(), JsError> {
        let frame = self.frame_index(address)?;
        write_data::write_frame(self, frame, trcs, hdrs, fold)
    }

    /// Write one left-justified frame whose target index is derived from the axis
    /// properties of its first live trace. Returns the frame index written.
    pub fn write_frame_from_headers(
        &mut self,
        trcs: &[f32],
        hdrs: &[u8],
        fold: usize,
    ) -> Result<u64, JsError> {
        let frame = write_data::derive_frame_index(self, hdrs, fold)?;
        write_data::write_frame(self, frame, trcs, hdrs, fold)?;
        Ok(frame)
    }

    /// Read one frame back from a writable handle, e.g. for read-modify-write.
    /// Returns the fold; the frame comes back left-justified as stored.
    pub fn read_frame(
        &mut self,
        frame: u64,
        trcs: &mut [f32],
        hdrs: &mut [u8],
    ) -> Result<usize, JsError> {
        let ns = self.samples_per_trace();
        let tpf = self.traces_per_frame();
        if trcs.len() < ns * tpf || hdrs.len() < self.header_length() * tpf {
            return Err(JsError::PreconditionViolated {
                msg: "frame buffers do not cover the frame".to_string(),
            });
        }
        let fold = self.map.fold(frame)?;
        if fold == 0 {
            return Ok(0);
        }
        write_data::read_frame_for_update(self, frame, fold, trcs, hdrs)?;
        Ok(fold)
    }

    /// Left-justify a frame in place. Returns the fold.
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

    /// Scatter a left-justified frame back to its framework-declared columns.
    pub fn regularize(
        &self,
        fold: usize,
        trcs: &mut [f32],
        hdrs: &mut [u8],
    ) -> Result<(), JsError> {
        let prop = self.trace_axis_property()?.clone();
        grid::regularize(
            &self.metadata.layout,
            &prop,
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

    /// Range write of trace samples over a rectangular subgrid; the mirror of the
    /// ranged read of `giga_jseis_in`. Headers of newly touched traces are
    /// synthesized from the grid position; partial frames do read-modify-write.
    pub fn write_traces(&mut self, selection: &[DimRange], data: &[f32]) -> Result<(), JsError> {
        write_data::write_traces_ranged(self, selection, data)
    }

    /// Delete the bulk data of the dataset while keeping the sidecars: every
    /// extent file goes, the fold map is zeroed, the status flag drops back to
    /// no-traces.
    pub fn empty(&mut self) -> Result<(), JsError> {
        debug!("emptying dataset {}", self.path.display());
        for e in self.trace_extents.iter().chain(self.header_extents.iter()) {
            match fs::remove_file(&e.path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        self.map.zero()?;
        self.metadata.has_traces = false;
        create_metadata::write_status_properties(&self.path, false)
    }

    /// Delete the dataset from disk, consuming the handle: every secondary's
    /// extent directory first, then the primary directory.
    pub fn remove(self) -> Result<(), JsError> {
        debug!("removing dataset {}", self.path.display());
        remove_dirs(&self.path, &self.metadata.secondaries)
    }
}

/// Copy a dataset frame by frame into a new location. The destination is created
/// *similar to* the source; empty frames stay empty.
pub fn copy_dataset<P: AsRef<Path>>(
    source: &mut giga_jseis_in::JseisDataset,
    destination: P,
) -> Result<JseisDataset, JsError> {
    let options = CreateOptions::similar_to(source.get_metadata());
    let mut dst =
        JseisDataset::create_with(destination, options, source.get_settings().clone())?;
    let (mut trcs, mut hdrs) = source.alloc_frame();
    for frame in 1..=source.total_frames() {
        let fold = source.read_frame(frame, &mut trcs, &mut hdrs)?;
        if fold > 0 {
            dst.write_frame(frame, &trcs, &hdrs, fold)?;
        }
    }
    Ok(dst)
}

/// Move a dataset: copy, then remove the source.
pub fn move_dataset<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Result<(), JsError> {
    let mut src = giga_jseis_in::JseisDataset::open(source.as_ref())?;
    let dst = copy_dataset(&mut src, destination)?;
    drop(src);
    drop(dst);
    remove_dataset(source.as_ref())
}

/// Delete a dataset by path, without fully opening it: the secondary extent
/// directories named by `VirtualFolders.xml` first, then the primary directory.
pub fn remove_dataset<P: AsRef<Path>>(path: P) -> Result<(), JsError> {
    let primary = extents::absolute_path(path.as_ref())?;
    let secondaries = giga_jseis_in::parse_metadata::read_secondaries(&primary)?;
    remove_dirs(&primary, &secondaries)
}

fn remove_dirs(primary: &Path, secondaries: &[PathBuf]) -> Result<(), JsError> {
    for s in secondaries {
        if s == Path::new(".") {
            continue;
        }
        let dir = extents::extent_dir(s, primary)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
    }
    fs::remove_dir_all(primary)?;
    Ok(())
}
