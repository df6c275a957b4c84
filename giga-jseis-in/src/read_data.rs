// Copyright (C) 2026 by GiGa infosystems
//! This submodule deals with reading the actual trace and header bytes once the
//! metadata and extent layout are known.
//!
//! Extent files are opened per operation and closed when the read is done; the
//! only long-lived file handle of a dataset is the trace map's.
use giga_jseis_core::errors::*;
use giga_jseis_core::extents::{extent_for_offset, Extent};
use giga_jseis_core::grid::DimRange;

use log::trace;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::JseisDataset;

/// Read `buf.len()` bytes at `offset` of a stream. The frame layout guarantees a
/// record never straddles an extent, so one open/seek/read suffices.
pub(crate) fn read_stream(extents: &[Extent], offset: u64, buf: &mut [u8]) -> Result<(), JsError> {
    let extent = extent_for_offset(extents, offset)?;
    trace!("reading {} bytes at {} of {}", buf.len(), offset, extent.name);
    let mut file = File::open(&extent.path)?;
    file.seek(SeekFrom::Start(offset - extent.start))?;
    file.read_exact(buf)?;
    Ok(())
}

/// Read the trace bodies of a frame: `fold` records decoded into `trcs`.
pub(crate) fn read_frame_traces(
    ds: &JseisDataset,
    frame: u64,
    fold: usize,
    trcs: &mut [f32],
) -> Result<(), JsError> {
    let record = ds.compressor.record_length() as u64;
    let offset = (frame - 1) * ds.metadata.traces_per_frame() as u64 * record;
    let mut raw = ds.compressor.alloc_frame_buf(fold);
    read_stream(&ds.trace_extents, offset, &mut raw)?;
    ds.compressor.unpack_frame(&raw, fold, trcs)
}

/// Read the header records of a frame: `fold` records into `hdrs`.
pub(crate) fn read_frame_headers(
    ds: &JseisDataset,
    frame: u64,
    fold: usize,
    hdrs: &mut [u8],
) -> Result<(), JsError> {
    let record = ds.metadata.header_record_length() as u64;
    let offset = (frame - 1) * ds.metadata.traces_per_frame() as u64 * record;
    read_stream(
        &ds.header_extents,
        offset,
        &mut hdrs[..fold * record as usize],
    )
}

/// Expand a selection into 1-based grid indices, one list per axis.
pub(crate) fn expand_selection(
    ds: &JseisDataset,
    selection: &[DimRange],
) -> Result<Vec<Vec<usize>>, JsError> {
    if selection.len() != ds.metadata.ndim() {
        return Err(JsError::PreconditionViolated {
            msg: format!(
                "selection has {} entries but the dataset has {} dimensions",
                selection.len(),
                ds.metadata.ndim()
            ),
        });
    }
    selection
        .iter()
        .zip(ds.metadata.axes.iter())
        .enumerate()
        .map(|(k, (r, axis))| r.grid_indices(axis, k))
        .collect()
}

/// The bulk range read over trace samples. Returns a flat column-major array of
/// shape `[samples, traces, outer...]` in selection order, empty frames zero.
pub(crate) fn read_traces_ranged(
    ds: &mut JseisDataset,
    selection: &[DimRange],
) -> Result<Vec<f32>, JsError> {
    let indices = expand_selection(ds, selection)?;
    let ns = ds.metadata.samples_per_trace();
    let tpf = ds.metadata.traces_per_frame();
    let n_out: usize = indices.iter().map(Vec::len).product();
    let mut out = vec![0f32; n_out];

    let samples = indices[0].clone();
    let traces = indices[1].clone();
    let frame_slab = samples.len() * traces.len();

    let mut frame_trcs = vec![0f32; ns * tpf];
    let mut frame_hdrs = vec![0u8; ds.metadata.header_record_length() * tpf];

    // The borrow of the fold map keeps `ds` exclusive, so the frame loop is
    // written out rather than routed through the `for_each_frame` helper.
    let outer: Vec<Vec<usize>> = indices[2..].to_vec();
    let lengths: Vec<u64> = ds.metadata.axes[2..].iter().map(|a| a.length as u64).collect();
    let mut odometer = vec![0usize; outer.len()];
    let mut slot = 0usize;
    loop {
        let mut frame = 1u64;
        let mut stride = 1u64;
        for (k, pos) in odometer.iter().enumerate() {
            frame += (outer[k][*pos] as u64 - 1) * stride;
            stride *= lengths[k];
        }

        let fold = ds.map.fold(frame)?;
        if fold > 0 {
            read_frame_traces(ds, frame, fold, &mut frame_trcs)?;
            if fold < tpf {
                // Sparse frame: place the live traces into their declared columns
                // before projecting.
                read_frame_headers(ds, frame, fold, &mut frame_hdrs)?;
                ds.regularize(fold, &mut frame_trcs, &mut frame_hdrs)?;
            }
            for (tj, tg) in traces.iter().enumerate() {
                for (sj, sg) in samples.iter().enumerate() {
                    out[slot * frame_slab + tj * samples.len() + sj] =
                        frame_trcs[(tg - 1) * ns + (sg - 1)];
                }
            }
        }
        slot += 1;

        let mut k = 0;
        loop {
            if k == odometer.len() {
                return Ok(out);
            }
            odometer[k] += 1;
            if odometer[k] < outer[k].len() {
                break;
            }
            odometer[k] = 0;
            k += 1;
        }
    }
}

/// The bulk range read over header records, shaped `[header_length, traces, outer...]`.
pub(crate) fn read_headers_ranged(
    ds: &mut JseisDataset,
    selection: &[DimRange],
) -> Result<Vec<u8>, JsError> {
    let indices = expand_selection(ds, selection)?;
    let ns = ds.metadata.samples_per_trace();
    let tpf = ds.metadata.traces_per_frame();
    let hl = ds.metadata.header_record_length();
    let traces = indices[1].clone();
    let n_frames: usize = indices[2..].iter().map(Vec::len).product();
    let mut out = vec![0u8; hl * traces.len() * n_frames];
    let frame_slab = hl * traces.len();

    let mut frame_trcs = vec![0f32; ns * tpf];
    let mut frame_hdrs = vec![0u8; hl * tpf];

    let outer: Vec<Vec<usize>> = indices[2..].to_vec();
    let lengths: Vec<u64> = ds.metadata.axes[2..].iter().map(|a| a.length as u64).collect();
    let mut odometer = vec![0usize; outer.len()];
    let mut slot = 0usize;
    loop {
        let mut frame = 1u64;
        let mut stride = 1u64;
        for (k, pos) in odometer.iter().enumerate() {
            frame += (outer[k][*pos] as u64 - 1) * stride;
            stride *= lengths[k];
        }

        let fold = ds.map.fold(frame)?;
        if fold > 0 {
            read_frame_headers(ds, frame, fold, &mut frame_hdrs)?;
            if fold < tpf {
                read_frame_traces(ds, frame, fold, &mut frame_trcs)?;
                ds.regularize(fold, &mut frame_trcs, &mut frame_hdrs)?;
            }
            for (tj, tg) in traces.iter().enumerate() {
                let src = &frame_hdrs[(tg - 1) * hl..*tg * hl];
                out[slot * frame_slab + tj * hl..slot * frame_slab + (tj + 1) * hl]
                    .copy_from_slice(src);
            }
        }
        slot += 1;

        let mut k = 0;
        loop {
            if k == odometer.len() {
                return Ok(out);
            }
            odometer[k] += 1;
            if odometer[k] < outer[k].len() {
                break;
            }
            odometer[k] = 0;
            k += 1;
        }
    }
}

/// The fold-aware full-frame read behind `JseisDataset::read_frame`.
pub(crate) fn read_frame(
    ds: &mut JseisDataset,
    frame: u64,
    trcs: &mut [f32],
    hdrs: &mut [u8],
) -> Result<usize, JsError> {
    check_frame_buffers(ds, Some(trcs.len()), Some(hdrs.len()))?;
    let fold = ds.map.fold(frame)?;
    if fold == 0 {
        return Ok(0);
    }
    read_frame_traces(ds, frame, fold, trcs)?;
    read_frame_headers(ds, frame, fold, hdrs)?;
    Ok(fold)
}

pub(crate) fn check_frame_buffers(
    ds: &JseisDataset,
    trcs_len: Option<usize>,
    hdrs_len: Option<usize>,
) -> Result<(), JsError> {
    let ns = ds.metadata.samples_per_trace();
    let tpf = ds.metadata.traces_per_frame();
    if let Some(t) = trcs_len {
        if t < ns * tpf {
            return Err(JsError::PreconditionViolated {
                msg: format!("trace buffer holds {} samples, a frame needs {}", t, ns * tpf),
            });
        }
    }
    if let Some(h) = hdrs_len {
        let needed = ds.metadata.header_record_length() * tpf;
        if h < needed {
            return Err(JsError::PreconditionViolated {
                msg: format!("header buffer holds {} bytes, a frame needs {}", h, needed),
            });
        }
    }
    Ok(())
}
