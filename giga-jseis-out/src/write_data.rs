// Copyright (C) 2026 by GiGa infosystems
//! This submodule contains the code for writing frames into the extent files, and
//! the read-modify-write machinery behind partial range writes.
//!
//! A frame write touches the dataset in a fixed order: trace bodies, header
//! records, the fold map entry, and last the status sidecar. A reader racing a
//! writer sees a consistent fold through the map regardless of how far the write
//! got.
use giga_jseis_core::bitconverter::{get_int, put_int};
use giga_jseis_core::enums::TraceType;
use giga_jseis_core::errors::*;
use giga_jseis_core::extents::{extent_for_offset, Extent};
use giga_jseis_core::grid::{self, DimRange};
use giga_jseis_core::properties::TRC_TYPE;

use log::trace;
use num::ToPrimitive;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::create_metadata::write_status_properties;
use crate::JseisDataset;

/// Write `bytes` at `offset` of a stream. The extent file is created on first
/// touch and grows as needed; the frame layout guarantees a record never
/// straddles an extent.
pub(crate) fn write_stream(extents: &[Extent], offset: u64, bytes: &[u8]) -> Result<(), JsError> {
    let extent = extent_for_offset(extents, offset)?;
    trace!("writing {} bytes at {} of {}", bytes.len(), offset, extent.name);
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&extent.path)?;
    file.seek(SeekFrom::Start(offset - extent.start))?;
    file.write_all(bytes)?;
    Ok(())
}

/// Read `buf.len()` bytes at `offset` of a stream; the read-back half of
/// read-modify-write.
pub(crate) fn read_stream(extents: &[Extent], offset: u64, buf: &mut [u8]) -> Result<(), JsError> {
    let extent = extent_for_offset(extents, offset)?;
    let mut file = File::open(&extent.path)?;
    file.seek(SeekFrom::Start(offset - extent.start))?;
    file.read_exact(buf)?;
    Ok(())
}

/// Write one frame: the first `fold` traces and headers, then the map entry, then
/// the status flag when this is the first data in the dataset.
pub(crate) fn write_frame(
    ds: &mut JseisDataset,
    frame: u64,
    trcs: &[f32],
    hdrs: &[u8],
    fold: usize,
) -> Result<(), JsError> {
    let ns = ds.metadata.samples_per_trace();
    let tpf = ds.metadata.traces_per_frame();
    let hl = ds.metadata.header_record_length();
    if fold > tpf {
        return Err(JsError::PreconditionViolated {
            msg: format!("fold {} exceeds {} traces per frame", fold, tpf),
        });
    }
    if trcs.len() < fold * ns || hdrs.len() < fold * hl {
        return Err(JsError::PreconditionViolated {
            msg: "frame buffers do not cover the fold".to_string(),
        });
    }

    if fold > 0 {
        let record = ds.compressor.record_length() as u64;
        let mut raw = ds.compressor.alloc_frame_buf(fold);
        ds.compressor.pack_frame(trcs, fold, &mut raw)?;
        write_stream(&ds.trace_extents, (frame - 1) * tpf as u64 * record, &raw)?;

        let hoffset = (frame - 1) * tpf as u64 * hl as u64;
        write_stream(&ds.header_extents, hoffset, &hdrs[..fold * hl])?;
    }

    ds.map.set_fold(frame, fold)?;

    if fold > 0 && !ds.metadata.has_traces {
        ds.metadata.has_traces = true;
        write_status_properties(&ds.path, true)?;
    }
    Ok(())
}

/// Read one frame back for modification, decoded and left-justified as on disk.
pub(crate) fn read_frame_for_update(
    ds: &JseisDataset,
    frame: u64,
    fold: usize,
    trcs: &mut [f32],
    hdrs: &mut [u8],
) -> Result<(), JsError> {
    let tpf = ds.metadata.traces_per_frame() as u64;
    let record = ds.compressor.record_length() as u64;
    let mut raw = ds.compressor.alloc_frame_buf(fold);
    read_stream(&ds.trace_extents, (frame - 1) * tpf * record, &mut raw)?;
    ds.compressor.unpack_frame(&raw, fold, trcs)?;

    let hl = ds.metadata.header_record_length();
    let hoffset = (frame - 1) * tpf * hl as u64;
    read_stream(&ds.header_extents, hoffset, &mut hdrs[..fold * hl])?;
    Ok(())
}

/// Derive the linear frame index of a left-justified frame from the axis
/// properties of its first live trace.
pub(crate) fn derive_frame_index(ds: &JseisDataset, hdrs: &[u8], fold: usize) -> Result<u64, JsError> {
    if fold == 0 {
        return Err(JsError::PreconditionViolated {
            msg: "an empty frame carries no address to derive".to_string(),
        });
    }
    let le = ds.metadata.byte_order.is_le();
    let hl = ds.metadata.header_record_length();
    let rec = &hdrs[..hl];
    let dictionary = ds.settings.get_dictionary();
    let mut address = Vec::with_capacity(ds.metadata.ndim() - 2);
    for k in 2..ds.metadata.ndim() {
        let prop = ds
            .metadata
            .axis_property(dictionary, k)?
            .ok_or_else(|| JsError::PropertyNotFound {
                label: dictionary
                    .property_for(&ds.metadata.axes[k].label)
                    .to_string(),
            })?;
        address.push(get_int(rec, prop, le)?);
    }
    grid::frame_index(&ds.metadata.axes, &address)
}

/// Fill one header record for a synthesized trace: axis properties from the grid
/// position, trace type live or dead, everything else zero.
pub(crate) fn synthesize_header(
    ds: &JseisDataset,
    rec: &mut [u8],
    frame_address: &[i64],
    trace_logical: i64,
    live: bool,
) -> Result<(), JsError> {
    let le = ds.metadata.byte_order.is_le();
    let dictionary = ds.settings.get_dictionary();
    for b in rec.iter_mut() {
        *b = 0;
    }
    if let Some(prop) = ds.metadata.axis_property(dictionary, 1)? {
        put_int(rec, prop, le, trace_logical)?;
    }
    for k in 2..ds.metadata.ndim() {
        if let Some(prop) = ds.metadata.axis_property(dictionary, k)? {
            put_int(rec, prop, le, frame_address[k - 2])?;
        }
    }
    let trc_type = ds.metadata.layout.require(TRC_TYPE)?;
    let code = if live { TraceType::Live } else { TraceType::Dead };
    put_int(rec, trc_type, le, code.to_i32().unwrap_or(2) as i64)?;
    Ok(())
}

fn expand_selection(
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

/// The bulk range write over trace samples: the mirror of the ranged read.
///
/// Frames fully covered by the selection are assembled from scratch with
/// synthesized headers. A write that is partial in samples or traces does a
/// read-modify-write of the frame; newly touched traces become live, everything
/// the selection does not reach keeps its old content (or stays zero).
pub(crate) fn write_traces_ranged(
    ds: &mut JseisDataset,
    selection: &[DimRange],
    data: &[f32],
) -> Result<(), JsError> {
    let indices = expand_selection(ds, selection)?;
    let expected: usize = indices.iter().map(Vec::len).product();
    if data.len() != expected {
        return Err(JsError::PreconditionViolated {
            msg: format!("selection covers {} samples, data holds {}", expected, data.len()),
        });
    }

    let ns = ds.metadata.samples_per_trace();
    let tpf = ds.metadata.traces_per_frame();
    let hl = ds.metadata.header_record_length();
    let le = ds.metadata.byte_order.is_le();
    let samples = indices[0].clone();
    let traces = indices[1].clone();
    let frame_slab = samples.len() * traces.len();
    let full_cover = samples.len() == ns && traces.len() == tpf;

    let trc_type_prop = ds.metadata.layout.require(TRC_TYPE)?.clone();
    let trace_axis = ds.metadata.axes[1].clone();

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
        let frame_address = grid::frame_address(&ds.metadata.axes, frame);

        if full_cover {
            for c in 0..tpf {
                synthesize_header(
                    ds,
                    &mut frame_hdrs[c * hl..(c + 1) * hl],
                    &frame_address,
                    grid::grid_to_logical(&trace_axis, c + 1),
                    true,
                )?;
            }
        } else {
            let fold = ds.map.fold(frame)?;
            if fold > 0 {
                read_frame_for_update(ds, frame, fold, &mut frame_trcs, &mut frame_hdrs)?;
                let prop = ds.trace_axis_property()?.clone();
                grid::regularize(
                    &ds.metadata.layout,
                    &prop,
                    &trace_axis,
                    le,
                    ns,
                    tpf,
                    fold,
                    &mut frame_trcs,
                    &mut frame_hdrs,
                )?;
            } else {
                for s in frame_trcs.iter_mut() {
                    *s = 0.0;
                }
                for c in 0..tpf {
                    synthesize_header(
                        ds,
                        &mut frame_hdrs[c * hl..(c + 1) * hl],
                        &frame_address,
                        grid::grid_to_logical(&trace_axis, c + 1),
                        false,
                    )?;
                }
            }
        }

        for (tj, tg) in traces.iter().enumerate() {
            let col = tg - 1;
            if !full_cover {
                let rec = &mut frame_hdrs[col * hl..(col + 1) * hl];
                let t = TraceType::new(get_int(rec, &trc_type_prop, le)? as i32);
                if t != TraceType::Live {
                    synthesize_header(
                        ds,
                        rec,
                        &frame_address,
                        grid::grid_to_logical(&trace_axis, *tg),
                        true,
                    )?;
                }
            }
            for (sj, sg) in samples.iter().enumerate() {
                frame_trcs[col * ns + (sg - 1)] = data[slot * frame_slab + tj * samples.len() + sj];
            }
        }

        let fold = grid::left_justify(
            &ds.metadata.layout,
            le,
            ns,
            tpf,
            &mut frame_trcs,
            &mut frame_hdrs,
        )?;
        write_frame(ds, frame, &frame_trcs, &frame_hdrs, fold)?;
        slot += 1;

        let mut k = 0;
        loop {
            if k == odometer.len() {
                return Ok(());
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
