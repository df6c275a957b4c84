// Copyright (C) 2026 by GiGa infosystems.
//! Here we write datasets with `giga_jseis_out` and read them back with
//! `giga_jseis_in`, to test that the two stay compatible on disk.
use tempfile;

use crate::{CreateOptions, JseisDataset};
use giga_jseis_core::bitconverter::{get_int, put_int};
use giga_jseis_core::enums::TraceFormat;
use giga_jseis_core::grid::DimRange;
use giga_jseis_core::properties::TRC_TYPE;

mod dataset_lifecycle;
mod frame_roundtrip;
mod sparse_frames;

/// A dataset of `lengths` with everything else at its default.
fn options(lengths: Vec<usize>) -> CreateOptions {
    let mut opts = CreateOptions::default();
    opts.set_axis_lengths(lengths);
    opts
}

/// Fill a frame buffer with the recognisable `100 * trace + sample` ramp.
fn ramp(trcs: &mut [f32], samples: usize) {
    for (t, trace) in trcs.chunks_mut(samples).enumerate() {
        for (s, v) in trace.iter_mut().enumerate() {
            *v = (100 * t + s) as f32;
        }
    }
}

/// Write one full ramp frame at a logical address and hand back the buffers.
fn write_full_frame(ds: &mut JseisDataset, address: &[i64]) -> (Vec<f32>, Vec<u8>) {
    let (mut trcs, mut hdrs) = ds.alloc_frame();
    ramp(&mut trcs, ds.samples_per_trace());
    let fold = ds.traces_per_frame();
    ds.fill_frame_headers(&mut hdrs, address, fold).unwrap();
    ds.write_frame_at(address, &trcs, &hdrs, fold).unwrap();
    (trcs, hdrs)
}
