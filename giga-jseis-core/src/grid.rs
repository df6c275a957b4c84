//! N-dimensional logical addressing, left-justification and regularization.
//!
//! Callers address the dataset in logical coordinates, which honour each axis'
//! logical origin and increment. Internally an address reduces to a 1-based grid
//! index per axis, and the grid indices of the frame-and-above axes reduce to a
//! single 1-based linear frame index, column-major.
use crate::bitconverter::{get_int, put_int};
use crate::errors::*;
use crate::properties::{HeaderLayout, TraceProperty, TRC_TYPE};
use crate::Axis;

use num::ToPrimitive;

/// A per-dimension selector for range I/O, in logical coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DimRange {
    /// Every bin of the axis.
    All,
    /// A single logical index.
    One(i64),
    /// An arithmetic progression of logical indices, `last` inclusive.
    Stepped { first: i64, last: i64, step: i64 },
}

impl DimRange {
    /// Expand the selector into 1-based grid indices along `axis`.
    pub fn grid_indices(&self, axis: &Axis, axis_index: usize) -> Result<Vec<usize>, JsError> {
        match *self {
            DimRange::All => Ok((1..=axis.length).collect()),
            DimRange::One(v) => Ok(vec![logical_to_grid(axis, axis_index, v)?]),
            DimRange::Stepped { first, last, step } => {
                if step == 0 {
                    return Err(JsError::PreconditionViolated {
                        msg: format!("selector of axis {} has step 0", axis_index),
                    });
                }
                let mut out = Vec::new();
                let mut v = first;
                while (step > 0 && v <= last) || (step < 0 && v >= last) {
                    out.push(logical_to_grid(axis, axis_index, v)?);
                    v += step;
                }
                Ok(out)
            }
        }
    }
}

/// Convert a logical index on one axis to its 1-based grid index.
pub fn logical_to_grid(axis: &Axis, axis_index: usize, v: i64) -> Result<usize, JsError> {
    let d = v - axis.logical_origin;
    if d % axis.logical_delta != 0 {
        return Err(JsError::AddressOutOfGrid {
            axis: axis_index,
            value: v,
        });
    }
    let g = d / axis.logical_delta;
    if g < 0 || g >= axis.length as i64 {
        return Err(JsError::AddressOutOfGrid {
            axis: axis_index,
            value: v,
        });
    }
    Ok(g as usize + 1)
}

/// Convert a 1-based grid index on one axis back to its logical index.
pub fn grid_to_logical(axis: &Axis, g: usize) -> i64 {
    axis.logical_origin + (g as i64 - 1) * axis.logical_delta
}

/// Convert a logical address over the frame-and-above axes (`axes[2..]`) to the
/// 1-based linear frame index.
/// ```
/// # use giga_jseis_core::{Axis, grid};
/// let axes = vec![
///     Axis::with_length("TIME", 128),
///     Axis::with_length("TRACE", 64),
///     Axis::with_length("FRAME", 10),
///     Axis::with_length("VOLUME", 4),
/// ];
/// assert_eq!(grid::frame_index(&axes, &[1, 1]).unwrap(), 1);
/// assert_eq!(grid::frame_index(&axes, &[3, 2]).unwrap(), 13);
/// assert_eq!(grid::frame_address(&axes, 13), vec![3, 2]);
/// ```
pub fn frame_index(axes: &[Axis], address: &[i64]) -> Result<u64, JsError> {
    if address.len() + 2 != axes.len() {
        return Err(JsError::PreconditionViolated {
            msg: format!(
                "address has {} entries but the dataset has {} dimensions",
                address.len(),
                axes.len()
            ),
        });
    }
    let mut frame = 0u64;
    let mut stride = 1u64;
    for (k, v) in address.iter().enumerate() {
        let g = logical_to_grid(&axes[k + 2], k + 2, *v)?;
        frame += (g as u64 - 1) * stride;
        stride *= axes[k + 2].length as u64;
    }
    Ok(frame + 1)
}

/// Convert a 1-based linear frame index back to its logical address, column-major.
pub fn frame_address(axes: &[Axis], frame: u64) -> Vec<i64> {
    let mut rest = frame - 1;
    let mut address = Vec::with_capacity(axes.len() - 2);
    for axis in axes[2..].iter() {
        let g = (rest % axis.length as u64) as usize + 1;
        rest /= axis.length as u64;
        address.push(grid_to_logical(axis, g));
    }
    address
}

/// The number of frames per volume and in the whole dataset.
pub fn total_frames(axes: &[Axis]) -> u64 {
    axes[2..].iter().map(|a| a.length as u64).product()
}

/// Move every live trace of a frame leftward, stable, pushing dead traces to the
/// right end, and swap the header records along. Returns the fold.
///
/// The discriminator is the stock TRC_TYPE field. A frame whose fold equals the
/// trace count comes back untouched.
pub fn left_justify(
    layout: &HeaderLayout,
    le: bool,
    samples_per_trace: usize,
    traces_per_frame: usize,
    trcs: &mut [f32],
    hdrs: &mut [u8],
) -> Result<usize, JsError> {
    let trc_type = layout.require(TRC_TYPE)?;
    let hl = layout.record_length();
    let ns = samples_per_trace;
    let mut write = 0usize;
    for i in 0..traces_per_frame {
        let rec = &hdrs[i * hl..(i + 1) * hl];
        if crate::enums::TraceType::new(get_int(rec, trc_type, le)? as i32)
            != crate::enums::TraceType::Live
        {
            continue;
        }
        if i != write {
            for k in 0..ns {
                trcs.swap(write * ns + k, i * ns + k);
            }
            for k in 0..hl {
                hdrs.swap(write * hl + k, i * hl + k);
            }
        }
        write += 1;
    }
    Ok(write)
}

/// Scatter the first `fold` (left-justified, live) traces of a frame back to the
/// columns their indexing property declares, dead-filling every other column.
///
/// `prop` is the indexing property, normally the trace-axis property; `axis` is the
/// trace axis itself. The traces are walked in reverse so a destination column that
/// still holds a to-be-moved live trace is vacated before it is overwritten.
#[allow(clippy::too_many_arguments)]
pub fn regularize(
    layout: &HeaderLayout,
    prop: &TraceProperty,
    axis: &Axis,
    le: bool,
    samples_per_trace: usize,
    traces_per_frame: usize,
    fold: usize,
    trcs: &mut [f32],
    hdrs: &mut [u8],
) -> Result<(), JsError> {
    if fold > traces_per_frame {
        return Err(JsError::PreconditionViolated {
            msg: format!("fold {} exceeds {} traces per frame", fold, traces_per_frame),
        });
    }
    let trc_type = layout.require(TRC_TYPE)?;
    let hl = layout.record_length();
    let ns = samples_per_trace;
    let mut occupied = vec![false; traces_per_frame];

    let live = |hdrs: &[u8], i: usize| -> Result<bool, JsError> {
        let rec = &hdrs[i * hl..(i + 1) * hl];
        Ok(crate::enums::TraceType::new(get_int(rec, trc_type, le)? as i32)
            == crate::enums::TraceType::Live)
    };

    // A left-justified frame has live traces in every one of its first `fold`
    // columns. If some of them are dead, the frame has been regularized before and
    // live traces may legitimately sit beyond the fold; those must survive below.
    let mut left_justified = true;
    for i in 0..fold {
        if !live(hdrs, i)? {
            left_justified = false;
            break;
        }
    }

    // Reverse order, so a destination still holding a to-be-moved live trace is
    // vacated before it is overwritten.
    for i in (0..fold).rev() {
        if !live(hdrs, i)? {
            continue;
        }
        let rec = &hdrs[i * hl..(i + 1) * hl];
        let v = get_int(rec, prop, le)?;
        let dest = logical_to_grid(axis, 1, v)? - 1;
        if dest != i {
            trcs.copy_within(i * ns..(i + 1) * ns, dest * ns);
            hdrs.copy_within(i * hl..(i + 1) * hl, dest * hl);
        }
        occupied[dest] = true;
    }

    for c in 0..traces_per_frame {
        if occupied[c] {
            continue;
        }
        // Everything unclaimed is dead-filled. For input that was regularized
        // before, a live trace still sitting at its declared column stays put; for
        // left-justified input the tail beyond the fold is undefined and anything
        // in it (stale buffer content included) must die.
        if !left_justified && live(hdrs, c)? {
            let rec = &hdrs[c * hl..(c + 1) * hl];
            let v = get_int(rec, prop, le)?;
            if matches!(logical_to_grid(axis, 1, v), Ok(d) if d == c + 1) {
                continue;
            }
        }
        for s in trcs[c * ns..(c + 1) * ns].iter_mut() {
            *s = 0.0;
        }
        let rec = &mut hdrs[c * hl..(c + 1) * hl];
        for b in rec.iter_mut() {
            *b = 0;
        }
        put_int(rec, prop, le, grid_to_logical(axis, c + 1))?;
        let dead = crate::enums::TraceType::Dead.to_i32().unwrap_or(2) as i64;
        put_int(rec, trc_type, le, dead)?;
    }
    Ok(())
}
