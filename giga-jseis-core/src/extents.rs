// Copyright (C) 2026 by GiGa infosystems
//! Extent layout: how the trace and header byte streams are split across files.
//!
//! Each stream (all-trace-data, all-header-data) is cut into fixed-size extent files
//! named `TraceFile0, TraceFile1, ...` and `TraceHeaders0, ...`. Every extent but the
//! last has the same capacity, which is what makes the offset-to-extent lookup a
//! single division. Extent directories are spread round-robin over the secondary
//! storage roots.
use crate::errors::*;

use std::env;
use std::path::{Path, PathBuf};

/// The environment variables that rebase a dataset path onto a secondary root.
pub const DATA_HOME_VARS: [&str; 2] = ["JAVASEIS_DATA_HOME", "PROMAX_DATA_HOME"];

const EXTENT_TARGET_BYTES: u64 = 2 * 1024 * 1024 * 1024;
const MAX_EXTENTS: u64 = 256;

/// One extent file of a byte stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Extent {
    /// File name, e.g. `TraceFile3`.
    pub name: String,
    /// Full path of the extent file.
    pub path: PathBuf,
    /// Position of the extent in the stream.
    pub index: usize,
    /// Byte offset of the extent's first byte in the logical stream.
    pub start: u64,
    /// Byte capacity.
    pub size: u64,
}

/// The default extent count for a stream of `total_bytes`, aiming for roughly 2 GiB
/// per extent, never more than 256 extents and never more extents than frames.
pub fn extent_count(total_bytes: u64, total_frames: u64) -> usize {
    let n = 10 + ceil_div(total_bytes, EXTENT_TARGET_BYTES);
    n.clamp(1, MAX_EXTENTS).min(total_frames.max(1)) as usize
}

/// The uniform extent capacity: a whole number of frames per extent.
pub fn extent_size(frames: u64, nextents: usize, traces_per_frame: u64, record_length: u64) -> u64 {
    ceil_div(frames, nextents as u64) * traces_per_frame * record_length
}

fn ceil_div(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}

/// Lay out the extents of one stream.
///
/// `secondaries` are the storage roots from `VirtualFolders.xml`; extent `k` is
/// assigned `secondaries[k % n]`. The extent count may come out lower than asked
/// for when the per-extent frame rounding already covers the stream.
pub fn build_extents(
    base_name: &str,
    dataset_path: &Path,
    secondaries: &[PathBuf],
    nextents: usize,
    size: u64,
    total_bytes: u64,
) -> Result<Vec<Extent>, JsError> {
    if size == 0 || secondaries.is_empty() {
        return Err(JsError::MalformedMetadata {
            msg: format!("extent set of '{}' has no capacity or no folders", base_name),
        });
    }
    let nextents = (nextents as u64).min(ceil_div(total_bytes, size)) as usize;
    let mut extents = Vec::with_capacity(nextents);
    for index in 0..nextents {
        let start = index as u64 * size;
        let name = format!("{}{}", base_name, index);
        let dir = extent_dir(&secondaries[index % secondaries.len()], dataset_path)?;
        extents.push(Extent {
            path: dir.join(&name),
            name,
            index,
            start,
            size: size.min(total_bytes - start),
        });
    }
    Ok(extents)
}

/// Find the extent holding a stream offset. Relies on all extents but the last
/// having the same capacity.
pub fn extent_for_offset(extents: &[Extent], offset: u64) -> Result<&Extent, JsError> {
    let first = extents.first().ok_or_else(|| JsError::MalformedMetadata {
        msg: "dataset has no extents".to_string(),
    })?;
    extents
        .get((offset / first.size) as usize)
        .ok_or_else(|| JsError::PreconditionViolated {
            msg: format!("byte offset {} lies beyond the last extent", offset),
        })
}

/// Resolve the extent directory for one secondary root.
///
/// A secondary of `.` keeps extents under the primary directory. Any other root
/// either rebases the dataset path via `JAVASEIS_DATA_HOME`/`PROMAX_DATA_HOME`, or
/// has the dataset path appended as a relative path. The environment is consulted
/// per call on purpose; a cached value would outlive a changed configuration.
pub fn extent_dir(secondary: &Path, dataset_path: &Path) -> Result<PathBuf, JsError> {
    if secondary == Path::new(".") {
        return absolute_path(dataset_path);
    }
    let dataset_path = absolute_path(dataset_path)?;
    for var in DATA_HOME_VARS.iter() {
        let home = match env::var(var) {
            Ok(h) if !h.is_empty() => h,
            _ => continue,
        };
        return match dataset_path.strip_prefix(&home) {
            Ok(rest) => Ok(secondary.join(rest)),
            Err(_) => Err(JsError::EnvironmentMisconfigured {
                msg: format!(
                    "{}={} is not a prefix of dataset path {}",
                    var,
                    home,
                    dataset_path.display()
                ),
            }),
        };
    }
    let mut rel = dataset_path.as_path();
    if let Ok(stripped) = rel.strip_prefix("/") {
        rel = stripped;
    }
    Ok(secondary.join(rel))
}

/// Absolutize a path against the working directory without touching the filesystem.
pub fn absolute_path(path: &Path) -> Result<PathBuf, JsError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}
