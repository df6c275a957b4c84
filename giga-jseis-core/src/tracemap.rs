// Copyright (C) 2026 by GiGa infosystems
//! The fold map of a mapped dataset: one `i32` live-trace count per frame.
//!
//! The on-disk image is a flat little-endian `i32` array in a file named `TraceMap`
//! under the primary directory. In memory a single volume's worth of entries is
//! cached; touching a frame of another volume evicts the cache and pages the other
//! volume in. Frames are 1-based at this API, byte offsets inside the file 0-based.
use crate::errors::*;

use log::trace;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// The file name of the fold map inside the primary directory.
pub const TRACE_MAP_FILE: &str = "TraceMap";

/// The fold map of one dataset.
///
/// An unmapped dataset carries no map file; every frame then reports the full
/// trace count and fold updates are ignored.
#[derive(Debug)]
pub struct TraceMap {
    file: Option<File>,
    frames_per_volume: usize,
    total_frames: u64,
    traces_per_frame: usize,
    /// 0-based index of the cached volume.
    cached_volume: Option<usize>,
    cache: Vec<i32>,
    volume_loads: usize,
}

impl TraceMap {
    /// Open the map of an existing dataset. `writable` governs whether
    /// [`Self::set_fold`] may touch the file.
    pub fn open(
        primary: &Path,
        frames_per_volume: usize,
        total_frames: u64,
        traces_per_frame: usize,
        mapped: bool,
        writable: bool,
    ) -> Result<Self, JsError> {
        let file = if mapped {
            let f = OpenOptions::new()
                .read(true)
                .write(writable)
                .open(primary.join(TRACE_MAP_FILE))?;
            Some(f)
        } else {
            None
        };
        Ok(TraceMap {
            file,
            frames_per_volume,
            total_frames,
            traces_per_frame,
            cached_volume: None,
            cache: Vec::new(),
            volume_loads: 0,
        })
    }

    /// Write a fresh all-zero map for `total_frames` frames.
    pub fn initialize(primary: &Path, total_frames: u64) -> Result<(), JsError> {
        let mut f = File::create(primary.join(TRACE_MAP_FILE))?;
        f.write_all(&vec![0u8; total_frames as usize * 4])?;
        Ok(())
    }

    /// The live-trace count of a 1-based frame.
    ///
    /// An out-of-range entry (negative, or above the trace count) reads as 0, so a
    /// partially-written frame stays invisible.
    pub fn fold(&mut self, frame: u64) -> Result<usize, JsError> {
        self.check_frame(frame)?;
        if self.file.is_none() {
            return Ok(self.traces_per_frame);
        }
        let volume = (frame as usize - 1) / self.frames_per_volume;
        if self.cached_volume != Some(volume) {
            self.page_in(volume)?;
        }
        let f = self.cache[(frame as usize - 1) % self.frames_per_volume];
        if f < 0 || f as usize > self.traces_per_frame {
            return Ok(0);
        }
        Ok(f as usize)
    }

    /// Record the fold of a 1-based frame. Ignored for unmapped datasets.
    pub fn set_fold(&mut self, frame: u64, fold: usize) -> Result<(), JsError> {
        self.check_frame(frame)?;
        let file = match self.file.as_mut() {
            Some(f) => f,
            None => return Ok(()),
        };
        file.seek(SeekFrom::Start((frame - 1) * 4))?;
        file.write_all(&(fold as i32).to_le_bytes())?;
        let volume = (frame as usize - 1) / self.frames_per_volume;
        if self.cached_volume == Some(volume) {
            self.cache[(frame as usize - 1) % self.frames_per_volume] = fold as i32;
        }
        Ok(())
    }

    /// Zero every entry of the map, in place, and drop the cache.
    pub fn zero(&mut self) -> Result<(), JsError> {
        if let Some(f) = self.file.as_mut() {
            f.seek(SeekFrom::Start(0))?;
            f.write_all(&vec![0u8; self.total_frames as usize * 4])?;
        }
        self.cached_volume = None;
        self.cache.clear();
        Ok(())
    }

    /// How often a volume has been paged in from disk. Instrumentation for cache
    /// behaviour; the counter never wraps in realistic use.
    pub fn volume_loads(&self) -> usize {
        self.volume_loads
    }

    fn check_frame(&self, frame: u64) -> Result<(), JsError> {
        if frame == 0 || frame > self.total_frames {
            return Err(JsError::PreconditionViolated {
                msg: format!(
                    "frame {} outside of dataset with {} frames",
                    frame, self.total_frames
                ),
            });
        }
        Ok(())
    }

    fn page_in(&mut self, volume: usize) -> Result<(), JsError> {
        let file = self.file.as_mut().expect("paging without a map file");
        trace!("paging trace map volume {}", volume);
        let n = self.frames_per_volume;
        let mut bytes = vec![0u8; n * 4];
        file.seek(SeekFrom::Start((volume * n * 4) as u64))?;
        file.read_exact(&mut bytes)?;
        self.cache.clear();
        self.cache
            .extend(bytes.chunks(4).map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]])));
        self.cached_volume = Some(volume);
        self.volume_loads += 1;
        Ok(())
    }
}
