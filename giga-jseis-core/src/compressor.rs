// Copyright (C) 2026 by GiGa infosystems
//! The trace codec: between `f32` sample frames and on-disk trace records.
//!
//! Two record layouts are handled end-to-end. `FLOAT` records are the little-endian
//! sample bytes verbatim. `COMPRESSED_INT16` records carry an 8-byte prefix
//! `{i32 scaler exponent, i32 reserved}` followed by the samples quantised to `i16`
//! with a per-trace power-of-two scale chosen so the trace peak maps to the int16
//! full scale.
use crate::enums::TraceFormat;
use crate::errors::*;

/// Byte length of the per-trace prefix of the compressed formats.
pub const COMPRESSED_PREFIX_LEN: usize = 8;

/// Largest quantised magnitude. One code point below `i16::MAX` so that rounding
/// at the peak cannot overflow.
const INT16_FULL_SCALE: f32 = 32766.0;

/// Exponents outside this range are clamped on decode; a corrupted prefix must not
/// be able to produce an infinite scale.
const EXPONENT_LIMIT: i32 = 126;

/// Packs and unpacks one frame of traces for a fixed sample format.
#[derive(Debug, Clone)]
pub struct TraceCompressor {
    format: TraceFormat,
    samples_per_trace: usize,
}

impl TraceCompressor {
    pub fn new(format: TraceFormat, samples_per_trace: usize) -> Self {
        TraceCompressor {
            format,
            samples_per_trace,
        }
    }

    pub fn format(&self) -> TraceFormat {
        self.format
    }

    /// The on-disk byte length of one trace record.
    pub fn record_length(&self) -> usize {
        self.format.record_length(self.samples_per_trace)
    }

    /// Allocate a zeroed byte buffer sized for `fold` trace records of the active
    /// format.
    pub fn alloc_frame_buf(&self, fold: usize) -> Vec<u8> {
        vec![0u8; self.record_length() * fold]
    }

    /// Encode the first `fold` traces of a frame into `out`, which must hold at
    /// least `fold` records. Returns the number of bytes written.
    pub fn pack_frame(&self, trcs: &[f32], fold: usize, out: &mut [u8]) -> Result<usize, JsError> {
        let ns = self.samples_per_trace;
        let rl = self.record_length();
        if trcs.len() < fold * ns {
            return Err(JsError::ShortRead {
                a: trcs.len(),
                b: fold * ns,
            });
        }
        if out.len() < fold * rl {
            return Err(JsError::ShortRead {
                a: out.len(),
                b: fold * rl,
            });
        }
        match self.format {
            TraceFormat::Float32 => {
                for (trace, rec) in trcs[..fold * ns].chunks(ns).zip(out.chunks_mut(rl)) {
                    for (s, b) in trace.iter().zip(rec.chunks_mut(4)) {
                        b.copy_from_slice(&s.to_le_bytes());
                    }
                }
            }
            TraceFormat::CompressedInt16 => {
                for (trace, rec) in trcs[..fold * ns].chunks(ns).zip(out.chunks_mut(rl)) {
                    pack_trace_int16(trace, rec);
                }
            }
            f => return Err(JsError::UnsupportedTraceFormat { format: f }),
        }
        Ok(fold * rl)
    }

    /// Decode `fold` trace records from `raw` into the first `fold` traces of `trcs`.
    pub fn unpack_frame(&self, raw: &[u8], fold: usize, trcs: &mut [f32]) -> Result<(), JsError> {
        let ns = self.samples_per_trace;
        let rl = self.record_length();
        if raw.len() < fold * rl {
            return Err(JsError::ShortRead {
                a: raw.len(),
                b: fold * rl,
            });
        }
        if trcs.len() < fold * ns {
            return Err(JsError::ShortRead {
                a: trcs.len() * 4,
                b: fold * ns * 4,
            });
        }
        match self.format {
            TraceFormat::Float32 => {
                for (rec, trace) in raw[..fold * rl].chunks(rl).zip(trcs.chunks_mut(ns)) {
                    for (b, s) in rec.chunks(4).zip(trace.iter_mut()) {
                        *s = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
                    }
                }
            }
            TraceFormat::CompressedInt16 => {
                for (rec, trace) in raw[..fold * rl].chunks(rl).zip(trcs.chunks_mut(ns)) {
                    unpack_trace_int16(rec, trace);
                }
            }
            f => return Err(JsError::UnsupportedTraceFormat { format: f }),
        }
        Ok(())
    }
}

/// Pick the exponent for one trace: the largest `e` with `peak * 2^e` inside the
/// int16 full scale. An all-zero (or all non-finite) trace gets exponent 0.
fn choose_exponent(peak: f32) -> i32 {
    if peak <= 0.0 || !peak.is_finite() {
        return 0;
    }
    let e = (INT16_FULL_SCALE / peak).log2().floor() as i32;
    e.clamp(-EXPONENT_LIMIT, EXPONENT_LIMIT)
}

fn pack_trace_int16(trace: &[f32], rec: &mut [u8]) {
    let peak = trace
        .iter()
        .filter(|s| s.is_finite())
        .fold(0f32, |p, s| p.max(s.abs()));
    let e = choose_exponent(peak);
    let scale = 2f32.powi(e);

    rec[0..4].copy_from_slice(&e.to_le_bytes());
    rec[4..8].copy_from_slice(&0i32.to_le_bytes());
    for (s, b) in trace.iter().zip(rec[COMPRESSED_PREFIX_LEN..].chunks_mut(2)) {
        let q = if s.is_finite() {
            (s * scale).round().clamp(-32767.0, 32767.0) as i16
        } else {
            0
        };
        b.copy_from_slice(&q.to_le_bytes());
    }
}

fn unpack_trace_int16(rec: &[u8], trace: &mut [f32]) {
    let e = i32::from_le_bytes([rec[0], rec[1], rec[2], rec[3]])
        .clamp(-EXPONENT_LIMIT, EXPONENT_LIMIT);
    let scale = 2f32.powi(-e);
    for (b, s) in rec[COMPRESSED_PREFIX_LEN..].chunks(2).zip(trace.iter_mut()) {
        *s = i16::from_le_bytes([b[0], b[1]]) as f32 * scale;
    }
}
