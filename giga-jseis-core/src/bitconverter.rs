// Copyright (C) 2026 by GiGa infosystems
//! This submodule deals with reading and writing single header fields inside the
//! fixed-layout trace header record.
//!
//! A header record is a plain byte buffer; a [`TraceProperty`](crate::properties::TraceProperty)
//! names a byte range and a scalar format inside it. The getters and setters here do the
//! bit conversion for that range, honouring the byte order the dataset declares.
use crate::enums::PropertyFormat;
use crate::errors::*;
use crate::properties::{HeaderLayout, TraceProperty};

use num::ToPrimitive;
use std::convert::TryInto;
use tinyvec::TinyVec;

/// This exists to save us a lot of typing.
pub(crate) type TVu8 = TinyVec<[u8; 8]>;

/// A dynamically-typed header field value.
///
/// Scalars come back as their declared format; fields with an element count above one
/// come back as vectors; byte-strings come back trimmed of their NUL padding.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Int16s(Vec<i16>),
    Int32s(Vec<i32>),
    Int64s(Vec<i64>),
    Float32s(Vec<f32>),
    Float64s(Vec<f64>),
    ByteString(String),
}

macro_rules! read_scalar {
    ($ty:ty, $bytes:expr, $le:expr) => {{
        let arr = $bytes.try_into()?;
        if $le {
            <$ty>::from_le_bytes(arr)
        } else {
            <$ty>::from_be_bytes(arr)
        }
    }};
}

macro_rules! write_scalar {
    ($ty:ty, $to:expr, $value:expr, $le:expr) => {{
        let v: $ty = $to(&$value).ok_or_else(|| JsError::BitConversionError {
            msg: format!(
                "Cannot represent {:?} as {}",
                $value,
                std::any::type_name::<$ty>()
            ),
        })?;
        let bytes = if $le { v.to_le_bytes() } else { v.to_be_bytes() };
        TinyVec::from(&bytes[..])
    }};
}

fn field_slice<'a>(rec: &'a [u8], prop: &TraceProperty) -> Result<&'a [u8], JsError> {
    let range = prop.byte_range();
    rec.get(range.clone()).ok_or(JsError::ShortRead {
        a: rec.len(),
        b: range.end,
    })
}

fn field_slice_mut<'a>(rec: &'a mut [u8], prop: &TraceProperty) -> Result<&'a mut [u8], JsError> {
    let range = prop.byte_range();
    let l = rec.len();
    rec.get_mut(range.clone())
        .ok_or(JsError::ShortRead { a: l, b: range.end })
}

/// Convert one value to the bytes of the declared scalar format, with range errors
/// instead of silent wrap-around.
pub(crate) fn scalar_to_bytes<T: ToPrimitive + std::fmt::Debug>(
    value: T,
    format: PropertyFormat,
    le: bool,
) -> Result<TVu8, JsError> {
    let bytes = match format {
        PropertyFormat::Int16 => write_scalar!(i16, ToPrimitive::to_i16, value, le),
        PropertyFormat::Int32 => write_scalar!(i32, ToPrimitive::to_i32, value, le),
        PropertyFormat::Int64 => write_scalar!(i64, ToPrimitive::to_i64, value, le),
        PropertyFormat::Float32 => write_scalar!(f32, ToPrimitive::to_f32, value, le),
        PropertyFormat::Float64 => write_scalar!(f64, ToPrimitive::to_f64, value, le),
        PropertyFormat::ByteString => {
            return Err(JsError::BitConversionError {
                msg: "A byte-string field takes no numeric value.".to_string(),
            })
        }
    };
    Ok(bytes)
}

/// Get an integer header field as `i64`.
///
/// Accepts the three integer formats only; the axis index properties are required to
/// be 32- or 64-bit signed integers, and this is the accessor the addressing code uses.
pub fn get_int(rec: &[u8], prop: &TraceProperty, le: bool) -> Result<i64, JsError> {
    let bytes = field_slice(rec, prop)?;
    let v = match prop.def.format {
        PropertyFormat::Int16 => read_scalar!(i16, bytes, le) as i64,
        PropertyFormat::Int32 => read_scalar!(i32, bytes, le) as i64,
        PropertyFormat::Int64 => read_scalar!(i64, bytes, le),
        f => {
            return Err(JsError::BitConversionError {
                msg: format!("Field '{}' is {}, not an integer.", prop.label(), f),
            })
        }
    };
    Ok(v)
}

/// Set an integer header field from `i64`, converting to the declared format.
pub fn put_int(rec: &mut [u8], prop: &TraceProperty, le: bool, value: i64) -> Result<(), JsError> {
    match prop.def.format {
        PropertyFormat::Int16 | PropertyFormat::Int32 | PropertyFormat::Int64 => {}
        f => {
            return Err(JsError::BitConversionError {
                msg: format!("Field '{}' is {}, not an integer.", prop.label(), f),
            })
        }
    }
    let bytes = scalar_to_bytes(value, prop.def.format, le)?;
    field_slice_mut(rec, prop)?[..bytes.len()].copy_from_slice(&bytes);
    Ok(())
}

/// Get any numeric header field as `f64`.
pub fn get_float(rec: &[u8], prop: &TraceProperty, le: bool) -> Result<f64, JsError> {
    let bytes = field_slice(rec, prop)?;
    let v = match prop.def.format {
        PropertyFormat::Int16 => read_scalar!(i16, bytes, le) as f64,
        PropertyFormat::Int32 => read_scalar!(i32, bytes, le) as f64,
        PropertyFormat::Int64 => read_scalar!(i64, bytes, le) as f64,
        PropertyFormat::Float32 => read_scalar!(f32, bytes, le) as f64,
        PropertyFormat::Float64 => read_scalar!(f64, bytes, le),
        PropertyFormat::ByteString => {
            return Err(JsError::BitConversionError {
                msg: format!("Field '{}' is a byte-string, not numeric.", prop.label()),
            })
        }
    };
    Ok(v)
}

/// Set any numeric header field from `f64`, converting to the declared format.
pub fn put_float(rec: &mut [u8], prop: &TraceProperty, le: bool, value: f64) -> Result<(), JsError> {
    let bytes = scalar_to_bytes(value, prop.def.format, le)?;
    field_slice_mut(rec, prop)?[..bytes.len()].copy_from_slice(&bytes);
    Ok(())
}

/// Get a byte-string field, trimmed of trailing NULs.
pub fn get_string(rec: &[u8], prop: &TraceProperty) -> Result<String, JsError> {
    if prop.def.format != PropertyFormat::ByteString {
        return Err(JsError::BitConversionError {
            msg: format!("Field '{}' is not a byte-string.", prop.label()),
        });
    }
    let mut bytes = field_slice(rec, prop)?.to_vec();
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

/// Set a byte-string field. The string must be shorter than the declared element
/// count; the remainder of the field is NUL-padded.
pub fn put_string(rec: &mut [u8], prop: &TraceProperty, value: &str) -> Result<(), JsError> {
    if prop.def.format != PropertyFormat::ByteString {
        return Err(JsError::BitConversionError {
            msg: format!("Field '{}' is not a byte-string.", prop.label()),
        });
    }
    let bytes = value.as_bytes();
    if bytes.len() >= prop.def.count {
        return Err(JsError::BitConversionError {
            msg: format!(
                "String of {} bytes does not fit field '{}' of {} bytes.",
                bytes.len(),
                prop.label(),
                prop.def.count
            ),
        });
    }
    let field = field_slice_mut(rec, prop)?;
    field[..bytes.len()].copy_from_slice(bytes);
    for b in field[bytes.len()..].iter_mut() {
        *b = 0;
    }
    Ok(())
}

macro_rules! read_vector {
    ($ty:ty, $bytes:expr, $le:expr) => {{
        let mut out = Vec::with_capacity($bytes.len() / std::mem::size_of::<$ty>());
        for chunk in $bytes.chunks(std::mem::size_of::<$ty>()) {
            out.push(read_scalar!($ty, chunk, $le));
        }
        out
    }};
}

/// Get a header field as a dynamically-typed [`HeaderValue`].
pub fn get_value(rec: &[u8], prop: &TraceProperty, le: bool) -> Result<HeaderValue, JsError> {
    use PropertyFormat::*;
    let bytes = field_slice(rec, prop)?;
    let scalar = prop.def.count == 1;
    let v = match (prop.def.format, scalar) {
        (Int16, true) => HeaderValue::Int16(read_scalar!(i16, bytes, le)),
        (Int32, true) => HeaderValue::Int32(read_scalar!(i32, bytes, le)),
        (Int64, true) => HeaderValue::Int64(read_scalar!(i64, bytes, le)),
        (Float32, true) => HeaderValue::Float32(read_scalar!(f32, bytes, le)),
        (Float64, true) => HeaderValue::Float64(read_scalar!(f64, bytes, le)),
        (Int16, false) => HeaderValue::Int16s(read_vector!(i16, bytes, le)),
        (Int32, false) => HeaderValue::Int32s(read_vector!(i32, bytes, le)),
        (Int64, false) => HeaderValue::Int64s(read_vector!(i64, bytes, le)),
        (Float32, false) => HeaderValue::Float32s(read_vector!(f32, bytes, le)),
        (Float64, false) => HeaderValue::Float64s(read_vector!(f64, bytes, le)),
        (ByteString, _) => HeaderValue::ByteString(get_string(rec, prop)?),
    };
    Ok(v)
}

fn put_vector<T: ToPrimitive + Copy + std::fmt::Debug>(
    rec: &mut [u8],
    prop: &TraceProperty,
    le: bool,
    values: &[T],
) -> Result<(), JsError> {
    if values.len() != prop.def.count {
        return Err(JsError::BitConversionError {
            msg: format!(
                "Field '{}' takes {} elements, got {}.",
                prop.label(),
                prop.def.count,
                values.len()
            ),
        });
    }
    let width = prop.def.format.byte_length();
    let field = field_slice_mut(rec, prop)?;
    for (i, v) in values.iter().enumerate() {
        let bytes = scalar_to_bytes(*v, prop.def.format, le)?;
        field[i * width..i * width + width].copy_from_slice(&bytes);
    }
    Ok(())
}

/// Set a header field from a dynamically-typed [`HeaderValue`], converting scalars
/// between numeric formats where the conversion is representable.
pub fn put_value(
    rec: &mut [u8],
    prop: &TraceProperty,
    le: bool,
    value: &HeaderValue,
) -> Result<(), JsError> {
    match value {
        HeaderValue::Int16(v) => put_vector(rec, prop, le, &[*v]),
        HeaderValue::Int32(v) => put_vector(rec, prop, le, &[*v]),
        HeaderValue::Int64(v) => put_vector(rec, prop, le, &[*v]),
        HeaderValue::Float32(v) => put_vector(rec, prop, le, &[*v]),
        HeaderValue::Float64(v) => put_vector(rec, prop, le, &[*v]),
        HeaderValue::Int16s(v) => put_vector(rec, prop, le, v),
        HeaderValue::Int32s(v) => put_vector(rec, prop, le, v),
        HeaderValue::Int64s(v) => put_vector(rec, prop, le, v),
        HeaderValue::Float32s(v) => put_vector(rec, prop, le, v),
        HeaderValue::Float64s(v) => put_vector(rec, prop, le, v),
        HeaderValue::ByteString(s) => put_string(rec, prop, s),
    }
}

/// Copy the fields of one header record into another with a possibly different
/// layout. Only properties whose labels exist on the target are copied; the rest
/// are silently skipped.
pub fn copy_record(
    src_layout: &HeaderLayout,
    src_le: bool,
    src: &[u8],
    dst_layout: &HeaderLayout,
    dst_le: bool,
    dst: &mut [u8],
) -> Result<(), JsError> {
    for prop in src_layout.props() {
        let target = match dst_layout.get(prop.label()) {
            Some(t) => t,
            None => continue,
        };
        if target.def.format == prop.def.format && target.def.count == prop.def.count && src_le == dst_le
        {
            let src_bytes = field_slice(src, prop)?;
            field_slice_mut(dst, target)?.copy_from_slice(src_bytes);
        } else {
            let v = get_value(src, prop, src_le)?;
            put_value(dst, target, dst_le, &v)?;
        }
    }
    Ok(())
}
