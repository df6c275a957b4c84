//! Similar-to cloning, range I/O, and the copy/move/empty/remove lifecycle.
use super::*;
use crate::JsError;
use giga_jseis_core::enums::{ByteOrder, PropertyFormat};
use giga_jseis_core::{DataProperty, Geometry, PropertyDef};

fn survey_geometry() -> Geometry {
    Geometry {
        min_i_line: 1,
        max_i_line: 10,
        min_x_line: 1,
        max_x_line: 64,
        x_i_line1_start: 100.0,
        y_i_line1_start: 200.0,
        x_i_line1_end: 1700.0,
        y_i_line1_end: 200.0,
        x_x_line1_end: 100.0,
        y_x_line1_end: 650.0,
    }
}

#[test]
fn similar_to_with_property_edits() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let a_path = dir.path().join("a.js");
    let b_path = dir.path().join("b.js");

    let mut opts = options(vec![128, 64, 10]);
    opts.set_geometry(survey_geometry());
    opts.add_data_property(DataProperty::new("Stacked", "boolean", "true"));
    let a = JseisDataset::create(&a_path, opts).unwrap();
    let a_header_len = a.header_length();
    drop(a);

    let a_in = giga_jseis_in::JseisDataset::open(&a_path).unwrap();
    let mut b_opts = CreateOptions::similar_to(a_in.get_metadata());
    b_opts.add_property(PropertyDef::scalar("CDP", "CDP bin number", PropertyFormat::Int32));
    b_opts.remove_property("SKEWSTAT");
    let b = JseisDataset::create(&b_path, b_opts).unwrap();

    // CDP (4 bytes) in, SKEWSTAT (4 bytes) out.
    assert_eq!(b.header_length(), a_header_len + 4 - 4);
    assert!(b.header_layout().contains("CDP"));
    assert!(!b.header_layout().contains("SKEWSTAT"));
    drop(b);

    // A is untouched, B matches A everywhere the edits did not reach.
    let a_in = giga_jseis_in::JseisDataset::open(&a_path).unwrap();
    let b_in = giga_jseis_in::JseisDataset::open(&b_path).unwrap();
    assert!(a_in.header_layout().contains("SKEWSTAT"));
    assert_eq!(a_in.header_length(), a_header_len);
    assert_eq!(a_in.axes(), b_in.axes());
    assert_eq!(a_in.trace_format(), b_in.trace_format());
    assert_eq!(a_in.byte_order(), b_in.byte_order());
    assert_eq!(a_in.geometry(), b_in.geometry());
    assert_eq!(a_in.data_properties(), b_in.data_properties());
    assert_eq!(
        a_in.data_property("Stacked").unwrap().value,
        "true"
    );
}

#[test]
fn property_edits_exclude_explicit_replacement() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let mut opts = options(vec![16, 4, 2]);
    opts.set_properties(vec![PropertyDef::scalar(
        "CDP",
        "CDP bin number",
        PropertyFormat::Int32,
    )]);
    opts.remove_property("SKEWSTAT");
    let err = JseisDataset::create(dir.path().join("x.js"), opts).unwrap_err();
    assert!(matches!(err, JsError::PreconditionViolated { .. }));

    // Removing a label that matches nothing is a caller mistake.
    let mut opts = options(vec![16, 4, 2]);
    opts.remove_property("NO_SUCH_FIELD");
    let err = JseisDataset::create(dir.path().join("y.js"), opts).unwrap_err();
    assert!(matches!(err, JsError::PropertyNotFound { .. }));
}

#[test]
fn range_write_then_read() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("ranges.js");
    let mut out = JseisDataset::create(&path, options(vec![8, 4, 3])).unwrap();

    // Whole-cube write through the range path.
    let all = vec![DimRange::All, DimRange::All, DimRange::All];
    let cube: Vec<f32> = (0..8 * 4 * 3).map(|v| v as f32).collect();
    out.write_traces(&all, &cube).unwrap();
    drop(out);

    let mut input = giga_jseis_in::JseisDataset::open(&path).unwrap();
    assert_eq!(input.selection_dims(&all).unwrap(), vec![8, 4, 3]);
    let back = input.read_traces(&all).unwrap();
    assert_eq!(back, cube);

    // A window: samples 3..=5, trace 2, frames 1 and 3.
    let window = vec![
        DimRange::Stepped { first: 3, last: 5, step: 1 },
        DimRange::One(2),
        DimRange::Stepped { first: 1, last: 3, step: 2 },
    ];
    assert_eq!(input.selection_dims(&window).unwrap(), vec![3, 1, 2]);
    let got = input.read_traces(&window).unwrap();
    let expect: Vec<f32> = vec![
        // Frame 1, trace 2 (0-based column 1), samples 3..=5 (0-based 2..=4).
        cube[8 + 2], cube[8 + 3], cube[8 + 4],
        // Frame 3.
        cube[2 * 32 + 8 + 2], cube[2 * 32 + 8 + 3], cube[2 * 32 + 8 + 4],
    ];
    assert_eq!(got, expect);
    drop(input);

    // Partial write: read-modify-write of frame 2, trace 4, all samples.
    let mut out = JseisDataset::open(&path).unwrap();
    let sel = vec![DimRange::All, DimRange::One(4), DimRange::One(2)];
    out.write_traces(&sel, &[9.0; 8]).unwrap();
    assert_eq!(out.fold_at(&[2]).unwrap(), 4);
    drop(out);

    let mut input = giga_jseis_in::JseisDataset::open(&path).unwrap();
    let frame2 = input
        .read_traces(&[DimRange::All, DimRange::All, DimRange::One(2)])
        .unwrap();
    for t in 0..4usize {
        for s in 0..8usize {
            let expect = if t == 3 { 9.0 } else { cube[32 + t * 8 + s] };
            assert_eq!(frame2[t * 8 + s], expect, "trace {} sample {}", t, s);
        }
    }
}

#[test]
fn partial_write_into_an_empty_frame() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("partial.js");
    let mut out = JseisDataset::create(&path, options(vec![8, 4, 2])).unwrap();

    // Nothing exists in frame 2 yet; only trace 3 becomes live.
    let sel = vec![
        DimRange::Stepped { first: 2, last: 4, step: 2 },
        DimRange::One(3),
        DimRange::One(2),
    ];
    out.write_traces(&sel, &[5.0, 6.0]).unwrap();
    assert_eq!(out.fold_at(&[2]).unwrap(), 1);
    drop(out);

    let mut input = giga_jseis_in::JseisDataset::open(&path).unwrap();
    let frame = input
        .read_traces(&[DimRange::All, DimRange::All, DimRange::One(2)])
        .unwrap();
    let mut expect = vec![0f32; 32];
    // Trace 3 (column 2), samples 2 and 4 (0-based 1 and 3); holes stay zero.
    expect[2 * 8 + 1] = 5.0;
    expect[2 * 8 + 3] = 6.0;
    assert_eq!(frame, expect);
}

#[test]
fn copy_move_empty_remove() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let src_path = dir.path().join("src.js");
    let copy_path = dir.path().join("copy.js");
    let moved_path = dir.path().join("moved.js");

    let mut out = JseisDataset::create(&src_path, options(vec![32, 16, 4])).unwrap();
    write_full_frame(&mut out, &[2]);
    drop(out);

    // Copy preserves frame placement and data.
    let mut src = giga_jseis_in::JseisDataset::open(&src_path).unwrap();
    let copied = crate::copy_dataset(&mut src, &copy_path).unwrap();
    drop(copied);
    drop(src);
    let mut copy_in = giga_jseis_in::JseisDataset::open(&copy_path).unwrap();
    assert_eq!(copy_in.fold_at(&[2]).unwrap(), 16);
    assert_eq!(copy_in.fold_at(&[1]).unwrap(), 0);
    let (mut trcs, mut hdrs) = copy_in.alloc_frame();
    assert_eq!(copy_in.read_frame_at(&[2], &mut trcs, &mut hdrs).unwrap(), 16);
    assert_eq!(trcs[0], 0.0);
    assert_eq!(trcs[32], 100.0);
    drop(copy_in);

    // Move = copy + remove.
    crate::move_dataset(&copy_path, &moved_path).unwrap();
    assert!(!copy_path.exists());
    let mut moved = giga_jseis_in::JseisDataset::open(&moved_path).unwrap();
    assert_eq!(moved.fold_at(&[2]).unwrap(), 16);
    drop(moved);

    // Empty keeps the sidecars but drops every fold and data file.
    let mut writable = JseisDataset::open(&src_path).unwrap();
    writable.empty().unwrap();
    assert!(!writable.has_traces());
    for frame in 1..=4u64 {
        assert_eq!(writable.fold(frame).unwrap(), 0);
    }
    assert!(!src_path.join("TraceFile0").exists());
    assert!(src_path.join("FileProperties.xml").exists());
    drop(writable);
    let input = giga_jseis_in::JseisDataset::open(&src_path).unwrap();
    assert!(!input.has_traces());
    drop(input);

    // Remove deletes the directory outright.
    crate::remove_dataset(&src_path).unwrap();
    assert!(!src_path.exists());
    crate::remove_dataset(&moved_path).unwrap();
    assert!(!moved_path.exists());
}

#[test]
fn big_endian_headers_roundtrip() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("be.js");
    let mut opts = options(vec![16, 8, 2]);
    opts.set_byte_order(ByteOrder::BigEndian);
    let mut out = JseisDataset::create(&path, opts).unwrap();
    write_full_frame(&mut out, &[2]);
    drop(out);

    let mut input = giga_jseis_in::JseisDataset::open(&path).unwrap();
    assert_eq!(input.byte_order(), ByteOrder::BigEndian);
    let (mut trcs, mut hdrs) = input.alloc_frame();
    assert_eq!(input.read_frame_at(&[2], &mut trcs, &mut hdrs).unwrap(), 8);
    let hl = input.header_length();
    let prop = input.trace_axis_property().unwrap();
    // Header fields decode through the declared byte order.
    assert_eq!(get_int(&hdrs[..hl], prop, false).unwrap(), 1);
    assert_eq!(get_int(&hdrs[hl..2 * hl], prop, false).unwrap(), 2);
}
