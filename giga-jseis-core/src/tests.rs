mod properties {
    use crate::enums::PropertyFormat;
    use crate::properties::*;

    #[test]
    fn stock_set_partitions_the_record() {
        let layout = HeaderLayout::assemble(stock_properties());
        assert_eq!(layout.len(), 18);
        // Every byte range starts where the previous one ends, beginning at 0.
        let mut end = 0;
        for p in layout.props() {
            assert_eq!(p.byte_offset, end);
            end += p.def.byte_length();
        }
        assert_eq!(end, layout.record_length());
        assert_eq!(layout.record_length(), 18 * 4);
    }

    #[test]
    fn assemble_drops_duplicates_keeping_the_first() {
        let defs = vec![
            PropertyDef::scalar("A", "first", PropertyFormat::Int32),
            PropertyDef::scalar("B", "second", PropertyFormat::Float64),
            PropertyDef::scalar("A", "again, differently", PropertyFormat::Int64),
        ];
        let layout = HeaderLayout::assemble(defs);
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.get("A").unwrap().def.description, "first");
        assert_eq!(layout.record_length(), 12);
    }

    #[test]
    fn from_entries_rejects_gaps() {
        let entries = vec![
            TraceProperty {
                def: PropertyDef::scalar("A", "", PropertyFormat::Int32),
                byte_offset: 0,
            },
            TraceProperty {
                def: PropertyDef::scalar("B", "", PropertyFormat::Int32),
                byte_offset: 8,
            },
        ];
        assert!(HeaderLayout::from_entries(entries).is_err());
    }

    #[test]
    fn from_entries_accepts_a_permuted_partition() {
        let entries = vec![
            TraceProperty {
                def: PropertyDef::scalar("B", "", PropertyFormat::Float64),
                byte_offset: 4,
            },
            TraceProperty {
                def: PropertyDef::scalar("A", "", PropertyFormat::Int32),
                byte_offset: 0,
            },
        ];
        let layout = HeaderLayout::from_entries(entries).unwrap();
        assert_eq!(layout.record_length(), 12);
        assert_eq!(layout.get("B").unwrap().byte_offset, 4);
    }

    #[test]
    fn equality_is_by_label() {
        let a = PropertyDef::scalar("CDP", "one", PropertyFormat::Int32);
        let b = PropertyDef::scalar("CDP", "other", PropertyFormat::Int64);
        assert_eq!(a, b);
    }
}

mod bitconverter {
    use crate::bitconverter::*;
    use crate::enums::PropertyFormat;
    use crate::properties::*;

    fn layout() -> HeaderLayout {
        HeaderLayout::assemble(vec![
            PropertyDef::scalar("I32", "", PropertyFormat::Int32),
            PropertyDef::scalar("F32", "", PropertyFormat::Float32),
            PropertyDef::new("NAME", "", PropertyFormat::ByteString, 8),
            PropertyDef::new("PAIR", "", PropertyFormat::Int16, 2),
        ])
    }

    #[test]
    fn int_roundtrip_both_orders() {
        let layout = layout();
        let p = layout.get("I32").unwrap();
        for le in [true, false] {
            let mut rec = vec![0u8; layout.record_length()];
            put_int(&mut rec, p, le, -123456).unwrap();
            assert_eq!(get_int(&rec, p, le).unwrap(), -123456);
        }
    }

    #[test]
    fn int_accessor_rejects_float_fields() {
        let layout = layout();
        let p = layout.get("F32").unwrap();
        let rec = vec![0u8; layout.record_length()];
        assert!(get_int(&rec, p, true).is_err());
    }

    #[test]
    fn float_converts_to_declared_format() {
        let layout = layout();
        let p = layout.get("F32").unwrap();
        let mut rec = vec![0u8; layout.record_length()];
        put_float(&mut rec, p, true, 1.5).unwrap();
        assert_eq!(get_float(&rec, p, true).unwrap(), 1.5);
    }

    #[test]
    fn strings_are_nul_padded_and_trimmed() {
        let layout = layout();
        let p = layout.get("NAME").unwrap();
        let mut rec = vec![0xffu8; layout.record_length()];
        put_string(&mut rec, p, "abc").unwrap();
        assert_eq!(get_string(&rec, p).unwrap(), "abc");
        // Too long for an 8-byte field: 8 bytes exactly is already too many,
        // the string must be shorter than the element count.
        assert!(put_string(&mut rec, p, "12345678").is_err());
    }

    #[test]
    fn vector_fields_roundtrip() {
        let layout = layout();
        let p = layout.get("PAIR").unwrap();
        let mut rec = vec![0u8; layout.record_length()];
        put_value(&mut rec, p, true, &HeaderValue::Int16s(vec![-1, 7])).unwrap();
        assert_eq!(
            get_value(&rec, p, true).unwrap(),
            HeaderValue::Int16s(vec![-1, 7])
        );
        // Wrong element count must not pass.
        assert!(put_value(&mut rec, p, true, &HeaderValue::Int16s(vec![1])).is_err());
    }

    #[test]
    fn copy_record_skips_missing_labels() {
        let src_layout = layout();
        let dst_layout = HeaderLayout::assemble(vec![PropertyDef::scalar(
            "I32",
            "",
            PropertyFormat::Int64,
        )]);
        let mut src = vec![0u8; src_layout.record_length()];
        put_int(&mut src, src_layout.get("I32").unwrap(), true, 42).unwrap();
        put_float(&mut src, src_layout.get("F32").unwrap(), true, 2.5).unwrap();

        let mut dst = vec![0u8; dst_layout.record_length()];
        copy_record(&src_layout, true, &src, &dst_layout, true, &mut dst).unwrap();
        // I32 came over (converted to Int64); F32 had nowhere to go.
        assert_eq!(get_int(&dst, dst_layout.get("I32").unwrap(), true).unwrap(), 42);
    }
}

mod compressor {
    use crate::compressor::*;
    use crate::enums::TraceFormat;

    #[test]
    fn float32_roundtrip_is_bit_exact() {
        let c = TraceCompressor::new(TraceFormat::Float32, 5);
        let trcs = vec![0.0f32, -1.5, 3.25, f32::MIN_POSITIVE, 1e30];
        let mut buf = c.alloc_frame_buf(1);
        c.pack_frame(&trcs, 1, &mut buf).unwrap();
        let mut back = vec![0f32; 5];
        c.unpack_frame(&buf, 1, &mut back).unwrap();
        assert_eq!(trcs, back);
    }

    #[test]
    fn int16_error_stays_within_the_quantisation_bound() {
        let ns = 64;
        let c = TraceCompressor::new(TraceFormat::CompressedInt16, ns);
        // Three traces with very different peak amplitudes.
        let peaks = [0.0f32, 1.0, 1e6];
        let mut trcs = Vec::with_capacity(3 * ns);
        for p in peaks {
            for k in 0..ns {
                trcs.push(p * ((k as f32 / ns as f32) * 2.0 - 1.0));
            }
        }
        let mut buf = c.alloc_frame_buf(3);
        c.pack_frame(&trcs, 3, &mut buf).unwrap();
        let mut back = vec![0f32; 3 * ns];
        c.unpack_frame(&buf, 3, &mut back).unwrap();

        for (t, p) in peaks.iter().enumerate() {
            let bound = p / 32767.0;
            for k in 0..ns {
                let err = (trcs[t * ns + k] - back[t * ns + k]).abs();
                assert!(
                    err <= bound,
                    "trace {} sample {}: err {} over bound {}",
                    t,
                    k,
                    err,
                    bound
                );
            }
        }
    }

    #[test]
    fn int16_record_has_prefix_and_samples() {
        let c = TraceCompressor::new(TraceFormat::CompressedInt16, 10);
        assert_eq!(c.record_length(), 8 + 20);
        assert_eq!(c.alloc_frame_buf(3).len(), 3 * 28);
    }

    #[test]
    fn unsupported_formats_error_in_the_codec() {
        let c = TraceCompressor::new(TraceFormat::Float64, 4);
        let trcs = vec![0f32; 4];
        let mut buf = c.alloc_frame_buf(1);
        assert!(c.pack_frame(&trcs, 1, &mut buf).is_err());
    }

    #[test]
    fn corrupted_exponent_is_clamped() {
        let c = TraceCompressor::new(TraceFormat::CompressedInt16, 2);
        let mut buf = c.alloc_frame_buf(1);
        buf[0..4].copy_from_slice(&i32::MAX.to_le_bytes());
        buf[8..10].copy_from_slice(&1i16.to_le_bytes());
        let mut back = vec![0f32; 2];
        c.unpack_frame(&buf, 1, &mut back).unwrap();
        assert!(back[0].is_finite());
    }
}

mod grid {
    use crate::bitconverter::{get_int, put_int};
    use crate::grid::*;
    use crate::properties::*;
    use crate::Axis;

    fn axes() -> Vec<Axis> {
        let mut frame = Axis::with_length("FRAME", 4);
        frame.logical_origin = 10;
        frame.logical_delta = 2;
        vec![
            Axis::with_length("TIME", 8),
            Axis::with_length("TRACE", 6),
            frame,
            Axis::with_length("VOLUME", 3),
        ]
    }

    #[test]
    fn address_linear_roundtrip() {
        let axes = axes();
        let mut seen = Vec::new();
        for vol in 1..=3i64 {
            for frm in [10i64, 12, 14, 16] {
                let f = frame_index(&axes, &[frm, vol]).unwrap();
                assert_eq!(frame_address(&axes, f), vec![frm, vol]);
                seen.push(f);
            }
        }
        let mut sorted = seen.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 12);
        assert_eq!(sorted[0], 1);
        assert_eq!(*sorted.last().unwrap(), 12);
    }

    #[test]
    fn off_grid_addresses_are_rejected() {
        let axes = axes();
        // 11 is between the bins of the frame axis (origin 10, step 2).
        assert!(frame_index(&axes, &[11, 1]).is_err());
        assert!(frame_index(&axes, &[18, 1]).is_err());
        assert!(frame_index(&axes, &[10, 4]).is_err());
    }

    fn test_layout() -> HeaderLayout {
        let mut defs = stock_properties();
        defs.push(axis_properties()[1].clone());
        HeaderLayout::assemble(defs)
    }

    /// Builds a frame whose live traces are recognisable by their first sample.
    fn build_frame(
        layout: &HeaderLayout,
        ns: usize,
        types: &[i32],
        trace_no: &[i64],
    ) -> (Vec<f32>, Vec<u8>) {
        let hl = layout.record_length();
        let n = types.len();
        let mut trcs = vec![0f32; ns * n];
        let mut hdrs = vec![0u8; hl * n];
        for i in 0..n {
            trcs[i * ns] = 100.0 + i as f32;
            let rec = &mut hdrs[i * hl..(i + 1) * hl];
            put_int(rec, layout.get(TRC_TYPE).unwrap(), true, types[i] as i64).unwrap();
            put_int(rec, layout.get("TRACE").unwrap(), true, trace_no[i]).unwrap();
        }
        (trcs, hdrs)
    }

    #[test]
    fn left_justify_is_stable_and_idempotent() {
        let layout = test_layout();
        let ns = 4;
        let (mut trcs, mut hdrs) = build_frame(&layout, ns, &[2, 1, 2, 1, 2], &[1, 2, 3, 4, 5]);
        let fold = left_justify(&layout, true, ns, 5, &mut trcs, &mut hdrs).unwrap();
        assert_eq!(fold, 2);
        // The two live traces (from columns 1 and 3) kept their relative order.
        assert_eq!(trcs[0], 101.0);
        assert_eq!(trcs[ns], 103.0);

        let again = left_justify(&layout, true, ns, 5, &mut trcs, &mut hdrs).unwrap();
        assert_eq!(again, 2);
        assert_eq!(trcs[0], 101.0);
        assert_eq!(trcs[ns], 103.0);
    }

    #[test]
    fn regularize_scatters_and_dead_fills() {
        let layout = test_layout();
        let prop = layout.get("TRACE").unwrap();
        let trace_axis = Axis::with_length("TRACE", 5);
        let ns = 4;
        // Two left-justified live traces destined for columns 2 and 5.
        let (mut trcs, mut hdrs) = build_frame(&layout, ns, &[1, 1, 2, 2, 2], &[2, 5, 0, 0, 0]);
        regularize(
            &layout, prop, &trace_axis, true, ns, 5, 2, &mut trcs, &mut hdrs,
        )
        .unwrap();

        let hl = layout.record_length();
        assert_eq!(trcs[ns], 100.0);
        assert_eq!(trcs[4 * ns], 101.0);
        for c in [0usize, 2, 3] {
            let rec = &hdrs[c * hl..(c + 1) * hl];
            assert_eq!(get_int(rec, layout.get(TRC_TYPE).unwrap(), true).unwrap(), 2);
            assert_eq!(get_int(rec, prop, true).unwrap(), (c + 1) as i64);
            assert!(trcs[c * ns..(c + 1) * ns].iter().all(|s| *s == 0.0));
        }

        // Idempotence: a second pass with the same arguments changes nothing.
        let snap_t = trcs.clone();
        let snap_h = hdrs.clone();
        regularize(
            &layout, prop, &trace_axis, true, ns, 5, 2, &mut trcs, &mut hdrs,
        )
        .unwrap();
        assert_eq!(snap_t, trcs);
        assert_eq!(snap_h, hdrs);
    }

    #[test]
    fn dim_range_expansion() {
        let mut axis = Axis::with_length("TRACE", 10);
        axis.logical_origin = 0;
        axis.logical_delta = 5;
        assert_eq!(DimRange::All.grid_indices(&axis, 1).unwrap().len(), 10);
        assert_eq!(DimRange::One(15).grid_indices(&axis, 1).unwrap(), vec![4]);
        assert_eq!(
            DimRange::Stepped {
                first: 0,
                last: 20,
                step: 10
            }
            .grid_indices(&axis, 1)
            .unwrap(),
            vec![1, 3, 5]
        );
        assert!(DimRange::One(3).grid_indices(&axis, 1).is_err());
    }
}

mod extents {
    use crate::extents::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn count_follows_the_heuristic() {
        // Small datasets still get the 10-extent floor, capped by frames.
        assert_eq!(extent_count(1024, 100), 11);
        assert_eq!(extent_count(1024, 4), 4);
        // Huge streams cap out at 256.
        assert_eq!(extent_count(u64::MAX / 2, 1_000_000), 256);
    }

    #[test]
    fn extents_cover_the_stream_contiguously() {
        // 10 frames of 64 traces, 16 bytes per record, over 3 extents.
        let record = 16u64;
        let total = 10 * 64 * record;
        let size = extent_size(10, 3, 64, record);
        assert_eq!(size, 4 * 64 * record);
        let extents = build_extents(
            "TraceFile",
            Path::new("/data/set.js"),
            &[PathBuf::from(".")],
            3,
            size,
            total,
        )
        .unwrap();
        assert_eq!(extents.len(), 3);
        assert_eq!(extents.iter().map(|e| e.size).sum::<u64>(), total);
        for (i, e) in extents.iter().enumerate() {
            assert_eq!(e.start, i as u64 * size);
            assert_eq!(e.name, format!("TraceFile{}", i));
        }
        // The last extent holds the remainder.
        assert_eq!(extents[2].size, 2 * 64 * record);

        assert_eq!(extent_for_offset(&extents, 0).unwrap().index, 0);
        assert_eq!(extent_for_offset(&extents, size - 1).unwrap().index, 0);
        assert_eq!(extent_for_offset(&extents, size).unwrap().index, 1);
        assert_eq!(extent_for_offset(&extents, total - 1).unwrap().index, 2);
        assert!(extent_for_offset(&extents, total + size).is_err());
    }

    #[test]
    fn surplus_extents_are_not_created() {
        // 10 frames over 6 extents rounds to 2 frames per extent; 5 extents suffice.
        let record = 4u64;
        let total = 10 * 8 * record;
        let size = extent_size(10, 6, 8, record);
        let extents = build_extents(
            "TraceHeaders",
            Path::new("/data/set.js"),
            &[PathBuf::from(".")],
            6,
            size,
            total,
        )
        .unwrap();
        assert_eq!(extents.len(), 5);
    }

    #[test]
    fn data_home_rebases_or_rejects() {
        // NB: env vars are process-global, so everything touching the data-home
        // resolution runs inside this one test, in order.
        let secondaries = [PathBuf::from("/fast"), PathBuf::from("/slow")];
        let extents = build_extents(
            "TraceFile",
            Path::new("/data/proj/set.js"),
            &secondaries,
            4,
            100,
            400,
        )
        .unwrap();
        assert_eq!(extents[0].path, Path::new("/fast/data/proj/set.js/TraceFile0"));
        assert_eq!(extents[1].path, Path::new("/slow/data/proj/set.js/TraceFile1"));
        assert_eq!(extents[2].path, Path::new("/fast/data/proj/set.js/TraceFile2"));

        std::env::set_var("JAVASEIS_DATA_HOME", "/data");
        let dir = extent_dir(Path::new("/nfs/a"), Path::new("/data/proj/set.js")).unwrap();
        assert_eq!(dir, Path::new("/nfs/a/proj/set.js"));

        let err = extent_dir(Path::new("/nfs/a"), Path::new("/elsewhere/set.js"));
        assert!(err.is_err());
        std::env::remove_var("JAVASEIS_DATA_HOME");

        std::env::set_var("PROMAX_DATA_HOME", "/data/proj");
        let dir = extent_dir(Path::new("/nfs/b"), Path::new("/data/proj/set.js")).unwrap();
        assert_eq!(dir, Path::new("/nfs/b/set.js"));
        std::env::remove_var("PROMAX_DATA_HOME");

        // A dot secondary keeps the dataset path itself.
        let dir = extent_dir(Path::new("."), Path::new("/data/proj/set.js")).unwrap();
        assert_eq!(dir, Path::new("/data/proj/set.js"));
    }
}

mod tracemap {
    use crate::tracemap::*;

    #[test]
    fn mapped_fold_roundtrip_and_paging() {
        let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
        // 12 frames, 4 per volume, 16 traces per frame.
        TraceMap::initialize(dir.path(), 12).unwrap();
        let mut map = TraceMap::open(dir.path(), 4, 12, 16, true, true).unwrap();

        assert_eq!(map.fold(1).unwrap(), 0);
        map.set_fold(1, 7).unwrap();
        map.set_fold(9, 16).unwrap();
        assert_eq!(map.fold(1).unwrap(), 7);
        let base = map.volume_loads();

        // Frames 1 and 9 live in volumes 0 and 2; alternating between them pages
        // each volume in once more.
        assert_eq!(map.fold(9).unwrap(), 16);
        assert_eq!(map.fold(1).unwrap(), 7);
        assert_eq!(map.volume_loads(), base + 2);

        // Same volume again: no further load.
        assert_eq!(map.fold(2).unwrap(), 0);
        assert_eq!(map.volume_loads(), base + 2);
    }

    #[test]
    fn out_of_range_entries_read_as_empty() {
        let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
        TraceMap::initialize(dir.path(), 4).unwrap();
        let mut map = TraceMap::open(dir.path(), 2, 4, 8, true, true).unwrap();
        map.set_fold(3, 100).unwrap();
        assert_eq!(map.fold(3).unwrap(), 0);
        assert!(map.fold(0).is_err());
        assert!(map.fold(5).is_err());
    }

    #[test]
    fn unmapped_reports_full_frames() {
        let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
        let mut map = TraceMap::open(dir.path(), 2, 4, 8, false, false).unwrap();
        assert_eq!(map.fold(4).unwrap(), 8);
        map.set_fold(4, 1).unwrap();
        assert_eq!(map.fold(4).unwrap(), 8);
    }

    #[test]
    fn zeroing_clears_every_entry() {
        let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
        TraceMap::initialize(dir.path(), 6).unwrap();
        let mut map = TraceMap::open(dir.path(), 3, 6, 8, true, true).unwrap();
        map.set_fold(2, 5).unwrap();
        map.zero().unwrap();
        for f in 1..=6 {
            assert_eq!(map.fold(f).unwrap(), 0);
        }
    }
}

mod parset {
    use crate::parset::*;

    fn sample() -> Parset {
        let mut root = Parset::new("JavaSeis Metadata");
        let mut fp = Parset::new("FileProperties");
        fp.add_par("DataType", "string", "CUSTOM");
        fp.add_par("AxisLengths", "long", "128 64 10");
        fp.add_par("Mapped", "boolean", "true");
        fp.add_par("Comments", "string", "\"written by hand\"");
        root.add_child(fp);
        root
    }

    #[test]
    fn xml_roundtrip() {
        let root = sample();
        let xml = root.to_xml();
        // No XML declaration on disk.
        assert!(xml.starts_with("<parset"));
        let back = Parset::from_xml(&xml).unwrap();
        assert_eq!(root, back);
    }

    #[test]
    fn typed_getters() {
        let root = sample();
        let fp = root.require_child("FileProperties").unwrap();
        assert_eq!(fp.par_string("DataType").unwrap(), "CUSTOM");
        assert_eq!(fp.par_usizes("AxisLengths").unwrap(), vec![128, 64, 10]);
        assert!(fp.par_bool("Mapped").unwrap());
        assert_eq!(fp.require_par("Comments").unwrap().unquoted(), "written by hand");
        assert!(fp.par_i64("Nope").is_err());
        assert!(fp.par_usize("DataType").is_err());
    }

    #[test]
    fn escaped_content_survives() {
        let mut root = Parset::new("A");
        root.add_par("X", "string", "a < b & c");
        let back = Parset::from_xml(&root.to_xml()).unwrap();
        assert_eq!(back.require_par("X").unwrap().text(), "a < b & c");
    }
}
