//! Creation geometry and full-frame round trips, including the compressed
//! sample format.
use super::*;

#[test]
fn create_lays_out_map_and_extents() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("layout.js");
    let mut ds = JseisDataset::create(&path, options(vec![128, 64, 10])).unwrap();

    // 10 frames of int32 fold counters.
    let map_len = std::fs::metadata(ds.path().join("TraceMap")).unwrap().len();
    assert_eq!(map_len, 40);

    // The extent heuristic caps at the frame count, one frame per extent here.
    assert_eq!(ds.total_frames(), 10);
    assert_eq!(ds.header_length(), (18 + 3) * 4);

    // No data files yet; they appear on first write.
    assert!(!ds.path().join("TraceFile0").exists());
    write_full_frame(&mut ds, &[1]);
    let trace_len = std::fs::metadata(ds.path().join("TraceFile0")).unwrap().len();
    assert_eq!(trace_len, 128 * 64 * 4);
    let hdr_len = std::fs::metadata(ds.path().join("TraceHeaders0")).unwrap().len();
    assert_eq!(hdr_len, 64 * 84);

    // All four XML sidecars and both property files in place.
    for f in [
        "FileProperties.xml",
        "TraceFile.xml",
        "TraceHeaders.xml",
        "VirtualFolders.xml",
        "Name.properties",
        "Status.properties",
    ] {
        assert!(ds.path().join(f).exists(), "missing {}", f);
    }
}

#[test]
fn full_frame_roundtrip_is_bit_exact() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("roundtrip.js");
    let mut out = JseisDataset::create(&path, options(vec![128, 64, 10])).unwrap();
    let (trcs, hdrs) = write_full_frame(&mut out, &[1]);
    drop(out);

    let mut input = giga_jseis_in::JseisDataset::open(&path).unwrap();
    assert!(input.has_traces());
    assert_eq!(input.fold(1).unwrap(), 64);

    let (mut rtrcs, mut rhdrs) = input.alloc_frame();
    let fold = input.read_frame(1, &mut rtrcs, &mut rhdrs).unwrap();
    assert_eq!(fold, 64);
    assert_eq!(trcs, rtrcs);
    assert_eq!(hdrs, rhdrs);
}

#[test]
fn frame_index_derives_from_headers() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("derived.js");
    let mut out = JseisDataset::create(&path, options(vec![16, 8, 5, 3])).unwrap();

    let (mut trcs, mut hdrs) = out.alloc_frame();
    ramp(&mut trcs, 16);
    out.fill_frame_headers(&mut hdrs, &[4, 2], 8).unwrap();
    let frame = out.write_frame_from_headers(&trcs, &hdrs, 8).unwrap();
    assert_eq!(frame, out.frame_index(&[4, 2]).unwrap());
    assert_eq!(out.fold_at(&[4, 2]).unwrap(), 8);
}

#[test]
fn int16_codec_roundtrip_stays_within_bound() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("int16.js");
    let mut opts = options(vec![64, 3, 4]);
    opts.set_trace_format(TraceFormat::CompressedInt16);
    let mut out = JseisDataset::create(&path, opts).unwrap();

    // Three traces with peak amplitudes 0, 1 and 1e6.
    let peaks = [0.0f32, 1.0, 1e6];
    let (mut trcs, mut hdrs) = out.alloc_frame();
    for (t, p) in peaks.iter().enumerate() {
        for s in 0..64 {
            trcs[t * 64 + s] = p * ((s as f32 / 64.0) * 2.0 - 1.0);
        }
    }
    out.fill_frame_headers(&mut hdrs, &[2], 3).unwrap();
    out.write_frame_at(&[2], &trcs, &hdrs, 3).unwrap();
    drop(out);

    let mut input = giga_jseis_in::JseisDataset::open(&path).unwrap();
    assert_eq!(input.trace_format(), TraceFormat::CompressedInt16);
    let (mut rtrcs, mut rhdrs) = input.alloc_frame();
    let fold = input.read_frame_at(&[2], &mut rtrcs, &mut rhdrs).unwrap();
    assert_eq!(fold, 3);
    for (t, p) in peaks.iter().enumerate() {
        let bound = p / 32767.0;
        for s in 0..64 {
            let err = (trcs[t * 64 + s] - rtrcs[t * 64 + s]).abs();
            assert!(err <= bound, "trace {} sample {}: {} > {}", t, s, err, bound);
        }
    }
}
