//! Sparse frames: partial folds, regularization back to declared columns, and
//! the paging behaviour of the fold map.
use super::*;

#[test]
fn sparse_frame_roundtrip_and_regularize() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("sparse.js");
    let mut out = JseisDataset::create(&path, options(vec![128, 64, 10])).unwrap();

    // Three live traces destined for logical trace indices 1, 17 and 33,
    // written left-justified.
    let destinations = [1i64, 17, 33];
    let (mut trcs, mut hdrs) = out.alloc_frame();
    for (t, d) in destinations.iter().enumerate() {
        for s in 0..128 {
            trcs[t * 128 + s] = (1000 * d + s as i64) as f32;
        }
    }
    out.fill_frame_headers(&mut hdrs, &[5], 3).unwrap();
    let hl = out.header_length();
    let prop = out.trace_axis_property().unwrap().clone();
    for (t, d) in destinations.iter().enumerate() {
        put_int(&mut hdrs[t * hl..(t + 1) * hl], &prop, true, *d).unwrap();
    }
    out.write_frame_at(&[5], &trcs, &hdrs, 3).unwrap();
    assert_eq!(out.fold_at(&[5]).unwrap(), 3);
    drop(out);

    let mut input = giga_jseis_in::JseisDataset::open(&path).unwrap();
    let (mut rtrcs, mut rhdrs) = input.alloc_frame();
    let fold = input.read_frame_at(&[5], &mut rtrcs, &mut rhdrs).unwrap();
    assert_eq!(fold, 3);
    // Left-justified and bit-identical before regularization.
    assert_eq!(&rtrcs[..3 * 128], &trcs[..3 * 128]);
    assert_eq!(&rhdrs[..3 * hl], &hdrs[..3 * hl]);

    input.regularize(fold, &mut rtrcs, &mut rhdrs).unwrap();
    let trc_type = input.property(TRC_TYPE).unwrap().clone();
    for c in 0..64usize {
        let rec = &rhdrs[c * hl..(c + 1) * hl];
        let live = destinations.contains(&(c as i64 + 1));
        if live {
            assert_eq!(get_int(rec, &trc_type, true).unwrap(), 1, "column {}", c);
            assert_eq!(rtrcs[c * 128], (1000 * (c as i64 + 1)) as f32);
        } else {
            assert_eq!(get_int(rec, &trc_type, true).unwrap(), 2, "column {}", c);
            assert!(rtrcs[c * 128..(c + 1) * 128].iter().all(|s| *s == 0.0));
        }
        assert_eq!(get_int(rec, &prop, true).unwrap(), c as i64 + 1);
    }
}

#[test]
fn volume_paging_loads_once_per_switch() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("paging.js");
    // 4 frames per volume, 3 volumes: 12 frames in total.
    let mut out = JseisDataset::create(&path, options(vec![16, 8, 4, 3])).unwrap();
    write_full_frame(&mut out, &[1, 1]);
    write_full_frame(&mut out, &[1, 3]);
    drop(out);

    let mut input = giga_jseis_in::JseisDataset::open(&path).unwrap();
    let (mut trcs, mut hdrs) = input.alloc_frame();

    // Frames 1 and 9 sit in volumes 1 and 3.
    assert_eq!(input.read_frame(1, &mut trcs, &mut hdrs).unwrap(), 8);
    let base = input.map_volume_loads();
    assert_eq!(input.read_frame(9, &mut trcs, &mut hdrs).unwrap(), 8);
    assert_eq!(input.read_frame(1, &mut trcs, &mut hdrs).unwrap(), 8);
    // Exactly two volume loads beyond the initial one.
    assert_eq!(input.map_volume_loads(), base + 2);

    // Staying inside the cached volume costs nothing.
    assert_eq!(input.fold(2).unwrap(), 0);
    assert_eq!(input.map_volume_loads(), base + 2);
}

#[test]
fn empty_frames_read_as_fold_zero() {
    let dir = tempfile::tempdir().expect("Couldn't get tempfile.");
    let path = dir.path().join("empty-frames.js");
    let mut out = JseisDataset::create(&path, options(vec![32, 16, 6])).unwrap();
    write_full_frame(&mut out, &[4]);
    drop(out);

    let mut input = giga_jseis_in::JseisDataset::open(&path).unwrap();
    let (mut trcs, mut hdrs) = input.alloc_frame();
    for frame in 1..=6u64 {
        let fold = input.read_frame(frame, &mut trcs, &mut hdrs).unwrap();
        if frame == 4 {
            assert_eq!(fold, 16);
        } else {
            assert_eq!(fold, 0);
            assert!(input.is_frame_empty(frame).unwrap());
        }
    }
}
