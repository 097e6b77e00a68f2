use std::path::PathBuf;

use rust_htslib::bam::header::{Header, HeaderRecord};
use rust_htslib::bam::record::{Cigar, CigarString, Record};
use rust_htslib::bam::{self, Format};
use tempfile::TempDir;

use basepile::error::PileupError;
use basepile::pileup::{CursorState, PileupCursor};

fn make_record(
    name: &[u8],
    tid: i32,
    pos: i64,
    cigar: Vec<Cigar>,
    seq: &[u8],
    qual: u8,
    mapq: u8,
    reverse: bool,
) -> Record {
    let mut rec = Record::new();
    let quals = vec![qual; seq.len()];
    rec.set(name, Some(&CigarString(cigar)), seq, &quals);
    rec.unset_flags();
    rec.set_tid(tid);
    rec.set_pos(pos);
    rec.set_mapq(mapq);
    if reverse {
        rec.set_reverse();
    }
    rec
}

/// Write a small indexed BAM with two references:
///
/// chr1: a forward 10M read at 100, a reverse 10M read at 104 and a
/// 4M2D4M read at 300. chr2: a forward 6M read at 5. All coordinates
/// 0-based.
fn build_test_bam(dir: &TempDir) -> PathBuf {
    let bam_path = dir.path().join("test.bam");

    let mut header = Header::new();
    for name in ["chr1", "chr2"] {
        let mut chr_rec = HeaderRecord::new(b"SQ");
        chr_rec.push_tag(b"SN", &name.to_string());
        chr_rec.push_tag(b"LN", &2000.to_string());
        header.push_record(&chr_rec);
    }

    let records = vec![
        make_record(b"r1", 0, 100, vec![Cigar::Match(10)], b"ACGTACGTAC", 30, 60, false),
        make_record(b"r2", 0, 104, vec![Cigar::Match(10)], b"GGGGGGGGGG", 20, 50, true),
        make_record(
            b"r3",
            0,
            300,
            vec![Cigar::Match(4), Cigar::Del(2), Cigar::Match(4)],
            b"ACGTACGT",
            30,
            60,
            false,
        ),
        make_record(b"r4", 1, 5, vec![Cigar::Match(6)], b"TTTTTT", 30, 60, false),
    ];

    {
        let mut writer =
            bam::Writer::from_path(&bam_path, &header, Format::Bam).expect("Opened test.bam");
        for rec in &records {
            writer.write(rec).expect("Wrote record");
        }
    }
    bam::index::build(&bam_path, None, bam::index::Type::Bai, 1).expect("Built index");

    bam_path
}

#[test]
fn linear_scan_covers_every_position_in_order() {
    let dir = TempDir::new().unwrap();
    let bam_path = build_test_bam(&dir);

    let mut cursor = PileupCursor::open(&bam_path).unwrap();
    assert_eq!(cursor.state(), CursorState::Idle);

    let mut records = Vec::new();
    while let Some(stat) = cursor.next().unwrap() {
        records.push(stat);
    }
    assert_eq!(cursor.state(), CursorState::Exhausted);

    // chr1: 100..=113 and 300..=309, chr2: 5..=10, all 1-based on output.
    assert_eq!(records.len(), 30);
    assert_eq!(records[0].ref_id, 0);
    assert_eq!(records[0].pos, 101);
    assert_eq!(records.last().unwrap().ref_id, 1);
    assert_eq!(records.last().unwrap().pos, 11);

    let coords: Vec<(u32, i64)> = records.iter().map(|r| (r.ref_id, r.pos)).collect();
    let mut sorted = coords.clone();
    sorted.sort();
    assert_eq!(coords, sorted);

    for stat in &records {
        let channel_sum: u64 = stat.channels().iter().map(|ch| ch.count).sum();
        assert_eq!(stat.total.count, channel_sum);
    }
}

#[test]
fn overlapping_reads_aggregate_per_channel() {
    let dir = TempDir::new().unwrap();
    let bam_path = build_test_bam(&dir);

    let mut cursor = PileupCursor::open(&bam_path).unwrap();
    let stat = loop {
        let stat = cursor.next().unwrap().expect("position 105 is covered");
        if stat.pos == 105 {
            break stat;
        }
    };

    // r1 contributes an A (offset 4, forward), r2 a G (offset 0, reverse).
    assert_eq!(stat.a.count, 1);
    assert_eq!(stat.g.count, 1);
    assert_eq!(stat.total.count, 2);
    assert_eq!(stat.a.qual_sum, 30);
    assert_eq!(stat.g.qual_sum, 20);
    assert_eq!(stat.total.mapq_sum, 110);
    assert_eq!(stat.a.pos_signal, 4);
    // reverse: distance from read end (10 - 0 - 1) plus the strand marker
    assert_eq!(stat.g.pos_signal, 10);
    assert_eq!(stat.major_base, 0);
    assert_eq!(stat.minor_base, 2);
    assert!((stat.entropy - 2.0f64.ln()).abs() < 1e-10);
}

#[test]
fn deleted_bases_leave_empty_channels() {
    let dir = TempDir::new().unwrap();
    let bam_path = build_test_bam(&dir);

    let mut cursor = PileupCursor::open(&bam_path).unwrap();
    let mut deletion_positions = Vec::new();
    while let Some(stat) = cursor.next().unwrap() {
        if stat.ref_id == 0 && (stat.pos == 305 || stat.pos == 306) {
            deletion_positions.push(stat);
        }
    }

    assert_eq!(deletion_positions.len(), 2);
    for stat in &deletion_positions {
        assert_eq!(stat.total.count, 0);
        assert_eq!(stat.ambiguous, 0);
        assert_eq!(stat.entropy, 0.0);
    }
}

#[test]
fn seek_delivers_the_first_position_at_or_past_the_target() {
    let dir = TempDir::new().unwrap();
    let bam_path = build_test_bam(&dir);

    let mut cursor = PileupCursor::open(&bam_path).unwrap();
    cursor.seek("chr1", 105).unwrap();
    assert_eq!(cursor.state(), CursorState::Streaming);

    let stat = cursor.next().unwrap().unwrap();
    assert_eq!(stat.ref_id, 0);
    assert_eq!(stat.pos, 105);

    // The stream continues in order from there.
    let stat = cursor.next().unwrap().unwrap();
    assert_eq!(stat.pos, 106);
}

#[test]
fn seek_into_a_gap_lands_on_the_next_covered_position() {
    let dir = TempDir::new().unwrap();
    let bam_path = build_test_bam(&dir);

    let mut cursor = PileupCursor::open(&bam_path).unwrap();
    cursor.seek("chr1", 200).unwrap();

    let stat = cursor.next().unwrap().unwrap();
    assert_eq!(stat.ref_id, 0);
    assert_eq!(stat.pos, 301);
}

#[test]
fn seek_past_a_reference_continues_on_the_next_one() {
    let dir = TempDir::new().unwrap();
    let bam_path = build_test_bam(&dir);

    let mut cursor = PileupCursor::open(&bam_path).unwrap();
    cursor.seek("chr1", 1500).unwrap();
    assert_eq!(cursor.state(), CursorState::Streaming);

    let stat = cursor.next().unwrap().unwrap();
    assert_eq!(stat.ref_id, 1);
    assert_eq!(stat.pos, 6);
}

#[test]
fn seek_with_nothing_downstream_exhausts_the_cursor() {
    let dir = TempDir::new().unwrap();
    let bam_path = build_test_bam(&dir);

    let mut cursor = PileupCursor::open(&bam_path).unwrap();
    cursor.seek("chr2", 1500).unwrap();
    assert_eq!(cursor.state(), CursorState::Exhausted);
    assert!(cursor.next().unwrap().is_none());
    assert!(cursor.next().unwrap().is_none());
}

#[test]
fn seek_to_an_unknown_reference_leaves_the_cursor_usable() {
    let dir = TempDir::new().unwrap();
    let bam_path = build_test_bam(&dir);

    let mut cursor = PileupCursor::open(&bam_path).unwrap();
    match cursor.seek("chrX", 1) {
        Err(PileupError::InvalidReference(name)) => assert_eq!(name, "chrX"),
        other => panic!("unexpected result: {other:?}"),
    }

    // The failed seek changed nothing: the linear scan starts at the top.
    let stat = cursor.next().unwrap().unwrap();
    assert_eq!(stat.ref_id, 0);
    assert_eq!(stat.pos, 101);
}

#[test]
fn reference_names_match_the_header() {
    let dir = TempDir::new().unwrap();
    let bam_path = build_test_bam(&dir);

    let cursor = PileupCursor::open(&bam_path).unwrap();
    assert_eq!(cursor.reference_names(), vec!["chr1", "chr2"]);
    assert_eq!(cursor.reference_id("chr2").unwrap(), 1);
    assert!(matches!(
        cursor.reference_id("chr3"),
        Err(PileupError::UnknownReference(_))
    ));
}

#[test]
fn missing_index_and_missing_file_are_distinct_errors() {
    let dir = TempDir::new().unwrap();
    let bam_path = dir.path().join("unindexed.bam");

    let mut header = Header::new();
    let mut chr_rec = HeaderRecord::new(b"SQ");
    chr_rec.push_tag(b"SN", &"chr1".to_string());
    chr_rec.push_tag(b"LN", &2000.to_string());
    header.push_record(&chr_rec);
    drop(bam::Writer::from_path(&bam_path, &header, Format::Bam).unwrap());

    assert!(matches!(
        PileupCursor::open(&bam_path),
        Err(PileupError::IndexMissing { .. })
    ));
    assert!(matches!(
        PileupCursor::open(dir.path().join("absent.bam")),
        Err(PileupError::FileOpen { .. })
    ));
}
