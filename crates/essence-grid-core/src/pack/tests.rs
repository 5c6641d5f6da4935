//! Round-trip, corruption and ratio tests for Gravitas-Pack.

use super::*;
use crate::types::{MetadataValue, Record};

fn file_metadata_record() -> Record {
    let mut record = Record::new();
    record.insert("file_path".into(), "/home/user/report.pdf".into());
    record.insert("file_name".into(), "report.pdf".into());
    record.insert("file_type".into(), ".pdf".into());
    record.insert("size_bytes".into(), MetadataValue::Int(123_456));
    record.insert("created_at".into(), "2031-01-02T03:04:05Z".into());
    record.insert("modified_at".into(), "2031-01-02T03:04:05Z".into());
    record.insert("is_binary".into(), MetadataValue::Bool(false));
    record.insert("encoding".into(), "utf-8".into());
    record
}

#[test]
fn round_trip_is_lossless_on_file_metadata() {
    let packer = GravitasPacker::new();
    let record = file_metadata_record();
    let packed = packer.compress(&record).unwrap();
    let unpacked = packer.decompress(&packed).unwrap();
    assert_eq!(record, unpacked);
}

#[test]
fn round_trip_covers_every_value_type() {
    let packer = GravitasPacker::new();
    let mut record = Record::new();
    record.insert("name".into(), "plain words".into());
    record.insert("count".into(), MetadataValue::Int(-42));
    record.insert("ratio".into(), MetadataValue::Float(0.125));
    record.insert("flag".into(), MetadataValue::Bool(true));
    record.insert("missing".into(), MetadataValue::Null);

    let packed = packer.compress(&record).unwrap();
    assert_eq!(record, packer.decompress(&packed).unwrap());
}

#[test]
fn unknown_keys_and_values_pass_through() {
    let packer = GravitasPacker::new();
    let mut record = Record::new();
    record.insert("custom_field_xyz".into(), "no dictionary entry here".into());
    record.insert("another_one".into(), MetadataValue::Int(7));

    let packed = packer.compress(&record).unwrap();
    assert_eq!(record, packer.decompress(&packed).unwrap());
}

#[test]
fn unicode_values_round_trip() {
    let packer = GravitasPacker::new();
    let mut record = Record::new();
    record.insert("title".into(), "résumé — 履歴書 📄".into());
    record.insert("путь".into(), "/home/пользователь/файл.pdf".into());

    let packed = packer.compress(&record).unwrap();
    assert_eq!(record, packer.decompress(&packed).unwrap());
}

#[test]
fn empty_record_round_trips() {
    let packer = GravitasPacker::new();
    let record = Record::new();
    let packed = packer.compress(&record).unwrap();
    assert_eq!(record, packer.decompress(&packed).unwrap());
}

#[test]
fn integer_extremes_round_trip() {
    let packer = GravitasPacker::new();
    let mut record = Record::new();
    record.insert("min".into(), MetadataValue::Int(i64::MIN));
    record.insert("max".into(), MetadataValue::Int(i64::MAX));
    record.insert("zero".into(), MetadataValue::Int(0));

    let packed = packer.compress(&record).unwrap();
    assert_eq!(record, packer.decompress(&packed).unwrap());
}

#[test]
fn long_literal_runs_round_trip() {
    let packer = GravitasPacker::new();
    let mut record = Record::new();
    record.insert("blob".into(), "a".repeat(70_000).into());

    let packed = packer.compress(&record).unwrap();
    assert_eq!(record, packer.decompress(&packed).unwrap());
}

#[test]
fn compression_is_deterministic() {
    let packer = GravitasPacker::new();
    let record = file_metadata_record();
    assert_eq!(
        packer.compress(&record).unwrap(),
        packer.compress(&record).unwrap()
    );
}

#[test]
fn glyph_rich_record_compresses_well() {
    let packer = GravitasPacker::new();
    let record = file_metadata_record();
    let packed = packer.compress(&record).unwrap();
    let raw = serde_json::to_vec(&record).unwrap();

    let ratio = 1.0 - packed.len() as f64 / raw.len() as f64;
    assert!(
        (0.60..0.95).contains(&ratio),
        "ratio {ratio:.3} outside expected band (raw {}, packed {})",
        raw.len(),
        packed.len()
    );
}

#[test]
fn nonconforming_timestamps_stay_verbatim() {
    let packer = GravitasPacker::new();
    let mut record = Record::new();
    // Millisecond precision and offset forms must not be folded.
    record.insert("a".into(), "2031-01-02T03:04:05.123Z".into());
    record.insert("b".into(), "2031-01-02T03:04:05+02:00".into());
    record.insert("c".into(), "2031-1-2T3:4:5Z".into());

    let packed = packer.compress(&record).unwrap();
    assert_eq!(record, packer.decompress(&packed).unwrap());
}

#[test]
fn stats_track_savings_and_reset() {
    let packer = GravitasPacker::new();
    let record = file_metadata_record();
    let packed = packer.compress(&record).unwrap();
    let _ = packer.decompress(&packed).unwrap();

    let stats = packer.stats();
    assert_eq!(stats.records_packed, 1);
    assert_eq!(stats.records_unpacked, 1);
    assert!(stats.bytes_saved > 0);
    assert!(stats.average_ratio > 0.0);

    packer.reset_stats();
    let stats = packer.stats();
    assert_eq!(stats.records_packed, 0);
    assert_eq!(stats.bytes_raw, 0);
}

// ============================================================================
// CORRUPTION
// ============================================================================

#[test]
fn bad_magic_is_corrupted() {
    let packer = GravitasPacker::new();
    let err = packer.decompress(&[0x00, 0x01, 0x00, 0x00]).unwrap_err();
    assert!(matches!(err, PackError::Corrupted { .. }));
}

#[test]
fn future_version_is_rejected() {
    let packer = GravitasPacker::new();
    let err = packer.decompress(&[MAGIC, 99, 0x00, 0x00]).unwrap_err();
    assert_eq!(
        err,
        PackError::UnsupportedVersion {
            found: 99,
            expected: VERSION
        }
    );
}

#[test]
fn truncated_record_is_corrupted() {
    let packer = GravitasPacker::new();
    let packed = packer.compress(&file_metadata_record()).unwrap();
    for cut in [3, packed.len() / 2, packed.len() - 1] {
        let err = packer.decompress(&packed[..cut]).unwrap_err();
        assert!(
            matches!(err, PackError::Corrupted { .. }),
            "cut at {cut} should surface corruption, got {err:?}"
        );
    }
}

#[test]
fn trailing_bytes_are_corrupted() {
    let packer = GravitasPacker::new();
    let mut packed = packer.compress(&file_metadata_record()).unwrap();
    packed.push(0xAB);
    let err = packer.decompress(&packed).unwrap_err();
    assert!(matches!(err, PackError::Corrupted { .. }));
}

#[test]
fn unknown_value_tag_is_corrupted() {
    let packer = GravitasPacker::new();
    // header + one field: known key glyph 0, bogus value tag.
    let bytes = [MAGIC, VERSION, 0x01, 0x00, 0x80, 0x7E];
    let err = packer.decompress(&bytes).unwrap_err();
    assert!(matches!(err, PackError::Corrupted { .. }));
}

#[test]
fn unknown_field_glyph_is_corrupted() {
    let packer = GravitasPacker::new();
    let bytes = [MAGIC, VERSION, 0x01, 0x00, 0x80 | 0x7D, TAG_NULL];
    let err = packer.decompress(&bytes).unwrap_err();
    assert!(matches!(err, PackError::Corrupted { .. }));
}

#[test]
fn corruption_reports_offset() {
    let packer = GravitasPacker::new();
    let err = packer.decompress(&[MAGIC]).unwrap_err();
    match err {
        PackError::Corrupted { offset, .. } => assert_eq!(offset, 1),
        other => panic!("expected Corrupted, got {other:?}"),
    }
}
