use std::fs::File;
use std::io::Write;
use std::path::Path;

use idwr_archive::{Error, ExtractOptions, extract_zip};
use zip::write::SimpleFileOptions;

fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn extract_flat_archive() {
    let temp_dir = tempfile::Builder::new()
        .prefix("idwr-test-zip-")
        .tempdir()
        .expect("Failed to create temp dir");
    let archive = temp_dir.path().join("jp_idwr_db-parquet.zip");
    write_zip(&archive, &[("bullet.parquet", b"PAR1 bullet"), ("unified.parquet", b"PAR1 unified")]);
    let dest = temp_dir.path().join("data");

    let report = extract_zip(&archive, &dest, &ExtractOptions::default()).unwrap();

    assert_eq!(report.entry_count, 2);
    assert_eq!(report.total_bytes, 23);
    assert_eq!(std::fs::read(dest.join("bullet.parquet")).unwrap(), b"PAR1 bullet");
    assert_eq!(std::fs::read(dest.join("unified.parquet")).unwrap(), b"PAR1 unified");
    assert_eq!(report.files().count(), 2);
}

#[test]
fn extract_replaces_existing_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let archive = temp_dir.path().join("a.zip");
    write_zip(&archive, &[("sentinel.parquet", b"fresh")]);
    std::fs::write(temp_dir.path().join("sentinel.parquet"), b"stale").unwrap();

    extract_zip(&archive, temp_dir.path(), &ExtractOptions::default()).unwrap();

    assert_eq!(std::fs::read(temp_dir.path().join("sentinel.parquet")).unwrap(), b"fresh");
}

#[test]
fn extract_rejects_escaping_members() {
    let temp_dir = tempfile::tempdir().unwrap();
    let archive = temp_dir.path().join("evil.zip");
    write_zip(&archive, &[("../evil.parquet", b"x")]);
    let dest = temp_dir.path().join("data");

    let err = extract_zip(&archive, &dest, &ExtractOptions::default()).unwrap_err();

    assert!(matches!(err, Error::ZipSlip { .. }), "{err:?}");
    assert!(!temp_dir.path().join("evil.parquet").exists());
}

#[test]
fn extract_reports_corrupted_archive() {
    let temp_dir = tempfile::tempdir().unwrap();
    let archive = temp_dir.path().join("broken.zip");
    std::fs::write(&archive, b"this is not a zip archive").unwrap();

    let err = extract_zip(&archive, temp_dir.path(), &ExtractOptions::default()).unwrap_err();

    assert!(matches!(err, Error::Corrupted { .. }), "{err:?}");
}

#[test]
fn extract_reports_member_digests() {
    let temp_dir = tempfile::tempdir().unwrap();
    let archive = temp_dir.path().join("a.zip");
    write_zip(&archive, &[("prefecture_en.parquet", b"Hokkaido")]);

    let report = extract_zip(&archive, temp_dir.path(), &ExtractOptions::default()).unwrap();

    let entry = &report.entries[0];
    assert!(!entry.is_directory);
    assert_eq!(entry.size, 8);
    assert_eq!(
        entry.sha256.as_deref(),
        Some(idwr_verify::digest_file(&entry.target_path).unwrap().as_str())
    );
}
