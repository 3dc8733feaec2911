//! Unpacking downloaded filing archives.
//!
//! EDINET XBRL ZIPs carry the instance document and its taxonomy files
//! under `XBRL/PublicDoc/`. Each archive unpacks into its own directory
//! named after the ZIP stem, and the first `*.xbrl` found there becomes the
//! filing's primary instance document.

use anyhow::{Context as _, Result};
use log::{debug, warn};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// One unpacked archive, keyed by its ZIP stem.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFiling {
    pub archive_id: String,
    pub instance_path: PathBuf,
    pub base_dir: PathBuf,
}

/// Unpacks every `*.zip` in `outputs_dir` into `extracted_dir/<stem>/` and
/// returns the filings that contain an instance document, sorted by archive
/// id. Archives without one are skipped with a warning.
pub fn extract_archives(outputs_dir: &Path, extracted_dir: &Path) -> Result<Vec<ExtractedFiling>> {
    let mut zips: Vec<PathBuf> = fs::read_dir(outputs_dir)
        .with_context(|| format!("failed to list {}", outputs_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "zip").unwrap_or(false))
        .collect();
    zips.sort();

    let mut filings = Vec::new();
    for zip_path in zips {
        let archive_id = match zip_path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        let base_dir = extracted_dir.join(&archive_id);
        unpack(&zip_path, &base_dir)?;

        match locate_instance(&base_dir)? {
            Some(instance_path) => {
                debug!("{}: instance at {}", archive_id, instance_path.display());
                filings.push(ExtractedFiling {
                    archive_id,
                    instance_path,
                    base_dir,
                });
            }
            None => {
                warn!("{}: no XBRL/PublicDoc/*.xbrl found, skipping", archive_id);
            }
        }
    }
    Ok(filings)
}

fn unpack(zip_path: &Path, target: &Path) -> Result<()> {
    let file = File::open(zip_path)
        .with_context(|| format!("failed to open {}", zip_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed to read zip {}", zip_path.display()))?;
    fs::create_dir_all(target)
        .with_context(|| format!("failed to create {}", target.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("failed to read entry {} of {}", i, zip_path.display()))?;
        // enclosed_name rejects names escaping the target directory.
        let relative = match entry.enclosed_name() {
            Some(relative) => relative,
            None => {
                warn!(
                    "{}: skipping unsafe entry name {:?}",
                    zip_path.display(),
                    entry.name()
                );
                continue;
            }
        };
        let out_path = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)
            .with_context(|| format!("failed to create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract {}", out_path.display()))?;
    }
    Ok(())
}

fn locate_instance(base_dir: &Path) -> Result<Option<PathBuf>> {
    let public_doc = base_dir.join("XBRL").join("PublicDoc");
    if !public_doc.is_dir() {
        return Ok(None);
    }

    let mut instances: Vec<PathBuf> = fs::read_dir(&public_doc)
        .with_context(|| format!("failed to list {}", public_doc.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "xbrl").unwrap_or(false))
        .collect();
    instances.sort();
    Ok(instances.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_archives_finds_instance() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = dir.path().join("outputs");
        let extracted = dir.path().join("extracted");
        fs::create_dir_all(&outputs).unwrap();

        write_zip(
            &outputs.join("E04539_2025-03.zip"),
            &[
                ("XBRL/PublicDoc/jpcrp030000-asr.xbrl", b"<xbrl/>"),
                ("XBRL/PublicDoc/jpcrp030000-asr_pre.xml", b"<linkbase/>"),
                ("XBRL/AuditDoc/audit.xml", b"<audit/>"),
            ],
        );

        let filings = extract_archives(&outputs, &extracted).unwrap();
        assert_eq!(filings.len(), 1);
        assert_eq!(filings[0].archive_id, "E04539_2025-03");
        assert!(filings[0].instance_path.ends_with("jpcrp030000-asr.xbrl"));
        assert!(filings[0].instance_path.exists());
        assert_eq!(filings[0].base_dir, extracted.join("E04539_2025-03"));
    }

    #[test]
    fn test_extract_archives_skips_archives_without_instance() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = dir.path().join("outputs");
        let extracted = dir.path().join("extracted");
        fs::create_dir_all(&outputs).unwrap();

        write_zip(
            &outputs.join("E99999_2025-03.zip"),
            &[("XBRL/AuditDoc/audit.xml", b"<audit/>")],
        );

        let filings = extract_archives(&outputs, &extracted).unwrap();
        assert!(filings.is_empty());
    }

    #[test]
    fn test_extract_archives_sorted_by_archive_id() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = dir.path().join("outputs");
        let extracted = dir.path().join("extracted");
        fs::create_dir_all(&outputs).unwrap();

        for id in ["E2_2024-03", "E1_2025-03"] {
            write_zip(
                &outputs.join(format!("{}.zip", id)),
                &[("XBRL/PublicDoc/report.xbrl", b"<xbrl/>")],
            );
        }

        let filings = extract_archives(&outputs, &extracted).unwrap();
        let ids: Vec<&str> = filings.iter().map(|f| f.archive_id.as_str()).collect();
        assert_eq!(ids, vec!["E1_2025-03", "E2_2024-03"]);
    }
}
