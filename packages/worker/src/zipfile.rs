//! Structural validation of uploaded package archives.

use std::io::{Cursor, Read};

use common::package_manifest::FieldErrors;
use zip::ZipArchive;

pub const MANIFEST_NAME: &str = "manifest.json";
pub const ICON_NAME: &str = "icon.png";
pub const README_NAME: &str = "README.md";
pub const CHANGELOG_NAME: &str = "CHANGELOG.md";

/// One extracted file from the archive.
#[derive(Debug)]
pub struct ArchiveEntry {
    pub path: String,
    pub data: Vec<u8>,
}

/// The well-known files pulled out of a valid archive, plus the full
/// file tree.
#[derive(Debug)]
pub struct ArchiveContents {
    pub manifest: Vec<u8>,
    pub icon: Vec<u8>,
    pub readme: Vec<u8>,
    pub changelog: Option<Vec<u8>>,
    pub entries: Vec<ArchiveEntry>,
}

fn add_error(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

/// Validate archive structure and extract every file.
///
/// Checks entry count, path safety, case-insensitive name collisions and
/// that the zip starts at byte zero before any content is accepted.
pub fn validate_and_extract(
    data: &[u8],
    max_file_count: u32,
) -> Result<ArchiveContents, FieldErrors> {
    let mut errors = FieldErrors::new();

    let mut archive = match ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => archive,
        Err(_) => {
            add_error(&mut errors, "file", "Invalid zip file format".into());
            return Err(errors);
        }
    };

    if archive.len() > max_file_count as usize {
        add_error(
            &mut errors,
            "file",
            format!(
                "The zip contains too many files: {} > {max_file_count}",
                archive.len()
            ),
        );
        return Err(errors);
    }

    let mut seen_lowercase = std::collections::HashSet::new();
    let mut starts_at_zero = false;
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(_) => {
                add_error(&mut errors, "file", "Invalid zip file format".into());
                return Err(errors);
            }
        };

        let name = entry.name().to_string();
        if name.contains("..") || name.starts_with('/') || name.contains('\\') {
            add_error(
                &mut errors,
                "file",
                "The zip contains unsafe file paths".into(),
            );
            return Err(errors);
        }

        // The parser tolerates leading junk by shifting every offset;
        // a genuine archive has an entry at byte zero.
        if entry.header_start() == 0 {
            starts_at_zero = true;
        }

        if entry.is_file() {
            if !seen_lowercase.insert(name.to_lowercase()) {
                add_error(
                    &mut errors,
                    "file",
                    format!("The zip contains file names differing only by case: {name}"),
                );
                return Err(errors);
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            if entry.read_to_end(&mut data).is_err() {
                add_error(&mut errors, "file", "Invalid zip file format".into());
                return Err(errors);
            }
            entries.push(ArchiveEntry { path: name, data });
        }
    }

    if archive.len() > 0 && !starts_at_zero {
        add_error(
            &mut errors,
            "file",
            "The zip contains bogus data at the beginning of the file".into(),
        );
        return Err(errors);
    }

    let manifest = match find_entry(&entries, MANIFEST_NAME) {
        Some(data) => data,
        None => {
            add_error(
                &mut errors,
                "file",
                format!("Package is missing {MANIFEST_NAME}"),
            );
            Vec::new()
        }
    };
    let icon = match find_entry(&entries, ICON_NAME) {
        Some(data) => data,
        None => {
            add_error(&mut errors, "file", format!("Package is missing {ICON_NAME}"));
            Vec::new()
        }
    };
    let readme = match find_entry(&entries, README_NAME) {
        Some(data) => data,
        None => {
            add_error(
                &mut errors,
                "file",
                format!("Package is missing {README_NAME}"),
            );
            Vec::new()
        }
    };
    let changelog = find_entry(&entries, CHANGELOG_NAME);

    if errors.is_empty() {
        Ok(ArchiveContents {
            manifest,
            icon,
            readme,
            changelog,
            entries,
        })
    } else {
        Err(errors)
    }
}

fn find_entry(entries: &[ArchiveEntry], name: &str) -> Option<Vec<u8>> {
    entries
        .iter()
        .find(|entry| entry.path == name)
        .map(|entry| entry.data.clone())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn complete_entries() -> Vec<(&'static str, &'static [u8])> {
        vec![
            ("manifest.json", b"{}".as_slice()),
            ("icon.png", b"png".as_slice()),
            ("README.md", b"# Readme".as_slice()),
        ]
    }

    #[test]
    fn complete_archive_extracts() {
        let data = build_zip(&complete_entries());
        let contents = validate_and_extract(&data, 1000).unwrap();
        assert_eq!(contents.manifest, b"{}");
        assert_eq!(contents.readme, b"# Readme");
        assert!(contents.changelog.is_none());
        assert_eq!(contents.entries.len(), 3);
        assert!(contents.entries.iter().any(|e| e.path == "icon.png"));
    }

    #[test]
    fn changelog_is_optional_but_extracted() {
        let mut entries = complete_entries();
        entries.push(("CHANGELOG.md", b"# 1.0.0"));
        let data = build_zip(&entries);
        let contents = validate_and_extract(&data, 1000).unwrap();
        assert_eq!(contents.changelog.unwrap(), b"# 1.0.0");
    }

    #[test]
    fn garbage_is_not_a_zip() {
        let errors = validate_and_extract(b"definitely not a zip", 1000).unwrap_err();
        assert!(errors["file"][0].contains("Invalid zip"));
    }

    #[test]
    fn prepended_junk_rejected() {
        // A zip glued onto the end of another file still parses, with
        // every offset shifted by the junk length.
        let mut data = vec![0x4du8; 64];
        data.extend(build_zip(&complete_entries()));
        let errors = validate_and_extract(&data, 1000).unwrap_err();
        assert!(errors["file"][0].contains("bogus data at the beginning"));
    }

    #[test]
    fn file_count_limit_enforced() {
        let data = build_zip(&complete_entries());
        let errors = validate_and_extract(&data, 2).unwrap_err();
        assert!(errors["file"][0].contains("too many files"));
    }

    #[test]
    fn traversal_paths_rejected() {
        let mut entries = complete_entries();
        entries.push(("../evil.dll", b"x"));
        let data = build_zip(&entries);
        let errors = validate_and_extract(&data, 1000).unwrap_err();
        assert!(errors["file"][0].contains("unsafe file paths"));
    }

    #[test]
    fn case_insensitive_duplicates_rejected() {
        let mut entries = complete_entries();
        entries.push(("Manifest.JSON", b"{}"));
        let data = build_zip(&entries);
        let errors = validate_and_extract(&data, 1000).unwrap_err();
        assert!(errors["file"][0].contains("differing only by case"));
    }

    #[test]
    fn missing_required_files_all_reported() {
        let data = build_zip(&[("manifest.json", b"{}".as_slice())]);
        let errors = validate_and_extract(&data, 1000).unwrap_err();
        let messages = &errors["file"];
        assert!(messages.iter().any(|m| m.contains("icon.png")));
        assert!(messages.iter().any(|m| m.contains("README.md")));
    }
}
