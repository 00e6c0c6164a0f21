//! Hand-rolled field validators shared by the submission pipeline and the
//! HTTP surface. Field-keyed error messages; no panics.

/// Maximum length of team, namespace and package names.
pub const MAX_NAME_LENGTH: usize = 64;
/// Maximum length of a version's description.
pub const MAX_DESCRIPTION_LENGTH: usize = 256;
/// Maximum length of a version's website URL.
pub const MAX_WEBSITE_URL_LENGTH: usize = 1024;

/// Validate a team/namespace/package name.
///
/// Rules: ASCII alphanumerics and underscores only, must start and end with
/// an alphanumeric, 1..=64 characters.
pub fn validate_package_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name must not be empty".into());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(format!("Name must be at most {MAX_NAME_LENGTH} characters"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("Name can only contain a-z A-Z 0-9 _ characters".into());
    }
    let first = name.chars().next().unwrap_or('_');
    let last = name.chars().next_back().unwrap_or('_');
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err("Name must start and end with a letter or digit".into());
    }
    Ok(())
}

/// Validate a strict `MAJOR.MINOR.PATCH` version triple.
///
/// Each component is a decimal integer without leading zeros; no pre-release
/// or build suffixes.
pub fn validate_version_number(version: &str) -> Result<(u64, u64, u64), String> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() != 3 {
        return Err("Version must be of the form MAJOR.MINOR.PATCH".into());
    }
    let mut numbers = [0u64; 3];
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err("Version components must be non-negative integers".into());
        }
        if part.len() > 1 && part.starts_with('0') {
            return Err("Version components must not have leading zeros".into());
        }
        numbers[i] = part
            .parse::<u64>()
            .map_err(|_| "Version component out of range".to_string())?;
    }
    Ok((numbers[0], numbers[1], numbers[2]))
}

/// Validate the description field of a manifest.
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Validate the website URL field of a manifest. An empty string is allowed.
pub fn validate_website_url(url: &str) -> Result<(), String> {
    if url.chars().count() > MAX_WEBSITE_URL_LENGTH {
        return Err(format!(
            "Website URL must be at most {MAX_WEBSITE_URL_LENGTH} characters"
        ));
    }
    Ok(())
}

/// Strip directory components from a client-supplied filename.
pub fn base_filename(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_names() {
        for name in ["Mod", "Test_Package", "a", "A1", "x_y_z9"] {
            assert!(validate_package_name(name).is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn rejects_bad_names() {
        for name in ["", "_leading", "trailing_", "has-dash", "has space", "ünïcode"] {
            assert!(validate_package_name(name).is_err(), "{name:?} should fail");
        }
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "a".repeat(MAX_NAME_LENGTH + 1);
        assert!(validate_package_name(&name).is_err());
    }

    #[test]
    fn accepts_strict_semver() {
        assert_eq!(validate_version_number("1.0.0").unwrap(), (1, 0, 0));
        assert_eq!(validate_version_number("0.12.345").unwrap(), (0, 12, 345));
    }

    #[test]
    fn rejects_loose_versions() {
        for v in [
            "1.0", "1.0.0.0", "01.0.0", "1.00.0", "1.0.0-rc1", "1.0.x", "v1.0.0", "", "1..0",
        ] {
            assert!(validate_version_number(v).is_err(), "{v:?} should fail");
        }
    }

    #[test]
    fn base_filename_strips_directories() {
        assert_eq!(base_filename("dir/sub/file.zip"), "file.zip");
        assert_eq!(base_filename("C:\\temp\\mod.zip"), "mod.zip");
        assert_eq!(base_filename("plain.zip"), "plain.zip");
    }

    #[test]
    fn description_limit_enforced() {
        assert!(validate_description(&"x".repeat(256)).is_ok());
        assert!(validate_description(&"x".repeat(257)).is_err());
    }
}
