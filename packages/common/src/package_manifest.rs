use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::package_reference::PackageReference;
use crate::validators::{
    validate_description, validate_package_name, validate_version_number, validate_website_url,
};

/// Maximum number of dependency references in one manifest.
pub const MAX_DEPENDENCY_COUNT: usize = 100;

/// The `manifest.json` of a package archive, as uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: String,
    pub version_number: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Field-keyed validation errors, `__all__` for non-field errors.
pub type FieldErrors = HashMap<String, Vec<String>>;

fn add_error(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

impl PackageManifest {
    /// Decode and validate manifest bytes.
    ///
    /// `own_namespace` is the namespace the package is being submitted
    /// under; a dependency on that namespace-name pair is a self
    /// reference. Returns the parsed manifest and its resolved dependency
    /// references, or the accumulated field errors.
    pub fn parse_and_validate(
        data: &[u8],
        own_namespace: &str,
    ) -> Result<(Self, Vec<PackageReference>), FieldErrors> {
        let mut errors = FieldErrors::new();

        let text = match std::str::from_utf8(data) {
            Ok(text) => text,
            Err(_) => {
                add_error(
                    &mut errors,
                    "__all__",
                    "Make sure the manifest.json is UTF-8 compatible".into(),
                );
                return Err(errors);
            }
        };

        let manifest: PackageManifest = match serde_json::from_str(text) {
            Ok(manifest) => manifest,
            Err(e) => {
                add_error(&mut errors, "__all__", format!("Unable to parse manifest.json: {e}"));
                return Err(errors);
            }
        };

        if let Err(e) = validate_package_name(&manifest.name) {
            add_error(&mut errors, "name", e);
        }
        if let Err(e) = validate_version_number(&manifest.version_number) {
            add_error(&mut errors, "version_number", e);
        }
        if let Err(e) = validate_website_url(&manifest.website_url) {
            add_error(&mut errors, "website_url", e);
        }
        if let Err(e) = validate_description(&manifest.description) {
            add_error(&mut errors, "description", e);
        }

        let references = manifest.validate_dependencies(own_namespace, &mut errors);

        if errors.is_empty() {
            Ok((manifest, references))
        } else {
            Err(errors)
        }
    }

    fn validate_dependencies(
        &self,
        own_namespace: &str,
        errors: &mut FieldErrors,
    ) -> Vec<PackageReference> {
        if self.dependencies.len() > MAX_DEPENDENCY_COUNT {
            add_error(
                errors,
                "dependencies",
                format!("A maximum of {MAX_DEPENDENCY_COUNT} dependencies is supported"),
            );
            return Vec::new();
        }

        let mut references = Vec::with_capacity(self.dependencies.len());
        for dependency in &self.dependencies {
            match PackageReference::parse(dependency) {
                Ok(reference) => references.push(reference),
                Err(e) => add_error(errors, "dependencies", format!("{dependency}: {e}")),
            }
        }

        // Duplicates are checked ignoring version.
        for (i, a) in references.iter().enumerate() {
            if references[..i].iter().any(|b| b.same_package(a)) {
                add_error(
                    errors,
                    "dependencies",
                    format!("Duplicate dependency: {}", a.package_name()),
                );
            }
        }

        // A bare name match is not enough: the same package name can
        // exist in any number of namespaces.
        for reference in &references {
            if reference.namespace.eq_ignore_ascii_case(own_namespace)
                && reference.name.eq_ignore_ascii_case(&self.name)
            {
                add_error(
                    errors,
                    "dependencies",
                    "A package cannot depend on itself".into(),
                );
                break;
            }
        }

        references
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_json(dependencies: &[&str]) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "name": "Test_Package",
            "version_number": "1.0.0",
            "website_url": "https://example.org",
            "description": "A test package",
            "dependencies": dependencies,
        }))
        .unwrap()
    }

    #[test]
    fn valid_manifest_parses() {
        let (manifest, refs) =
            PackageManifest::parse_and_validate(&manifest_json(&["Other-Dep-1.0.0"]), "Mine").unwrap();
        assert_eq!(manifest.name, "Test_Package");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].namespace, "Other");
    }

    #[test]
    fn invalid_utf8_is_reported_on_all() {
        let errors = PackageManifest::parse_and_validate(&[0x80, 0x81], "Mine").unwrap_err();
        assert!(errors["__all__"][0].contains("UTF-8"));
    }

    #[test]
    fn invalid_json_is_reported() {
        let errors = PackageManifest::parse_and_validate(b"{not json", "Mine").unwrap_err();
        assert!(errors["__all__"][0].contains("Unable to parse manifest.json"));
    }

    #[test]
    fn missing_name_is_a_field_error() {
        let data = serde_json::to_vec(&serde_json::json!({
            "version_number": "1.0.0",
        }))
        .unwrap();
        let errors = PackageManifest::parse_and_validate(&data, "Mine").unwrap_err();
        assert!(errors.contains_key("__all__"));
    }

    #[test]
    fn bad_version_is_a_field_error() {
        let data = serde_json::to_vec(&serde_json::json!({
            "name": "Ok_Name",
            "version_number": "1.0",
        }))
        .unwrap();
        let errors = PackageManifest::parse_and_validate(&data, "Mine").unwrap_err();
        assert!(errors.contains_key("version_number"));
    }

    #[test]
    fn duplicate_dependencies_ignoring_version() {
        let errors = PackageManifest::parse_and_validate(
            &manifest_json(&["Other-Dep-1.0.0", "Other-Dep-2.0.0"]),
            "Mine",
        )
        .unwrap_err();
        assert!(errors["dependencies"][0].contains("Duplicate dependency"));
    }

    #[test]
    fn self_reference_rejected() {
        let errors =
            PackageManifest::parse_and_validate(&manifest_json(&["Mine-Test_Package-1.0.0"]), "Mine")
                .unwrap_err();
        assert!(errors["dependencies"][0].contains("depend on itself"));
    }

    #[test]
    fn same_name_in_another_namespace_is_a_valid_dependency() {
        let (_, refs) =
            PackageManifest::parse_and_validate(&manifest_json(&["Other-Test_Package-1.0.0"]), "Mine")
                .unwrap();
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn too_many_dependencies_rejected() {
        let deps: Vec<String> = (0..=MAX_DEPENDENCY_COUNT)
            .map(|i| format!("NS-Dep{i}-1.0.0"))
            .collect();
        let dep_refs: Vec<&str> = deps.iter().map(String::as_str).collect();
        let errors =
            PackageManifest::parse_and_validate(&manifest_json(&dep_refs), "Mine").unwrap_err();
        assert!(errors.contains_key("dependencies"));
    }
}
