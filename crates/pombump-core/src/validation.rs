//! Input validation for patch coordinates, property updates, and file paths.
//!
//! Everything that enters the patcher from the command line or a patch file
//! passes through here before any POM is touched.

use crate::error::{PombumpError, Result};
use crate::patch::{Patch, PropertyPatch};
use regex::Regex;
use std::sync::LazyLock;

const MAX_GROUP_ID_LEN: usize = 256;
const MAX_ARTIFACT_ID_LEN: usize = 256;
const MAX_VERSION_LEN: usize = 128;
const MAX_PROPERTY_NAME_LEN: usize = 256;
const MAX_PROPERTY_VALUE_LEN: usize = 1024;
const MAX_SCOPE_LEN: usize = 64;

static COORDINATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("Invalid regex"));
// Version ranges use brackets, commas, and exclamation marks.
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._\-+\[\],!()]+$").expect("Invalid regex"));

const VALID_SCOPES: &[&str] = &["compile", "provided", "runtime", "test", "system", "import"];

/// Substrings that must never appear in values written into a POM.
const XML_DENYLIST: &[&str] = &[
    "<!entity",
    "<!doctype",
    "<![cdata[",
    "<?xml",
    "<script",
    "javascript:",
    "onerror=",
    "onclick=",
];

/// Checks one dependency patch: coordinate shape, version characters,
/// scope vocabulary, and injection denylist.
pub fn validate_patch(patch: &Patch) -> Result<()> {
    validate_coordinate("groupId", &patch.group_id, MAX_GROUP_ID_LEN)?;
    validate_coordinate("artifactId", &patch.artifact_id, MAX_ARTIFACT_ID_LEN)?;
    validate_version(&patch.version)?;

    if !patch.scope.is_empty() {
        if patch.scope.len() > MAX_SCOPE_LEN {
            return Err(PombumpError::invalid_input(format!(
                "scope too long: {} characters (max: {})",
                patch.scope.len(),
                MAX_SCOPE_LEN
            )));
        }
        if !VALID_SCOPES.contains(&patch.scope.as_str()) {
            return Err(PombumpError::invalid_input(format!(
                "invalid scope {:?}: must be one of {}",
                patch.scope,
                VALID_SCOPES.join(", ")
            )));
        }
    }
    if !patch.dep_type.is_empty() {
        validate_coordinate("type", &patch.dep_type, MAX_SCOPE_LEN)?;
    }
    Ok(())
}

/// Checks one property update: name shape, value length, and injection
/// denylist on the value.
pub fn validate_property_patch(patch: &PropertyPatch) -> Result<()> {
    if patch.property.is_empty() {
        return Err(PombumpError::invalid_input("property name cannot be empty"));
    }
    if patch.property.len() > MAX_PROPERTY_NAME_LEN {
        return Err(PombumpError::invalid_input(format!(
            "property name too long: {} characters (max: {})",
            patch.property.len(),
            MAX_PROPERTY_NAME_LEN
        )));
    }
    if !COORDINATE_RE.is_match(&patch.property) {
        return Err(PombumpError::invalid_input(format!(
            "invalid property name {:?}: only alphanumerics, dots, hyphens, and underscores are allowed",
            patch.property
        )));
    }

    if patch.value.is_empty() {
        return Err(PombumpError::invalid_input(format!(
            "property {:?} has an empty value",
            patch.property
        )));
    }
    if patch.value.len() > MAX_PROPERTY_VALUE_LEN {
        return Err(PombumpError::invalid_input(format!(
            "property value too long: {} characters (max: {})",
            patch.value.len(),
            MAX_PROPERTY_VALUE_LEN
        )));
    }
    check_xml_injection("property value", &patch.value)?;
    Ok(())
}

/// Checks a user-supplied file path before it is opened: rejects empty
/// paths, parent-directory traversal, and NUL bytes.
pub fn validate_file_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(PombumpError::invalid_input("file path cannot be empty"));
    }
    if path.contains("..") {
        return Err(PombumpError::invalid_input(format!(
            "file path {path:?} must not contain \"..\""
        )));
    }
    if path.contains('\0') {
        return Err(PombumpError::invalid_input("file path contains a NUL byte"));
    }
    Ok(())
}

fn validate_coordinate(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() {
        return Err(PombumpError::invalid_input(format!(
            "{field} cannot be empty"
        )));
    }
    if value.len() > max_len {
        return Err(PombumpError::invalid_input(format!(
            "{field} too long: {} characters (max: {max_len})",
            value.len()
        )));
    }
    if !COORDINATE_RE.is_match(value) {
        return Err(PombumpError::invalid_input(format!(
            "invalid {field} {value:?}: only alphanumerics, dots, hyphens, and underscores are allowed"
        )));
    }
    Ok(())
}

fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(PombumpError::invalid_input("version cannot be empty"));
    }
    if version.len() > MAX_VERSION_LEN {
        return Err(PombumpError::invalid_input(format!(
            "version too long: {} characters (max: {MAX_VERSION_LEN})",
            version.len()
        )));
    }
    if !VERSION_RE.is_match(version) {
        return Err(PombumpError::invalid_input(format!(
            "invalid version {version:?}: contains characters outside the Maven version grammar"
        )));
    }
    Ok(())
}

fn check_xml_injection(field: &str, value: &str) -> Result<()> {
    let lowered = value.to_lowercase();
    for needle in XML_DENYLIST {
        if lowered.contains(needle) {
            return Err(PombumpError::invalid_input(format!(
                "{field} contains disallowed sequence {needle:?}"
            )));
        }
    }
    if value.contains('<') && value.contains('>') {
        return Err(PombumpError::invalid_input(format!(
            "{field} contains markup"
        )));
    }
    Ok(())
}
