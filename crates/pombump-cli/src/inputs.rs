//! Patch and property ingestion from YAML files and flag strings.

use anyhow::{Context, Result, bail};
use pombump_core::{
    Patch, PatchList, PropertyList, PropertyPatch, validate_patch, validate_property_patch,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Reads dependency patches from a YAML file or a flag string, fills in
/// default scope/type, and validates every entry.
pub fn parse_patches(patch_file: Option<&Path>, patch_flag: Option<&str>) -> Result<Vec<Patch>> {
    let mut patches = if let Some(path) = patch_file {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        let list: PatchList = serde_yaml_ng::from_str(&data)
            .with_context(|| format!("failed parsing {}", path.display()))?;
        list.patches
    } else {
        parse_dependency_flag(patch_flag.unwrap_or_default())?
    };

    for patch in &mut patches {
        patch.fill_defaults();
        validate_patch(patch)?;
    }
    Ok(patches)
}

/// Reads property updates from a YAML file or a flag string and validates
/// every entry.
pub fn parse_properties(
    properties_file: Option<&Path>,
    properties_flag: Option<&str>,
) -> Result<BTreeMap<String, String>> {
    let entries = if let Some(path) = properties_file {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        let list: PropertyList = serde_yaml_ng::from_str(&data)
            .with_context(|| format!("failed parsing {}", path.display()))?;
        list.properties
    } else {
        parse_property_flag(properties_flag.unwrap_or_default())?
    };

    let mut properties = BTreeMap::new();
    for entry in entries {
        validate_property_patch(&entry)?;
        properties.insert(entry.property, entry.value);
    }
    Ok(properties)
}

fn parse_dependency_flag(flag: &str) -> Result<Vec<Patch>> {
    let mut patches = Vec::new();
    for spec in flag.split(' ').filter(|s| !s.is_empty()) {
        let parts: Vec<&str> = spec.split('@').collect();
        if parts.len() < 3 || parts.len() > 5 {
            bail!(
                "invalid dependency format ({spec}): expected groupID@artifactID@version[@scope[@type]]"
            );
        }
        patches.push(Patch {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            scope: parts.get(3).unwrap_or(&"").to_string(),
            dep_type: parts.get(4).unwrap_or(&"").to_string(),
        });
    }
    Ok(patches)
}

fn parse_property_flag(flag: &str) -> Result<Vec<PropertyPatch>> {
    let mut properties = Vec::new();
    for spec in flag.split(' ').filter(|s| !s.is_empty()) {
        let parts: Vec<&str> = spec.split('@').collect();
        if parts.len() != 2 {
            bail!("invalid property format ({spec}): expected property@value");
        }
        properties.push(PropertyPatch {
            property: parts[0].to_string(),
            value: parts[1].to_string(),
        });
    }
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_parse_dependency_flag_with_defaults() {
        let patches = parse_patches(None, Some("io.netty@netty-handler@4.1.118.Final")).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].group_id, "io.netty");
        assert_eq!(patches[0].version, "4.1.118.Final");
        assert_eq!(patches[0].scope, "import");
        assert_eq!(patches[0].dep_type, "jar");
    }

    #[test]
    fn test_parse_dependency_flag_with_scope_and_type() {
        let patches =
            parse_patches(None, Some("org.example@widget@1.0@test@pom junit@junit@4.13.2"))
                .unwrap();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].scope, "test");
        assert_eq!(patches[0].dep_type, "pom");
        assert_eq!(patches[1].key(), "junit:junit");
    }

    #[test]
    fn test_parse_dependency_flag_malformed() {
        assert!(parse_patches(None, Some("junit@junit")).is_err());
        assert!(parse_patches(None, Some("a@b@c@d@e@f")).is_err());
    }

    #[test]
    fn test_parse_dependency_flag_rejects_unsafe_values() {
        assert!(parse_patches(None, Some("io netty@handler@1.0")).is_err());
    }

    #[test]
    fn test_parse_empty_flag_is_empty() {
        assert!(parse_patches(None, None).unwrap().is_empty());
        assert!(parse_properties(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_parse_patch_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"patches:\n  - groupId: io.netty\n    artifactId: netty-bom\n    version: 4.1.118.Final\n    type: pom\n",
        )
        .unwrap();
        let patches = parse_patches(Some(file.path()), None).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].dep_type, "pom");
        // Unset scope picks up the default.
        assert_eq!(patches[0].scope, "import");
    }

    #[test]
    fn test_parse_property_flag() {
        let properties =
            parse_properties(None, Some("netty.version@4.1.118.Final slf4j.version@2.0.9"))
                .unwrap();
        assert_eq!(properties["netty.version"], "4.1.118.Final");
        assert_eq!(properties["slf4j.version"], "2.0.9");
    }

    #[test]
    fn test_parse_properties_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"properties:\n  - property: netty.version\n    value: 4.1.118.Final\n")
            .unwrap();
        let properties = parse_properties(Some(file.path()), None).unwrap();
        assert_eq!(properties["netty.version"], "4.1.118.Final");
    }

    #[test]
    fn test_property_injection_rejected() {
        assert!(parse_properties(None, Some("v@<script>alert(1)</script>")).is_err());
    }
}
