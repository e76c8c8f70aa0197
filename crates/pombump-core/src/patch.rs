//! Dependency and property patches, and their application to a project.

use crate::model::{Dependency, DependencySection, Project};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Default scope and type for a patch that does not specify them.
pub const DEFAULT_SCOPE: &str = "import";
pub const DEFAULT_TYPE: &str = "jar";

/// A requested dependency version change. Identity is `(groupId, artifactId)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Patch {
    #[serde(rename = "groupId")]
    pub group_id: String,
    #[serde(rename = "artifactId")]
    pub artifact_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "type")]
    pub dep_type: String,
}

impl Patch {
    /// Canonical identifier: "{groupId}:{artifactId}".
    pub fn key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// Fills in the default scope and type for omitted fields.
    pub fn fill_defaults(&mut self) {
        if self.scope.is_empty() {
            self.scope = DEFAULT_SCOPE.to_string();
        }
        if self.dep_type.is_empty() {
            self.dep_type = DEFAULT_TYPE.to_string();
        }
    }
}

/// A requested property change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyPatch {
    pub property: String,
    pub value: String,
}

/// YAML file shape: `{patches: [{groupId, artifactId, version, scope?, type?}]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchList {
    #[serde(default)]
    pub patches: Vec<Patch>,
}

/// YAML file shape: `{properties: [{property, value}]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyList {
    #[serde(default)]
    pub properties: Vec<PropertyPatch>,
}

/// Applies dependency and property patches to the project, in place.
///
/// Each patch is matched against direct dependencies first, then against
/// dependency-management; a match overwrites only the version. Patches
/// matched nowhere are appended to dependency-management so the version is
/// pinned without forcing the dependency into the build. Property patches
/// are upserted unconditionally.
pub fn apply_patches(
    project: &mut Project,
    patches: &[Patch],
    property_patches: &BTreeMap<String, String>,
) {
    let mut missing: Vec<Patch> = Vec::new();

    for patch in patches {
        debug!(
            "have patch: {}:{} -> {}",
            patch.group_id, patch.artifact_id, patch.version
        );

        let updated = project.update_dependency_version(
            DependencySection::Direct,
            &patch.group_id,
            &patch.artifact_id,
            &patch.version,
        );
        if updated > 0 {
            info!(
                "patched dependency {}:{} to {}",
                patch.group_id, patch.artifact_id, patch.version
            );
            continue;
        }

        let updated = project.update_dependency_version(
            DependencySection::Management,
            &patch.group_id,
            &patch.artifact_id,
            &patch.version,
        );
        if updated > 0 {
            info!(
                "patched managed dependency {}:{} to {}",
                patch.group_id, patch.artifact_id, patch.version
            );
            continue;
        }

        // Unmatched: queue for dependency-management, one entry per
        // (groupId, artifactId), last requested version wins.
        missing.retain(|m| {
            !(m.group_id == patch.group_id && m.artifact_id == patch.artifact_id)
        });
        missing.push(patch.clone());
    }

    for md in &missing {
        info!(
            "adding missing dependency {}:{}:{} to dependencyManagement",
            md.group_id, md.artifact_id, md.version
        );
        project.add_managed_dependency(&Dependency {
            group_id: md.group_id.clone(),
            artifact_id: md.artifact_id.clone(),
            version: md.version.clone(),
            scope: md.scope.clone(),
            dep_type: md.dep_type.clone(),
        });
    }

    for (name, value) in property_patches {
        info!("setting property {} = {}", name, value);
        project.set_property(name, value);
    }
}
