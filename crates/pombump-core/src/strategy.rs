//! BOM-first patch routing: version-conflict detection, BOM recommendation,
//! then property updates, then direct patches.

use crate::analyzer::{AnalysisResult, BomInfo};
use crate::patch::Patch;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// The routed outcome of one `patch_strategy` call.
#[derive(Debug, Clone, Default)]
pub struct PatchPlan {
    /// Patches to apply directly (including synthesized BOM updates).
    pub direct_patches: Vec<Patch>,
    /// Property name -> new value.
    pub property_patches: BTreeMap<String, String>,
    /// Advisory messages: unresolved property references, dropped duplicate
    /// property requests, conflicts without a BOM.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    UpdateBom,
    ResolveManually,
}

/// Disagreeing version requests within one groupId.
#[derive(Debug, Clone)]
pub struct VersionConflict {
    pub group_id: String,
    /// artifactId -> requested version.
    pub requested_versions: BTreeMap<String, String>,
    pub action: ConflictAction,
    pub bom_candidate: Option<BomInfo>,
}

/// Routes requested patches into direct patches and property updates.
///
/// Pure function of its inputs: the analysis result is never mutated.
/// Conflicting version requests within a group that has a matching BOM are
/// replaced by a single BOM update; remaining patches go to a property
/// update when the dependency's version is property-based, otherwise they
/// stay direct. A property receives at most one value per call; later
/// conflicting requests are dropped with a warning.
pub fn patch_strategy(result: &AnalysisResult, patches: &[Patch]) -> PatchPlan {
    debug!(
        "determining BOM-first patch strategy for {} patches ({} properties, {} dependencies, {} BOMs known)",
        patches.len(),
        result.properties.len(),
        result.dependencies.len(),
        result.boms.len()
    );

    let conflicts = detect_version_conflicts(result, patches);

    let mut plan = PatchPlan::default();
    let mut bom_recommendations: Vec<Patch> = Vec::new();
    let mut handled_groups: BTreeSet<String> = BTreeSet::new();

    for conflict in &conflicts {
        match (&conflict.bom_candidate, conflict.action) {
            (Some(bom), ConflictAction::UpdateBom) => {
                let version = optimal_bom_version(&conflict.requested_versions);
                info!(
                    "recommending BOM update {}:{} to {} instead of individual patches for group {}",
                    bom.group_id, bom.artifact_id, version, conflict.group_id
                );
                bom_recommendations.push(Patch {
                    group_id: bom.group_id.clone(),
                    artifact_id: bom.artifact_id.clone(),
                    version,
                    scope: "import".to_string(),
                    dep_type: "pom".to_string(),
                });
                handled_groups.insert(conflict.group_id.clone());
            }
            _ => {
                let message = format!(
                    "version conflict detected for {} but no BOM found - manual resolution required",
                    conflict.group_id
                );
                warn!("{message}");
                plan.warnings.push(message);
            }
        }
    }

    for patch in patches {
        if handled_groups.contains(&patch.group_id) {
            debug!(
                "skipping {} (handled by BOM recommendation)",
                patch.key()
            );
            continue;
        }

        match result.should_use_property(&patch.group_id, &patch.artifact_id) {
            Some(property_name) => {
                if let Some(existing) = plan.property_patches.get(property_name) {
                    let message = format!(
                        "property {} already set to {}, requested {} for {}",
                        property_name,
                        existing,
                        patch.version,
                        patch.key()
                    );
                    warn!("{message}");
                    plan.warnings.push(message);
                    continue;
                }

                plan.property_patches
                    .insert(property_name.to_string(), patch.version.clone());

                if let Some(current) = result.properties.get(property_name) {
                    info!(
                        "will update property {} from {} to {}",
                        property_name, current, patch.version
                    );
                } else {
                    let message = format!(
                        "property {property_name} is referenced but not found in the project - it may be defined in an external parent POM"
                    );
                    warn!("{message}");
                    plan.warnings.push(message);
                }
            }
            None => {
                info!("will directly patch {} to {}", patch.key(), patch.version);
                plan.direct_patches.push(patch.clone());
            }
        }
    }

    plan.direct_patches.extend(bom_recommendations);

    info!(
        "strategy: {} direct patches, {} property updates",
        plan.direct_patches.len(),
        plan.property_patches.len()
    );

    plan
}

/// Groups patches by groupId and reports groups whose artifacts disagree on
/// the requested version.
pub fn detect_version_conflicts(result: &AnalysisResult, patches: &[Patch]) -> Vec<VersionConflict> {
    let mut groups: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for patch in patches {
        groups
            .entry(patch.group_id.clone())
            .or_default()
            .insert(patch.artifact_id.clone(), patch.version.clone());
    }

    let mut conflicts = Vec::new();
    for (group_id, artifacts) in groups {
        if artifacts.len() < 2 {
            continue;
        }
        let versions: BTreeSet<&String> = artifacts.values().collect();
        if versions.len() < 2 {
            continue;
        }

        let bom_candidate = find_bom_for_group(result, &group_id).cloned();
        let action = if bom_candidate.is_some() {
            ConflictAction::UpdateBom
        } else {
            ConflictAction::ResolveManually
        };
        conflicts.push(VersionConflict {
            group_id,
            requested_versions: artifacts,
            action,
            bom_candidate,
        });
    }

    conflicts
}

/// Finds an imported BOM managing the given group: exact groupId match, or
/// one of the well-known BOM artifact aliases.
fn find_bom_for_group<'a>(result: &'a AnalysisResult, group_id: &str) -> Option<&'a BomInfo> {
    result.boms.iter().find(|bom| {
        bom.group_id == group_id
            || (group_id == "io.netty" && bom.artifact_id == "netty-bom")
            || (group_id == "org.springframework"
                && (bom.artifact_id == "spring-bom" || bom.artifact_id == "spring-framework-bom"))
    })
}

/// Highest requested version under plain lexicographic string comparison.
/// Not Maven-version aware (e.g. "4.1.9" sorts above "4.1.10"); kept for
/// compatibility with existing patch files.
fn optimal_bom_version(requested_versions: &BTreeMap<String, String>) -> String {
    requested_versions
        .values()
        .max()
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_project;
    use crate::model::Project;

    const POM: &str = r"<project>
  <properties>
    <netty.version>4.1.100.Final</netty.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>io.netty</groupId>
      <artifactId>netty-handler</artifactId>
      <version>${netty.version}</version>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.12</version>
    </dependency>
  </dependencies>
</project>";

    const POM_WITH_BOM: &str = r"<project>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>io.netty</groupId>
        <artifactId>netty-bom</artifactId>
        <version>4.1.100.Final</version>
        <type>pom</type>
        <scope>import</scope>
      </dependency>
    </dependencies>
  </dependencyManagement>
  <dependencies>
    <dependency>
      <groupId>io.netty</groupId>
      <artifactId>netty-handler</artifactId>
      <version>4.1.100.Final</version>
    </dependency>
    <dependency>
      <groupId>io.netty</groupId>
      <artifactId>netty-codec</artifactId>
      <version>4.1.100.Final</version>
    </dependency>
  </dependencies>
</project>";

    fn patch(group: &str, artifact: &str, version: &str) -> Patch {
        Patch {
            group_id: group.into(),
            artifact_id: artifact.into(),
            version: version.into(),
            scope: String::new(),
            dep_type: String::new(),
        }
    }

    fn analyzed(xml: &str) -> AnalysisResult {
        analyze_project(&xml.parse::<Project>().unwrap())
    }

    #[test]
    fn test_property_routed_patch() {
        let result = analyzed(POM);
        let plan = patch_strategy(
            &result,
            &[patch("io.netty", "netty-handler", "4.1.118.Final")],
        );

        assert!(plan.direct_patches.is_empty());
        assert_eq!(
            plan.property_patches.get("netty.version"),
            Some(&"4.1.118.Final".to_string())
        );
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn test_direct_patch_for_literal_version() {
        let result = analyzed(POM);
        let plan = patch_strategy(&result, &[patch("junit", "junit", "4.13.2")]);

        assert_eq!(plan.direct_patches.len(), 1);
        assert_eq!(plan.direct_patches[0].key(), "junit:junit");
        assert!(plan.property_patches.is_empty());
    }

    #[test]
    fn test_unknown_dependency_goes_direct() {
        let result = analyzed(POM);
        let plan = patch_strategy(&result, &[patch("com.example", "new-lib", "1.0.0")]);
        assert_eq!(plan.direct_patches.len(), 1);
    }

    #[test]
    fn test_bom_conflict_emits_single_bom_patch() {
        let result = analyzed(POM_WITH_BOM);
        let plan = patch_strategy(
            &result,
            &[
                patch("io.netty", "netty-handler", "4.1.115.Final"),
                patch("io.netty", "netty-codec", "4.1.110.Final"),
            ],
        );

        assert_eq!(plan.direct_patches.len(), 1);
        let bom = &plan.direct_patches[0];
        assert_eq!(bom.key(), "io.netty:netty-bom");
        // Lexicographic maximum of the conflicting requests.
        assert_eq!(bom.version, "4.1.115.Final");
        assert_eq!(bom.scope, "import");
        assert_eq!(bom.dep_type, "pom");
        assert!(plan.property_patches.is_empty());
    }

    #[test]
    fn test_conflict_without_bom_falls_through_to_direct() {
        let result = analyzed(POM);
        let plan = patch_strategy(
            &result,
            &[
                patch("org.apache.logging.log4j", "log4j-api", "2.22.0"),
                patch("org.apache.logging.log4j", "log4j-core", "2.21.0"),
            ],
        );

        // No BOM for the group: both patches stay direct and a warning is
        // surfaced.
        assert_eq!(plan.direct_patches.len(), 2);
        assert!(plan.warnings.iter().any(|w| w.contains("manual resolution")));
    }

    #[test]
    fn test_agreeing_versions_are_not_a_conflict() {
        let result = analyzed(POM_WITH_BOM);
        let conflicts = detect_version_conflicts(
            &result,
            &[
                patch("io.netty", "netty-handler", "4.1.118.Final"),
                patch("io.netty", "netty-codec", "4.1.118.Final"),
            ],
        );
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_property_first_wins() {
        let xml = r"<project>
  <properties>
    <netty.version>4.1.100.Final</netty.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>io.netty</groupId>
      <artifactId>netty-handler</artifactId>
      <version>${netty.version}</version>
    </dependency>
    <dependency>
      <groupId>io.netty.incubator</groupId>
      <artifactId>netty-incubator-codec</artifactId>
      <version>${netty.version}</version>
    </dependency>
  </dependencies>
</project>";
        let result = analyzed(xml);
        let plan = patch_strategy(
            &result,
            &[
                patch("io.netty", "netty-handler", "4.1.118.Final"),
                patch("io.netty.incubator", "netty-incubator-codec", "4.1.110.Final"),
            ],
        );

        // One value per property per call: the first patch wins, the second
        // is dropped with a warning.
        assert_eq!(
            plan.property_patches.get("netty.version"),
            Some(&"4.1.118.Final".to_string())
        );
        assert!(plan.direct_patches.is_empty());
        assert!(plan.warnings.iter().any(|w| w.contains("already set")));
    }

    #[test]
    fn test_undefined_property_still_recorded_with_warning() {
        let xml = r"<project>
  <dependencies>
    <dependency>
      <groupId>org.assertj</groupId>
      <artifactId>assertj-core</artifactId>
      <version>${assertj.version}</version>
    </dependency>
  </dependencies>
</project>";
        let result = analyzed(xml);
        let plan = patch_strategy(&result, &[patch("org.assertj", "assertj-core", "3.25.0")]);

        assert_eq!(
            plan.property_patches.get("assertj.version"),
            Some(&"3.25.0".to_string())
        );
        assert!(
            plan.warnings
                .iter()
                .any(|w| w.contains("external parent POM"))
        );
    }

    #[test]
    fn test_routing_completeness() {
        let result = analyzed(POM_WITH_BOM);
        let patches = [
            patch("io.netty", "netty-handler", "4.1.115.Final"),
            patch("io.netty", "netty-codec", "4.1.110.Final"),
            patch("com.google.guava", "guava", "33.0.0-jre"),
        ];
        let plan = patch_strategy(&result, &patches);

        // Two netty patches collapse into one BOM patch; guava stays direct.
        assert_eq!(plan.direct_patches.len(), 2);
        assert!(
            plan.direct_patches
                .iter()
                .any(|p| p.key() == "com.google.guava:guava")
        );
        assert!(
            plan.direct_patches
                .iter()
                .any(|p| p.key() == "io.netty:netty-bom")
        );
        assert!(
            !plan
                .direct_patches
                .iter()
                .any(|p| p.artifact_id == "netty-handler" || p.artifact_id == "netty-codec")
        );
    }

    #[test]
    fn test_spring_bom_alias() {
        let xml = r"<project>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.springframework.boot</groupId>
        <artifactId>spring-framework-bom</artifactId>
        <version>6.1.0</version>
        <type>pom</type>
        <scope>import</scope>
      </dependency>
    </dependencies>
  </dependencyManagement>
</project>";
        let result = analyzed(xml);
        let bom = find_bom_for_group(&result, "org.springframework").unwrap();
        assert_eq!(bom.artifact_id, "spring-framework-bom");
        assert!(find_bom_for_group(&result, "io.netty").is_none());
    }

    #[test]
    fn test_optimal_bom_version_is_lexicographic() {
        let mut requested = BTreeMap::new();
        requested.insert("a".to_string(), "4.1.9".to_string());
        requested.insert("b".to_string(), "4.1.10".to_string());
        // String ordering, deliberately: "9" > "1".
        assert_eq!(optimal_bom_version(&requested), "4.1.9");
    }
}
