//! End-to-end tests using fixture files: parse, analyze, plan, patch,
//! marshal, and restore comments.

use pombump_core::{
    Patch, Project, analyze_project, analyze_project_path, apply_patches, patch_strategy,
    preserve_comments,
};
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::Path;

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {name}: {e}"))
}

fn write_temp_pom(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::with_suffix(".xml").unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn patch(group: &str, artifact: &str, version: &str) -> Patch {
    Patch {
        group_id: group.to_string(),
        artifact_id: artifact.to_string(),
        version: version.to_string(),
        scope: String::new(),
        dep_type: String::new(),
    }
}

#[test]
fn test_analyze_commented_pom() {
    let project: Project = load_fixture("commented_pom.xml").parse().unwrap();
    let result = analyze_project(&project);

    assert_eq!(result.dependencies.len(), 3);
    assert_eq!(result.count_property_usage(), 2);
    assert_eq!(result.boms.len(), 1);
    assert_eq!(result.boms[0].artifact_id, "netty-bom");
    assert_eq!(result.properties["netty.version"], "4.1.100.Final");
    assert_eq!(
        result.should_use_property("io.netty", "netty-handler"),
        Some("netty.version")
    );
    assert_eq!(result.should_use_property("junit", "junit"), None);
}

#[test]
fn test_property_routed_patch_end_to_end() {
    let original = load_fixture("commented_pom.xml");
    let mut project: Project = original.parse().unwrap();
    let analysis = analyze_project(&project);

    let requested = vec![patch("io.netty", "netty-handler", "4.1.118.Final")];
    let plan = patch_strategy(&analysis, &requested);

    assert!(plan.direct_patches.is_empty());
    assert_eq!(plan.property_patches["netty.version"], "4.1.118.Final");

    apply_patches(&mut project, &plan.direct_patches, &plan.property_patches);
    let output = project.marshal().unwrap();
    let text = String::from_utf8(output).unwrap();

    assert!(text.contains("<netty.version>4.1.118.Final</netty.version>"));
    // The dependency still references the property.
    assert!(text.contains("<version>${netty.version}</version>"));
    // The untouched property is intact.
    assert!(text.contains("<slf4j.version>1.7.36</slf4j.version>"));
}

#[test]
fn test_conflict_resolved_through_bom() {
    let original = load_fixture("commented_pom.xml");
    let mut project: Project = original.parse().unwrap();
    let analysis = analyze_project(&project);

    // Two io.netty artifacts at different versions: the plan updates the
    // BOM once instead of patching each artifact.
    let requested = vec![
        patch("io.netty", "netty-handler", "4.1.115.Final"),
        patch("io.netty", "netty-codec-http", "4.1.110.Final"),
    ];
    let plan = patch_strategy(&analysis, &requested);

    assert_eq!(plan.direct_patches.len(), 1);
    let bom_patch = &plan.direct_patches[0];
    assert_eq!(bom_patch.group_id, "io.netty");
    assert_eq!(bom_patch.artifact_id, "netty-bom");
    assert_eq!(bom_patch.version, "4.1.115.Final");
    assert!(plan.property_patches.is_empty());

    apply_patches(&mut project, &plan.direct_patches, &plan.property_patches);
    let text = String::from_utf8(project.marshal().unwrap()).unwrap();

    // The managed BOM entry now carries the pinned version.
    assert!(text.contains("<artifactId>netty-bom</artifactId>"));
    assert!(text.contains("<version>4.1.115.Final</version>"));
}

#[test]
fn test_direct_update_simple_pom() {
    let mut project: Project = load_fixture("simple_pom.xml").parse().unwrap();

    let patches = vec![patch("junit", "junit", "4.13.2")];
    apply_patches(&mut project, &patches, &BTreeMap::new());
    let text = String::from_utf8(project.marshal().unwrap()).unwrap();

    assert!(text.contains("<version>4.13.2</version>"));
    assert!(!text.contains("<version>4.12</version>"));
    assert!(text.contains("<version>3.12.0</version>"));
}

#[test]
fn test_missing_dependency_lands_in_dependency_management() {
    let mut project: Project = load_fixture("simple_pom.xml").parse().unwrap();

    let mut missing = patch("com.fasterxml.jackson.core", "jackson-databind", "2.15.3");
    missing.fill_defaults();
    apply_patches(&mut project, &[missing], &BTreeMap::new());
    let text = String::from_utf8(project.marshal().unwrap()).unwrap();

    let mgmt_pos = text.find("<dependencyManagement>").unwrap();
    let jackson_pos = text
        .find("<artifactId>jackson-databind</artifactId>")
        .unwrap();
    assert!(jackson_pos > mgmt_pos);
    assert!(text.contains("<version>2.15.3</version>"));
    // Appended entries carry the defaults.
    assert!(text.contains("<scope>import</scope>"));
    assert!(text.contains("<type>jar</type>"));
}

#[test]
fn test_comments_survive_patch_round_trip() {
    let original = load_fixture("commented_pom.xml");
    let file = write_temp_pom(&original);

    let mut project: Project = original.parse().unwrap();
    apply_patches(&mut project, &[patch("junit", "junit", "4.13.2")], &BTreeMap::new());
    let marshaled = project.marshal().unwrap();

    let merged = preserve_comments(file.path(), &marshaled).unwrap();
    let text = String::from_utf8(merged).unwrap();

    // Every standalone comment of the original is back.
    assert!(text.contains("Licensed to the demo project"));
    assert!(text.contains("<!-- Centralized version management -->"));
    assert!(text.contains("<!-- Netty BOM pins all io.netty artifacts -->"));
    assert!(text.contains("<!-- Testing only -->"));

    // License block sits between the declaration and the project element.
    let decl_pos = text.find("<?xml").unwrap();
    let license_pos = text.find("Licensed to the demo project").unwrap();
    let project_pos = text.find("<project").unwrap();
    assert!(decl_pos < license_pos && license_pos < project_pos);

    // The patch itself is present.
    assert!(text.contains("<version>4.13.2</version>"));
}

#[test]
fn test_comment_count_stable_over_repeated_rewrites() {
    let original = load_fixture("commented_pom.xml");
    let file = write_temp_pom(&original);

    let project: Project = original.parse().unwrap();
    let marshaled = project.marshal().unwrap();
    let merged = preserve_comments(file.path(), &marshaled).unwrap();
    let text = String::from_utf8(merged).unwrap();

    let original_count = original.matches("<!--").count();
    assert_eq!(text.matches("<!--").count(), original_count);
}

#[test]
fn test_analyze_project_path_merges_sibling_properties() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    std::fs::write(
        root.join("pom.xml"),
        r#"<?xml version="1.0"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <dependencies>
    <dependency>
      <groupId>io.netty</groupId>
      <artifactId>netty-handler</artifactId>
      <version>${netty.version}</version>
    </dependency>
  </dependencies>
</project>
"#,
    )
    .unwrap();
    std::fs::create_dir(root.join("parent")).unwrap();
    std::fs::write(
        root.join("parent/pom.xml"),
        r#"<?xml version="1.0"?>
<project>
  <properties>
    <netty.version>4.1.100.Final</netty.version>
  </properties>
</project>
"#,
    )
    .unwrap();

    let result = analyze_project_path(&root.join("pom.xml")).unwrap();
    assert_eq!(result.properties["netty.version"], "4.1.100.Final");

    // With the property definition found, the patch routes to the property.
    let plan = patch_strategy(
        &result,
        &[patch("io.netty", "netty-handler", "4.1.118.Final")],
    );
    assert!(plan.direct_patches.is_empty());
    assert_eq!(plan.property_patches["netty.version"], "4.1.118.Final");
}

#[test]
fn test_undefined_property_reference_warns() {
    let project: Project = r#"<?xml version="1.0"?>
<project>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>widget</artifactId>
      <version>${widget.version}</version>
    </dependency>
  </dependencies>
</project>
"#
    .parse()
    .unwrap();
    let analysis = analyze_project(&project);

    let plan = patch_strategy(&analysis, &[patch("org.example", "widget", "2.0.0")]);
    assert_eq!(plan.property_patches["widget.version"], "2.0.0");
    assert!(
        plan.warnings
            .iter()
            .any(|w| w.contains("external parent POM"))
    );
}
