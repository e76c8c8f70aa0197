//! POM patching and dependency analysis.
//!
//! This crate provides the core of the pombump tool: parsing pom.xml files
//! into an editable model, applying dependency and property patches,
//! analyzing property usage and BOM imports, planning BOM-first patch
//! strategies, and re-serializing POMs with their original comments
//! preserved.

pub mod analyzer;
pub mod comments;
pub mod error;
pub mod model;
pub mod patch;
pub mod report;
pub mod strategy;
pub mod validation;

pub use analyzer::{
    AnalysisResult, BomInfo, DependencyInfo, analyze_project, analyze_project_path,
    find_property_location,
};
pub use comments::preserve_comments;
pub use error::{PombumpError, Result};
pub use model::{Dependency, DependencySection, Project};
pub use patch::{
    DEFAULT_SCOPE, DEFAULT_TYPE, Patch, PatchList, PropertyList, PropertyPatch, apply_patches,
};
pub use report::{AnalysisOutput, DependencyAnalysis, PropertyAnalysis, UnfixableIssue};
pub use strategy::{ConflictAction, PatchPlan, VersionConflict, patch_strategy};
pub use validation::{validate_file_path, validate_patch, validate_property_patch};
