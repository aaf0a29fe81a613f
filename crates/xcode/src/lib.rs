//! Xcode project tools for Swift Package Manager dependencies
//!
//! This crate provides:
//! - A parser and writer for `project.pbxproj` files
//! - An editable project object graph
//! - Dependency reconciliation for package references and product dependencies
//! - The `config.properties` dependency manifest
//! - Cleanup of resolved-package artifacts

pub mod artifacts;
pub mod graph;
pub mod manifest;
pub mod parser;
pub mod plist;
pub mod project;
pub mod spm;
pub mod writer;

#[cfg(test)]
mod test_fixtures;

pub use artifacts::SpmArtifacts;
pub use graph::{PackageGraph, PackageReference, ProductDependency, VersionRequirement};
pub use manifest::{parse_manifest, read_manifest};
pub use project::{bundle_path, Target, XcodeProject};
pub use spm::{
    select_target, AddOutcome, Dependency, DependencyListing, ListedDependency, PackageRemoval,
    ProductRemoval, Reconciler, RemoveOutcome,
};
