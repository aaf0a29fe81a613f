//! Swift Package Manager dependency reconciliation
//!
//! Adds and removes package product dependencies on a target, sharing one
//! package reference per repository URL. A package reference lives as long
//! as some product dependency on the target still points at it; liveness is
//! recomputed by scanning the target on every removal.

use crate::graph::{PackageGraph, PackageReference, ProductDependency, VersionRequirement};
use crate::project::Target;
use xcspm_core::error::{Error, Result};
use xcspm_core::validation::Validator;

/// A named product from a package at a URL and minimum version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub url: String,
    pub version: String,
    pub product_name: String,
}

impl Dependency {
    /// Build a dependency from raw input, trimming every field
    ///
    /// Fails with a validation error naming each empty field.
    pub fn new(url: &str, version: &str, product_name: &str) -> Result<Self> {
        let (url, version, product_name) = (url.trim(), version.trim(), product_name.trim());
        Validator::new()
            .required("url", url)
            .required("version", version)
            .required("product_name", product_name)
            .validate()
            .to_result()?;

        Ok(Self {
            url: url.to_string(),
            version: version.to_string(),
            product_name: product_name.to_string(),
        })
    }
}

/// What `add` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new product dependency was appended to the target
    Added {
        product: ProductDependency,
        package: PackageReference,
        reused_package: bool,
    },
    /// A product dependency with the same name exists; nothing changed.
    /// `existing_url` is set when it comes from a different repository.
    AlreadyPresent {
        product: ProductDependency,
        existing_url: Option<String>,
    },
}

/// What `remove` did with the product dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRemoval {
    Removed,
    NotFound,
}

/// What `remove` did with the package reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageRemoval {
    Removed,
    StillInUse,
    NotFound,
}

/// What `remove` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub product: ProductRemoval,
    pub package: PackageRemoval,
}

/// A product dependency of the target together with its package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedDependency {
    pub product: ProductDependency,
    pub package: Option<PackageReference>,
}

/// Swift package state of one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyListing {
    pub target: Target,
    pub dependencies: Vec<ListedDependency>,
    /// Package references no product on the target uses
    pub unused_packages: Vec<PackageReference>,
}

/// Pick the target to edit: `name` if given, else the project's first target
pub fn select_target<G: PackageGraph>(graph: &G, name: Option<&str>) -> Result<Target> {
    let targets = graph.targets();
    match name {
        Some(name) => targets
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::target_not_found(name)),
        None => targets.into_iter().next().ok_or_else(Error::no_targets),
    }
}

/// Edits the Swift package dependencies of one target
pub struct Reconciler<'g, G: PackageGraph> {
    graph: &'g mut G,
    target: Target,
}

impl<'g, G: PackageGraph> Reconciler<'g, G> {
    /// Bind to the target chosen by [`select_target`]
    pub fn new(graph: &'g mut G, target_name: Option<&str>) -> Result<Self> {
        let target = select_target(graph, target_name)?;
        tracing::debug!(target = %target.name, id = %target.id, "Selected target");
        Ok(Self { graph, target })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn find_product(&self, product_name: &str) -> Option<ProductDependency> {
        self.graph
            .product_dependencies(&self.target)
            .into_iter()
            .find(|dep| dep.product_name.as_deref() == Some(product_name))
    }

    fn find_package(&self, url: &str) -> Option<PackageReference> {
        self.graph
            .package_references()
            .into_iter()
            .find(|pkg| pkg.url == url)
    }

    /// Add a product dependency, reusing the package reference for its URL
    ///
    /// Idempotent by product name: an existing dependency with the same name
    /// is left untouched even if it points at another package. A reused
    /// package reference keeps its version requirement.
    pub fn add(&mut self, dependency: &Dependency) -> Result<AddOutcome> {
        if let Some(product) = self.find_product(&dependency.product_name) {
            let existing_url = product
                .package
                .as_deref()
                .and_then(|id| {
                    self.graph
                        .package_references()
                        .into_iter()
                        .find(|pkg| pkg.id == id)
                })
                .map(|pkg| pkg.url)
                .filter(|url| *url != dependency.url);
            tracing::info!(
                product = %dependency.product_name,
                "Product dependency already present, skipping add"
            );
            return Ok(AddOutcome::AlreadyPresent {
                product,
                existing_url,
            });
        }

        let (package, reused_package) = match self.find_package(&dependency.url) {
            Some(package) => (package, true),
            None => {
                let requirement = VersionRequirement::up_to_next_major(&dependency.version);
                (self.graph.add_package_reference(&dependency.url, &requirement)?, false)
            }
        };

        let product = self.graph.add_product_dependency(
            &self.target,
            &dependency.product_name,
            &package,
        )?;
        tracing::debug!(
            product = %dependency.product_name,
            package = %package.url,
            reused_package,
            "Added product dependency"
        );

        Ok(AddOutcome::Added {
            product,
            package,
            reused_package,
        })
    }

    /// Remove a product dependency and, if nothing else on the target uses
    /// it, its package reference
    ///
    /// Matching is by product name and URL only; the version is not
    /// consulted. Missing nodes are reported, not treated as errors.
    pub fn remove(&mut self, dependency: &Dependency) -> Result<RemoveOutcome> {
        tracing::debug!(version = %dependency.version, "Version is not used for matching on removal");

        let product = match self.find_product(&dependency.product_name) {
            Some(product) => {
                self.graph.remove_product_dependency(&product)?;
                ProductRemoval::Removed
            }
            None => {
                tracing::info!(product = %dependency.product_name, "Product dependency not found");
                ProductRemoval::NotFound
            }
        };

        let package = match self.find_package(&dependency.url) {
            Some(package) => {
                let still_in_use = self
                    .graph
                    .product_dependencies(&self.target)
                    .iter()
                    .any(|dep| dep.package.as_deref() == Some(package.id.as_str()));
                if still_in_use {
                    PackageRemoval::StillInUse
                } else {
                    self.graph.remove_package_reference(&package)?;
                    PackageRemoval::Removed
                }
            }
            None => {
                tracing::info!(url = %dependency.url, "Package reference not found");
                PackageRemoval::NotFound
            }
        };

        Ok(RemoveOutcome { product, package })
    }

    /// Report the target's product dependencies and unused packages
    pub fn list(&self) -> DependencyListing {
        let packages = self.graph.package_references();
        let dependencies: Vec<ListedDependency> = self
            .graph
            .product_dependencies(&self.target)
            .into_iter()
            .map(|product| {
                let package = product
                    .package
                    .as_deref()
                    .and_then(|id| packages.iter().find(|pkg| pkg.id == id))
                    .cloned();
                ListedDependency { product, package }
            })
            .collect();

        let unused_packages = packages
            .iter()
            .filter(|pkg| {
                !dependencies
                    .iter()
                    .any(|dep| dep.product.package.as_deref() == Some(pkg.id.as_str()))
            })
            .cloned()
            .collect();

        DependencyListing {
            target: self.target.clone(),
            dependencies,
            unused_packages,
        }
    }
}
