//! Swift package nodes of the project graph
//!
//! [`PackageGraph`] is the seam between the dependency reconciler and the
//! project file: the reconciler only finds, appends and deletes nodes
//! through it, and [`XcodeProject`] implements it on top of the pbxproj
//! object graph.

use crate::plist::{Dict, Value};
use crate::project::{Target, XcodeProject};
use std::fmt;
use xcspm_core::error::{Error, Result};

pub const REMOTE_PACKAGE_REFERENCE: &str = "XCRemoteSwiftPackageReference";
pub const PRODUCT_DEPENDENCY: &str = "XCSwiftPackageProductDependency";

/// Version constraint of a package reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequirement {
    pub kind: String,
    pub minimum_version: Option<String>,
}

impl VersionRequirement {
    /// "From `version`, up to the next major version"
    pub fn up_to_next_major(version: &str) -> Self {
        Self {
            kind: "upToNextMajorVersion".to_string(),
            minimum_version: Some(version.to_string()),
        }
    }

    fn from_dict(dict: &Dict) -> Option<Self> {
        Some(Self {
            kind: dict.get_str("kind")?.to_string(),
            minimum_version: dict.get_str("minimumVersion").map(String::from),
        })
    }

    fn to_dict(&self) -> Dict {
        let mut dict = Dict::new().with("kind", self.kind.as_str());
        if let Some(version) = &self.minimum_version {
            dict.insert("minimumVersion", version.as_str());
        }
        dict
    }
}

impl fmt::Display for VersionRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.minimum_version {
            Some(version) if self.kind == "upToNextMajorVersion" => {
                write!(f, "{} up to next major", version)
            }
            Some(version) => write!(f, "{} {}", self.kind, version),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A remote Swift package the project depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    pub id: String,
    pub url: String,
    pub requirement: Option<VersionRequirement>,
}

/// A product of a package linked into a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDependency {
    pub id: String,
    /// `None` for a node written without a `productName`
    pub product_name: Option<String>,
    /// Id of the package reference supplying the product
    pub package: Option<String>,
}

/// Capability interface over a project's Swift package nodes
pub trait PackageGraph {
    /// Targets in project order
    fn targets(&self) -> Vec<Target>;

    /// Remote package references of the project
    fn package_references(&self) -> Vec<PackageReference>;

    /// Product dependencies of `target`, in order
    fn product_dependencies(&self, target: &Target) -> Vec<ProductDependency>;

    /// Create a package reference and list it on the project
    fn add_package_reference(
        &mut self,
        url: &str,
        requirement: &VersionRequirement,
    ) -> Result<PackageReference>;

    /// Create a product dependency on `package` and append it to `target`
    fn add_product_dependency(
        &mut self,
        target: &Target,
        product_name: &str,
        package: &PackageReference,
    ) -> Result<ProductDependency>;

    /// Detach a product dependency from its target and delete it
    fn remove_product_dependency(&mut self, dependency: &ProductDependency) -> Result<()>;

    /// Delete a package reference and drop it from the project
    fn remove_package_reference(&mut self, package: &PackageReference) -> Result<()>;
}

/// Display name Xcode gives a package reference: the repository name
pub fn package_display_name(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last)
}

impl PackageGraph for XcodeProject {
    fn targets(&self) -> Vec<Target> {
        XcodeProject::targets(self)
    }

    fn package_references(&self) -> Vec<PackageReference> {
        let Ok(root) = self.root_object() else {
            return Vec::new();
        };

        root.get_array("packageReferences")
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .filter_map(|id| {
                let object = self.object(id)?;
                if object.isa() != Some(REMOTE_PACKAGE_REFERENCE) {
                    return None;
                }
                Some(PackageReference {
                    id: id.to_string(),
                    url: object.get_str("repositoryURL")?.to_string(),
                    requirement: object
                        .get_dict("requirement")
                        .and_then(VersionRequirement::from_dict),
                })
            })
            .collect()
    }

    fn product_dependencies(&self, target: &Target) -> Vec<ProductDependency> {
        let Some(target_object) = self.object(&target.id) else {
            return Vec::new();
        };

        target_object
            .get_array("packageProductDependencies")
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .filter_map(|id| {
                let object = self.object(id)?;
                Some(ProductDependency {
                    id: id.to_string(),
                    product_name: object.get_str("productName").map(String::from),
                    package: object.get_str("package").map(String::from),
                })
            })
            .collect()
    }

    fn add_package_reference(
        &mut self,
        url: &str,
        requirement: &VersionRequirement,
    ) -> Result<PackageReference> {
        let object = Dict::new()
            .with("isa", REMOTE_PACKAGE_REFERENCE)
            .with("repositoryURL", url)
            .with("requirement", requirement.to_dict());
        let annotation = format!(
            "{} \"{}\"",
            REMOTE_PACKAGE_REFERENCE,
            package_display_name(url)
        );
        let id = self.add_object(object, Some(annotation));

        let reference = self.reference(&id);
        self.root_object_mut()?
            .array_entry("packageReferences")
            .push(reference);

        Ok(PackageReference {
            id,
            url: url.to_string(),
            requirement: Some(requirement.clone()),
        })
    }

    fn add_product_dependency(
        &mut self,
        target: &Target,
        product_name: &str,
        package: &PackageReference,
    ) -> Result<ProductDependency> {
        if self.object(&target.id).is_none() {
            return Err(Error::dangling_reference(&target.id).with_context("target"));
        }

        let object = Dict::new()
            .with("isa", PRODUCT_DEPENDENCY)
            .with("package", self.reference(&package.id))
            .with("productName", product_name);
        let id = self.add_object(object, Some(product_name.to_string()));

        let reference = self.reference(&id);
        self.object_mut(&target.id)
            .ok_or_else(|| Error::dangling_reference(&target.id).with_context("target"))?
            .array_entry("packageProductDependencies")
            .push(reference);

        Ok(ProductDependency {
            id,
            product_name: Some(product_name.to_string()),
            package: Some(package.id.clone()),
        })
    }

    fn remove_product_dependency(&mut self, dependency: &ProductDependency) -> Result<()> {
        self.remove_object(&dependency.id)
            .map(|_| ())
            .ok_or_else(|| Error::dangling_reference(&dependency.id))
    }

    fn remove_package_reference(&mut self, package: &PackageReference) -> Result<()> {
        self.remove_object(&package.id)
            .map(|_| ())
            .ok_or_else(|| Error::dangling_reference(&package.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{FIREBASE_URL, PLUGIN_PBXPROJ};
    use std::path::Path;

    fn fixture() -> XcodeProject {
        XcodeProject::parse(PLUGIN_PBXPROJ, Path::new("Plugin.xcodeproj")).unwrap()
    }

    #[test]
    fn test_package_display_name() {
        assert_eq!(package_display_name("https://github.com/firebase/firebase-ios-sdk"), "firebase-ios-sdk");
        assert_eq!(package_display_name("https://github.com/a/b.git"), "b");
        assert_eq!(package_display_name("https://github.com/a/b/"), "b");
    }

    #[test]
    fn test_existing_nodes() {
        let project = fixture();
        let packages = project.package_references();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].url, FIREBASE_URL);
        assert_eq!(
            packages[0].requirement,
            Some(VersionRequirement::up_to_next_major("10.0.0"))
        );

        let target = &project.targets()[0];
        let products = project.product_dependencies(target);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_name.as_deref(), Some("FirebaseCore"));
        assert_eq!(products[0].package.as_deref(), Some(packages[0].id.as_str()));
    }

    #[test]
    fn test_added_nodes_serialize_like_xcode() {
        let mut project = fixture();
        let target = project.targets()[0].clone();
        let package = project
            .add_package_reference(
                "https://github.com/googleads/swift-package-manager-google-mobile-ads.git",
                &VersionRequirement::up_to_next_major("11.2.0"),
            )
            .unwrap();
        let product = project
            .add_product_dependency(&target, "GoogleMobileAds", &package)
            .unwrap();

        let text = project.to_pbxproj_string();
        let annotation = "XCRemoteSwiftPackageReference \"swift-package-manager-google-mobile-ads\"";
        assert!(text.contains(&format!(
            "\t\t{} /* {} */ = {{\n\t\t\tisa = XCRemoteSwiftPackageReference;\n\t\t\trepositoryURL = \"https://github.com/googleads/swift-package-manager-google-mobile-ads.git\";\n\t\t\trequirement = {{\n\t\t\t\tkind = upToNextMajorVersion;\n\t\t\t\tminimumVersion = 11.2.0;\n\t\t\t}};\n\t\t}};\n",
            package.id, annotation
        )));
        assert!(text.contains(&format!(
            "\t\t{} /* GoogleMobileAds */ = {{\n\t\t\tisa = XCSwiftPackageProductDependency;\n\t\t\tpackage = {} /* {} */;\n\t\t\tproductName = GoogleMobileAds;\n\t\t}};\n",
            product.id, package.id, annotation
        )));
        assert!(text.contains(&format!("\t\t\t\t{} /* GoogleMobileAds */,\n", product.id)));

        let reparsed = XcodeProject::parse(&text, Path::new("Plugin.xcodeproj")).unwrap();
        assert_eq!(reparsed.to_pbxproj_string(), text);
        assert_eq!(reparsed.package_references().len(), 2);
        assert_eq!(reparsed.product_dependencies(&target).len(), 2);
    }

    #[test]
    fn test_first_package_keys_written_in_xcode_order() {
        let without_packages = PLUGIN_PBXPROJ.replace(
            "\t\t\tpackageReferences = (\n\t\t\t\t9A0000000000000000000070 /* XCRemoteSwiftPackageReference \"firebase-ios-sdk\" */,\n\t\t\t);\n",
            "",
        );
        assert_ne!(without_packages, PLUGIN_PBXPROJ);
        let mut project =
            XcodeProject::parse(&without_packages, Path::new("Plugin.xcodeproj")).unwrap();
        assert!(project.package_references().is_empty());

        let target = project.targets()[1].clone();
        let package = project
            .add_package_reference(
                "https://github.com/googleads/swift-package-manager-google-mobile-ads",
                &VersionRequirement::up_to_next_major("11.2.0"),
            )
            .unwrap();
        let product = project
            .add_product_dependency(&target, "GoogleMobileAds", &package)
            .unwrap();

        let text = project.to_pbxproj_string();
        assert!(text.contains(&format!(
            "\t\t\tname = godot_plugin_tests;\n\t\t\tpackageProductDependencies = (\n\t\t\t\t{} /* GoogleMobileAds */,\n\t\t\t);\n\t\t\tproductName = godot_plugin_tests;\n",
            product.id
        )));
        assert!(text.contains(&format!(
            "\t\t\tmainGroup = 9A0000000000000000000002;\n\t\t\tpackageReferences = (\n\t\t\t\t{} /* XCRemoteSwiftPackageReference \"swift-package-manager-google-mobile-ads\" */,\n\t\t\t);\n\t\t\tproductRefGroup = ",
            package.id
        )));
    }

    #[test]
    fn test_remove_product_dependency_detaches_from_target() {
        let mut project = fixture();
        let target = project.targets()[0].clone();
        let product = project.product_dependencies(&target).remove(0);

        project.remove_product_dependency(&product).unwrap();

        assert!(project.product_dependencies(&target).is_empty());
        assert!(project.object(&product.id).is_none());
        // The frameworks build file loses its productRef with it
        let text = project.to_pbxproj_string();
        assert!(!text.contains(&product.id));
    }

    #[test]
    fn test_remove_package_reference_drops_project_entry() {
        let mut project = fixture();
        let package = project.package_references().remove(0);

        project.remove_package_reference(&package).unwrap();

        assert!(project.package_references().is_empty());
        let root = project.root_object().unwrap();
        assert!(root.get_array("packageReferences").unwrap().is_empty());
    }

    #[test]
    fn test_remove_unknown_node_fails() {
        let mut project = fixture();
        let ghost = ProductDependency {
            id: "FFFFFFFFFFFFFFFFFFFFFFFF".to_string(),
            product_name: Some("Ghost".to_string()),
            package: None,
        };
        assert!(project.remove_product_dependency(&ghost).is_err());
    }

    #[test]
    fn test_add_product_to_missing_target_fails() {
        let mut project = fixture();
        let package = project.package_references().remove(0);
        let ghost = Target {
            id: "FFFFFFFFFFFFFFFFFFFFFFFF".to_string(),
            name: "ghost".to_string(),
            isa: "PBXNativeTarget".to_string(),
        };

        let err = project
            .add_product_dependency(&ghost, "FirebaseAuth", &package)
            .unwrap_err();
        assert_eq!(err.code, xcspm_core::ErrorCode::DanglingReference);
        assert_eq!(project.to_pbxproj_string(), PLUGIN_PBXPROJ);
    }

    #[test]
    fn test_requirement_display() {
        assert_eq!(
            VersionRequirement::up_to_next_major("1.2.0").to_string(),
            "1.2.0 up to next major"
        );
        let exact = VersionRequirement {
            kind: "exactVersion".to_string(),
            minimum_version: None,
        };
        assert_eq!(exact.to_string(), "exactVersion");
    }
}
