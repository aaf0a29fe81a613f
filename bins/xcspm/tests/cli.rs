//! End-to-end tests for the xcspm binary

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PLUGIN_PBXPROJ: &str =
    include_str!("../../../crates/xcode/tests/fixtures/Plugin.xcodeproj/project.pbxproj");

const FIREBASE_URL: &str = "https://github.com/firebase/firebase-ios-sdk";
const ADS_URL: &str = "https://github.com/googleads/swift-package-manager-google-mobile-ads";

/// Copy the fixture project into a fresh directory
fn project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let bundle = dir.path().join("Plugin.xcodeproj");
    fs::create_dir(&bundle).unwrap();
    fs::write(bundle.join("project.pbxproj"), PLUGIN_PBXPROJ).unwrap();
    (dir, bundle)
}

fn pbxproj(bundle: &Path) -> String {
    fs::read_to_string(bundle.join("project.pbxproj")).unwrap()
}

fn xcspm(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("xcspm");
    cmd.current_dir(dir.path()).arg("--no-color");
    cmd
}

mod exit_code_tests {
    use super::*;

    #[test]
    fn test_help() {
        cargo_bin_cmd!("xcspm").arg("--help").assert().code(0);
    }

    #[test]
    fn test_version() {
        cargo_bin_cmd!("xcspm").arg("--version").assert().code(0);
    }

    #[test]
    fn test_no_arguments() {
        cargo_bin_cmd!("xcspm").assert().code(1);
    }

    #[test]
    fn test_wrong_argument_count() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("-a")
            .arg(&bundle)
            .args([FIREBASE_URL, "10.0.0"])
            .assert()
            .code(1);
        assert_eq!(pbxproj(&bundle), PLUGIN_PBXPROJ);
    }

    #[test]
    fn test_unknown_option() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("-x")
            .arg(&bundle)
            .args([FIREBASE_URL, "10.0.0", "FirebaseCore"])
            .assert()
            .code(1);
    }

    #[test]
    fn test_add_and_delete_together() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("-a")
            .arg(&bundle)
            .args([ADS_URL, "11.2.0", "GoogleMobileAds"])
            .arg("-d")
            .arg(&bundle)
            .args([ADS_URL, "11.2.0", "GoogleMobileAds"])
            .assert()
            .code(1);
        assert_eq!(pbxproj(&bundle), PLUGIN_PBXPROJ);
    }

    #[test]
    fn test_missing_project() {
        let dir = TempDir::new().unwrap();
        xcspm(&dir)
            .args(["-a", "Missing.xcodeproj", FIREBASE_URL, "10.0.0", "FirebaseCore"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Xcode project not found"));
    }

    #[test]
    fn test_empty_product_name() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("-a")
            .arg(&bundle)
            .args([ADS_URL, "11.2.0", "  "])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("product_name"));
        assert_eq!(pbxproj(&bundle), PLUGIN_PBXPROJ);
    }

    #[test]
    fn test_malformed_project() {
        let (dir, bundle) = project();
        fs::write(bundle.join("project.pbxproj"), "// !$*UTF8*$!\n{\n\tarchiveVersion = 1\n}\n")
            .unwrap();
        xcspm(&dir)
            .arg("list")
            .arg(&bundle)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("line 4"));
    }

    #[test]
    fn test_unknown_target() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .args(["--target", "nope", "add"])
            .arg(&bundle)
            .args([ADS_URL, "11.2.0", "GoogleMobileAds"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Target 'nope' not found"));
        assert_eq!(pbxproj(&bundle), PLUGIN_PBXPROJ);
    }
}

mod add_remove_tests {
    use super::*;

    #[test]
    fn test_add_creates_package_and_product() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("-a")
            .arg(&bundle)
            .args([ADS_URL, "11.2.0", "GoogleMobileAds"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Successfully added SPM dependency 'GoogleMobileAds'",
            ));

        let text = pbxproj(&bundle);
        assert!(text.contains(&format!("repositoryURL = \"{}\";", ADS_URL)));
        assert!(text.contains("minimumVersion = 11.2.0;"));
        assert!(text.contains("productName = GoogleMobileAds;"));
    }

    #[test]
    fn test_add_twice_is_idempotent() {
        let (dir, bundle) = project();
        for _ in 0..2 {
            xcspm(&dir)
                .arg("-a")
                .arg(&bundle)
                .args([ADS_URL, "11.2.0", "GoogleMobileAds"])
                .assert()
                .success();
        }

        let text = pbxproj(&bundle);
        assert_eq!(text.matches("productName = GoogleMobileAds;").count(), 1);
        assert_eq!(text.matches("isa = XCRemoteSwiftPackageReference;").count(), 2);
    }

    #[test]
    fn test_add_existing_product_warns() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("add")
            .arg(&bundle)
            .args([FIREBASE_URL, "10.0.0", "FirebaseCore"])
            .assert()
            .success()
            .stderr(predicate::str::contains("already exists in the project"));
        assert_eq!(pbxproj(&bundle), PLUGIN_PBXPROJ);
    }

    #[test]
    fn test_products_share_one_package() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("add")
            .arg(&bundle)
            .args([FIREBASE_URL, "10.0.0", "FirebaseAuth"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Reusing existing package reference"));

        let text = pbxproj(&bundle);
        assert_eq!(text.matches("isa = XCRemoteSwiftPackageReference;").count(), 1);
        assert_eq!(text.matches("isa = XCSwiftPackageProductDependency;").count(), 2);
    }

    #[test]
    fn test_remove_sole_user_deletes_package() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("-d")
            .arg(&bundle)
            .args([FIREBASE_URL, "10.0.0", "FirebaseCore"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed package reference"));

        let text = pbxproj(&bundle);
        assert!(!text.contains("XCSwiftPackageProductDependency"));
        assert!(!text.contains("XCRemoteSwiftPackageReference"));
    }

    #[test]
    fn test_remove_keeps_shared_package() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("add")
            .arg(&bundle)
            .args([FIREBASE_URL, "10.0.0", "FirebaseAuth"])
            .assert()
            .success();
        xcspm(&dir)
            .arg("remove")
            .arg(&bundle)
            .args([FIREBASE_URL, "10.0.0", "FirebaseCore"])
            .assert()
            .success()
            .stdout(predicate::str::contains("still used by other products"));

        let text = pbxproj(&bundle);
        assert!(!text.contains("productName = FirebaseCore;"));
        assert!(text.contains("productName = FirebaseAuth;"));
        assert_eq!(text.matches("isa = XCRemoteSwiftPackageReference;").count(), 1);
    }

    #[test]
    fn test_remove_nonexistent_product() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("-d")
            .arg(&bundle)
            .args([ADS_URL, "11.2.0", "GoogleMobileAds"])
            .assert()
            .code(0)
            .stderr(predicate::str::contains("not found in target"));
        assert_eq!(pbxproj(&bundle), PLUGIN_PBXPROJ);
    }

    #[test]
    fn test_add_then_remove_restores_file() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("-a")
            .arg(&bundle)
            .args([ADS_URL, "11.2.0", "GoogleMobileAds"])
            .assert()
            .success();
        xcspm(&dir)
            .arg("-d")
            .arg(bundle.join("project.pbxproj"))
            .args([ADS_URL, "11.2.0", "GoogleMobileAds"])
            .assert()
            .success();
        assert_eq!(pbxproj(&bundle), PLUGIN_PBXPROJ);
    }

    #[test]
    fn test_dry_run_leaves_file_untouched() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("--dry-run")
            .arg("-a")
            .arg(&bundle)
            .args([ADS_URL, "11.2.0", "GoogleMobileAds"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Dry run"));
        assert_eq!(pbxproj(&bundle), PLUGIN_PBXPROJ);
    }

    #[test]
    fn test_named_target() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .args(["--target", "godot_plugin_tests", "add"])
            .arg(&bundle)
            .args([FIREBASE_URL, "10.0.0", "FirebaseCore"])
            .assert()
            .success();

        let text = pbxproj(&bundle);
        assert_eq!(text.matches("productName = FirebaseCore;").count(), 2);
    }
}

mod batch_tests {
    use super::*;

    fn write_manifest(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("config.properties");
        fs::write(
            &path,
            format!(
                "# plugin settings\npluginName=godot_plugin\ndependency.FirebaseAuth={}|10.0.0\ndependency.GoogleMobileAds={}|11.2.0\ndependency.Broken=no-version\n",
                FIREBASE_URL, ADS_URL
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_sync_adds_manifest_dependencies() {
        let (dir, bundle) = project();
        let manifest = write_manifest(&dir);
        xcspm(&dir)
            .arg("sync")
            .arg(&bundle)
            .arg("--manifest")
            .arg(&manifest)
            .assert()
            .success()
            .stdout(predicate::str::contains("Found 2 SPM dependencies"))
            .stdout(predicate::str::contains("SPM update completed."));

        let text = pbxproj(&bundle);
        assert!(text.contains("productName = FirebaseAuth;"));
        assert!(text.contains("productName = GoogleMobileAds;"));
        assert!(!text.contains("Broken"));
        assert_eq!(text.matches("isa = XCRemoteSwiftPackageReference;").count(), 2);
    }

    #[test]
    fn test_sync_without_manifest_skips() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("sync")
            .arg(&bundle)
            .arg("--manifest")
            .arg(dir.path().join("missing.properties"))
            .assert()
            .success()
            .stderr(predicate::str::contains("No dependencies found"));
        assert_eq!(pbxproj(&bundle), PLUGIN_PBXPROJ);
    }

    #[test]
    fn test_manifest_from_config_file() {
        let (dir, bundle) = project();
        write_manifest(&dir);
        fs::write(
            dir.path().join(".xcspm.toml"),
            "[manifest]\npath = \"config.properties\"\n",
        )
        .unwrap();

        xcspm(&dir).arg("sync").arg(&bundle).assert().success();
        assert!(pbxproj(&bundle).contains("productName = GoogleMobileAds;"));
    }

    #[test]
    fn test_missing_config_file() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .args(["--config", "nowhere.toml", "list"])
            .arg(&bundle)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Configuration file not found"));
    }

    #[test]
    fn test_reset_removes_dependencies_and_artifacts() {
        let (dir, bundle) = project();
        let manifest = write_manifest(&dir);
        xcspm(&dir)
            .arg("sync")
            .arg(&bundle)
            .arg("--manifest")
            .arg(&manifest)
            .assert()
            .success();

        let swiftpm = bundle.join("project.xcworkspace/xcshareddata/swiftpm");
        fs::create_dir_all(&swiftpm).unwrap();
        fs::write(swiftpm.join("Package.resolved"), "{}").unwrap();
        let derived_data = dir.path().join("DerivedData");
        fs::create_dir_all(derived_data.join("SourcePackages/checkouts")).unwrap();

        xcspm(&dir)
            .arg("reset")
            .arg(&bundle)
            .arg("--manifest")
            .arg(&manifest)
            .arg("--derived-data")
            .arg(&derived_data)
            .assert()
            .success()
            .stdout(predicate::str::contains("SPM reset completed."));

        let text = pbxproj(&bundle);
        assert!(!text.contains("FirebaseAuth"));
        assert!(!text.contains("GoogleMobileAds"));
        // FirebaseCore is not in the manifest and keeps its package
        assert!(text.contains("productName = FirebaseCore;"));
        assert!(!swiftpm.join("Package.resolved").exists());
        assert!(!derived_data.join("SourcePackages").exists());
        assert!(derived_data.exists());
    }

    #[test]
    fn test_reset_keep_artifacts() {
        let (dir, bundle) = project();
        let manifest = write_manifest(&dir);
        let derived_data = dir.path().join("DerivedData");
        fs::create_dir_all(derived_data.join("SourcePackages")).unwrap();

        xcspm(&dir)
            .arg("reset")
            .arg(&bundle)
            .arg("--manifest")
            .arg(&manifest)
            .arg("--derived-data")
            .arg(&derived_data)
            .arg("--keep-artifacts")
            .assert()
            .success();
        assert!(derived_data.join("SourcePackages").exists());
    }

    #[test]
    fn test_list() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .arg("list")
            .arg(&bundle)
            .assert()
            .success()
            .stdout(predicate::str::contains("godot_plugin"))
            .stdout(predicate::str::contains(format!(
                "FirebaseCore from {} (10.0.0 up to next major)",
                FIREBASE_URL
            )));
    }

    #[test]
    fn test_list_reports_unused_package() {
        let (dir, bundle) = project();
        xcspm(&dir)
            .args(["--target", "godot_plugin_tests", "list"])
            .arg(&bundle)
            .assert()
            .success()
            .stdout(predicate::str::contains("No Swift package products"))
            .stderr(predicate::str::contains("is not used by any product"));
    }
}
