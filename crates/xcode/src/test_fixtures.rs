pub const PLUGIN_PBXPROJ: &str =
    include_str!("../tests/fixtures/Plugin.xcodeproj/project.pbxproj");

pub const PLUGIN_TARGET_ID: &str = "9A0000000000000000000040";

pub const FIREBASE_URL: &str = "https://github.com/firebase/firebase-ios-sdk";
