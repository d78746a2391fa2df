fn main() {
    // The app shell only exists on macOS; elsewhere only the portable core is built.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("macos") {
        return;
    }

    let manifest = tauri_build::AppManifest::new().commands(&[
        "check_permissions",
        "request_accessibility",
        "get_settings",
        "update_settings",
        "report_focus",
        "handle_key_down",
        "snap_now",
        "return_to_target",
    ]);

    let attrs = tauri_build::Attributes::new().app_manifest(manifest);
    tauri_build::try_build(attrs).expect("failed to run build script");
}
