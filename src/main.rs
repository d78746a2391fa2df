// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(target_os = "macos")]
fn main() {
    nativetab_lib::run()
}

#[cfg(not(target_os = "macos"))]
fn main() {
    nativetab_lib::logging::init(false);
    tracing::error!(event = "main.unsupported_platform", "NativeTab only runs on macOS");
    std::process::exit(1);
}
