#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

fn main() {
    if let Err(e) = metro_path_viewer::run() {
        tracing::error!("{e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}
