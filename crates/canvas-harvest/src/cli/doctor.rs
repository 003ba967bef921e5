//! Environment readiness check.

use crate::cli::output::{self, Styled};
use crate::cli::Overrides;
use crate::config::{Credentials, ENV_BASE_URL};
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::path::Path;

/// Check browser discovery, portal URL, credentials and the download
/// directory.
pub async fn run(overrides: &Overrides) -> Result<()> {
    let config = overrides.resolve()?;
    let chromium = find_chromium(config.chromium_path.as_ref());
    let credentials = Credentials::from_env();
    let download_dir = check_writable(&config.download_dir);

    let ready = chromium.is_some()
        && config.base_url.is_some()
        && credentials.is_ok()
        && download_dir.is_ok();

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "base_url": config.base_url,
            "credentials": credentials.is_ok(),
            "download_dir": config.download_dir.display().to_string(),
            "download_dir_writable": download_dir.is_ok(),
            "ready": ready,
        }));
        return Ok(());
    }

    let s = Styled::new();
    println!("canvas-harvest doctor");
    println!("=====================");
    println!();
    println!("OS:   {}", std::env::consts::OS);
    println!("Arch: {}", std::env::consts::ARCH);
    println!();

    match &chromium {
        Some(path) => println!("{} Chromium found: {}", s.ok_sym(), path.display()),
        None => println!(
            "{} Chromium NOT found. Install Google Chrome or set CANVAS_CHROMIUM_PATH.",
            s.warn_sym()
        ),
    }

    match &config.base_url {
        Some(url) => println!("{} Portal: {url}", s.ok_sym()),
        None => println!("{} {ENV_BASE_URL} is not set", s.warn_sym()),
    }

    match &credentials {
        Ok(creds) => println!("{} Credentials for {}", s.ok_sym(), creds.email),
        Err(e) => println!("{} {e}", s.warn_sym()),
    }

    match &download_dir {
        Ok(()) => println!(
            "{} Download directory {} is writable",
            s.ok_sym(),
            config.download_dir.display()
        ),
        Err(e) => println!(
            "{} Download directory {}: {e}",
            s.warn_sym(),
            config.download_dir.display()
        ),
    }

    println!();
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }

    Ok(())
}

/// Create `dir` if needed and prove a file can be written into it.
fn check_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".canvas-harvest-probe");
    std::fs::write(&probe, b"")?;
    std::fs::remove_file(&probe)
}
