//! `canvas-harvest run`: the full workflow.

use crate::cli::output::{self, Styled};
use crate::cli::Overrides;
use crate::config::Credentials;
use crate::portal::PortalSession;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use crate::report::{HarvestReport, TraversalEnd};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Sign in, walk every course and print the report.
pub async fn run(overrides: &Overrides) -> Result<()> {
    let config = overrides.resolve()?;
    let credentials = Credentials::from_env()?;
    config.base_url()?;

    info!("starting canvas-harvest v{}", env!("CARGO_PKG_VERSION"));
    let renderer = ChromiumRenderer::launch(&config)
        .await
        .context("could not start the browser")?;
    let ctx = renderer.new_context().await?;
    let mut session = PortalSession::new(ctx, config.clone());

    let outcome = tokio::select! {
        result = session.run(&credentials) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Err(e) = session.close().await {
        warn!("failed to close page: {e}");
    }
    renderer.shutdown().await?;

    let Some(result) = outcome else {
        warn!("interrupted, browser closed");
        return Ok(());
    };
    let report = result?;

    print_report(&report, &config.download_dir.display().to_string());
    Ok(())
}

fn print_report(report: &HarvestReport, download_dir: &str) {
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "download_dir": download_dir,
            "courses": report.courses,
            "total_pages": report.total_pages(),
            "total_files": report.total_files(),
            "total_videos": report.total_videos(),
            "failed": report.failed(),
        }));
        return;
    }
    if output::is_quiet() {
        return;
    }

    let s = Styled::new();
    eprintln!();
    for course in &report.courses {
        let sym = match course.end {
            TraversalEnd::Failed(_) => s.err_sym(),
            TraversalEnd::NoModules | TraversalEnd::PageLimit => s.warn_sym(),
            _ => s.ok_sym(),
        };
        eprintln!("  {sym} {}", s.bold(&course.url));
        eprintln!(
            "       {} pages, {} files, {} videos {}",
            course.pages_visited,
            course.files_clicked,
            course.videos_requested,
            s.dim(&format!("({})", course.end)),
        );
    }
    eprintln!();
    eprintln!(
        "  {} courses, {} files and {} videos requested into {download_dir}",
        report.courses.len(),
        report.total_files(),
        report.total_videos(),
    );
    if report.failed() > 0 {
        eprintln!("  {} {} course(s) stopped early; rerun with --verbose for details.", s.warn_sym(), report.failed());
    }
}
