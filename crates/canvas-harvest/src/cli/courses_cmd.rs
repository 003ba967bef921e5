//! `canvas-harvest courses`: sign in and list the dashboard's course links.

use crate::cli::output::{self, Styled};
use crate::cli::Overrides;
use crate::config::Credentials;
use crate::portal::PortalSession;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::{Context, Result};
use tracing::warn;

pub async fn run(overrides: &Overrides) -> Result<()> {
    let config = overrides.resolve()?;
    let credentials = Credentials::from_env()?;
    config.base_url()?;

    let renderer = ChromiumRenderer::launch(&config)
        .await
        .context("could not start the browser")?;
    let ctx = renderer.new_context().await?;
    let mut session = PortalSession::new(ctx, config);

    let collected = async {
        session.open_portal().await?;
        session.login(&credentials).await?;
        session.collect_course_links().await
    }
    .await;
    let courses = session.courses().to_vec();

    if let Err(e) = session.close().await {
        warn!("failed to close page: {e}");
    }
    renderer.shutdown().await?;
    collected?;

    if output::is_json() {
        output::print_json(&serde_json::json!({ "courses": courses }));
        return Ok(());
    }

    let s = Styled::new();
    if courses.is_empty() {
        eprintln!("  {} No courses on the dashboard.", s.warn_sym());
        return Ok(());
    }
    for course in &courses {
        println!("{course}");
    }
    Ok(())
}
