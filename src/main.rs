use std::sync::Arc;

use atrium::assets::{Manifest, Site};
use atrium::config::{Args, Config};
use atrium::server::Supervisor;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.site)?.apply_args(&args);

    // Fail fast: a manifest that cannot be fully cross-checked means the
    // process never starts accepting.
    let manifest = Manifest::load(&cfg.assets)?;
    tracing::info!(
        assets = manifest.len(),
        root = %cfg.assets.root.display(),
        "manifest loaded"
    );

    let site = Arc::new(Site::new(
        manifest,
        &cfg.assets,
        cfg.server.idle_timeout_secs,
    ));

    let pool = Supervisor::bind(&cfg.server, site).await?;
    pool.run_until(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received");
    })
    .await
}
