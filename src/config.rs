use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Process start parameters.
///
/// Everything else (asset roots, table paths, timeouts) lives in the site
/// config file, which is the deploy-time artifact naming the site to serve.
#[derive(Debug, Clone, Parser)]
#[command(name = "atrium")]
#[command(about = "HTTP server for precompressed static assets")]
pub struct Args {
    /// Path to the site config file
    #[arg(long, default_value = "site.yaml", env = "ATRIUM_SITE")]
    pub site: PathBuf,

    /// Override the listen address from the site config
    #[arg(long, env = "LISTEN")]
    pub listen: Option<String>,

    /// Override the worker count from the site config
    #[arg(long, env = "WORKERS")]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the single listening socket binds to
    pub listen_addr: String,
    /// Number of independent workers accepting on that socket
    pub workers: usize,
    /// Seconds a keep-alive connection may sit idle before being closed
    pub idle_timeout_secs: u64,
    /// Seconds the supervisor waits for in-flight responses on shutdown
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            workers: 1,
            idle_timeout_secs: 30,
            shutdown_grace_secs: 5,
        }
    }
}

/// Where the servable files and their build-time tables live.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    /// Root of the uncompressed asset tree
    pub root: PathBuf,
    /// Root of the parallel precompressed tree
    pub gzip_root: PathBuf,
    /// Extension-to-MIME table written by the mimetable tool
    pub mime_table: PathBuf,
    /// Path-to-sizes manifest written by the gzpack tool
    pub gzip_manifest: PathBuf,
    /// File name a trailing-slash request maps to
    #[serde(default = "default_index_file")]
    pub index_file: String,
    /// Content type for extensions missing from the table
    #[serde(default = "default_content_type")]
    pub default_type: String,
}

fn default_index_file() -> String {
    "index.html".to_string()
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read site config {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse site config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.workers == 0 {
            anyhow::bail!("workers must be >= 1");
        }
        if self.server.listen_addr.is_empty() {
            anyhow::bail!("listen_addr must not be empty");
        }
        if self.assets.index_file.is_empty() || self.assets.index_file.contains('/') {
            anyhow::bail!("index_file must be a bare file name");
        }
        Ok(())
    }

    /// Fold CLI overrides into the file-loaded config.
    pub fn apply_args(mut self, args: &Args) -> Self {
        if let Some(listen) = &args.listen {
            self.server.listen_addr = listen.clone();
        }
        if let Some(workers) = args.workers {
            self.server.workers = workers;
        }
        self
    }
}
