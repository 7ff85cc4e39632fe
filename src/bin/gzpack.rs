use clap::Parser;
use std::path::PathBuf;

/// Populate the precompressed tree and its manifest for an asset tree.
#[derive(Debug, Parser)]
#[command(name = "gzpack")]
#[command(about = "Precompress an asset tree and write its gzip manifest")]
struct Args {
    /// Asset tree to compress
    root: PathBuf,

    /// Root of the parallel tree the compressed files go into
    gzip_root: PathBuf,

    /// Where to write the JSON manifest
    #[arg(long, default_value = "gzip-manifest.json")]
    manifest: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();
    atrium::pipeline::gzip::populate(&args.root, &args.gzip_root, &args.manifest)
}
