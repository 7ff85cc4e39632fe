use clap::Parser;
use std::path::PathBuf;

/// Walk an asset tree and write the extension-to-MIME table the server
/// loads at start-up.
#[derive(Debug, Parser)]
#[command(name = "mimetable")]
#[command(about = "Generate the extension-to-MIME table for an asset tree")]
struct Args {
    /// Asset tree to scan
    root: PathBuf,

    /// Where to write the JSON table
    #[arg(long, default_value = "mimetypes.json")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();
    atrium::pipeline::mime::write_table(&args.root, &args.output)?;
    tracing::info!(output = %args.output.display(), "mime table written");
    Ok(())
}
