use clap::Parser;
use mmi_capture::replay::ReplaySession;
use mmi_extract::extract::extract_draw_calls;
use mmi_extract::select::SelectorConfig;

/// Extract geometry, shader constants, and textures
/// from a captured maps frame for scene reconstruction.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// The capture file to extract from.
    capture: String,
    /// The output file prefix like "out/tile-".
    output_prefix: String,
    /// Clear signature marking the start of relevant draw calls.
    /// Can be repeated to add fallback signatures.
    #[arg(long)]
    clear_signature: Vec<String>,
    /// Draw call name prefix ending the relevant range.
    #[arg(long)]
    end_prefix: Option<String>,
}

fn main() -> anyhow::Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let cli = Cli::parse();

    let mut config = SelectorConfig::default();
    if !cli.clear_signature.is_empty() {
        config.clear_signatures = cli.clear_signature;
    }
    if let Some(end_prefix) = cli.end_prefix {
        config.end_prefix = end_prefix;
    }

    let start = std::time::Instant::now();

    let mut session = ReplaySession::open(&cli.capture)?;
    let extracted = extract_draw_calls(&mut session, &cli.output_prefix, &config)?;

    println!("Extracted {extracted} draw calls in {:?}", start.elapsed());
    Ok(())
}
