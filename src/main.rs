//! Binary entrypoint for shape-mask.
//!
//! Drives one replacement session headlessly; all logic lives in the library.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use shape_mask::config::Configuration;
use shape_mask::surface::{MemorySurface, PngFileSurface, RenderSurface};
use shape_mask::{Session, TransformEdit, assets, export};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

/// Fill a mask's cutout with a replacement image
#[derive(Debug, Parser)]
#[command(name = "shape-mask", about = "Fill a silhouette mask with a replacement image")]
struct Cli {
    /// Alpha mask (PNG)
    #[arg(long, value_name = "FILE")]
    mask: PathBuf,

    /// Image placed into the mask
    #[arg(long, value_name = "FILE")]
    replacement: PathBuf,

    /// Scale override; defaults to fitting the replacement inside the mask
    #[arg(long)]
    scale: Option<f32>,

    /// Horizontal displacement from the centred position (pixels)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset_x: f32,

    /// Vertical displacement from the centred position (pixels)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset_y: f32,

    /// Save the ghosted preview before committing
    #[arg(long, value_name = "FILE")]
    preview: Option<PathBuf>,

    /// Mirror every rendered frame to this PNG
    #[arg(long, value_name = "FILE")]
    surface: Option<PathBuf>,

    /// Output file; a timestamped name in --output-dir is used otherwise
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Directory for timestamped output
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Path to YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(format!("shape_mask={level}").parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = match &cli.config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Configuration::default(),
    };
    let cfg = cfg.validated().context("validating configuration")?;

    // Decode both assets concurrently; the session still takes them in order.
    let (mask, replacement) = tokio::try_join!(
        assets::load_file_async(cli.mask.clone(), cfg.mask_policy.clone()),
        assets::load_file_async(cli.replacement.clone(), cfg.replacement_policy.clone()),
    )
    .context("loading images")?;

    match cli.surface.clone() {
        Some(path) => run(&cli, &cfg, PngFileSurface::new(path), mask, replacement),
        None => run(&cli, &cfg, MemorySurface::new(), mask, replacement),
    }
}

fn run<S: RenderSurface>(
    cli: &Cli,
    cfg: &Configuration,
    surface: S,
    mask: shape_mask::RasterImage,
    replacement: shape_mask::RasterImage,
) -> Result<()> {
    let mut session = Session::with_options(surface, cfg.composite_options());
    session.load_mask(mask).context("loading mask")?;
    session.activate_tool();
    session
        .load_replacement(replacement)
        .context("loading replacement")?;
    info!(scale = session.transform().scale, "fitted replacement");

    if let Some(scale) = cli.scale {
        session.apply_edit(TransformEdit::SetScale(scale))?;
    }
    if cli.offset_x != 0.0 || cli.offset_y != 0.0 {
        session.apply_edit(TransformEdit::BeginDrag)?;
        session.apply_edit(TransformEdit::DragBy {
            dx: cli.offset_x,
            dy: cli.offset_y,
        })?;
        session.apply_edit(TransformEdit::EndDrag)?;
    }

    if let (Some(path), Some(preview)) = (&cli.preview, session.preview()) {
        std::fs::write(path, export::encode_png(preview.image())?)
            .with_context(|| format!("writing preview to {}", path.display()))?;
        info!(path = %path.display(), "preview saved");
    }

    session.commit().context("committing replacement")?;

    let written = match &cli.output {
        Some(path) => {
            std::fs::write(path, export::export_png(&session)?)
                .with_context(|| format!("writing {}", path.display()))?;
            path.clone()
        }
        None => export::write_png(&session, &cli.output_dir, &cfg.export)?,
    };
    info!(path = %written.display(), "done");
    Ok(())
}
