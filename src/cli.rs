use crate::compute_chart;
use crate::config::{Config, load_config};
use crate::ir::ChartInput;
use crate::layout_dump::{chart_to_json, write_chart_dump};
use crate::log::{debug, warn};
use crate::render::{render_svg, write_output_svg};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kinchart", version, about = "Family tree chart layout")]
pub struct Args {
    /// Input chart document (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON or JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Person the chart is centred on; overrides the document's focus
    #[arg(short = 'f', long = "focus")]
    pub focus: Option<String>,

    /// Keep only people within this many generations of the focus
    #[arg(short = 'd', long = "maxDepth")]
    pub max_depth: Option<u32>,

    /// Width used when rasterising
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height used when rasterising
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;

    let raw = read_input(args.input.as_deref())?;
    let mut input: ChartInput =
        serde_json::from_str(&raw).context("input is not a valid chart document")?;
    apply_overrides(&mut input, &args);

    execute(&input, &config, args.output_format, args.output.as_deref())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn apply_overrides(input: &mut ChartInput, args: &Args) {
    if let Some(focus) = &args.focus {
        input.focus = Some(focus.clone());
    }
    if args.max_depth.is_some() {
        input.max_depth = args.max_depth;
    }
}

fn execute(
    input: &ChartInput,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let chart = compute_chart(input, &config.layout);
    debug!(
        people = chart.layout.nodes.len(),
        connectors = chart.connectors.len(),
        "chart computed"
    );
    if chart.layout.is_empty() {
        warn!("nothing to draw: focus missing or no people in input");
    }

    match format {
        OutputFormat::Svg => {
            let svg = render_svg(&chart, &config.theme, &config.layout);
            write_output_svg(&svg, output)?;
        }
        OutputFormat::Json => match output {
            Some(path) => write_chart_dump(path, &chart)?,
            None => println!("{}", chart_to_json(&chart)?),
        },
        OutputFormat::Png => {
            let output = ensure_output(output, "png")?;
            write_png(&render_svg(&chart, &config.theme, &config.layout), &output, config)?;
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires building with the `png` feature"
    ))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: Option<&Path>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
