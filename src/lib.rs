//! Stonescan: single-image object detection for medical scans.
//!
//! An operator submits one image and a confidence threshold; stonescan runs
//! a pre-trained detector over it and returns the detections, an annotated
//! copy of the image, and a plain-text export of the numeric results.
//!
//! # Modules
//!
//! - [`ir`]: Core value types (boxes, detections, thresholds, images)
//! - [`detector`]: Detector backends and the load-once [`detector::DetectorHandle`]
//! - [`pipeline`]: Request handling: normalize, annotate, aggregate
//! - [`export`]: Plain-text result export and its parser
//! - [`report`]: Operator-facing summaries
//! - [`error`]: Error types for stonescan operations

pub mod annotate;
pub mod config;
pub mod detector;
pub mod error;
pub mod export;
pub mod ir;
pub mod logging;
pub mod pipeline;
pub mod report;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::annotate::AnnotationStyle;
use crate::config::Config;
use crate::detector::{DetectorHandle, DetectorSource};
use crate::error::DetectError;
use crate::ir::{ClassNames, ConfidenceThreshold, InputImage};
use crate::pipeline::DetectionPipeline;
use crate::report::{DetectionReport, ImageInfoDisplay};

pub use error::StoneScanError;

/// The stonescan CLI application.
#[derive(Parser)]
#[command(name = "stonescan")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Detect objects in an image.
    Detect(DetectArgs),
    /// Load the detector and report whether it is usable.
    Check(CheckArgs),
    /// Parse an export file and print its rows.
    ParseExport(ParseExportArgs),
}

/// Where the detector comes from.
#[derive(clap::Args)]
struct ModelArgs {
    /// Model weights (default: $STONESCAN_MODEL or weights/best.onnx).
    #[arg(long, conflicts_with = "predictions")]
    model: Option<PathBuf>,

    /// Replay candidates from a predictions JSON file instead of running a model.
    #[arg(long)]
    predictions: Option<PathBuf>,

    /// Class names from a YOLO data.yaml or classes.txt, replacing the model's.
    #[arg(long)]
    names: Option<PathBuf>,
}

/// Arguments for the detect subcommand.
#[derive(clap::Args)]
struct DetectArgs {
    /// Image to analyze (jpg, jpeg, png, bmp, webp).
    image: PathBuf,

    /// Confidence threshold in [0.1, 1.0] (default: $STONESCAN_CONFIDENCE or 0.4).
    #[arg(long, short)]
    threshold: Option<f64>,

    #[command(flatten)]
    model: ModelArgs,

    /// Write the numeric results to a text file.
    #[arg(long, num_args = 0..=1, default_missing_value = export::DEFAULT_EXPORT_FILE_NAME)]
    export: Option<PathBuf>,

    /// Write the annotated image (format from the extension).
    #[arg(long)]
    annotated: Option<PathBuf>,

    /// TTF/OTF font for box labels. Without it only boxes are drawn.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Box line width in pixels (default: scaled to the image).
    #[arg(long)]
    line_width: Option<u32>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the check subcommand.
#[derive(clap::Args)]
struct CheckArgs {
    #[command(flatten)]
    model: ModelArgs,
}

/// Arguments for the parse-export subcommand.
#[derive(clap::Args)]
struct ParseExportArgs {
    /// Export file written by `detect --export`.
    input: PathBuf,
}

/// Run the stonescan CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), StoneScanError> {
    let cli = Cli::parse();
    let config = Config::from_env();
    logging::setup_logging(config.environment);
    tracing::debug!(
        environment = config.environment.as_str(),
        model = %config.model_path.display(),
        "Configuration loaded"
    );

    match cli.command {
        Some(Commands::Detect(args)) => run_detect(args, &config),
        Some(Commands::Check(args)) => run_check(args, &config),
        Some(Commands::ParseExport(args)) => run_parse_export(args),
        None => {
            println!("stonescan {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Single-image object detection for medical scans.");
            println!();
            println!("Run 'stonescan --help' for usage information.");
            Ok(())
        }
    }
}

fn build_handle(args: &ModelArgs, config: &Config) -> Result<DetectorHandle, StoneScanError> {
    let source = match (&args.predictions, &args.model) {
        (Some(path), _) => DetectorSource::Predictions(path.clone()),
        (None, Some(path)) => DetectorSource::from_path(path),
        (None, None) => DetectorSource::from_path(&config.model_path),
    };
    let names: Option<ClassNames> = args
        .names
        .as_deref()
        .map(ir::io_names::read_class_names)
        .transpose()?;

    Ok(DetectorHandle::from_source(source, names))
}

/// Execute the detect subcommand.
fn run_detect(args: DetectArgs, config: &Config) -> Result<(), StoneScanError> {
    if !matches!(args.output.as_str(), "text" | "json") {
        return Err(StoneScanError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            args.output
        )));
    }

    let threshold =
        ConfidenceThreshold::operator(args.threshold.unwrap_or(config.confidence_threshold))?;
    let image = InputImage::open(&args.image, config.max_pixels)?;

    let mut style = AnnotationStyle::new();
    if let Some(width) = args.line_width {
        style = style.with_line_width(width);
    }
    if let Some(path) = &args.font {
        style = style.with_font(AnnotationStyle::load_font(path)?);
    }

    let pipeline = DetectionPipeline::new(build_handle(&args.model, config)?).with_style(style);

    let result = match pipeline.handle_detection_request(&image, threshold) {
        Ok(result) => result,
        Err(err) => {
            // Degraded mode: the image is still described.
            if args.output == "text" {
                print!("{}", ImageInfoDisplay(&image.info()));
            }
            return Err(err.into());
        }
    };

    let report = DetectionReport::new(&result);
    match args.output.as_str() {
        "json" => println!("{}", report.to_json().map_err(StoneScanError::ReportWrite)?),
        _ => print!("{}", report),
    }

    if let Some(path) = &args.annotated {
        write_annotated(path, result.annotated())?;
        if args.output == "text" {
            println!("\nAnnotated image written to {}", path.display());
        }
    }

    if let Some(path) = &args.export {
        export::write_export(path, &result)?;
        if args.output == "text" {
            println!(
                "Results exported to {} ({})",
                path.display(),
                export::EXPORT_MIME_TYPE
            );
        }
    }

    Ok(())
}

fn write_annotated(path: &Path, annotated: &image::RgbImage) -> Result<(), StoneScanError> {
    annotated
        .save(path)
        .map_err(|source| StoneScanError::ImageWrite {
            path: path.to_path_buf(),
            source,
        })
}

/// Execute the check subcommand.
fn run_check(args: CheckArgs, config: &Config) -> Result<(), StoneScanError> {
    let handle = build_handle(&args.model, config)?;
    let detector = handle.get().map_err(DetectError::ModelUnavailable)?;

    println!("Model loaded successfully");
    println!("  Backend: {}", detector.name());
    println!("  Classes: {}", detector.class_names().len());
    for (id, name) in detector.class_names().iter() {
        println!("    {}: {}", id, name);
    }
    Ok(())
}

/// Execute the parse-export subcommand.
fn run_parse_export(args: ParseExportArgs) -> Result<(), StoneScanError> {
    let rows = export::read_export(&args.input)?;

    println!("{} detection(s)", rows.len());
    for row in &rows {
        let cells: Vec<String> = row.iter().map(|v| format!("{:?}", v)).collect();
        println!("[{}]", cells.join(", "));
    }
    Ok(())
}
