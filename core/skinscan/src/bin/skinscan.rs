//! Command-line skin analysis.
//!
//! Usage:
//!   skinscan <image> --detector-model seeta.bin          # Human-readable report
//!   skinscan <image> --detector-model seeta.bin --json   # JSON report
//!   skinscan <before> --compare <after> -o progress.json # Before/after comparison

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Parser;
use skinscan::{AnalysisConfig, Comparison, ScanReport, SkinAnalyzer};

#[derive(Parser, Debug)]
#[command(name = "skinscan")]
#[command(author, version, about = "Heuristic facial skin analysis", long_about = None)]
struct Args {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// JSON analysis config (defaults are used for anything it omits)
    #[arg(long)]
    config: Option<PathBuf>,

    /// SeetaFace model for the primary detector
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// SSD ONNX model for the fallback detector
    #[arg(long)]
    fallback_model: Option<PathBuf>,

    /// Compare against a second ("after") image instead of a single report
    #[arg(long, value_name = "AFTER")]
    compare: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log pipeline detail to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(path) = &args.detector_model {
        config.locator.primary_model_path = Some(path.clone());
    }
    if let Some(path) = &args.fallback_model {
        config.locator.fallback_model_path = Some(path.clone());
    }
    let analyzer = SkinAnalyzer::new(config)?;

    let before = std::fs::read(&args.image)?;
    let output = match &args.compare {
        Some(after_path) => {
            let after = std::fs::read(after_path)?;
            let comparison = analyzer.compare(&before, &after);
            if args.json {
                serde_json::to_string_pretty(&comparison)?
            } else {
                format_comparison(&comparison)
            }
        }
        None => {
            let report = analyzer.analyze_bytes(&before);
            if args.json {
                serde_json::to_string_pretty(&report)?
            } else {
                format_report(&report)
            }
        }
    };

    if let Some(path) = &args.output {
        std::fs::write(path, &output)?;
        log::info!("output written to {}", path.display());
    } else {
        println!("{output}");
    }

    Ok(())
}

fn format_report(report: &ScanReport) -> String {
    if !report.found {
        return "No face detected.".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Skin type:    {}", report.skin_type);
    let _ = writeln!(out, "Health score: {:.2}/100", report.health_score);
    if let (Some(bounds), Some(tier)) = (report.face_bounds, report.detector_tier) {
        let _ = writeln!(
            out,
            "Face:         {}x{} at ({}, {}), {tier:?} detector",
            bounds.width, bounds.height, bounds.x, bounds.y
        );
    }

    let _ = writeln!(out, "\nConditions:");
    for metric in report.analysis.iter() {
        let count = metric
            .count
            .map(|n| format!(", {n} spots"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:<13} {:>6.2}  {}{count}",
            metric.condition.name(),
            metric.value,
            metric.label()
        );
    }

    let sections = [
        ("Products", &report.recommendations.products),
        ("Morning routine", &report.recommendations.morning_routine),
        ("Night routine", &report.recommendations.night_routine),
        ("Diet", &report.recommendations.diet_tips),
        ("Hydration", &report.recommendations.hydration_tips),
        ("Tips", &report.recommendations.general_tips),
    ];
    for (title, lines) in sections {
        let _ = writeln!(out, "\n{title}:");
        for line in lines {
            let _ = writeln!(out, "  - {line}");
        }
    }

    out.trim_end().to_string()
}

fn format_comparison(comparison: &Comparison) -> String {
    let side = |found: bool, score: f64| {
        if found {
            format!("{score:.2}")
        } else {
            "no face".to_string()
        }
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Before: {}",
        side(comparison.before.found, comparison.before.health_score)
    );
    let _ = writeln!(
        out,
        "After:  {}",
        side(comparison.after.found, comparison.after.health_score)
    );
    let _ = write!(
        out,
        "Change: {:+.2} ({:+.2}%)",
        comparison.improvement, comparison.improvement_percentage
    );
    out
}
