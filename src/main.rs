mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;

use cli::{Cli, Format};
use zimtohrli::audio::decode::decode_file;
use zimtohrli::config::{self, Config, GateConfig};
use zimtohrli::{Comparator, Comparison, Quality, SincResampler, Zimtohrli};

#[derive(Serialize)]
struct Report {
    reference: PathBuf,
    results: Vec<Entry>,
    passed: bool,
}

#[derive(Serialize)]
struct Entry {
    file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<f64>,
    mos: f64,
    quality: Quality,
    passed: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    let config_path = cli.config.clone().or_else(config::find_config);
    let cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };

    // Merge: config values apply only when CLI is at its default
    if cli.format == Format::Text { cli.format = cfg.output.format.into(); }
    if !cli.distance { cli.distance = cfg.output.distance; }
    let gate = GateConfig {
        min_mos: cli.min_mos.or(cfg.gate.min_mos),
        max_distance: cli.max_distance.or(cfg.gate.max_distance),
    };

    for path in std::iter::once(&cli.reference).chain(&cli.distorted) {
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
    }

    let kernel = Zimtohrli::with_config(cfg.kernel).context("Failed to build kernel")?;
    let comparator = Comparator::with_parts(kernel, SincResampler::new(cfg.resampler));

    log::info!("Reference: {}", cli.reference.display());
    let reference = decode_file(&cli.reference)
        .with_context(|| format!("Failed to decode {}", cli.reference.display()))?;
    log::info!(
        "Reference: {:.2}s @ {} Hz",
        reference.duration_secs(),
        reference.sample_rate()
    );
    let reference_spec = comparator
        .analyze_buffer(&reference)
        .context("Failed to analyze reference")?;

    let pb = ProgressBar::new(cli.distorted.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({eta} remaining)")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(cli.distorted.len());
    for path in &cli.distorted {
        let test = decode_file(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        let spec = comparator
            .analyze_buffer(&test)
            .with_context(|| format!("Failed to analyze {}", path.display()))?;
        let comparison = comparator.compare_spectrograms(&reference_spec, &spec)?;
        results.push(entry(path.clone(), comparison, &gate, cli.distance));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let passed = results.iter().all(|e| e.passed);
    let report = Report {
        reference: cli.reference.clone(),
        results,
        passed,
    };

    match cli.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        Format::Text => print_text(&report),
    }

    if !report.passed {
        log::error!("Quality gate failed");
        std::process::exit(1);
    }
    Ok(())
}

fn entry(file: PathBuf, comparison: Comparison, gate: &GateConfig, with_distance: bool) -> Entry {
    Entry {
        file,
        distance: with_distance.then_some(comparison.distance),
        mos: comparison.mos,
        quality: comparison.quality(),
        passed: gate.passes(comparison.distance, comparison.mos),
    }
}

fn print_text(report: &Report) {
    for e in &report.results {
        let mark = if e.passed { "" } else { "  FAIL" };
        match e.distance {
            Some(d) => println!(
                "{}: MOS {:.3} ({}) distance {:.6}{}",
                e.file.display(),
                e.mos,
                e.quality,
                d,
                mark
            ),
            None => println!("{}: MOS {:.3} ({}){}", e.file.display(), e.mos, e.quality, mark),
        }
    }
}
