use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tablescope::config::{AIConfig, PipelineConfig};
use tablescope::pipeline::{self, RunOutcome};

#[derive(Parser, Debug)]
#[command(
    name = "tablescope",
    version,
    about = "Profile a tabular data file and write an HTML report with charts"
)]
pub struct Cli {
    /// Data file to analyse (.csv, .xlsx, .xls, .json, .parquet)
    pub file: PathBuf,

    /// Directory for the report, charts and exports
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Do not render charts
    #[arg(long)]
    pub no_plots: bool,

    /// Do not request an AI summary even if OPENAI_API_KEY is set
    #[arg(long)]
    pub no_ai: bool,

    /// Directory for log files. Defaults to the platform data directory.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Resolves the run configuration; the environment is read here only.
    pub fn to_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(&self.file, &self.output);
        config.generate_plots = !self.no_plots;
        config.allow_ai = !self.no_ai;
        config.ai = AIConfig::from_env();
        config
    }
}

fn print_section(title: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("  {title}");
    println!("{}", "=".repeat(60));
}

pub async fn run(cli: &Cli) -> Result<()> {
    let config = cli.to_config();
    let outcome = pipeline::run(&config).await?;
    print_outcome(&config, &outcome);
    Ok(())
}

fn print_outcome(config: &PipelineConfig, outcome: &RunOutcome) {
    print_section("PROFILE");
    print!("{}", outcome.profile);

    print_section("AI SUMMARY");
    match &outcome.narrative {
        Some(narrative) => println!("{narrative}"),
        None if !config.effective_ai().is_active() => {
            println!("  Skipped (no OPENAI_API_KEY, or disabled).");
        }
        None => println!("  Not available (the request failed; see the log)."),
    }

    print_section("CHARTS");
    if !config.generate_plots {
        println!("  Skipped (--no-plots).");
    }
    for entry in &outcome.manifest.entries {
        println!("  ✓ {}", config.output_dir.join(entry.relative_path()).display());
    }
    for omitted in outcome.manifest.failures() {
        println!("  ✗ {} ({})", omitted.name, omitted.reason);
    }

    print_section("OUTPUT FILES");
    println!("  Report: {}", outcome.report.html.display());
    println!(
        "  Sample (first {} rows): {}",
        outcome.report.sample_rows,
        outcome.report.sample_csv.display()
    );
    println!("  Profile JSON: {}", outcome.report.profile_json.display());

    println!();
    println!("{}", outcome.summary());
}
