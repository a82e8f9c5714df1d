use anyhow::Context;
use clap::Parser;
use lipsum_check::{EokaSessions, Params, Runner, Suite};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "lipsum-check")]
#[command(about = "Acceptance checks for a lorem-ipsum generator page")]
#[command(version)]
struct Cli {
    /// Suite file to run
    suite: PathBuf,

    /// Run in headless mode (overrides suite)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Only run scenarios whose name contains this text
    #[arg(long, value_name = "TEXT")]
    only: Option<String>,

    /// Validate suite without running
    #[arg(long)]
    check: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let params = Params::from_args(&cli.params)?;
    let mut suite = Suite::load_with_params(&cli.suite, &params)
        .with_context(|| format!("loading {}", cli.suite.display()))?;

    if cli.check {
        println!("Suite valid: {}", suite.name);
        println!("  Target: {}", suite.target.url);
        println!("  Locators: {}", suite.locators.len());
        println!("  Scenarios: {}", suite.scenarios.len());
        for scenario in suite.select(cli.only.as_deref()) {
            let note = if scenario.short_circuits() { " (short-circuit)" } else { "" };
            println!("    - {}{}", scenario.name, note);
        }
        if !suite.params.is_empty() {
            println!("  Parameters: {}", suite.params.len());
            for (name, def) in &suite.params {
                let req = if def.required { " (required)" } else { "" };
                let desc = def.description.as_deref().unwrap_or("");
                println!("    - {}{}: {}", name, req, desc);
            }
        }
        return Ok(());
    }

    if cli.headless {
        suite.browser.headless = true;
    }

    let runner = Runner::new(EokaSessions::new(suite.browser.clone()));
    let report = runner.run_filtered(&suite, cli.only.as_deref()).await?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report);
    }

    if !report.success() {
        std::process::exit(1);
    }
    Ok(())
}
