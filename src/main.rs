use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use sr_calculator::config::ServerConfig;
use sr_calculator::core::{
    CalculatorInput, CalculatorOutput, SustainabilityRating, calculate_retirement,
    sustainability_rating,
};
use sr_calculator::error::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "sr-calculator",
    about = "Retirement projection: SIP accumulation and inflation-adjusted corpus depletion"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API over HTTP
    Serve(ServeArgs),
    /// Run a single projection and print it as JSON
    Calculate(CalculateArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, help = "TOML config file; defaults apply when omitted")]
    config: Option<PathBuf>,
    #[arg(long, help = "Overrides the configured bind host")]
    host: Option<String>,
    #[arg(long, help = "Overrides the configured port")]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct CalculateArgs {
    #[arg(long, allow_negative_numbers = true)]
    current_age: i32,
    #[arg(long, allow_negative_numbers = true)]
    retirement_age: i32,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    current_savings: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = 0.12,
        allow_negative_numbers = true,
        help = "Expected annual return as a fraction, e.g. 0.12 for 12%"
    )]
    expected_annual_return_rate: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    current_monthly_expense: f64,
    #[arg(
        long,
        default_value_t = 0.06,
        allow_negative_numbers = true,
        help = "Annual inflation as a fraction, e.g. 0.06 for 6%"
    )]
    annual_inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 0.08,
        allow_negative_numbers = true,
        help = "Nominal annual return during retirement as a fraction"
    )]
    post_retirement_nominal_return_rate: f64,
}

impl From<CalculateArgs> for CalculatorInput {
    fn from(value: CalculateArgs) -> Self {
        CalculatorInput {
            current_age: value.current_age,
            retirement_age: value.retirement_age,
            current_savings: value.current_savings,
            monthly_contribution: value.monthly_contribution,
            expected_annual_return_rate: value.expected_annual_return_rate,
            current_monthly_expense: value.current_monthly_expense,
            annual_inflation_rate: value.annual_inflation_rate,
            post_retirement_nominal_return_rate: value.post_retirement_nominal_return_rate,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateReport {
    input: CalculatorInput,
    output: CalculatorOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    sustainability: Option<SustainabilityRating>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,sr_calculator=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Serve(args) => {
            serve(args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Calculate(args) => calculate(args),
    }
}

/// Loads the config file (or defaults) and applies `--host`/`--port` on top.
fn resolve_config(args: &ServeArgs) -> Result<ServerConfig, ConfigError> {
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate()?;
    Ok(config)
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&args)?;
    info!("SR Calculator v{}", env!("CARGO_PKG_VERSION"));
    sr_calculator::api::run_http_server(config).await?;
    Ok(())
}

fn build_report(input: CalculatorInput) -> CalculateReport {
    let output = calculate_retirement(&input);
    let sustainability = output
        .is_valid
        .then(|| sustainability_rating(output.retirement_duration_years));
    CalculateReport {
        input,
        output,
        sustainability,
    }
}

/// 0 for a valid projection, 1 when the input was refused.
fn exit_status(report: &CalculateReport) -> u8 {
    if report.output.is_valid { 0 } else { 1 }
}

fn calculate(args: CalculateArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let report = build_report(CalculatorInput::from(args));
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(exit_status(&report)))
}
