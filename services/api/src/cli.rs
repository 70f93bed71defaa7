use crate::demo::{run_demo, DemoArgs};
use crate::reports::{
    run_forecast_report, run_stress_report, run_timeline_report, ForecastReportArgs,
    StressReportArgs, TimelineReportArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use crop_monitor::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Iowa Crop Monitor",
    about = "County crop stress monitoring and in-season yield forecasting for Iowa corn",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Composite stress index for one county and date window
    Stress(StressReportArgs),
    /// Yield forecast for one county and week of season
    Forecast(ForecastReportArgs),
    /// Week-by-week stress for one county season
    Timeline(TimelineReportArgs),
    /// Walk the synthetic demo counties through stress and forecast output
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured indicator CSV export
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Stress(args) => run_stress_report(args),
        Command::Forecast(args) => run_forecast_report(args),
        Command::Timeline(args) => run_timeline_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
