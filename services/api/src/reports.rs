use crate::infra::{build_service, load_indicator_table, MonitorService};
use chrono::NaiveDate;
use clap::Args;
use crop_monitor::config::AppConfig;
use crop_monitor::error::AppError;
use crop_monitor::forecast::YieldForecastResult;
use crop_monitor::growth_stage::SEASON_WEEKS;
use crop_monitor::stress::{CompositeStressResult, SubIndexKind};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct StressReportArgs {
    /// Five digit Iowa county FIPS code
    #[arg(long)]
    pub(crate) fips: String,
    /// First day of the assessment window (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) week_start: NaiveDate,
    /// Last day of the assessment window (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) week_end: NaiveDate,
    /// Indicator CSV export. Defaults to CROP_INDICATOR_CSV, then the demo season.
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ForecastReportArgs {
    /// Five digit Iowa county FIPS code
    #[arg(long)]
    pub(crate) fips: String,
    /// Season year
    #[arg(long)]
    pub(crate) year: i32,
    /// Week of season to forecast from (1-26)
    #[arg(long)]
    pub(crate) week: u32,
    /// Also list the forecast for every earlier week of the season
    #[arg(long)]
    pub(crate) trajectory: bool,
    /// Indicator CSV export. Defaults to CROP_INDICATOR_CSV, then the demo season.
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct TimelineReportArgs {
    /// Five digit Iowa county FIPS code
    #[arg(long)]
    pub(crate) fips: String,
    /// Season year
    #[arg(long)]
    pub(crate) year: i32,
    /// First week of season to include
    #[arg(long, default_value_t = 1)]
    pub(crate) from_week: u32,
    /// Last week of season to include
    #[arg(long, default_value_t = SEASON_WEEKS)]
    pub(crate) to_week: u32,
    /// Indicator CSV export. Defaults to CROP_INDICATOR_CSV, then the demo season.
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

fn cli_service(csv: Option<PathBuf>) -> Result<MonitorService, AppError> {
    let config = AppConfig::load()?;
    let csv = csv.or(config.analytics.indicator_csv.clone());
    let table = load_indicator_table(csv.as_deref())?;
    let (_, service) = build_service(&config.analytics, table)?;
    Ok(service)
}

pub(crate) fn run_stress_report(args: StressReportArgs) -> Result<(), AppError> {
    let service = cli_service(args.csv)?;
    let result = service.compute_stress(&args.fips, args.week_start, args.week_end)?;
    println!(
        "Crop stress for county {} ({} to {})",
        result.fips, result.week_start, result.week_end
    );
    render_stress(&result);
    Ok(())
}

pub(crate) fn run_forecast_report(args: ForecastReportArgs) -> Result<(), AppError> {
    let service = cli_service(args.csv)?;
    let forecast = service.forecast_from_store(&args.fips, args.week, args.year)?;
    println!(
        "Yield forecast for county {} (season {}, week {})",
        forecast.fips, forecast.year, forecast.week_of_season
    );
    render_forecast(&forecast);

    if args.trajectory {
        let trajectory = service.forecast_trajectory(&args.fips, args.year, args.week)?;
        render_trajectory(&trajectory);
    }
    Ok(())
}

pub(crate) fn run_timeline_report(args: TimelineReportArgs) -> Result<(), AppError> {
    let service = cli_service(args.csv)?;
    let timeline = service.stress_timeline(&args.fips, args.year, args.from_week..=args.to_week)?;

    println!(
        "Weekly stress timeline for county {} (season {}, weeks {}-{})",
        args.fips, args.year, args.from_week, args.to_week
    );
    if timeline.is_empty() {
        println!("  No indicator rows in range");
        return Ok(());
    }
    println!("  week  stage               overall  status     primary driver");
    for entry in &timeline {
        println!(
            "  {:>4}  {:<18}  {:>7.1}  {:<9}  {}",
            entry.week_of_season,
            entry.growth_stage.label(),
            entry.overall_stress_index,
            entry.overall_status.label(),
            entry.primary_driver.label()
        );
    }
    Ok(())
}

pub(crate) fn render_stress(result: &CompositeStressResult) {
    println!(
        "  Growth stage: {} (week {})",
        result.growth_stage.label(),
        result.week_of_season
    );
    println!(
        "  Overall stress: {:.1} ({})",
        result.overall_stress_index,
        result.overall_status.label()
    );
    for kind in SubIndexKind::priority_order() {
        let sub_index = match kind {
            SubIndexKind::WaterStress => &result.water_stress,
            SubIndexKind::HeatStress => &result.heat_stress,
            SubIndexKind::VegetationHealth => &result.vegetation_health,
            SubIndexKind::AtmosphericStress => &result.atmospheric_stress,
        };
        println!(
            "    {:<20} {:>5.1}  {:<9}  {}",
            kind.label(),
            sub_index.value,
            sub_index.status.label(),
            sub_index.key_driver
        );
    }
    println!(
        "  Drivers: {} then {}",
        result.primary_driver.label(),
        result.secondary_driver.label()
    );
    if result.coverage.degraded_confidence {
        println!(
            "  Coverage: {} of {} weeks observed (reduced confidence)",
            result.coverage.weeks_observed, result.coverage.weeks_expected
        );
    }
    println!("  Recommendations:");
    for line in &result.farm_recommendations {
        println!("    - {line}");
    }
}

pub(crate) fn render_forecast(forecast: &YieldForecastResult) {
    println!(
        "  Predicted yield: {:.1} bu/acre (range {:.1} to {:.1}, baseline {:.1})",
        forecast.predicted_yield, forecast.lower_bound, forecast.upper_bound, forecast.baseline_yield
    );
    println!(
        "  Confidence: {:?}; primary driver: {}",
        forecast.confidence,
        forecast.primary_driver.as_str()
    );
    if !forecast.missing_weeks.is_empty() {
        println!("  Missing weeks: {:?}", forecast.missing_weeks);
    }

    let mut ranked: Vec<_> = forecast.feature_importance.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1));
    println!("  Feature importance:");
    for (feature, share) in ranked.into_iter().take(4) {
        println!("    {:<28} {:>5.1}%", feature.as_str(), share * 100.0);
    }
}

pub(crate) fn render_trajectory(trajectory: &[YieldForecastResult]) {
    println!("  Trajectory:");
    for point in trajectory {
        println!(
            "    week {:>2}: {:>6.1} bu/acre (±{:.0})",
            point.week_of_season, point.predicted_yield, point.uncertainty
        );
    }
}
