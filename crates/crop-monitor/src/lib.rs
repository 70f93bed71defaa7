//! County-level crop stress monitoring and in-season corn yield forecasting
//! for Iowa. Weekly satellite and weather indicators go in; composite stress
//! indices and yield forecasts with uncertainty bands come out.

pub mod cache;
pub mod config;
pub mod error;
pub mod forecast;
pub mod growth_stage;
pub mod indicators;
pub mod router;
pub mod service;
pub mod stress;
pub mod telemetry;

pub use service::CropMonitorService;
