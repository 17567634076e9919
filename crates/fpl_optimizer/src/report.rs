use crate::config::Config;
use crate::error::Result;
use crate::optimize::{SolveReport, SquadPlan};
use itertools::Itertools;
use serde::Serialize;
use std::path::Path;

/// JSON document written by `save_report_json`
#[derive(Debug, Serialize)]
pub struct ExportedReport<'a> {
    pub generated_at: String,
    pub config: &'a Config,
    #[serde(flatten)]
    pub report: &'a SolveReport,
}

impl<'a> ExportedReport<'a> {
    pub fn new(report: &'a SolveReport, config: &'a Config) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            config,
            report,
        }
    }
}

/// 結果の出力
pub fn log_report(report: &SolveReport) {
    log::info!(
        "status: {} ({} in {}ms)",
        report.status,
        report.backend,
        report.solve_time_ms
    );
    if let Some(message) = &report.message {
        log::info!("solver message: {}", message);
    }
    match &report.plan {
        Some(plan) => log_plan(plan),
        None => log::warn!("no plan available for status {}", report.status),
    }
}

pub fn log_plan(plan: &SquadPlan) {
    log::info!("objective: {:.3}", plan.objective_value);
    for week in &plan.weeks {
        log::info!(
            "[{}] cost {}, expected points {:.2}, captain {}",
            week.gameweek,
            week.squad_cost,
            week.expected_points,
            week.captain
        );
        log::info!("  team:  {}", week.team.iter().join(", "));
        log::info!(
            "  bench: {}",
            week.squad
                .iter()
                .filter(|name| !week.team.contains(*name))
                .join(", ")
        );
        if !week.transfers_in.is_empty() {
            log::info!(
                "  transfers: in [{}] out [{}]",
                week.transfers_in.iter().join(", "),
                week.transfers_out.iter().join(", ")
            );
        }
    }
}

pub fn render_json(report: &SolveReport, config: &Config) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ExportedReport::new(report, config))?)
}

pub fn save_report_json<P: AsRef<Path>>(path: P, report: &SolveReport, config: &Config) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, render_json(report, config)?)?;
    log::info!("Report saved to: {}", path.display());
    Ok(())
}
