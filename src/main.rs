use std::{env, error::Error};

use chrono::Local;
use tracing::{info, warn};
use workforce_payroll::{calendar::Month, config, payroll, store, telemetry};

/// Generates payroll for the month given as `YYYY-MM`, the current month by default
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    telemetry::init(&config::log_file())?;
    let config = config::load()?;

    let month = match env::args().nth(1) {
        Some(month) => Month::parse(&month)?,
        None => Month::containing(Local::now().date_naive()),
    };

    let database = store::connect(&config).await?;
    let settings = config::resolve_settings(&database, &config).await?;

    let report = payroll::generate(&database, month, &settings, Local::now().fixed_offset()).await?;

    for skipped in &report.errors {
        warn!(employee = %skipped.name, reason = %skipped.reason, "payroll not generated");
    }

    let summary = payroll::summarize(&report.generated);
    info!(
        %month,
        employees = summary.employees,
        gross = %summary.total_gross,
        net = %summary.total_net,
        "payroll run finished"
    );

    Ok(())
}
