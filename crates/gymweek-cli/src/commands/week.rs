use chrono::Local;
use gymweek_core::calendar;

use crate::commands::common::{format_week_lines, AppContext, Workspace};
use crate::error::CliError;

pub async fn run_week(offset: i64, context: AppContext) -> Result<(), CliError> {
    let workspace = Workspace::open_synced(context).await?;
    let settings = workspace.settings()?;
    let today = Local::now().date_naive();
    let anchor = calendar::offset_weeks(today, offset);
    let start = calendar::start_of_week(anchor);

    println!(
        "Week of {} ({} workouts planned)",
        calendar::format_dd_mm(start),
        settings.workouts_per_week
    );
    for line in format_week_lines(settings, workspace.tracker.workouts(), anchor, today) {
        println!("{line}");
    }
    Ok(())
}
