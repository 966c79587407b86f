use chrono::Local;
use gymweek_core::calendar;
use gymweek_core::reminders::banner_text;

use crate::commands::common::{note_preview, sync_label, AppContext, Workspace};
use crate::error::CliError;

pub async fn run_home(context: AppContext) -> Result<(), CliError> {
    let workspace = Workspace::open_synced(context).await?;
    let today = Local::now().date_naive();
    let day_index = calendar::weekday_index(today);

    let greeting = match workspace.tracker.first_name().await {
        Some(name) => format!("Hi {name}!"),
        None => "Hi!".to_string(),
    };
    println!("{greeting}");
    println!(
        "Today: {} {}",
        calendar::day_name_long(day_index),
        calendar::format_dd_mm(today)
    );

    let Some(settings) = workspace.tracker.settings() else {
        println!("No plan yet. Run `gymweek settings init` to set up your week.");
        return Ok(());
    };

    let workout_today = settings.is_workout_day(day_index);
    let note = workspace.tracker.workouts().get(day_index);
    if workout_today {
        if note.trim().is_empty() {
            println!("Workout day. Nothing planned yet: `gymweek day edit`.");
        } else {
            println!("Workout day: {}", note_preview(note, 72));
        }
    } else {
        println!("Rest day.");
    }
    println!("Reminders: {}", banner_text(settings, workout_today));
    println!(
        "{}",
        sync_label(
            workspace.tracker.sync_state(),
            workspace.context.cloud_enabled()
        )
    );
    Ok(())
}
