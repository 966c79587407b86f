use chrono::Local;
use gymweek_core::calendar;

use crate::cli::DayCommands;
use crate::commands::common::{
    capture_editor_input_with_initial, normalize_content, parse_day, parse_day_or_today,
    read_piped_stdin, AppContext, Workspace,
};
use crate::error::CliError;

pub async fn run_day(command: DayCommands, context: AppContext) -> Result<(), CliError> {
    let today = Local::now().date_naive();
    match command {
        DayCommands::Show { day } => {
            let day_index = parse_day_or_today(day.as_deref(), today)?;
            let workspace = Workspace::open_synced(context).await?;
            let settings = workspace.settings()?;
            let kind = if settings.is_workout_day(day_index) {
                "Workout"
            } else {
                "Rest"
            };
            println!("{} - {kind}", calendar::day_name_long(day_index));
            let note = workspace.tracker.workouts().get(day_index);
            if note.trim().is_empty() {
                println!("(empty)");
            } else {
                println!("{note}");
            }
            Ok(())
        }
        DayCommands::Edit { day } => {
            let day_index = parse_day_or_today(day.as_deref(), today)?;
            let mut workspace = Workspace::open_synced(context).await?;
            workspace.settings()?;
            let current = workspace.tracker.workouts().get(day_index).to_string();
            let edited = capture_editor_input_with_initial(&current)?;
            if edited == current.trim() {
                println!("No changes.");
                return workspace.finish().await;
            }
            workspace
                .tracker
                .update_workout_text(day_index, &edited)
                .await?;
            println!("Saved {}.", calendar::day_name_long(day_index));
            workspace.finish().await
        }
        DayCommands::Set { day, text } => {
            let day_index = parse_day(&day)?;
            let text = match normalize_content(&text.join(" ")) {
                Some(text) => text,
                None => read_piped_stdin()?.unwrap_or_default(),
            };
            let mut workspace = Workspace::open_synced(context).await?;
            workspace.settings()?;
            workspace
                .tracker
                .update_workout_text(day_index, &text)
                .await?;
            if text.is_empty() {
                println!("Cleared {}.", calendar::day_name_long(day_index));
            } else {
                println!("Saved {}.", calendar::day_name_long(day_index));
            }
            workspace.finish().await
        }
    }
}
