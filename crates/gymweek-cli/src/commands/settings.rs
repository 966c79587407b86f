use gymweek_core::{Settings, SyncState};

use crate::cli::SettingsCommands;
use crate::commands::common::{
    apply_settings_args, format_settings_lines, sync_label, AppContext, Workspace,
};
use crate::error::CliError;

pub async fn run_settings(
    command: Option<SettingsCommands>,
    context: AppContext,
) -> Result<(), CliError> {
    let mut workspace = Workspace::open_synced(context).await?;
    match command.unwrap_or(SettingsCommands::Show) {
        SettingsCommands::Show => {
            for line in format_settings_lines(workspace.settings()?) {
                println!("{line}");
            }
        }
        SettingsCommands::Init { values } => {
            let base = workspace
                .tracker
                .settings()
                .cloned()
                .unwrap_or_default();
            let settings = apply_settings_args(base, &values, &[])?;
            save(&mut workspace, settings).await?;
        }
        SettingsCommands::Set { values, toggle } => {
            let base = workspace.settings()?.clone();
            let settings = apply_settings_args(base, &values, &toggle)?;
            save(&mut workspace, settings).await?;
        }
    }
    workspace.finish().await
}

async fn save(workspace: &mut Workspace, settings: Settings) -> Result<(), CliError> {
    let state = workspace.tracker.save_settings(settings).await?;
    if let Some(saved) = workspace.tracker.settings() {
        for line in format_settings_lines(saved) {
            println!("{line}");
        }
    }
    if state == SyncState::Error {
        if let Some(error) = workspace.tracker.last_error() {
            eprintln!("Cloud error: {error} (saved locally)");
        }
    }
    println!(
        "{}",
        sync_label(state, workspace.context.cloud_enabled())
    );
    Ok(())
}
