use gymweek_core::SyncState;

use crate::commands::common::{sync_label, AppContext, Workspace};
use crate::error::CliError;

pub async fn run_sync(context: AppContext) -> Result<(), CliError> {
    if !context.cloud_enabled() {
        return Err(CliError::CloudNotConfigured);
    }

    let mut workspace = Workspace::open(context).await?;
    workspace.require_access()?;

    let report = workspace.tracker.reconcile().await;
    if let Some(error) = &report.error {
        eprintln!("Cloud error: {error} (using local data)");
    }
    if report.migrated {
        println!("Uploaded this device's plan to your empty cloud account.");
    } else if report.state == SyncState::Synced {
        println!(
            "Pulled {} from the cloud ({} day(s) with notes).",
            if report.settings.is_some() {
                "settings and workouts"
            } else {
                "workouts"
            },
            report.workouts.filled_days()
        );
    }
    println!(
        "{}",
        sync_label(report.state, workspace.context.cloud_enabled())
    );
    workspace.finish().await
}
