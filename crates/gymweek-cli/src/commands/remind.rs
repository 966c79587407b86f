use chrono::Local;
use gymweek_core::quotes::QuoteService;
use gymweek_core::reminders::{Notifier, ReminderTicker};

use crate::commands::common::{AppContext, Workspace};
use crate::error::CliError;

/// Prints notifications to the terminal, ringing the bell.
#[derive(Debug, Clone, Copy)]
pub struct TerminalNotifier {
    enabled: bool,
}

impl TerminalNotifier {
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Notifier for TerminalNotifier {
    fn permission(&self) -> bool {
        self.enabled
    }

    fn notify(&self, title: &str, body: &str) {
        println!("\u{7}{}", format_notification(title, body));
    }
}

pub fn format_notification(title: &str, body: &str) -> String {
    format!("[{}] {title}: {body}", Local::now().format("%H:%M"))
}

pub async fn run_remind(once: bool, no_notify: bool, context: AppContext) -> Result<(), CliError> {
    let workspace = Workspace::open_synced(context).await?;
    let quotes = QuoteService::new(&workspace.context.config)?;
    let mut ticker = ReminderTicker::new(quotes, TerminalNotifier::new(!no_notify));

    if once {
        let settings = workspace.settings()?;
        let now = Local::now().naive_local();
        let report = ticker
            .tick(now, settings, workspace.tracker.workouts())
            .await;
        println!("{}", report.banner);
        return Ok(());
    }

    if let Some(settings) = workspace.tracker.settings() {
        let today = gymweek_core::calendar::weekday_index(Local::now().date_naive());
        println!(
            "{}",
            gymweek_core::reminders::banner_text(settings, settings.is_workout_day(today))
        );
    }
    println!("Watching reminders. Press Ctrl+C to stop.");

    let local = workspace.tracker.local();
    let snapshot = move || async move {
        match (local.load().await, local.load_workouts().await) {
            (Ok(Some(settings)), Ok(workouts)) => Some((settings, workouts)),
            (Ok(None), _) => None,
            (Err(error), _) | (_, Err(error)) => {
                tracing::warn!("Reminder snapshot failed: {}", error);
                None
            }
        }
    };
    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", error);
            std::future::pending::<()>().await;
        }
    };

    ticker
        .run(workspace.context.config.reminder_interval(), snapshot, shutdown)
        .await;
    Ok(())
}
