use std::io::{self, BufRead, IsTerminal, Write};

use crate::commands::common::{describe_profile, AppContext, Workspace};
use crate::error::CliError;

pub async fn run_reset(yes: bool, context: AppContext) -> Result<(), CliError> {
    if !yes && !confirm(&format!(
        "Delete settings and workouts stored for profile {}? [y/N] ",
        describe_profile(&context)
    ))? {
        return Err(CliError::Aborted);
    }

    let mut workspace = Workspace::open(context).await?;
    workspace.tracker.reset().await?;
    println!("Local settings and workouts deleted.");
    if workspace.context.cloud_enabled() {
        println!("Cloud data is untouched; it is pulled again on the next sync.");
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, CliError> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(CliError::Config(
            "Refusing to reset without a terminal. Pass --yes to confirm.".to_string(),
        ));
    }
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
