use gymweek_core::session::SignUpReport;
use gymweek_core::SignUpForm;

use crate::auth::clear_stored_session;
use crate::cli::AuthCommands;
use crate::commands::common::{describe_profile, report_flush_outcome, AppContext, Workspace};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, context: AppContext) -> Result<(), CliError> {
    if !context.cloud_enabled() {
        return match command {
            AuthCommands::Status => {
                println!(
                    "Profile {} runs in local-only mode (no Supabase project).",
                    describe_profile(&context)
                );
                Ok(())
            }
            _ => Err(CliError::CloudNotConfigured),
        };
    }

    let profile_label = describe_profile(&context);
    let mut workspace = Workspace::open(context).await?;
    let Some(auth) = workspace.auth.as_ref() else {
        return Err(CliError::CloudNotConfigured);
    };
    let Some(remote) = workspace.remote.clone() else {
        return Err(CliError::CloudNotConfigured);
    };
    let local = workspace.tracker.local();

    match command {
        AuthCommands::Signup {
            email,
            password,
            first_name,
            last_name,
            birth_date,
            nationality,
        } => {
            let form = SignUpForm {
                email,
                password,
                first_name,
                last_name,
                birth_date,
                nationality,
            };
            match workspace
                .gate
                .sign_up(auth, form, local, remote.as_ref())
                .await?
            {
                SignUpReport::SignedIn(outcome) => {
                    report_flush_outcome(&outcome);
                    println!("Account created. Signed in profile {profile_label}.");
                }
                SignUpReport::ConfirmationRequired => {
                    println!(
                        "Account created. Confirm your email, then run `gymweek auth login`."
                    );
                }
            }
            Ok(())
        }
        AuthCommands::Login { email, password } => {
            let result = workspace
                .gate
                .sign_in(auth, &email, &password, local, remote.as_ref())
                .await;
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(gymweek_core::Error::Auth(error)) if error.is_email_not_confirmed() => {
                    return Err(CliError::Auth(
                        "Email not confirmed yet. Open the link we sent you, then retry."
                            .to_string(),
                    ));
                }
                Err(error) => return Err(error.into()),
            };
            report_flush_outcome(&outcome);
            let email_label = workspace
                .gate
                .state()
                .session()
                .map_or(email.as_str(), |session| session.email())
                .to_string();
            println!("Signed in profile {profile_label} as {email_label}");

            let report = workspace.tracker.reconcile().await;
            if report.migrated {
                println!("Uploaded this device's plan to your empty cloud account.");
            }
            if let Some(error) = report.error {
                eprintln!("Cloud error: {error} (using local data)");
            }
            Ok(())
        }
        AuthCommands::Status => {
            match workspace.gate.state().session() {
                Some(session) => println!(
                    "Profile {} is signed in as {} (expires_at={})",
                    profile_label,
                    session.email(),
                    session.expires_at
                ),
                None => println!("Profile {profile_label} is not signed in."),
            }
            Ok(())
        }
        AuthCommands::Logout => {
            let had_session = workspace.gate.is_authenticated();
            workspace
                .gate
                .sign_out(auth, local, remote.as_ref())
                .await?;
            // Revocation may have failed; the keychain copy must go regardless
            clear_stored_session(&workspace.context.profile_name)?;
            if had_session {
                println!("Signed out profile {profile_label}. Local data removed.");
            } else {
                println!("Profile {profile_label} was not signed in.");
            }
            Ok(())
        }
    }
}
