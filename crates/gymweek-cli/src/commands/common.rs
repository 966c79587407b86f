use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use gymweek_core::calendar::{self, DAY_NAMES, DAY_NAMES_LONG};
use gymweek_core::db::{Database, LibSqlKeyValueStore};
use gymweek_core::models::{parse_reminder_time, validate_day_index};
use gymweek_core::remote::{CurrentSession, SupabaseRemoteStore};
use gymweek_core::session::{FlushOutcome, SessionGate};
use gymweek_core::storage::LocalStore;
use gymweek_core::{ClientConfig, Settings, SyncState, Tracker, WorkoutMap};

use crate::auth::{auth_client_for_profile, CliAuthClient};
use crate::cli::SettingsArgs;
use crate::config_profiles::{CliProfilesConfig, PROFILE_ENV_VAR};
use crate::error::CliError;

pub type CliLocalStore = LocalStore<LibSqlKeyValueStore>;
pub type CliTracker = Tracker<LibSqlKeyValueStore, SupabaseRemoteStore>;

const DATA_DIR_ENV_VAR: &str = "GYMWEEK_DATA_DIR";

/// Resolved profile plus where its data lives.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub profile_name: String,
    pub config: ClientConfig,
    pub db_path: PathBuf,
}

impl AppContext {
    pub fn resolve(profile: Option<&str>, data_dir: Option<&Path>) -> Result<Self, CliError> {
        let profiles = CliProfilesConfig::load().map_err(CliError::Config)?;
        let profile_name = profiles.resolve_profile_name(profile);
        let config = profiles
            .profile(&profile_name)
            .cloned()
            .unwrap_or_default()
            .client_config()
            .map_err(CliError::Config)?;
        let db_path = resolve_db_path(data_dir.map(Path::to_path_buf), &profile_name)?;
        Ok(Self {
            profile_name,
            config,
            db_path,
        })
    }

    pub const fn cloud_enabled(&self) -> bool {
        self.config.supabase_url.is_some() && self.config.supabase_anon_key.is_some()
    }
}

/// Everything a data command needs, opened once per invocation.
pub struct Workspace {
    pub context: AppContext,
    pub gate: SessionGate,
    pub auth: Option<CliAuthClient>,
    pub remote: Option<Arc<SupabaseRemoteStore>>,
    pub tracker: CliTracker,
}

impl Workspace {
    /// Open the local store and, when the profile has Supabase configured,
    /// restore the session through the gate.
    pub async fn open(context: AppContext) -> Result<Self, CliError> {
        let local = open_local_store(&context.db_path).await?;
        let current = CurrentSession::new();
        let mut gate = SessionGate::new(current.clone());
        let auth = auth_client_for_profile(&context.profile_name, &context.config)?;

        let remote = match context.config.supabase() {
            Some((url, anon_key)) => Some(Arc::new(SupabaseRemoteStore::new(
                url, anon_key, current,
            )?)),
            None => None,
        };

        if let (Some(auth), Some(remote)) = (&auth, &remote) {
            let outcome = gate.restore(auth, &local, remote.as_ref()).await?;
            if let Some(outcome) = outcome {
                report_flush_outcome(&outcome);
            }
        } else {
            tracing::debug!("Profile '{}' runs in local-only mode", context.profile_name);
        }

        let mut tracker = Tracker::new(local, remote.clone(), context.config.debounce());
        tracker.load_local().await?;
        Ok(Self {
            context,
            gate,
            auth,
            remote,
            tracker,
        })
    }

    /// Cloud profiles must be signed in before touching data.
    pub fn require_access(&self) -> Result<(), CliError> {
        if self.context.cloud_enabled() && !self.gate.is_authenticated() {
            return Err(CliError::NotSignedIn);
        }
        Ok(())
    }

    /// Open and gate in one step, reconciling once when signed in.
    pub async fn open_synced(context: AppContext) -> Result<Self, CliError> {
        let mut workspace = Self::open(context).await?;
        workspace.require_access()?;
        if workspace.gate.is_authenticated() {
            let report = workspace.tracker.reconcile().await;
            if report.migrated {
                println!("Uploaded this device's plan to your empty cloud account.");
            }
            if let Some(error) = &report.error {
                eprintln!("Cloud error: {error} (using local data)");
            }
        }
        Ok(workspace)
    }

    pub fn settings(&self) -> Result<&Settings, CliError> {
        self.tracker.settings().ok_or(CliError::SettingsMissing)
    }

    /// Push pending edits before the process exits.
    pub async fn finish(mut self) -> Result<(), CliError> {
        if let Err(error) = self.tracker.flush().await {
            eprintln!("Cloud error: {error} (saved locally)");
        }
        Ok(())
    }
}

pub fn report_flush_outcome(outcome: &FlushOutcome) {
    match outcome {
        FlushOutcome::Flushed => println!("Profile details saved to your account."),
        FlushOutcome::Failed(error) => {
            eprintln!("Could not save profile details yet: {error}. Will retry next sign-in.");
        }
        FlushOutcome::NoPending | FlushOutcome::EmailMismatch => {}
    }
}

pub async fn open_local_store(db_path: &Path) -> Result<CliLocalStore, CliError> {
    let db = Database::open(db_path).await?;
    Ok(LocalStore::new(LibSqlKeyValueStore::new(db)))
}

pub fn resolve_db_path(
    cli_data_dir: Option<PathBuf>,
    profile_name: &str,
) -> Result<PathBuf, CliError> {
    let dir = match cli_data_dir.or_else(|| env::var_os(DATA_DIR_ENV_VAR).map(PathBuf::from)) {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    Ok(dir.join(format!("{}.db", sanitize_profile_name(profile_name))))
}

pub fn default_data_dir() -> Result<PathBuf, CliError> {
    dirs::data_local_dir()
        .map(|dir| dir.join("gymweek"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

/// Keep profile names usable as file names.
pub fn sanitize_profile_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Accepts `0..6`, short (`mon`) or long (`monday`) names, any case.
pub fn parse_day(value: &str) -> Result<u8, CliError> {
    let trimmed = value.trim().to_ascii_lowercase();
    if let Ok(index) = trimmed.parse::<u8>() {
        validate_day_index(index).map_err(|_| CliError::InvalidDay(value.to_string()))?;
        return Ok(index);
    }
    DAY_NAMES
        .iter()
        .zip(DAY_NAMES_LONG.iter())
        .position(|(short, long)| {
            trimmed == short.to_ascii_lowercase() || trimmed == long.to_ascii_lowercase()
        })
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| CliError::InvalidDay(value.to_string()))
}

pub fn parse_day_or_today(value: Option<&str>, today: NaiveDate) -> Result<u8, CliError> {
    value.map_or_else(|| Ok(calendar::weekday_index(today)), parse_day)
}

/// Overlay CLI flags on `base`, then validate the result.
pub fn apply_settings_args(
    mut base: Settings,
    args: &SettingsArgs,
    toggles: &[String],
) -> Result<Settings, CliError> {
    if let Some(count) = args.per_week {
        base = base.with_workouts_per_week(count);
    }
    if let Some(days) = &args.days {
        base.selected_days = days
            .iter()
            .filter(|day| !day.trim().is_empty())
            .map(|day| parse_day(day))
            .collect::<Result<_, _>>()?;
    }
    if let Some(time) = &args.workout_time {
        parse_reminder_time(time)?;
        base.workout_time = time.trim().to_string();
    }
    if let Some(time) = &args.quote_time {
        parse_reminder_time(time)?;
        base.quote_time = time.trim().to_string();
    }
    for day in toggles {
        base.toggle_day(parse_day(day)?)?;
    }
    base.validate()?;
    Ok(base)
}

pub fn format_settings_lines(settings: &Settings) -> Vec<String> {
    let days = settings
        .selected_days
        .iter()
        .map(|day| calendar::day_name(*day))
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        format!("Workouts per week: {}", settings.workouts_per_week),
        format!("Training days:     {days}"),
        format!("Workout reminder:  {}", settings.workout_time),
        format!("Motivation at:     {}", settings.quote_time),
    ]
}

/// One line per day: marker, label, date, kind and a preview of the note.
pub fn format_week_lines(
    settings: &Settings,
    workouts: &WorkoutMap,
    anchor: NaiveDate,
    today: NaiveDate,
) -> Vec<String> {
    calendar::week_dates(anchor)
        .into_iter()
        .map(|date| {
            let index = calendar::weekday_index(date);
            let marker = if date == today { '>' } else { ' ' };
            let kind = if settings.is_workout_day(index) {
                "Workout"
            } else {
                "Rest"
            };
            let preview = note_preview(workouts.get(index), 40);
            format!(
                "{marker} {:<3} {}  {kind:<7}  {preview}",
                calendar::day_name(index),
                calendar::format_dd_mm(date),
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn note_preview(note: &str, max_chars: usize) -> String {
    let first_line = note.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn sync_label(state: SyncState, cloud_enabled: bool) -> String {
    if cloud_enabled {
        state.to_string()
    } else {
        "Sync: local only (no cloud profile)".to_string()
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

/// Open the editor on `initial_content`; blank output clears the note.
pub fn capture_editor_input_with_initial(initial_content: &str) -> Result<String, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_workout_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&content).unwrap_or_default())
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_workout_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("gymweek-day-{}-{now}.md", std::process::id()))
}

/// Profile name shown in messages, including where it came from.
pub fn describe_profile(context: &AppContext) -> String {
    if env::var(PROFILE_ENV_VAR).is_ok_and(|value| value.trim() == context.profile_name) {
        format!("'{}' (from {PROFILE_ENV_VAR})", context.profile_name)
    } else {
        format!("'{}'", context.profile_name)
    }
}
