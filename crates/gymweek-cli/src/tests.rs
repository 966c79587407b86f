use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use gymweek_core::reminders::Notifier;
use gymweek_core::{Settings, SyncState, WorkoutMap};
use pretty_assertions::assert_eq;

use crate::cli::{CompletionShell, SettingsArgs};
use crate::commands::common::{
    apply_settings_args, default_editor, format_settings_lines, format_week_lines,
    normalize_content, note_preview, open_local_store, parse_day, parse_day_or_today,
    resolve_db_path, sanitize_profile_name, sync_label,
};
use crate::commands::completions::render_completions;
use crate::commands::config::{merge_profile, missing_cloud_fields, ProfileValues};
use crate::commands::remind::TerminalNotifier;
use crate::commands::reset::is_affirmative;
use crate::config_profiles::CliProfile;
use crate::error::CliError;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("Squats 5x5\nBench 3x8\n"),
        Some("Squats 5x5\nBench 3x8".to_string())
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn parse_day_accepts_indices_and_names() {
    assert_eq!(parse_day("0").unwrap(), 0);
    assert_eq!(parse_day("6").unwrap(), 6);
    assert_eq!(parse_day("mon").unwrap(), 0);
    assert_eq!(parse_day("Wed").unwrap(), 2);
    assert_eq!(parse_day(" SUNDAY ").unwrap(), 6);
}

#[test]
fn parse_day_rejects_unknown_values() {
    assert!(matches!(parse_day("7"), Err(CliError::InvalidDay(_))));
    assert!(matches!(parse_day("funday"), Err(CliError::InvalidDay(_))));
    assert!(matches!(parse_day(""), Err(CliError::InvalidDay(_))));
}

#[test]
fn parse_day_or_today_defaults_to_weekday_of_today() {
    // 2024-01-03 is a Wednesday
    assert_eq!(parse_day_or_today(None, date(2024, 1, 3)).unwrap(), 2);
    assert_eq!(parse_day_or_today(Some("fri"), date(2024, 1, 3)).unwrap(), 4);
}

#[test]
fn apply_settings_args_overlays_flags() {
    let args = SettingsArgs {
        per_week: Some(2),
        days: Some(vec!["tue".to_string(), "thu".to_string()]),
        workout_time: Some("07:30".to_string()),
        quote_time: None,
    };
    let settings = apply_settings_args(Settings::default(), &args, &[]).unwrap();

    assert_eq!(settings.workouts_per_week, 2);
    assert_eq!(settings.selected_days, BTreeSet::from([1, 3]));
    assert_eq!(settings.workout_time, "07:30");
    assert_eq!(settings.quote_time, Settings::default().quote_time);
}

#[test]
fn apply_settings_args_clamps_weekly_target() {
    let args = SettingsArgs {
        per_week: Some(12),
        ..SettingsArgs::default()
    };
    let settings = apply_settings_args(Settings::default(), &args, &[]).unwrap();
    assert_eq!(settings.workouts_per_week, 7);
}

#[test]
fn apply_settings_args_toggles_days() {
    let toggles = vec!["mon".to_string(), "sat".to_string()];
    let settings =
        apply_settings_args(Settings::default(), &SettingsArgs::default(), &toggles).unwrap();
    assert_eq!(settings.selected_days, BTreeSet::from([2, 4, 5]));
}

#[test]
fn apply_settings_args_rejects_empty_day_selection() {
    let toggles = vec!["mon".to_string(), "wed".to_string(), "fri".to_string()];
    let error =
        apply_settings_args(Settings::default(), &SettingsArgs::default(), &toggles).unwrap_err();
    assert!(matches!(error, CliError::Core(_)));
}

#[test]
fn apply_settings_args_rejects_bad_times() {
    let args = SettingsArgs {
        quote_time: Some("9am".to_string()),
        ..SettingsArgs::default()
    };
    assert!(apply_settings_args(Settings::default(), &args, &[]).is_err());
}

#[test]
fn format_settings_lines_lists_day_names() {
    let lines = format_settings_lines(&Settings::default());
    assert_eq!(lines[0], "Workouts per week: 3");
    assert_eq!(lines[1], "Training days:     Mon, Wed, Fri");
}

#[test]
fn format_week_lines_marks_today_and_rest_days() {
    let mut workouts = WorkoutMap::new();
    workouts.set(0, "Squats 5x5\nBench 3x8");
    // 2024-01-01 is a Monday
    let lines = format_week_lines(
        &Settings::default(),
        &workouts,
        date(2024, 1, 3),
        date(2024, 1, 1),
    );

    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "> Mon 01/01  Workout  Squats 5x5");
    assert_eq!(lines[1], "  Tue 02/01  Rest");
    assert_eq!(lines[6], "  Sun 07/01  Rest");
}

#[test]
fn note_preview_uses_first_line_and_truncates() {
    assert_eq!(note_preview("  Deadlift   3x5 \nAccessory", 40), "Deadlift 3x5");
    assert_eq!(note_preview("abcdefghij", 8), "abcde...");
}

#[test]
fn sync_label_reports_local_only_profiles() {
    assert_eq!(sync_label(SyncState::Synced, true), "Sync: cloud");
    assert_eq!(
        sync_label(SyncState::Synced, false),
        "Sync: local only (no cloud profile)"
    );
}

#[test]
fn resolve_db_path_uses_one_file_per_profile() {
    let dir = PathBuf::from("/tmp/gymweek-test");
    assert_eq!(
        resolve_db_path(Some(dir.clone()), "work").unwrap(),
        dir.join("work.db")
    );
    assert_eq!(
        resolve_db_path(Some(dir.clone()), "../evil").unwrap(),
        dir.join("___evil.db")
    );
}

#[test]
fn sanitize_profile_name_keeps_safe_characters() {
    assert_eq!(sanitize_profile_name("home_2-b"), "home_2-b");
    assert_eq!(sanitize_profile_name("a b/c"), "a_b_c");
}

#[tokio::test(flavor = "multi_thread")]
async fn local_store_round_trips_through_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("default.db");

    {
        let local = open_local_store(&db_path).await.unwrap();
        let mut workouts = WorkoutMap::new();
        workouts.set(3, "Intervals");
        local.save(&Settings::default()).await.unwrap();
        local.save_workouts(&workouts).await.unwrap();
    }

    let reopened = open_local_store(&db_path).await.unwrap();
    assert_eq!(reopened.load().await.unwrap(), Some(Settings::default()));
    assert_eq!(reopened.load_workouts().await.unwrap().get(3), "Intervals");
}

#[test]
fn merge_profile_prefers_explicit_values() {
    let existing = CliProfile {
        supabase_url: Some("https://old.supabase.co".to_string()),
        supabase_anon_key: Some("old-key".to_string()),
        quotable_url: Some("https://quotes.example.com".to_string()),
        zenquotes_url: None,
    };
    let merged = merge_profile(
        existing,
        ProfileValues {
            supabase_url: Some(" https://new.supabase.co ".to_string()),
            supabase_anon_key: Some("new-key".to_string()),
            quotable_url: None,
            zenquotes_url: Some("https://zen.example.com".to_string()),
        },
    );

    assert_eq!(merged.supabase_url.as_deref(), Some("https://new.supabase.co"));
    assert_eq!(merged.supabase_anon_key.as_deref(), Some("new-key"));
    assert_eq!(
        merged.quotable_url.as_deref(),
        Some("https://quotes.example.com")
    );
    assert_eq!(merged.zenquotes_url.as_deref(), Some("https://zen.example.com"));
}

#[test]
fn missing_cloud_fields_names_half_configured_profiles() {
    let profile = CliProfile {
        supabase_url: Some("https://demo.supabase.co".to_string()),
        ..CliProfile::default()
    };
    let missing = missing_cloud_fields(&profile);
    // The anon key may still come from the environment
    assert!(missing.len() <= 1);
    assert!(!missing.contains(&"supabase_url"));
}

#[test]
fn reset_confirmation_accepts_yes_only() {
    assert!(is_affirmative("y\n"));
    assert!(is_affirmative(" YES "));
    assert!(!is_affirmative(""));
    assert!(!is_affirmative("no"));
}

#[test]
fn terminal_notifier_permission_follows_flag() {
    assert!(TerminalNotifier::new(true).permission());
    assert!(!TerminalNotifier::new(false).permission());
}

#[test]
fn completions_use_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("gymweek"));
    assert!(script.contains("settings"));
}
