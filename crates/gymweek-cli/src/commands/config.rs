use std::env;

use crate::cli::ConfigCommands;
use crate::config_profiles::{is_http_url, normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            supabase_url,
            supabase_anon_key,
            quotable_url,
            zenquotes_url,
            no_activate,
        } => run_config_init(
            profile.as_deref().or(global_profile),
            ProfileValues {
                supabase_url,
                supabase_anon_key,
                quotable_url,
                zenquotes_url,
            },
            no_activate,
        ),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

/// Values passed on the command line; `None` keeps what the profile has.
#[derive(Debug, Default)]
pub struct ProfileValues {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub quotable_url: Option<String>,
    pub zenquotes_url: Option<String>,
}

pub fn run_config_init(
    profile_name: Option<&str>,
    values: ProfileValues,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let existing_profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let merged = merge_profile(existing_profile, values);
    validate_profile_urls(&merged)?;
    *config.profile_mut_or_default(&profile_name) = merged;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing_fields = missing_cloud_fields(profile);
    if missing_fields.is_empty() {
        println!(
            "Cloud profile '{profile_name}' is ready. Run `gymweek auth signup` or `gymweek auth login`."
        );
    } else if missing_fields.len() == 2 {
        println!("Profile '{profile_name}' runs in local-only mode (no Supabase project).");
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    let client = profile.client_config().map_err(CliError::Config)?;

    println!("Profile:        {profile_name}");
    println!(
        "Supabase URL:   {}",
        client.supabase_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "Supabase key:   {}",
        if client.supabase_anon_key.is_some() {
            "(set)"
        } else {
            "(not set)"
        }
    );
    println!("Quotable:       {}", client.quotable_url);
    println!("ZenQuotes:      {}", client.zenquotes_url);
    Ok(())
}

/// Explicit flags win, then the environment, then what was stored.
pub fn merge_profile(existing: CliProfile, values: ProfileValues) -> CliProfile {
    let supabase_url = normalize_text_option(values.supabase_url)
        .or_else(|| normalize_text_option(env::var("SUPABASE_URL").ok()))
        .or_else(|| existing.supabase_url());
    let supabase_anon_key = normalize_text_option(values.supabase_anon_key)
        .or_else(|| normalize_text_option(env::var("SUPABASE_ANON_KEY").ok()))
        .or_else(|| existing.supabase_anon_key());

    CliProfile {
        supabase_url,
        supabase_anon_key,
        quotable_url: normalize_text_option(values.quotable_url)
            .or_else(|| normalize_text_option(existing.quotable_url)),
        zenquotes_url: normalize_text_option(values.zenquotes_url)
            .or_else(|| normalize_text_option(existing.zenquotes_url)),
    }
}

pub fn missing_cloud_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing_fields = Vec::new();
    if profile.supabase_url().is_none() {
        missing_fields.push("supabase_url");
    }
    if profile.supabase_anon_key().is_none() {
        missing_fields.push("supabase_anon_key");
    }
    missing_fields
}

fn validate_profile_urls(profile: &CliProfile) -> Result<(), CliError> {
    let urls = [
        ("supabase_url", profile.supabase_url.as_deref()),
        ("quotable_url", profile.quotable_url.as_deref()),
        ("zenquotes_url", profile.zenquotes_url.as_deref()),
    ];
    for (name, url) in urls {
        if let Some(url) = url {
            if !is_http_url(url) {
                return Err(CliError::Config(format!(
                    "{name} must include http:// or https://"
                )));
            }
        }
    }
    Ok(())
}
