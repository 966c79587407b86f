use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "gymweek")]
#[command(about = "Plan your training week from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the local database (one file per profile)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// CLI profile name for Supabase configuration and session
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Greeting, today's plan and reminder banner
    Home,
    /// Show the Monday-to-Sunday calendar
    Week {
        /// Weeks relative to the current one (e.g. -1 for last week)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },
    /// Show or change one day's workout
    Day {
        #[command(subcommand)]
        command: DayCommands,
    },
    /// Show or change the weekly plan settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
    /// Sign up, sign in or out of the cloud account
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Reconcile local data with the cloud account
    Sync,
    /// Print a motivational quote
    Quote,
    /// Run the reminder loop (banner plus terminal notifications)
    Remind {
        /// Evaluate a single tick and exit
        #[arg(long)]
        once: bool,
        /// Only print the banner, never notifications
        #[arg(long)]
        no_notify: bool,
    },
    /// Delete local settings and workouts
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum DayCommands {
    /// Print the workout note for a day
    Show {
        /// Day name or index (mon, tuesday, 0..6); defaults to today
        day: Option<String>,
    },
    /// Edit the note in $VISUAL / $EDITOR
    Edit {
        /// Day name or index; defaults to today
        day: Option<String>,
    },
    /// Replace the note with the given text (empty clears it)
    Set {
        /// Day name or index
        day: String,
        /// Note text
        text: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Print the current settings
    Show,
    /// First-run setup; fills unspecified values with defaults
    Init {
        #[command(flatten)]
        values: SettingsArgs,
    },
    /// Change individual settings
    Set {
        #[command(flatten)]
        values: SettingsArgs,
        /// Toggle a training day on or off
        #[arg(long, value_name = "DAY")]
        toggle: Vec<String>,
    },
}

#[derive(Debug, Default, Clone, clap::Args)]
pub struct SettingsArgs {
    /// Planned workouts per week (1-7)
    #[arg(long, value_name = "N")]
    pub per_week: Option<i64>,
    /// Training days, comma separated (e.g. mon,wed,fri)
    #[arg(long, value_name = "DAYS", value_delimiter = ',')]
    pub days: Option<Vec<String>>,
    /// Workout reminder time (HH:MM)
    #[arg(long, value_name = "HH:MM")]
    pub workout_time: Option<String>,
    /// Motivation reminder time (HH:MM)
    #[arg(long, value_name = "HH:MM")]
    pub quote_time: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Override the Quotable endpoint
        #[arg(long, value_name = "URL")]
        quotable_url: Option<String>,
        /// Override the ZenQuotes endpoint
        #[arg(long, value_name = "URL")]
        zenquotes_url: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile configuration
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account; the profile is kept locally until first sign-in
    Signup {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        #[arg(long, value_name = "NAME")]
        first_name: String,
        #[arg(long, value_name = "NAME")]
        last_name: String,
        /// Birth date (YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        birth_date: String,
        #[arg(long, value_name = "COUNTRY")]
        nationality: String,
    },
    /// Sign in with email/password and store the session in the keychain
    Login {
        #[arg(long, value_name = "EMAIL")]
        email: String,
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for the profile
    Status,
    /// Sign out and purge local data
    Logout,
}
