use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "his")]
#[command(about = "HIS front desk: sessions, workstation access and registration checks")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL (overrides config and HIS_URL env var)
    #[arg(short, long, global = true, env = "HIS_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "HIS_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Print the most recent log events after the command finishes
    #[arg(long, global = true)]
    pub log_summary: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a session issued by the backend
    Login(LoginArgs),
    /// Clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Open workstation paths through the session guard
    Open(OpenArgs),
    /// Validate and parse identity card numbers
    Idcard(IdcardArgs),
    /// Validate a single registration field
    Check(CheckArgs),
    /// Validate a batch of registration drafts
    Import(ImportArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct LoginArgs {
    /// Session token issued by the backend
    #[arg(long)]
    pub token: String,
    /// Role: nurse, doctor, pharmacy or admin
    #[arg(long)]
    pub role: String,
    /// Display name
    #[arg(long)]
    pub name: String,
    /// Department
    #[arg(long)]
    pub dept: Option<String>,
    #[arg(long)]
    pub user_id: Option<i64>,
    /// Id of the linked nurse/doctor/pharmacist record
    #[arg(long)]
    pub related_id: Option<i64>,
}

#[derive(clap::Args)]
pub struct OpenArgs {
    /// Paths to open, in order (e.g. /nurse /doctor/consult)
    #[arg(required = true)]
    pub paths: Vec<String>,
}

#[derive(clap::Args)]
pub struct IdcardArgs {
    /// 18-character identity card numbers
    #[arg(required = true)]
    pub numbers: Vec<String>,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    #[command(subcommand)]
    pub field: CheckField,
}

#[derive(Subcommand)]
pub enum CheckField {
    /// Mainland mobile number
    Phone { value: String },
    /// Patient name
    Name { value: String },
    /// Age in years
    Age {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// JSON file holding an array of registration drafts
    pub file: PathBuf,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Config key (server, format, cache_window)
    pub key: String,
    /// Config value
    pub value: String,
}
