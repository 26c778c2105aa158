use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "coursedb",
    version,
    about = "Course content seeding and inspection tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Populate the store from CSV exports.
    Seed(SeedArgs),
    /// Check post-seed referential integrity.
    Verify(VerifyArgs),
    /// Report the latest seed run and live table counts.
    Status(StatusArgs),
    /// Browse seeded content.
    Show(ShowArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    /// Directory holding Course.csv, Unit.csv, Chunk.csv, Exercise.csv and
    /// Chunk-Resource.csv.
    #[arg(long, default_value = "future-tables")]
    pub csv_dir: PathBuf,

    #[arg(long, default_value = ".cache/coursedb")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    /// Append to existing data instead of clearing first.
    #[arg(long, default_value_t = false)]
    pub no_clear: bool,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    #[arg(long, default_value = ".cache/coursedb")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/coursedb")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[arg(long, default_value = ".cache/coursedb")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Course slug to drill into; lists all courses when omitted.
    #[arg(long)]
    pub course: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
