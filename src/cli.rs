//! This module contains the command-line interface [`Cli`] parser for recording and reporting
//! student attendance.

use crate::models::Status;
use crate::stats::DivisionFilter;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(version, about = "Record and report per-session student attendance")]
pub struct Cli {
    /// Configuration file to read instead of `config.toml`.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The different commands available for managing attendance records.
    #[command(subcommand)]
    pub command: Command,
}

/// Credentials of the staff member performing an action.
#[derive(Args, Debug)]
pub struct Credentials {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "STAFF_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a session's attendance, replacing anything recorded for it before.
    Mark {
        #[command(flatten)]
        credentials: Credentials,

        #[arg(long)]
        division: String,

        #[arg(long)]
        subject: String,

        /// Session date as YYYY-MM-DD. Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Statuses in roll number order, e.g. `P,A,P`. Missing trailing students are absent.
        #[arg(long, value_delimiter = ',')]
        statuses: Vec<Status>,
    },

    /// Show per-student attendance for a division, or `all`.
    Report {
        #[arg(long, default_value = "all")]
        division: DivisionFilter,
    },

    /// List students below the low attendance threshold.
    Alerts,

    /// Show the department overview for a day.
    Dashboard {
        /// Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// Show the roster of a division.
    Roster { division: String },

    /// Show a student's details and attendance.
    Student { roll_no: String },

    /// Create a staff account.
    AddStaff {
        #[arg(long)]
        name: String,

        #[arg(long)]
        department: Option<String>,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Add students from a `roll_no,name,division` CSV file.
    ImportRoster { file_path: PathBuf },

    /// Remove a student along with their attendance records.
    RemoveStudent { roll_no: String },
}
