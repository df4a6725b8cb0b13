use anyhow::{Context, Result};
use attendance_tracker::auth::{self, StaffContext};
use attendance_tracker::cli::{Cli, Command, Credentials};
use attendance_tracker::recording::{self, MarkRequest};
use attendance_tracker::{AttendanceManager, display, import};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber, honoring `RUST_LOG` when it is set.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn login(manager: &mut AttendanceManager, credentials: &Credentials) -> Result<StaffContext> {
    auth::authenticate(manager, &credentials.email, &credentials.password)
        .context("login failed")
}

fn day_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(raw) => Ok(recording::parse_date(raw)?),
        None => Ok(Local::now().date_naive()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (mut manager, settings) = attendance_tracker::create_default_manager(cli.config.as_deref())
        .context("could not open the attendance store")?;

    match cli.command {
        Command::Mark {
            credentials,
            division,
            subject,
            date,
            statuses,
        } => {
            let staff = login(&mut manager, &credentials)?;
            let date = date.unwrap_or_else(recording::today);

            settings.check_division(&division)?;
            let roster = manager.roster(&division)?;
            let entries = recording::align_statuses(&division, &roster, &statuses)?;

            let request = MarkRequest {
                division: &division,
                subject: &subject,
                date: &date,
                entries,
            };
            let outcome = recording::record_attendance(&mut manager, &settings, &staff, &request)?;
            display::show_recorded(&outcome);
        }
        Command::Report { division } => display::show_report(&mut manager, &settings, &division)?,
        Command::Alerts => display::show_alerts(&mut manager, &settings)?,
        Command::Dashboard { date } => {
            let date = day_or_today(date.as_deref())?;
            display::show_dashboard(&mut manager, &settings, date)?;
        }
        Command::Roster { division } => display::show_roster(&mut manager, &settings, &division)?,
        Command::Student { roll_no } => display::show_student_info(&mut manager, &roll_no)?,
        Command::AddStaff {
            name,
            department,
            credentials,
        } => {
            let department = department.unwrap_or_else(|| settings.department.clone());
            let staff = auth::provision_staff(
                &mut manager,
                &name,
                &credentials.email,
                &department,
                &credentials.password,
            )?;
            println!("Created staff account {} <{}>", staff.name, staff.email);
        }
        Command::ImportRoster { file_path } => {
            let added = import::import_roster(&mut manager, &settings, &file_path)
                .with_context(|| format!("could not import {}", file_path.display()))?;
            println!("Added {} students: {:?}", added.len(), added);
        }
        Command::RemoveStudent { roll_no } => {
            let student = manager.delete_student(&roll_no)?;
            println!("Removed {} ({})", student.name, student.roll_no);
        }
    }

    Ok(())
}
