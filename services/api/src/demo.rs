use crate::infra::{
    default_cascade_config, parse_date, InMemorySchedulingStore, LoggingCoverNotifier,
    RosterStaffDirectory,
};
use chrono::{Duration, Local, NaiveDate, Utc};
use clap::Args;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use swirl_ops::error::AppError;
use swirl_ops::workflows::scheduling::cover::{
    AbsenceReport, AbsenceType, CoverResponse, CoverServiceError, CoverageStatusView, EmployeeId,
    SchedulingRepository, ShiftCoverService, UnitId,
};
use swirl_ops::workflows::scheduling::roster::StaffRoster;

/// Bundled roster for the walkthrough: one understaffed unit with a mix of
/// strong and weak candidates and one member who fails the hard filters.
const SAMPLE_ROSTER: &str = "\
Employee ID,Name,Unit,Eligible For Cover,Channel,Reliability,Distance,Wants More Hours,Has Required Skills,Speaks Required Languages,Currently Available
emp-101,Avery Lund,store-042,yes,push,90,2,yes,yes,yes,yes
emp-102,Sam Ortiz,store-042,yes,sms,95,1,no,yes,yes,yes
emp-103,Kit Doyle,store-042,yes,email,99,0,yes,no,yes,yes
emp-104,Noa Reyes,store-042,yes,push,72,4,yes,yes,yes,yes
emp-105,Jules Kim,store-042,yes,push,64,3,no,yes,yes,yes
";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Shift date to request cover for (YYYY-MM-DD). Defaults to tomorrow.
    #[arg(long, value_parser = parse_date)]
    pub(crate) shift_date: Option<NaiveDate>,
    /// Staff roster CSV to run the cascade against (defaults to a bundled
    /// sample roster)
    #[arg(long)]
    pub(crate) roster_csv: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        shift_date,
        roster_csv,
    } = args;

    let shift_date =
        shift_date.unwrap_or_else(|| Local::now().date_naive() + Duration::days(1));

    let roster = match roster_csv {
        Some(path) => StaffRoster::from_path(path)?,
        None => StaffRoster::from_reader(Cursor::new(SAMPLE_ROSTER))?,
    };

    let unit = UnitId("store-042".to_string());
    println!("Shift-cover cascade demo");
    println!(
        "Unit {}: {} staff on the imported roster",
        unit,
        roster.members_for(&unit).len()
    );

    let store = Arc::new(InMemorySchedulingStore::default());
    let directory = Arc::new(RosterStaffDirectory::from_roster(roster));
    let notifier = Arc::new(LoggingCoverNotifier);
    let service = ShiftCoverService::new(
        store.clone(),
        directory,
        notifier,
        default_cascade_config(),
    );

    let now = Utc::now();
    let receipt = service
        .report_absence(
            AbsenceReport {
                employee_id: EmployeeId("emp-100".to_string()),
                unit_id: unit,
                shift_date,
                reason: "called in sick".to_string(),
                absence_type: AbsenceType::Sick,
                emergency: false,
            },
            now,
        )?;

    println!(
        "\nAbsence {} reported for {}: {} candidate(s) notified",
        receipt.absence_id, shift_date, receipt.notifications_sent
    );

    if receipt.escalated {
        println!("No eligible candidates were found; the absence went straight to a manager.");
        return Ok(());
    }

    let mut covers = store
        .cover_requests_for_absence(&receipt.absence_id)
        .map_err(CoverServiceError::from)?;
    covers.sort_by_key(|cover| cover.cascade_rank);

    println!("\nCascade order");
    for cover in &covers {
        println!(
            "- rank {}: {} via {} (answer by {})",
            cover.cascade_rank,
            cover.employee_id,
            cover.channel.label(),
            cover.deadline.format("%H:%M:%S")
        );
    }

    // The favorite passes, the runner-up takes the shift.
    let declined = service
        .respond_to_cover_request(
            &covers[0].cover_request_id,
            CoverResponse::Declined,
            now + Duration::minutes(3),
        )?;
    println!("\nRank 1 declined: {}", declined.message);

    let accepted = service
        .respond_to_cover_request(
            &covers[1].cover_request_id,
            CoverResponse::Accepted,
            now + Duration::minutes(7),
        )?;
    println!("Rank 2 accepted: {}", accepted.message);

    let view = service
        .coverage_status(&receipt.absence_id, now + Duration::minutes(8))?;
    render_audit_trail(&view);

    Ok(())
}

fn render_audit_trail(view: &CoverageStatusView) {
    println!("\nFinal coverage status: {}", view.status);
    if let Some(replacement) = &view.replacement {
        println!("Replacement: {}", replacement);
    }
    println!("Audit trail");
    for request in &view.cover_requests {
        match request.responded_at {
            Some(at) => println!(
                "- rank {}: {} -> {} at {}",
                request.rank,
                request.employee_id,
                request.response,
                at.format("%H:%M:%S")
            ),
            None => println!(
                "- rank {}: {} -> {}",
                request.rank, request.employee_id, request.response
            ),
        }
    }
}
