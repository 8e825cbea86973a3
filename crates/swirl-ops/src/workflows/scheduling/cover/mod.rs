//! Shift-cover cascade engine: when a staff member reports an absence, the
//! orchestrator ranks eligible colleagues, dispatches time-bounded cover
//! requests in priority order, and settles the absence from their responses.

pub mod domain;
pub mod repository;
pub mod router;
pub(crate) mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AbsenceId, AbsenceReport, AbsenceStatus, AbsenceType, CoverRequestId, CoverRequestStatus,
    CoverResponse, EligibleStaffMember, EmployeeId, NotificationChannel, ReplacementCandidate,
    UnitId,
};
pub use repository::{
    AbsenceReceipt, AbsenceRecord, CoverNotifier, CoverRequestRecord, CoverRequestView,
    CoverResponseReceipt, CoverageStatusView, DirectoryError, EmployeeInboxEntry, NotifyError,
    RepositoryError, SchedulingRepository, StaffDirectory,
};
pub use router::scheduling_router;
pub use scoring::rank_candidates;
pub use service::{CascadeConfig, CoverServiceError, ShiftCoverService, SweepOutcome};
