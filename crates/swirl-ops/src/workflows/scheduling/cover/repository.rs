use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AbsenceId, AbsenceStatus, AbsenceType, CoverRequestId, CoverRequestStatus, EligibleStaffMember,
    EmployeeId, NotificationChannel, UnitId,
};

/// Store row for a reported absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbsenceRecord {
    pub absence_id: AbsenceId,
    pub employee_id: EmployeeId,
    pub unit_id: UnitId,
    pub shift_date: NaiveDate,
    pub reason: String,
    pub absence_type: AbsenceType,
    pub emergency: bool,
    pub status: AbsenceStatus,
    pub reported_at: DateTime<Utc>,
    pub replacement: Option<EmployeeId>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Store row for one cover request in a cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverRequestRecord {
    pub cover_request_id: CoverRequestId,
    pub absence_id: AbsenceId,
    pub employee_id: EmployeeId,
    pub shift_date: NaiveDate,
    pub channel: NotificationChannel,
    /// 1-based position in the ranked cascade, kept for the audit trail.
    pub cascade_rank: u8,
    pub deadline: DateTime<Utc>,
    pub status: CoverRequestStatus,
    pub responded_at: Option<DateTime<Utc>>,
}

impl CoverRequestRecord {
    pub fn is_pending(&self) -> bool {
        self.status == CoverRequestStatus::Pending
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && now > self.deadline
    }

    pub fn view(&self) -> CoverRequestView {
        CoverRequestView {
            employee_id: self.employee_id.clone(),
            rank: self.cascade_rank,
            response: self.status.label(),
            responded_at: self.responded_at,
        }
    }

    pub fn inbox_entry(&self) -> EmployeeInboxEntry {
        EmployeeInboxEntry {
            cover_request_id: self.cover_request_id.clone(),
            absence_id: self.absence_id.clone(),
            shift_date: self.shift_date,
            rank: self.cascade_rank,
            deadline: self.deadline,
        }
    }
}

/// Storage abstraction over the platform row store so the cascade engine can
/// be exercised in isolation.
pub trait SchedulingRepository: Send + Sync {
    fn insert_absence(&self, record: AbsenceRecord) -> Result<AbsenceRecord, RepositoryError>;
    fn update_absence(&self, record: AbsenceRecord) -> Result<(), RepositoryError>;
    fn fetch_absence(&self, id: &AbsenceId) -> Result<Option<AbsenceRecord>, RepositoryError>;

    /// Persist a whole cascade batch. Implementations must apply the batch
    /// all-or-nothing: a partially created cascade would leave silently
    /// missing members.
    fn insert_cover_batch(&self, batch: Vec<CoverRequestRecord>) -> Result<(), RepositoryError>;
    fn update_cover_request(&self, record: CoverRequestRecord) -> Result<(), RepositoryError>;
    fn fetch_cover_request(
        &self,
        id: &CoverRequestId,
    ) -> Result<Option<CoverRequestRecord>, RepositoryError>;
    fn cover_requests_for_absence(
        &self,
        absence_id: &AbsenceId,
    ) -> Result<Vec<CoverRequestRecord>, RepositoryError>;
    fn pending_cover_requests_for_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<CoverRequestRecord>, RepositoryError>;
    /// Every pending cover request across all absences; drives the expiry
    /// sweep.
    fn pending_cover_requests(&self) -> Result<Vec<CoverRequestRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// HR directory lookup consumed by the orchestrator when building a cascade.
pub trait StaffDirectory: Send + Sync {
    fn eligible_staff(&self, unit_id: &UnitId) -> Result<Vec<EligibleStaffMember>, DirectoryError>;
}

/// Staff directory failure.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("staff directory unavailable: {0}")]
    Unavailable(String),
}

/// Outbound delivery hook for cover requests (push/SMS/email adapters).
/// Dispatch is fire-and-forget: a failed delivery is logged by the caller
/// and never rolls back the cascade.
pub trait CoverNotifier: Send + Sync {
    fn notify(&self, request: &CoverRequestRecord) -> Result<(), NotifyError>;
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Receipt returned when an absence report has been processed.
#[derive(Debug, Clone, Serialize)]
pub struct AbsenceReceipt {
    pub absence_id: AbsenceId,
    pub status: &'static str,
    pub notifications_sent: usize,
    pub escalated: bool,
}

/// Receipt returned for an accept/decline response.
#[derive(Debug, Clone, Serialize)]
pub struct CoverResponseReceipt {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_pending: Option<usize>,
}

/// One cover request in the coverage audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct CoverRequestView {
    pub employee_id: EmployeeId,
    pub rank: u8,
    pub response: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

/// Coverage snapshot for one absence.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageStatusView {
    pub absence_id: AbsenceId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<EmployeeId>,
    pub cover_requests: Vec<CoverRequestView>,
}

/// Pending cover request as shown in a staff member's inbox.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeInboxEntry {
    pub cover_request_id: CoverRequestId,
    pub absence_id: AbsenceId,
    pub shift_date: NaiveDate,
    pub rank: u8,
    pub deadline: DateTime<Utc>,
}
