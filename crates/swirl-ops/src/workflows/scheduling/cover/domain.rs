use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for reported absences.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbsenceId(pub String);

impl fmt::Display for AbsenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for individual cover requests in a cascade.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverRequestId(pub String);

impl fmt::Display for CoverRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for staff members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for store locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub String);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of a reported absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceType {
    Sick,
    Emergency,
    Personal,
    Other,
}

impl AbsenceType {
    pub const fn label(self) -> &'static str {
        match self {
            AbsenceType::Sick => "sick",
            AbsenceType::Emergency => "emergency",
            AbsenceType::Personal => "personal",
            AbsenceType::Other => "other",
        }
    }
}

/// Lifecycle of an absence while the cascade looks for cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceStatus {
    Pending,
    Covered,
    Escalated,
    Cancelled,
}

impl AbsenceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AbsenceStatus::Pending => "pending",
            AbsenceStatus::Covered => "covered",
            AbsenceStatus::Escalated => "escalated",
            AbsenceStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, AbsenceStatus::Pending)
    }
}

/// Response state of a single cover request. Write-once: once a request
/// leaves `Pending` it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverRequestStatus {
    Pending,
    Accepted,
    Declined,
    Timeout,
    Cancelled,
}

impl CoverRequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CoverRequestStatus::Pending => "pending",
            CoverRequestStatus::Accepted => "accepted",
            CoverRequestStatus::Declined => "declined",
            CoverRequestStatus::Timeout => "timeout",
            CoverRequestStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_settled(self) -> bool {
        !matches!(self, CoverRequestStatus::Pending)
    }
}

/// Delivery channel preferred by a staff member for cover requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Push,
    Sms,
    Email,
}

impl NotificationChannel {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationChannel::Push => "push",
            NotificationChannel::Sms => "sms",
            NotificationChannel::Email => "email",
        }
    }
}

/// Explicit employee answer to a cover request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverResponse {
    Accepted,
    Declined,
}

/// Inbound absence report as submitted by the staff app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceReport {
    pub employee_id: EmployeeId,
    pub unit_id: UnitId,
    pub shift_date: NaiveDate,
    pub reason: String,
    pub absence_type: AbsenceType,
    pub emergency: bool,
}

/// One row of the HR eligibility feed for a unit. Reliability and travel
/// distance are optional because the metrics history may not cover every
/// hire yet; the cascade repairs missing values to worst case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibleStaffMember {
    pub employee_id: EmployeeId,
    pub display_name: String,
    pub eligible: bool,
    pub channel_preference: NotificationChannel,
    pub reliability: Option<f32>,
    pub travel_distance: Option<f32>,
    pub wants_more_hours: bool,
    pub has_required_skills: bool,
    pub speaks_required_languages: bool,
    pub currently_available: bool,
}

/// Scoring view of one staff member, rebuilt fresh for every dispatch and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementCandidate {
    pub employee_id: EmployeeId,
    pub display_name: String,
    pub reliability: f32,
    pub distance: f32,
    pub wants_more_hours: bool,
    pub has_required_skills: bool,
    pub speaks_required_languages: bool,
    pub currently_available: bool,
}

impl ReplacementCandidate {
    /// Build a candidate from an eligibility-feed row, defaulting unknown
    /// metrics to worst case (zero reliability, maximal distance) so a gap
    /// in the metrics history never fails a ranking.
    pub fn from_staff(member: &EligibleStaffMember) -> Self {
        Self {
            employee_id: member.employee_id.clone(),
            display_name: member.display_name.clone(),
            reliability: member
                .reliability
                .filter(|value| value.is_finite())
                .map(|value| value.clamp(0.0, 100.0))
                .unwrap_or(0.0),
            distance: member
                .travel_distance
                .filter(|value| value.is_finite() && *value >= 0.0)
                .unwrap_or(f32::MAX),
            wants_more_hours: member.wants_more_hours,
            has_required_skills: member.has_required_skills,
            speaks_required_languages: member.speaks_required_languages,
            currently_available: member.currently_available,
        }
    }
}
