use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use swirl_ops::workflows::scheduling::cover::{
    AbsenceId, AbsenceRecord, CascadeConfig, CoverNotifier, CoverRequestId, CoverRequestRecord,
    DirectoryError, EligibleStaffMember, EmployeeId, NotifyError, RepositoryError,
    SchedulingRepository, StaffDirectory, UnitId,
};
use swirl_ops::workflows::scheduling::roster::StaffRoster;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Row-store adapter backing the scheduling workflow until the platform
/// database lands. One mutex per table keeps the cascade batch insert
/// all-or-nothing.
#[derive(Default, Clone)]
pub(crate) struct InMemorySchedulingStore {
    absences: Arc<Mutex<HashMap<AbsenceId, AbsenceRecord>>>,
    covers: Arc<Mutex<HashMap<CoverRequestId, CoverRequestRecord>>>,
}

impl SchedulingRepository for InMemorySchedulingStore {
    fn insert_absence(&self, record: AbsenceRecord) -> Result<AbsenceRecord, RepositoryError> {
        let mut guard = self.absences.lock().expect("absence mutex poisoned");
        if guard.contains_key(&record.absence_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.absence_id.clone(), record.clone());
        Ok(record)
    }

    fn update_absence(&self, record: AbsenceRecord) -> Result<(), RepositoryError> {
        let mut guard = self.absences.lock().expect("absence mutex poisoned");
        if guard.contains_key(&record.absence_id) {
            guard.insert(record.absence_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_absence(&self, id: &AbsenceId) -> Result<Option<AbsenceRecord>, RepositoryError> {
        let guard = self.absences.lock().expect("absence mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn insert_cover_batch(&self, batch: Vec<CoverRequestRecord>) -> Result<(), RepositoryError> {
        let mut guard = self.covers.lock().expect("cover mutex poisoned");
        if batch
            .iter()
            .any(|record| guard.contains_key(&record.cover_request_id))
        {
            return Err(RepositoryError::Conflict);
        }
        for record in batch {
            guard.insert(record.cover_request_id.clone(), record);
        }
        Ok(())
    }

    fn update_cover_request(&self, record: CoverRequestRecord) -> Result<(), RepositoryError> {
        let mut guard = self.covers.lock().expect("cover mutex poisoned");
        if guard.contains_key(&record.cover_request_id) {
            guard.insert(record.cover_request_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_cover_request(
        &self,
        id: &CoverRequestId,
    ) -> Result<Option<CoverRequestRecord>, RepositoryError> {
        let guard = self.covers.lock().expect("cover mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn cover_requests_for_absence(
        &self,
        absence_id: &AbsenceId,
    ) -> Result<Vec<CoverRequestRecord>, RepositoryError> {
        let guard = self.covers.lock().expect("cover mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.absence_id == absence_id)
            .cloned()
            .collect())
    }

    fn pending_cover_requests_for_employee(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<CoverRequestRecord>, RepositoryError> {
        let guard = self.covers.lock().expect("cover mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.employee_id == employee_id && record.is_pending())
            .cloned()
            .collect())
    }

    fn pending_cover_requests(&self) -> Result<Vec<CoverRequestRecord>, RepositoryError> {
        let guard = self.covers.lock().expect("cover mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.is_pending())
            .cloned()
            .collect())
    }
}

/// Staff directory backed by an imported roster snapshot.
#[derive(Default, Clone)]
pub(crate) struct RosterStaffDirectory {
    roster: Arc<Mutex<StaffRoster>>,
}

impl RosterStaffDirectory {
    pub(crate) fn from_roster(roster: StaffRoster) -> Self {
        Self {
            roster: Arc::new(Mutex::new(roster)),
        }
    }
}

impl StaffDirectory for RosterStaffDirectory {
    fn eligible_staff(
        &self,
        unit_id: &UnitId,
    ) -> Result<Vec<EligibleStaffMember>, DirectoryError> {
        let guard = self.roster.lock().expect("roster mutex poisoned");
        Ok(guard.members_for(unit_id).to_vec())
    }
}

/// Delivery adapter that records the handoff in the service log. The real
/// push/SMS/email bridges plug in behind the same trait.
#[derive(Default, Clone)]
pub(crate) struct LoggingCoverNotifier;

impl CoverNotifier for LoggingCoverNotifier {
    fn notify(&self, request: &CoverRequestRecord) -> Result<(), NotifyError> {
        info!(
            cover_request_id = %request.cover_request_id,
            employee_id = %request.employee_id,
            channel = request.channel.label(),
            deadline = %request.deadline,
            "cover request handed to delivery"
        );
        Ok(())
    }
}

pub(crate) fn default_cascade_config() -> CascadeConfig {
    CascadeConfig {
        max_cascade_size: 5,
        response_window_minutes: 30,
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
