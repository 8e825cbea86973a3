use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::workflows::scheduling::cover::domain::{
    AbsenceId, AbsenceReport, AbsenceType, CoverRequestId, EligibleStaffMember, EmployeeId,
    NotificationChannel, UnitId,
};
use crate::workflows::scheduling::cover::repository::{
    AbsenceRecord, CoverNotifier, CoverRequestRecord, DirectoryError, NotifyError,
    RepositoryError, SchedulingRepository, StaffDirectory,
};
use crate::workflows::scheduling::cover::service::{CascadeConfig, ShiftCoverService};

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap()
}

pub(super) fn shift_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date")
}

pub(super) fn unit() -> UnitId {
    UnitId("store-042".to_string())
}

pub(super) fn staff_member(id: &str, reliability: f32, distance: f32) -> EligibleStaffMember {
    EligibleStaffMember {
        employee_id: EmployeeId(id.to_string()),
        display_name: format!("Staff {id}"),
        eligible: true,
        channel_preference: NotificationChannel::Push,
        reliability: Some(reliability),
        travel_distance: Some(distance),
        wants_more_hours: false,
        has_required_skills: true,
        speaks_required_languages: true,
        currently_available: true,
    }
}

pub(super) fn report(employee_id: &str) -> AbsenceReport {
    AbsenceReport {
        employee_id: EmployeeId(employee_id.to_string()),
        unit_id: unit(),
        shift_date: shift_date(),
        reason: "flu".to_string(),
        absence_type: AbsenceType::Sick,
        emergency: false,
    }
}

#[derive(Default)]
pub(super) struct MemoryStore {
    absences: Mutex<HashMap<AbsenceId, AbsenceRecord>>,
    covers: Mutex<HashMap<CoverRequestId, CoverRequestRecord>>,
    fail_cover_batches: AtomicBool,
}

impl MemoryStore {
    pub(super) fn fail_next_cover_batches(&self) {
        self.fail_cover_batches.store(true, Ordering::SeqCst);
    }

    pub(super) fn cover_count(&self) -> usize {
        self.covers.lock().expect("lock").len()
    }

    pub(super) fn absence(&self, id: &AbsenceId) -> Option<AbsenceRecord> {
        self.absences.lock().expect("lock").get(id).cloned()
    }

    pub(super) fn covers_for(&self, id: &AbsenceId) -> Vec<CoverRequestRecord> {
        let mut records: Vec<CoverRequestRecord> = self
            .covers
            .lock()
            .expect("lock")
            .values()
            .filter(|record| &record.absence_id == id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.cascade_rank);
        records
    }
}

impl SchedulingRepository for MemoryStore {
    fn insert_absence(&self, record: AbsenceRecord) -> Result<AbsenceRecord, RepositoryError> {
        let mut guard = self.absences.lock().expect("lock");
        if guard.contains_key(&record.absence_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.absence_id.clone(), record.clone());
        Ok(record)
    }

    fn update_absence(&self, record: AbsenceRecord) -> Result<(), RepositoryError> {
        let mut guard = self.absences.lock().expect("lock");
        if guard.contains_key(&record.absence_id) {
            guard.insert(record.absence_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_absence(&self, id: &AbsenceId) -> Result<Option<AbsenceRecord>, RepositoryError> {
        let guard = self.absences.lock().expect("lock");
        Ok(guard.get(id).cloned())
    }

    fn insert_cover_batch(&self, batch: Vec<CoverRequestRecord>) -> Result<(), RepositoryError> {
        if self.fail_cover_batches.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("simulated outage".to_string()));
        }
        let mut guard = self.covers.lock().expect("lock");
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
        let mut guard = self.covers.lock().expect("lock");
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
        let guard = self.covers.lock().expect("lock");
        Ok(guard.get(id).cloned())
    }

    fn cover_requests_for_absence(
        &self,
        absence_id: &AbsenceId,
    ) -> Result<Vec<CoverRequestRecord>, RepositoryError> {
        let guard = self.covers.lock().expect("lock");
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
        let guard = self.covers.lock().expect("lock");
        Ok(guard
            .values()
            .filter(|record| &record.employee_id == employee_id && record.is_pending())
            .cloned()
            .collect())
    }

    fn pending_cover_requests(&self) -> Result<Vec<CoverRequestRecord>, RepositoryError> {
        let guard = self.covers.lock().expect("lock");
        Ok(guard
            .values()
            .filter(|record| record.is_pending())
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    staff: Mutex<HashMap<UnitId, Vec<EligibleStaffMember>>>,
}

impl MemoryDirectory {
    pub(super) fn seed(&self, unit_id: UnitId, members: Vec<EligibleStaffMember>) {
        self.staff.lock().expect("lock").insert(unit_id, members);
    }
}

impl StaffDirectory for MemoryDirectory {
    fn eligible_staff(
        &self,
        unit_id: &UnitId,
    ) -> Result<Vec<EligibleStaffMember>, DirectoryError> {
        let guard = self.staff.lock().expect("lock");
        Ok(guard.get(unit_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    sent: Mutex<Vec<CoverRequestRecord>>,
    fail: AtomicBool,
}

impl MemoryNotifier {
    pub(super) fn fail_deliveries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub(super) fn sent(&self) -> Vec<CoverRequestRecord> {
        self.sent.lock().expect("lock").clone()
    }
}

impl CoverNotifier for MemoryNotifier {
    fn notify(&self, request: &CoverRequestRecord) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("simulated outage".to_string()));
        }
        self.sent.lock().expect("lock").push(request.clone());
        Ok(())
    }
}

pub(super) type TestService = ShiftCoverService<MemoryStore, MemoryDirectory, MemoryNotifier>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryStore>,
    Arc<MemoryDirectory>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(MemoryDirectory::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = Arc::new(ShiftCoverService::new(
        store.clone(),
        directory.clone(),
        notifier.clone(),
        CascadeConfig::default(),
    ));
    (service, store, directory, notifier)
}

/// Six-member roster so a default cascade fills all five slots and leaves
/// the weakest candidate out.
pub(super) fn seed_default_unit(directory: &MemoryDirectory) {
    directory.seed(
        unit(),
        vec![
            staff_member("emp-a", 90.0, 2.0),
            staff_member("emp-b", 95.0, 1.0),
            staff_member("emp-c", 80.0, 4.0),
            staff_member("emp-d", 75.0, 3.0),
            staff_member("emp-e", 60.0, 5.0),
            staff_member("emp-f", 50.0, 9.0),
        ],
    );
}
