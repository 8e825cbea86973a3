use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    AbsenceId, AbsenceReport, AbsenceStatus, CoverRequestId, CoverRequestStatus, CoverResponse,
    EmployeeId, NotificationChannel, ReplacementCandidate,
};
use super::repository::{
    AbsenceReceipt, AbsenceRecord, CoverNotifier, CoverRequestRecord, CoverResponseReceipt,
    CoverageStatusView, DirectoryError, EmployeeInboxEntry, RepositoryError, SchedulingRepository,
    StaffDirectory,
};
use super::scoring::rank_candidates;

/// Tuning knobs for the cover cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Upper bound on cascade size; only this many top-ranked candidates
    /// receive a cover request.
    pub max_cascade_size: usize,
    /// Minutes each candidate has to answer before their request lapses.
    pub response_window_minutes: i64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            max_cascade_size: 5,
            response_window_minutes: 30,
        }
    }
}

impl CascadeConfig {
    fn response_window(&self) -> Duration {
        Duration::minutes(self.response_window_minutes)
    }
}

/// Outcome of one expiry sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepOutcome {
    pub expired: usize,
    pub escalated: usize,
}

static ABSENCE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static COVER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_absence_id() -> AbsenceId {
    let id = ABSENCE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AbsenceId(format!("abs-{id:06}"))
}

fn next_cover_request_id() -> CoverRequestId {
    let id = COVER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    CoverRequestId(format!("cov-{id:06}"))
}

/// Orchestrates the shift-cover cascade: absence intake, candidate ranking,
/// dispatch, response handling, and expiry.
pub struct ShiftCoverService<R, D, N> {
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    config: CascadeConfig,
    /// One guard per open absence; accept/decline/expiry for the same
    /// absence serialize on it so only the first accept can win.
    absence_guards: Mutex<HashMap<AbsenceId, Arc<Mutex<()>>>>,
}

impl<R, D, N> ShiftCoverService<R, D, N>
where
    R: SchedulingRepository + 'static,
    D: StaffDirectory + 'static,
    N: CoverNotifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        notifier: Arc<N>,
        config: CascadeConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            notifier,
            config,
            absence_guards: Mutex::new(HashMap::new()),
        }
    }

    fn guard_for(&self, absence_id: &AbsenceId) -> Arc<Mutex<()>> {
        let mut guards = self.absence_guards.lock().expect("guard registry poisoned");
        guards
            .entry(absence_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release_guard(&self, absence_id: &AbsenceId) {
        let mut guards = self.absence_guards.lock().expect("guard registry poisoned");
        guards.remove(absence_id);
    }

    /// Register an absence and dispatch the cover cascade.
    ///
    /// An empty eligible set is a modeled outcome, not an error: the absence
    /// is stored directly as escalated and the receipt says so.
    pub fn report_absence(
        &self,
        report: AbsenceReport,
        now: DateTime<Utc>,
    ) -> Result<AbsenceReceipt, CoverServiceError> {
        let staff = self.directory.eligible_staff(&report.unit_id)?;

        let candidates: Vec<ReplacementCandidate> = staff
            .iter()
            .filter(|member| member.eligible && member.employee_id != report.employee_id)
            .map(ReplacementCandidate::from_staff)
            .collect();
        let ranked = rank_candidates(candidates);

        let mut record = AbsenceRecord {
            absence_id: next_absence_id(),
            employee_id: report.employee_id,
            unit_id: report.unit_id,
            shift_date: report.shift_date,
            reason: report.reason,
            absence_type: report.absence_type,
            emergency: report.emergency,
            status: AbsenceStatus::Pending,
            reported_at: now,
            replacement: None,
            confirmed_at: None,
        };

        if ranked.is_empty() {
            record.status = AbsenceStatus::Escalated;
            let stored = self.repository.insert_absence(record)?;
            info!(
                absence_id = %stored.absence_id,
                unit_id = %stored.unit_id,
                "no eligible cover candidates, absence escalated"
            );
            return Ok(AbsenceReceipt {
                absence_id: stored.absence_id,
                status: AbsenceStatus::Escalated.label(),
                notifications_sent: 0,
                escalated: true,
            });
        }

        let deadline = now + self.config.response_window();
        let channels: HashMap<&EmployeeId, _> = staff
            .iter()
            .map(|member| (&member.employee_id, member.channel_preference))
            .collect();

        let batch: Vec<CoverRequestRecord> = ranked
            .iter()
            .take(self.config.max_cascade_size)
            .enumerate()
            .map(|(index, candidate)| CoverRequestRecord {
                cover_request_id: next_cover_request_id(),
                absence_id: record.absence_id.clone(),
                employee_id: candidate.employee_id.clone(),
                shift_date: record.shift_date,
                channel: channels
                    .get(&candidate.employee_id)
                    .copied()
                    .unwrap_or(NotificationChannel::Push),
                cascade_rank: (index + 1) as u8,
                deadline,
                status: CoverRequestStatus::Pending,
                responded_at: None,
            })
            .collect();

        let stored = self.repository.insert_absence(record)?;
        self.repository.insert_cover_batch(batch.clone())?;

        for request in &batch {
            if let Err(err) = self.notifier.notify(request) {
                warn!(
                    cover_request_id = %request.cover_request_id,
                    employee_id = %request.employee_id,
                    error = %err,
                    "cover notification failed, request stays open until its deadline"
                );
            }
        }

        info!(
            absence_id = %stored.absence_id,
            cascade_size = batch.len(),
            deadline = %deadline,
            "cover cascade dispatched"
        );

        Ok(AbsenceReceipt {
            absence_id: stored.absence_id,
            status: AbsenceStatus::Pending.label(),
            notifications_sent: batch.len(),
            escalated: false,
        })
    }

    /// Record an accept or decline for a cover request.
    ///
    /// Accept handling is serialized per absence: the first accept marks the
    /// absence covered and cancels every other open request; a losing accept
    /// gets an already-resolved rejection instead of a silent success.
    pub fn respond_to_cover_request(
        &self,
        cover_request_id: &CoverRequestId,
        response: CoverResponse,
        now: DateTime<Utc>,
    ) -> Result<CoverResponseReceipt, CoverServiceError> {
        let probe = self
            .repository
            .fetch_cover_request(cover_request_id)?
            .ok_or_else(|| CoverServiceError::CoverRequestNotFound(cover_request_id.clone()))?;

        let guard = self.guard_for(&probe.absence_id);
        let _serialized = guard.lock().expect("absence guard poisoned");

        let request = self
            .repository
            .fetch_cover_request(cover_request_id)?
            .ok_or_else(|| CoverServiceError::CoverRequestNotFound(cover_request_id.clone()))?;
        let mut absence = self
            .repository
            .fetch_absence(&request.absence_id)?
            .ok_or_else(|| CoverServiceError::AbsenceNotFound(request.absence_id.clone()))?;

        if absence.status.is_terminal() {
            self.release_guard(&absence.absence_id);
            return Err(CoverServiceError::AbsenceAlreadyResolved {
                absence_id: absence.absence_id,
                status: absence.status.label(),
            });
        }

        if request.status.is_settled() {
            return Err(CoverServiceError::CoverRequestAlreadySettled {
                cover_request_id: request.cover_request_id,
                status: request.status.label(),
            });
        }

        match response {
            CoverResponse::Accepted => {
                let mut accepted = request;
                accepted.status = CoverRequestStatus::Accepted;
                accepted.responded_at = Some(now);
                self.repository.update_cover_request(accepted.clone())?;

                absence.status = AbsenceStatus::Covered;
                absence.replacement = Some(accepted.employee_id.clone());
                absence.confirmed_at = Some(now);
                self.repository.update_absence(absence.clone())?;

                let cancelled = self.cancel_open_requests(
                    &absence.absence_id,
                    Some(&accepted.cover_request_id),
                )?;
                self.release_guard(&absence.absence_id);

                info!(
                    absence_id = %absence.absence_id,
                    replacement = %accepted.employee_id,
                    cancelled,
                    "shift covered"
                );

                Ok(CoverResponseReceipt {
                    success: true,
                    message: format!(
                        "cover confirmed for absence {}; {} other request(s) cancelled",
                        absence.absence_id, cancelled
                    ),
                    remaining_pending: None,
                })
            }
            CoverResponse::Declined => {
                let mut declined = request;
                declined.status = CoverRequestStatus::Declined;
                declined.responded_at = Some(now);
                self.repository.update_cover_request(declined)?;

                let remaining = self.count_open_requests(&absence.absence_id)?;
                if remaining == 0 {
                    absence.status = AbsenceStatus::Escalated;
                    self.repository.update_absence(absence.clone())?;
                    self.release_guard(&absence.absence_id);
                    info!(
                        absence_id = %absence.absence_id,
                        "cascade exhausted by declines, absence escalated"
                    );
                    return Ok(CoverResponseReceipt {
                        success: true,
                        message: format!(
                            "decline recorded; no candidates remain, absence {} escalated",
                            absence.absence_id
                        ),
                        remaining_pending: Some(0),
                    });
                }

                Ok(CoverResponseReceipt {
                    success: true,
                    message: format!("decline recorded; {remaining} request(s) still pending"),
                    remaining_pending: Some(remaining),
                })
            }
        }
    }

    /// Coverage snapshot for one absence, settling lapsed deadlines first so
    /// the answer is correct even when the background sweep is behind.
    pub fn coverage_status(
        &self,
        absence_id: &AbsenceId,
        now: DateTime<Utc>,
    ) -> Result<CoverageStatusView, CoverServiceError> {
        // Existence probe before taking a guard, so unknown ids never grow
        // the registry.
        self.repository
            .fetch_absence(absence_id)?
            .ok_or_else(|| CoverServiceError::AbsenceNotFound(absence_id.clone()))?;

        let guard = self.guard_for(absence_id);
        let _serialized = guard.lock().expect("absence guard poisoned");

        let absence = self
            .repository
            .fetch_absence(absence_id)?
            .ok_or_else(|| CoverServiceError::AbsenceNotFound(absence_id.clone()))?;

        let absence = self.settle_expired(absence, now)?;
        if absence.status.is_terminal() {
            self.release_guard(absence_id);
        }

        let mut requests = self.repository.cover_requests_for_absence(absence_id)?;
        requests.sort_by_key(|request| request.cascade_rank);

        Ok(CoverageStatusView {
            absence_id: absence.absence_id.clone(),
            status: absence.status.label(),
            replacement: absence.replacement.clone(),
            cover_requests: requests.iter().map(CoverRequestRecord::view).collect(),
        })
    }

    /// Retract an absence before it reaches a terminal state; every open
    /// cover request is cancelled with it.
    pub fn cancel_absence(
        &self,
        absence_id: &AbsenceId,
        _now: DateTime<Utc>,
    ) -> Result<CoverageStatusView, CoverServiceError> {
        self.repository
            .fetch_absence(absence_id)?
            .ok_or_else(|| CoverServiceError::AbsenceNotFound(absence_id.clone()))?;

        let guard = self.guard_for(absence_id);
        let _serialized = guard.lock().expect("absence guard poisoned");

        let mut absence = self
            .repository
            .fetch_absence(absence_id)?
            .ok_or_else(|| CoverServiceError::AbsenceNotFound(absence_id.clone()))?;

        if absence.status.is_terminal() {
            self.release_guard(absence_id);
            return Err(CoverServiceError::AbsenceAlreadyResolved {
                absence_id: absence.absence_id,
                status: absence.status.label(),
            });
        }

        absence.status = AbsenceStatus::Cancelled;
        self.repository.update_absence(absence.clone())?;
        let cancelled = self.cancel_open_requests(absence_id, None)?;
        self.release_guard(absence_id);

        info!(absence_id = %absence.absence_id, cancelled, "absence retracted");

        let mut requests = self.repository.cover_requests_for_absence(absence_id)?;
        requests.sort_by_key(|request| request.cascade_rank);

        Ok(CoverageStatusView {
            absence_id: absence.absence_id,
            status: AbsenceStatus::Cancelled.label(),
            replacement: None,
            cover_requests: requests.iter().map(CoverRequestRecord::view).collect(),
        })
    }

    /// Time-driven pass over every pending cover request: lapsed deadlines
    /// become timeouts, and absences whose last request lapsed escalate.
    /// Safe to run late or twice; expiry is plain wall-clock state.
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> Result<SweepOutcome, CoverServiceError> {
        let pending = self.repository.pending_cover_requests()?;

        let mut absence_ids: Vec<AbsenceId> = Vec::new();
        for request in &pending {
            if request.is_expired(now) && !absence_ids.contains(&request.absence_id) {
                absence_ids.push(request.absence_id.clone());
            }
        }

        let mut outcome = SweepOutcome {
            expired: 0,
            escalated: 0,
        };

        for absence_id in absence_ids {
            let guard = self.guard_for(&absence_id);
            let _serialized = guard.lock().expect("absence guard poisoned");

            let Some(absence) = self.repository.fetch_absence(&absence_id)? else {
                continue;
            };
            let before = absence.status;
            let (absence, expired) = self.settle_expired_counting(absence, now)?;
            outcome.expired += expired;
            if before == AbsenceStatus::Pending && absence.status == AbsenceStatus::Escalated {
                outcome.escalated += 1;
            }
        }

        if outcome.expired > 0 {
            info!(
                expired = outcome.expired,
                escalated = outcome.escalated,
                "expiry sweep settled overdue cover requests"
            );
        }

        Ok(outcome)
    }

    /// Pending cover requests targeting one staff member, soonest deadline
    /// first.
    pub fn employee_inbox(
        &self,
        employee_id: &EmployeeId,
    ) -> Result<Vec<EmployeeInboxEntry>, CoverServiceError> {
        let mut pending = self
            .repository
            .pending_cover_requests_for_employee(employee_id)?;
        pending.sort_by_key(|request| request.deadline);
        Ok(pending.iter().map(CoverRequestRecord::inbox_entry).collect())
    }

    fn settle_expired(
        &self,
        absence: AbsenceRecord,
        now: DateTime<Utc>,
    ) -> Result<AbsenceRecord, CoverServiceError> {
        let (absence, _) = self.settle_expired_counting(absence, now)?;
        Ok(absence)
    }

    /// Mark lapsed pending requests as timeouts, then re-run the exhaustion
    /// check. Must be called with the absence guard held.
    fn settle_expired_counting(
        &self,
        mut absence: AbsenceRecord,
        now: DateTime<Utc>,
    ) -> Result<(AbsenceRecord, usize), CoverServiceError> {
        let requests = self.repository.cover_requests_for_absence(&absence.absence_id)?;
        let had_requests = !requests.is_empty();

        let mut expired = 0;
        let mut still_open = 0;
        for request in requests {
            if request.is_expired(now) {
                let mut timed_out = request;
                timed_out.status = CoverRequestStatus::Timeout;
                self.repository.update_cover_request(timed_out)?;
                expired += 1;
            } else if request.is_pending() {
                still_open += 1;
            }
        }

        // Exhaustion is re-checked on every inspection, not only when this
        // pass expired something, so a missed sweep cannot strand an absence.
        if had_requests && still_open == 0 && absence.status == AbsenceStatus::Pending {
            absence.status = AbsenceStatus::Escalated;
            self.repository.update_absence(absence.clone())?;
            self.release_guard(&absence.absence_id);
            info!(
                absence_id = %absence.absence_id,
                "cascade exhausted by timeouts, absence escalated"
            );
        }

        Ok((absence, expired))
    }

    fn cancel_open_requests(
        &self,
        absence_id: &AbsenceId,
        except: Option<&CoverRequestId>,
    ) -> Result<usize, CoverServiceError> {
        let requests = self.repository.cover_requests_for_absence(absence_id)?;
        let mut cancelled = 0;
        for request in requests {
            if !request.is_pending() {
                continue;
            }
            if except == Some(&request.cover_request_id) {
                continue;
            }
            let mut record = request;
            record.status = CoverRequestStatus::Cancelled;
            self.repository.update_cover_request(record)?;
            cancelled += 1;
        }
        Ok(cancelled)
    }

    fn count_open_requests(&self, absence_id: &AbsenceId) -> Result<usize, CoverServiceError> {
        let requests = self.repository.cover_requests_for_absence(absence_id)?;
        Ok(requests.iter().filter(|request| request.is_pending()).count())
    }
}

/// Error raised by the shift-cover service.
#[derive(Debug, thiserror::Error)]
pub enum CoverServiceError {
    #[error("absence {0} not found")]
    AbsenceNotFound(AbsenceId),
    #[error("cover request {0} not found")]
    CoverRequestNotFound(CoverRequestId),
    #[error("absence {absence_id} already {status}")]
    AbsenceAlreadyResolved {
        absence_id: AbsenceId,
        status: &'static str,
    },
    #[error("cover request {cover_request_id} already {status}")]
    CoverRequestAlreadySettled {
        cover_request_id: CoverRequestId,
        status: &'static str,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}
