//! The marketplace facade.
//!
//! [`Marketplace`] owns every registry, the escrow ledger and the event log
//! behind a single lock, so operations are applied one at a time and each
//! one observes the full effect of its predecessors. A mutation validates,
//! writes its state, moves value if it has to, and appends exactly one
//! event. An error at any step leaves everything as it was.

use std::sync::Arc;

use hire_core::{
    Address, Amount, Blake3Hasher, Clock, ContentHasher, JobId, RatingId, Role, Score, SystemClock,
    Timestamp,
};
use hire_escrow::{EscrowLedger, LedgerTotals, Payout, ValueTransfer};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::MarketConfig;
use crate::error::Result;
use crate::events::{EventLog, EventRecord, EventSink, MarketEvent, TracingEventSink};
use crate::job::{ApplyOutcome, Job, JobRegistry, NewJob};
use crate::rating::{NewRating, Rating, RatingFilter, RatingRegistry};
use crate::resume::{Resume, ResumeRegistry};
use crate::review::{Review, ReviewRegistry};

struct MarketState<T> {
    jobs: JobRegistry,
    escrow: EscrowLedger<T>,
    ratings: RatingRegistry,
    reviews: ReviewRegistry,
    resumes: ResumeRegistry,
    events: EventLog,
}

/// Builder for [`Marketplace`].
pub struct MarketplaceBuilder<T> {
    transfer: T,
    config: MarketConfig,
    clock: Option<Arc<dyn Clock>>,
    hasher: Option<Arc<dyn ContentHasher>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl<T: ValueTransfer> MarketplaceBuilder<T> {
    /// Sets the policy configuration.
    #[must_use]
    pub fn config(mut self, config: MarketConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the clock used to timestamp records.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the hasher used for text fields.
    #[must_use]
    pub fn hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Sets the sink that receives committed events.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the marketplace.
    #[must_use]
    pub fn build(self) -> Marketplace<T> {
        let sink: Arc<dyn EventSink> = match self.sink {
            Some(sink) => sink,
            None => Arc::new(match &self.config.event_log_prefix {
                Some(prefix) => TracingEventSink::with_prefix(prefix.clone()),
                None => TracingEventSink::new(),
            }),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let hasher: Arc<dyn ContentHasher> = match self.hasher {
            Some(hasher) => hasher,
            None => Arc::new(Blake3Hasher),
        };
        Marketplace {
            state: Mutex::new(MarketState {
                jobs: JobRegistry::new(),
                escrow: EscrowLedger::new(self.transfer),
                ratings: RatingRegistry::new(),
                reviews: ReviewRegistry::new(),
                resumes: ResumeRegistry::new(),
                events: EventLog::new(),
            }),
            config: self.config,
            clock,
            hasher,
            sink,
        }
    }
}

/// A hiring marketplace over a value-transfer backend.
///
/// Every method takes the caller explicitly. Getters return owned copies so
/// no reference into the locked state escapes.
pub struct Marketplace<T: ValueTransfer> {
    state: Mutex<MarketState<T>>,
    config: MarketConfig,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn ContentHasher>,
    sink: Arc<dyn EventSink>,
}

impl<T: ValueTransfer> Marketplace<T> {
    /// Starts building a marketplace that pays out through `transfer`.
    pub fn builder(transfer: T) -> MarketplaceBuilder<T> {
        MarketplaceBuilder {
            transfer,
            config: MarketConfig::default(),
            clock: None,
            hasher: None,
            sink: None,
        }
    }

    /// A marketplace with default configuration.
    pub fn new(transfer: T) -> Self {
        Self::builder(transfer).build()
    }

    /// The active configuration.
    pub const fn config(&self) -> &MarketConfig {
        &self.config
    }

    fn commit(&self, events: &mut EventLog, event: MarketEvent, now: Timestamp) {
        let record = events.append(event, now);
        self.sink.publish(record);
    }

    // ==================== Jobs ====================

    /// Posts a job, escrowing `value` as its payment.
    ///
    /// # Errors
    ///
    /// `NullAddress` for a null caller, or a ledger error if the value
    /// cannot be held.
    pub fn create_job(
        &self,
        caller: &Address,
        deadline: Timestamp,
        description: &str,
        skills: &str,
        value: Amount,
    ) -> Result<JobId> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        let new = NewJob {
            employer: *caller,
            deadline,
            description: self.hasher.digest(description),
            skills: self.hasher.digest(skills),
            payment: value,
        };
        let job_id = state.jobs.create(&mut state.escrow, new, now)?;

        self.commit(
            &mut state.events,
            MarketEvent::JobCreated {
                job_id,
                employer: *caller,
                payment: value,
                deadline,
                description: description.to_string(),
                skills: skills.to_string(),
            },
            now,
        );
        info!(%job_id, employer = %caller, payment = %value, "job posted");
        Ok(job_id)
    }

    /// Returns a job.
    ///
    /// # Errors
    ///
    /// `JobNotFound`.
    pub fn get_job(&self, job_id: JobId) -> Result<Job> {
        self.state.lock().jobs.get(job_id).cloned()
    }

    /// Every job in id order.
    pub fn all_jobs(&self) -> Vec<Job> {
        self.state.lock().jobs.all().cloned().collect()
    }

    /// Jobs posted by `employer`.
    pub fn jobs_by_employer(&self, employer: &Address) -> Vec<Job> {
        self.state.lock().jobs.by_employer(employer).cloned().collect()
    }

    /// Jobs assigned to `employee`.
    pub fn jobs_by_employee(&self, employee: &Address) -> Vec<Job> {
        self.state.lock().jobs.by_employee(employee).cloned().collect()
    }

    /// Number of jobs ever posted.
    pub fn job_count(&self) -> usize {
        self.state.lock().jobs.len()
    }

    /// Applies the caller for an open job.
    ///
    /// A repeated application under the idempotent policy returns
    /// [`ApplyOutcome::AlreadyRecorded`] and emits nothing.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `JobNotOpen`, `Unauthorized` for the employer,
    /// `NullAddress`, or `AlreadyApplied`.
    pub fn apply_for_job(&self, caller: &Address, job_id: JobId) -> Result<ApplyOutcome> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        let outcome = state.jobs.apply(caller, job_id, self.config.application_policy)?;
        if outcome == ApplyOutcome::Recorded {
            self.commit(
                &mut state.events,
                MarketEvent::JobApplication {
                    job_id,
                    applicant: *caller,
                },
                now,
            );
        } else {
            debug!(%job_id, applicant = %caller, "repeated application ignored");
        }
        Ok(outcome)
    }

    /// Applicants of a job in submission order. Employer only.
    ///
    /// # Errors
    ///
    /// `JobNotFound` or `Unauthorized`.
    pub fn job_applications(&self, caller: &Address, job_id: JobId) -> Result<Vec<Address>> {
        Ok(self.state.lock().jobs.applications(caller, job_id)?.to_vec())
    }

    /// Assigns an applicant to an open job.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, `NullAddress`, `JobNotOpen`, or
    /// `NotAnApplicant`.
    pub fn assign_job(&self, caller: &Address, job_id: JobId, employee: &Address) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        state.jobs.assign(caller, job_id, employee, now)?;
        self.commit(
            &mut state.events,
            MarketEvent::JobAssigned {
                job_id,
                employee: *employee,
            },
            now,
        );
        Ok(())
    }

    /// Submits work for the employer to review.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, or `JobNotInProgress`.
    pub fn ask_to_review_job(&self, caller: &Address, job_id: JobId, work_result: &str) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        state
            .jobs
            .ask_review(caller, job_id, self.hasher.digest(work_result), now)?;
        self.commit(
            &mut state.events,
            MarketEvent::JobWaitingReview {
                job_id,
                employee: *caller,
                work_result: work_result.to_string(),
            },
            now,
        );
        Ok(())
    }

    /// Accepts the submitted work and releases the escrow to the employee.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, `JobNotWaitingReview`, or a transfer
    /// error. On error the job and the escrow are unchanged.
    pub fn complete_job(&self, caller: &Address, job_id: JobId) -> Result<Payout> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        let payout = state.jobs.complete(caller, job_id, &mut state.escrow, now)?;
        self.commit(
            &mut state.events,
            MarketEvent::JobCompleted {
                job_id,
                employee: payout.to,
                paid: payout.amount,
            },
            now,
        );
        info!(%job_id, employee = %payout.to, amount = %payout.amount, "job completed");
        Ok(payout)
    }

    /// Cancels the job and refunds the escrow to the employer.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, `JobNotCancellable`, or a transfer
    /// error. On error the job and the escrow are unchanged.
    pub fn cancel_job(&self, caller: &Address, job_id: JobId) -> Result<Payout> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        let payout = state.jobs.cancel(
            caller,
            job_id,
            self.config.allow_cancel_while_waiting_review,
            &mut state.escrow,
            now,
        )?;
        self.commit(
            &mut state.events,
            MarketEvent::JobCancelled {
                job_id,
                employer: payout.to,
                refunded: payout.amount,
            },
            now,
        );
        info!(%job_id, employer = %payout.to, amount = %payout.amount, "job cancelled");
        Ok(payout)
    }

    /// Reopens a cancelled job, escrowing `value` as the new payment.
    ///
    /// # Errors
    ///
    /// `JobNotFound`, `Unauthorized`, `JobNotCancelled`, or a ledger error.
    pub fn reopen_job(&self, caller: &Address, job_id: JobId, value: Amount) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        state.jobs.reopen(caller, job_id, value, &mut state.escrow, now)?;
        self.commit(
            &mut state.events,
            MarketEvent::JobReopened {
                job_id,
                payment: value,
            },
            now,
        );
        info!(%job_id, payment = %value, "job reopened");
        Ok(())
    }

    // ==================== Reviews ====================

    /// Reviews submitted work, sending the job back to `InProgress`.
    ///
    /// # Errors
    ///
    /// `Invalid` for a score outside 1..=5, `JobNotFound`, `Unauthorized`,
    /// or `JobNotWaitingReview`.
    pub fn create_review(&self, caller: &Address, job_id: JobId, score: u8, comment: &str) -> Result<()> {
        let score = Score::new(score)?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        let review = state.reviews.create(
            &mut state.jobs,
            caller,
            job_id,
            score,
            self.hasher.digest(comment),
            now,
        )?;
        self.commit(
            &mut state.events,
            MarketEvent::ReviewCreated {
                job_id,
                employee: review.employee,
                score,
                comment: comment.to_string(),
            },
            now,
        );
        Ok(())
    }

    /// Reviews of the caller's work on a job. Assigned employee only.
    ///
    /// # Errors
    ///
    /// `JobNotFound` or `Unauthorized`.
    pub fn reviews(&self, caller: &Address, job_id: JobId) -> Result<Vec<Review>> {
        let state = self.state.lock();
        Ok(state.reviews.reviews(&state.jobs, caller, job_id)?.to_vec())
    }

    // ==================== Ratings ====================

    /// Rates the other party of a completed job.
    ///
    /// `role` is the role `ratee` held on the job; the caller must have held
    /// the other one.
    ///
    /// # Errors
    ///
    /// `Invalid` for a bad score, `JobNotFound`, `NullAddress`,
    /// `JobNotCompleted`, `Unauthorized`, `RoleMismatch`, or
    /// `DuplicateRating`.
    pub fn create_rating(
        &self,
        caller: &Address,
        job_id: JobId,
        score: u8,
        comment: &str,
        role: Role,
        ratee: &Address,
    ) -> Result<RatingId> {
        let score = Score::new(score)?;
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        let new = NewRating {
            job_id,
            ratee: *ratee,
            role,
            score,
            comment: self.hasher.digest(comment),
        };
        let rating_id = state.ratings.create(&state.jobs, caller, new, now)?;
        self.commit(
            &mut state.events,
            MarketEvent::RatingCreated {
                rating_id,
                job_id,
                rater: *caller,
                ratee: *ratee,
                role,
                score,
                comment: comment.to_string(),
            },
            now,
        );
        Ok(rating_id)
    }

    /// Ratings received by `address` that pass `filter`.
    pub fn ratings(&self, address: &Address, filter: RatingFilter) -> Vec<Rating> {
        self.state
            .lock()
            .ratings
            .ratings_for(address, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Number of ratings received by `address` that pass `filter`.
    pub fn ratings_count(&self, address: &Address, filter: RatingFilter) -> usize {
        self.state.lock().ratings.ratings_count(address, filter)
    }

    /// The `index`-th rating received by `address`.
    pub fn rating_at(&self, address: &Address, index: usize) -> Option<Rating> {
        self.state.lock().ratings.rating_at(address, index).cloned()
    }

    /// Every rating in the system.
    pub fn all_ratings(&self) -> Vec<Rating> {
        self.state.lock().ratings.all().to_vec()
    }

    /// Positive minus negative ratings received by `address`.
    pub fn karma(&self, address: &Address) -> i64 {
        self.state.lock().ratings.karma(address)
    }

    // ==================== Resumes ====================

    /// Stores the caller's resume for `role`.
    ///
    /// # Errors
    ///
    /// `NullAddress` or `ResumeAlreadyExists`.
    pub fn create_resume(&self, caller: &Address, role: Role, name: &str, description: &str) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = self.clock.now();

        let resume = Resume {
            name: self.hasher.digest(name),
            description: self.hasher.digest(description),
        };
        state.resumes.create(caller, role, resume)?;
        self.commit(
            &mut state.events,
            MarketEvent::ResumeCreated {
                owner: *caller,
                role,
                name: name.to_string(),
                description: description.to_string(),
            },
            now,
        );
        Ok(())
    }

    /// The resume of `address` for `role`, or [`Resume::EMPTY`].
    pub fn resume(&self, address: &Address, role: Role) -> Resume {
        self.state.lock().resumes.get(address, role)
    }

    /// Whether `address` has a resume for `role`.
    pub fn has_resume(&self, address: &Address, role: Role) -> bool {
        self.state.lock().resumes.contains(address, role)
    }

    // ==================== Events and escrow ====================

    /// Every committed event, oldest first.
    pub fn events(&self) -> Vec<EventRecord> {
        self.state.lock().events.records().to_vec()
    }

    /// Committed events with `sequence >= from`.
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.state.lock().events.since(from).to_vec()
    }

    /// Exports the event log as JSON.
    ///
    /// # Errors
    ///
    /// `Replay` if serialization fails.
    pub fn export_events(&self) -> Result<String> {
        self.state.lock().events.to_json()
    }

    /// Value held in escrow for a job.
    pub fn escrow_balance(&self, job_id: JobId) -> Amount {
        self.state.lock().escrow.balance_of(job_id)
    }

    /// Value held in escrow across all jobs.
    pub fn total_escrowed(&self) -> Amount {
        self.state.lock().escrow.total_held()
    }

    /// Lifetime escrow counters.
    pub fn escrow_totals(&self) -> LedgerTotals {
        self.state.lock().escrow.totals()
    }
}

impl<T: ValueTransfer> std::fmt::Debug for Marketplace<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Marketplace")
            .field("config", &self.config)
            .field("jobs", &state.jobs.len())
            .field("events", &state.events.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApplicationPolicy;
    use crate::error::{ErrorKind, MarketError};
    use crate::events::NoopEventSink;
    use crate::history::JobHistory;
    use crate::job::JobStatus;
    use crate::rating::RatingKind;
    use chrono::{DateTime, Duration, Utc};
    use hire_core::ManualClock;
    use hire_escrow::InMemoryBank;
    use proptest::prelude::*;

    struct Harness {
        bank: Arc<InMemoryBank>,
        clock: Arc<ManualClock>,
        market: Marketplace<Arc<InMemoryBank>>,
        employer: Address,
        employee: Address,
    }

    fn harness_with(config: MarketConfig) -> Harness {
        let bank = Arc::new(InMemoryBank::new());
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::UNIX_EPOCH));
        let market = Marketplace::builder(Arc::clone(&bank))
            .config(config)
            .clock(clock.clone())
            .event_sink(Arc::new(NoopEventSink))
            .build();
        Harness {
            bank,
            clock,
            market,
            employer: Address::random(),
            employee: Address::random(),
        }
    }

    fn harness() -> Harness {
        harness_with(MarketConfig::default())
    }

    impl Harness {
        fn post(&self, value: u64) -> JobId {
            self.market
                .create_job(
                    &self.employer,
                    DateTime::<Utc>::UNIX_EPOCH,
                    "Test job",
                    "rust",
                    Amount::new(value),
                )
                .expect("create job")
        }

        fn assigned(&self, value: u64) -> JobId {
            let id = self.post(value);
            self.market.apply_for_job(&self.employee, id).expect("apply");
            self.market
                .assign_job(&self.employer, id, &self.employee)
                .expect("assign");
            id
        }

        fn waiting_review(&self, value: u64) -> JobId {
            let id = self.assigned(value);
            self.market
                .ask_to_review_job(&self.employee, id, "test_url")
                .expect("ask review");
            id
        }

        fn completed(&self, value: u64) -> JobId {
            let id = self.waiting_review(value);
            self.market.complete_job(&self.employer, id).expect("complete");
            id
        }
    }

    fn event_types<T: ValueTransfer>(market: &Marketplace<T>) -> Vec<&'static str> {
        market.events().iter().map(|r| r.event.event_type()).collect()
    }

    #[test]
    fn happy_path_pays_employee_and_logs_every_step() {
        let h = harness();
        let id = h.completed(100);

        assert_eq!(h.market.get_job(id).expect("job").status, JobStatus::Completed);
        assert_eq!(h.bank.balance(&h.employee), Amount::new(100));
        assert_eq!(h.market.escrow_balance(id), Amount::ZERO);
        assert_eq!(
            event_types(&h.market),
            vec!["JobCreated", "JobApplication", "JobAssigned", "JobWaitingReview", "JobCompleted"]
        );
        let sequences: Vec<u64> = h.market.events().iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn events_carry_plaintext_while_job_stores_digests() {
        let h = harness();
        let id = h.post(10);

        let job = h.market.get_job(id).expect("job");
        assert_eq!(job.description, Blake3Hasher.digest("Test job"));
        match &h.market.events()[0].event {
            MarketEvent::JobCreated { description, skills, .. } => {
                assert_eq!(description, "Test job");
                assert_eq!(skills, "rust");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn failed_operations_append_nothing() {
        let h = harness();
        let id = h.post(10);
        let before = h.market.events().len();

        assert!(h.market.apply_for_job(&h.employer, id).is_err());
        assert!(h.market.complete_job(&h.employer, id).is_err());
        assert!(h.market.create_review(&h.employer, id, 9, "x").is_err());
        assert!(h.market.assign_job(&h.employer, id, &h.employee).is_err());

        assert_eq!(h.market.events().len(), before);
    }

    #[test]
    fn failed_release_rolls_back_everything() {
        let h = harness();
        let id = h.waiting_review(100);
        h.bank.fail_next_transfer();

        let err = h.market.complete_job(&h.employer, id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransferFailure);
        assert_eq!(h.market.get_job(id).expect("job").status, JobStatus::WaitingReview);
        assert_eq!(h.market.escrow_balance(id), Amount::new(100));
        assert_eq!(h.bank.balance(&h.employee), Amount::ZERO);
        assert_eq!(event_types(&h.market).last(), Some(&"JobWaitingReview"));

        h.market.complete_job(&h.employer, id).expect("retry");
        assert_eq!(h.bank.balance(&h.employee), Amount::new(100));
    }

    #[test]
    fn cancel_then_reopen_with_new_value() {
        let h = harness();
        let id = h.post(50);

        h.market.cancel_job(&h.employer, id).expect("cancel");
        assert_eq!(h.bank.balance(&h.employer), Amount::new(50));
        assert_eq!(h.market.escrow_balance(id), Amount::ZERO);

        h.market.reopen_job(&h.employer, id, Amount::new(30)).expect("reopen");
        let job = h.market.get_job(id).expect("job");
        assert_eq!(job.status, JobStatus::Open);
        assert_eq!(job.payment, Amount::new(30));
        assert_eq!(h.market.escrow_balance(id), Amount::new(30));
    }

    #[test]
    fn cancel_while_waiting_review_can_be_disabled() {
        let h = harness_with(MarketConfig {
            allow_cancel_while_waiting_review: false,
            ..MarketConfig::default()
        });
        let id = h.waiting_review(10);
        let err = h.market.cancel_job(&h.employer, id).unwrap_err();
        assert!(matches!(err, MarketError::JobNotCancellable { .. }));
    }

    #[test]
    fn idempotent_reapplication_emits_no_event() {
        let h = harness_with(MarketConfig {
            application_policy: ApplicationPolicy::Idempotent,
            ..MarketConfig::default()
        });
        let id = h.post(10);
        assert_eq!(h.market.apply_for_job(&h.employee, id), Ok(ApplyOutcome::Recorded));
        assert_eq!(
            h.market.apply_for_job(&h.employee, id),
            Ok(ApplyOutcome::AlreadyRecorded)
        );
        assert_eq!(h.market.job_applications(&h.employer, id).expect("apps").len(), 1);
        assert_eq!(event_types(&h.market), vec!["JobCreated", "JobApplication"]);
    }

    #[test]
    fn review_cycle_and_ratings() {
        let h = harness();
        let id = h.waiting_review(10);
        h.market
            .create_review(&h.employer, id, 4, "test_comment")
            .expect("review");
        assert_eq!(h.market.get_job(id).expect("job").status, JobStatus::InProgress);
        assert_eq!(h.market.reviews(&h.employee, id).expect("reviews").len(), 1);

        h.market.ask_to_review_job(&h.employee, id, "v2").expect("resubmit");
        h.market.complete_job(&h.employer, id).expect("complete");

        h.market
            .create_rating(&h.employer, id, 5, "great", Role::Employee, &h.employee)
            .expect("rate employee");
        h.market
            .create_rating(&h.employee, id, 1, "late pay", Role::Employer, &h.employer)
            .expect("rate employer");

        let dup = h
            .market
            .create_rating(&h.employer, id, 4, "again", Role::Employee, &h.employee)
            .unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::AlreadyExists);

        assert_eq!(h.market.karma(&h.employee), 1);
        assert_eq!(h.market.karma(&h.employer), -1);
        assert_eq!(
            h.market
                .ratings_count(&h.employer, RatingFilter::kind(RatingKind::Negative)),
            1
        );
        assert_eq!(h.market.all_ratings().len(), 2);
        assert!(h.market.rating_at(&h.employee, 0).is_some());
        assert!(h.market.rating_at(&h.employee, 1).is_none());
    }

    #[test]
    fn invalid_score_is_invalid_argument() {
        let h = harness();
        let id = h.waiting_review(10);
        let err = h.market.create_review(&h.employer, id, 0, "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn resumes_are_unique_per_role() {
        let h = harness();
        assert!(!h.market.has_resume(&h.employee, Role::Employee));
        assert!(h.market.resume(&h.employee, Role::Employee).is_empty());

        h.market
            .create_resume(&h.employee, Role::Employee, "Ada", "rustacean")
            .expect("resume");
        let err = h
            .market
            .create_resume(&h.employee, Role::Employee, "Ada", "again")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert!(h.market.has_resume(&h.employee, Role::Employee));
        assert_eq!(event_types(&h.market), vec!["ResumeCreated"]);
    }

    #[test]
    fn timestamps_come_from_the_clock() {
        let h = harness();
        let id = h.post(1);
        h.clock.advance(Duration::hours(2));
        h.market.cancel_job(&h.employer, id).expect("cancel");

        let job = h.market.get_job(id).expect("job");
        assert_eq!(job.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(job.updated_at, DateTime::<Utc>::UNIX_EPOCH + Duration::hours(2));
        assert_eq!(h.market.events()[1].timestamp, job.updated_at);
    }

    /// Ticks one second per read; the first read stalls.
    struct StallingClock {
        reads: std::sync::atomic::AtomicI64,
    }

    impl Clock for StallingClock {
        fn now(&self) -> Timestamp {
            let tick = self.reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if tick == 0 {
                std::thread::sleep(std::time::Duration::from_millis(200));
            }
            DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(tick)
        }
    }

    #[test]
    fn timestamps_follow_commit_order_under_contention() {
        let market = Arc::new(
            Marketplace::builder(Arc::new(InMemoryBank::new()))
                .clock(Arc::new(StallingClock {
                    reads: std::sync::atomic::AtomicI64::new(0),
                }))
                .event_sink(Arc::new(NoopEventSink))
                .build(),
        );

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let market = Arc::clone(&market);
                std::thread::spawn(move || {
                    if i == 1 {
                        std::thread::sleep(std::time::Duration::from_millis(50));
                    }
                    market
                        .create_job(&Address::random(), DateTime::<Utc>::UNIX_EPOCH, "d", "s", Amount::ZERO)
                        .expect("create job")
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("join");
        }

        let events = market.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].timestamp <= events[1].timestamp);
        for record in &events {
            let job = market.get_job(record.event.job_id().expect("job id")).expect("job");
            assert_eq!(job.created_at, record.timestamp);
        }
    }

    #[test]
    fn events_since_skips_older_records() {
        let h = harness();
        let id = h.post(5);
        h.market.cancel_job(&h.employer, id).expect("cancel");
        h.market.reopen_job(&h.employer, id, Amount::new(5)).expect("reopen");

        let tail = h.market.events_since(1);
        let types: Vec<_> = tail.iter().map(|r| r.event.event_type()).collect();
        assert_eq!(types, vec!["JobCancelled", "JobReopened"]);
        assert_eq!(tail[0].sequence, 1);
        assert!(h.market.events_since(3).is_empty());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Post(u64),
        Apply(usize),
        Assign(usize),
        Submit(usize),
        Review(usize, u8),
        Complete(usize),
        Cancel(usize),
        Reopen(usize, u64),
        FailNext,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..1_000).prop_map(Op::Post),
            (0usize..4).prop_map(Op::Apply),
            (0usize..4).prop_map(Op::Assign),
            (0usize..4).prop_map(Op::Submit),
            ((0usize..4), (1u8..=5)).prop_map(|(j, s)| Op::Review(j, s)),
            (0usize..4).prop_map(Op::Complete),
            (0usize..4).prop_map(Op::Cancel),
            ((0usize..4), (0u64..1_000)).prop_map(|(j, v)| Op::Reopen(j, v)),
            Just(Op::FailNext),
        ]
    }

    proptest! {
        #[test]
        fn value_is_conserved_and_replay_agrees(ops in proptest::collection::vec(op(), 1..60)) {
            let h = harness();
            let mut posted: u64 = 0;

            for op in ops {
                let job = |i: usize| JobId::new(i as u64);
                let _ = match op {
                    Op::Post(v) => h.market
                        .create_job(&h.employer, DateTime::<Utc>::UNIX_EPOCH, "d", "s", Amount::new(v))
                        .map(|_| posted += v),
                    Op::Apply(j) => h.market.apply_for_job(&h.employee, job(j)).map(drop),
                    Op::Assign(j) => h.market.assign_job(&h.employer, job(j), &h.employee),
                    Op::Submit(j) => h.market.ask_to_review_job(&h.employee, job(j), "w"),
                    Op::Review(j, s) => h.market.create_review(&h.employer, job(j), s, "c"),
                    Op::Complete(j) => h.market.complete_job(&h.employer, job(j)).map(drop),
                    Op::Cancel(j) => h.market.cancel_job(&h.employer, job(j)).map(drop),
                    Op::Reopen(j, v) => h.market
                        .reopen_job(&h.employer, job(j), Amount::new(v))
                        .map(|()| posted += v),
                    Op::FailNext => {
                        h.bank.fail_next_transfer();
                        Ok(())
                    }
                };
            }

            let paid_out = h.bank.balance(&h.employer).units() + h.bank.balance(&h.employee).units();
            prop_assert_eq!(paid_out + h.market.total_escrowed().units(), posted);

            let totals = h.market.escrow_totals();
            prop_assert_eq!(totals.credited.units(), posted);

            let history = JobHistory::replay(&h.market.events()).expect("replay");
            prop_assert_eq!(history.len(), h.market.job_count());
            for job in h.market.all_jobs() {
                let snapshot = history.get(job.id).expect("snapshot");
                prop_assert_eq!(snapshot.status, job.status);
                prop_assert_eq!(snapshot.employee, job.employee);
                prop_assert_eq!(snapshot.payment, job.payment);
                prop_assert_eq!(snapshot.escrowed, h.market.escrow_balance(job.id));
            }
        }
    }
}
