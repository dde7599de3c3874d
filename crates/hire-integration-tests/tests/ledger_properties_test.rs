//! Property tests over random operation sequences.
//!
//! Whatever order operations arrive in, and whichever of them fail:
//! - value is conserved between the bank and the escrow
//! - jobs only move along lifecycle edges
//! - replaying the exported event log reproduces every job

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hire_core::{Address, Amount, JobId, Role};
use hire_escrow::InMemoryBank;
use hire_market::{EventLog, JobHistory, JobStatus, Marketplace, NoopEventSink, RatingFilter};
use proptest::prelude::*;

// ============================================================================
// Operation Model
// ============================================================================

#[derive(Debug, Clone)]
enum Action {
    Post { employer: usize, value: u64 },
    Apply { worker: usize, job: u64 },
    Assign { employer: usize, worker: usize, job: u64 },
    Submit { worker: usize, job: u64 },
    Review { employer: usize, job: u64, score: u8 },
    Complete { employer: usize, job: u64 },
    Cancel { employer: usize, job: u64 },
    Reopen { employer: usize, job: u64, value: u64 },
    Rate { rater: usize, ratee: usize, job: u64, score: u8, as_employee: bool },
    FailNextTransfer,
}

const PEOPLE: usize = 4;
const JOBS: u64 = 5;

fn action() -> impl Strategy<Value = Action> {
    let who = 0..PEOPLE;
    let job = 0..JOBS;
    prop_oneof![
        (who.clone(), 0u64..500).prop_map(|(employer, value)| Action::Post { employer, value }),
        (who.clone(), job.clone()).prop_map(|(worker, job)| Action::Apply { worker, job }),
        (who.clone(), who.clone(), job.clone())
            .prop_map(|(employer, worker, job)| Action::Assign { employer, worker, job }),
        (who.clone(), job.clone()).prop_map(|(worker, job)| Action::Submit { worker, job }),
        (who.clone(), job.clone(), 1u8..=5)
            .prop_map(|(employer, job, score)| Action::Review { employer, job, score }),
        (who.clone(), job.clone()).prop_map(|(employer, job)| Action::Complete { employer, job }),
        (who.clone(), job.clone()).prop_map(|(employer, job)| Action::Cancel { employer, job }),
        (who.clone(), job.clone(), 0u64..500)
            .prop_map(|(employer, job, value)| Action::Reopen { employer, job, value }),
        (who.clone(), who.clone(), job.clone(), 1u8..=5, any::<bool>()).prop_map(
            |(rater, ratee, job, score, as_employee)| Action::Rate {
                rater,
                ratee,
                job,
                score,
                as_employee
            }
        ),
        Just(Action::FailNextTransfer),
    ]
}

struct Run {
    bank: Arc<InMemoryBank>,
    market: Marketplace<Arc<InMemoryBank>>,
    people: Vec<Address>,
    credited: u64,
}

impl Run {
    fn new() -> Self {
        let bank = Arc::new(InMemoryBank::new());
        Self {
            market: Marketplace::builder(Arc::clone(&bank))
                .event_sink(Arc::new(NoopEventSink))
                .build(),
            bank,
            people: (0..PEOPLE).map(|_| Address::random()).collect(),
            credited: 0,
        }
    }

    fn apply(&mut self, action: &Action) {
        let p = &self.people;
        let m = &self.market;
        let job = |id: u64| JobId::new(id);
        match *action {
            Action::Post { employer, value } => {
                if m.create_job(&p[employer], DateTime::<Utc>::UNIX_EPOCH, "d", "s", Amount::new(value))
                    .is_ok()
                {
                    self.credited += value;
                }
            }
            Action::Apply { worker, job: j } => {
                let _ = m.apply_for_job(&p[worker], job(j));
            }
            Action::Assign { employer, worker, job: j } => {
                let _ = m.assign_job(&p[employer], job(j), &p[worker]);
            }
            Action::Submit { worker, job: j } => {
                let _ = m.ask_to_review_job(&p[worker], job(j), "w");
            }
            Action::Review { employer, job: j, score } => {
                let _ = m.create_review(&p[employer], job(j), score, "c");
            }
            Action::Complete { employer, job: j } => {
                let _ = m.complete_job(&p[employer], job(j));
            }
            Action::Cancel { employer, job: j } => {
                let _ = m.cancel_job(&p[employer], job(j));
            }
            Action::Reopen { employer, job: j, value } => {
                if m.reopen_job(&p[employer], job(j), Amount::new(value)).is_ok() {
                    self.credited += value;
                }
            }
            Action::Rate { rater, ratee, job: j, score, as_employee } => {
                let role = if as_employee { Role::Employee } else { Role::Employer };
                let _ = m.create_rating(&p[rater], job(j), score, "c", role, &p[ratee]);
            }
            Action::FailNextTransfer => self.bank.fail_next_transfer(),
        }
    }

    fn paid_out(&self) -> u64 {
        self.people.iter().map(|a| self.bank.balance(a).units()).sum()
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn escrow_conserves_value(actions in proptest::collection::vec(action(), 1..80)) {
        let mut run = Run::new();
        for action in &actions {
            run.apply(action);
        }

        let totals = run.market.escrow_totals();
        prop_assert_eq!(totals.credited.units(), run.credited);
        prop_assert_eq!(
            totals.released.units() + totals.refunded.units() + run.market.total_escrowed().units(),
            run.credited
        );
        prop_assert_eq!(run.paid_out() + run.market.total_escrowed().units(), run.credited);

        for job in run.market.all_jobs() {
            let held = run.market.escrow_balance(job.id);
            match job.status {
                JobStatus::Completed | JobStatus::Cancelled => prop_assert_eq!(held, Amount::ZERO),
                _ => prop_assert_eq!(held, job.payment),
            }
        }
    }

    #[test]
    fn exported_log_replays_to_the_registry(actions in proptest::collection::vec(action(), 1..80)) {
        let mut run = Run::new();
        for action in &actions {
            run.apply(action);
        }

        let exported = run.market.export_events().expect("export");
        let log = EventLog::from_json(&exported).expect("import");
        let history = JobHistory::replay(log.records()).expect("replay");

        prop_assert_eq!(history.len(), run.market.job_count());
        prop_assert_eq!(history.total_escrowed(), run.market.total_escrowed());
        for job in run.market.all_jobs() {
            let snapshot = history.get(job.id).expect("snapshot");
            prop_assert_eq!(snapshot.status, job.status);
            prop_assert_eq!(snapshot.employee, job.employee);
            prop_assert_eq!(snapshot.payment, job.payment);
            for pair in snapshot.status_trail.windows(2) {
                prop_assert!(pair[0].can_transition_to(&pair[1]));
            }
        }
    }

    #[test]
    fn ratings_are_unique_per_key(actions in proptest::collection::vec(action(), 1..80)) {
        let mut run = Run::new();
        for action in &actions {
            run.apply(action);
        }

        let ratings = run.market.all_ratings();
        let mut keys: Vec<_> = ratings.iter().map(|r| (r.job_id, r.ratee, r.role)).collect();
        keys.sort();
        keys.dedup();
        prop_assert_eq!(keys.len(), ratings.len());

        let received: usize = run
            .people
            .iter()
            .map(|a| run.market.ratings_count(a, RatingFilter::default()))
            .sum();
        prop_assert_eq!(received, ratings.len());
    }
}
