//! Scripted marketplace scenarios.
//!
//! A scenario names its actors, funds them in an in-memory bank, and lists
//! operations to run in order. Actors are mapped to fresh random addresses.
//! Value attached to `create_job` and `reopen_job` is withdrawn from the
//! caller's bank balance, and returned if the operation fails.
//!
//! ```json
//! {
//!   "actors": { "alice": 500, "bob": 0 },
//!   "steps": [
//!     { "op": "create_job", "actor": "alice", "description": "Fix CI", "skills": "rust", "value": 100 },
//!     { "op": "apply_for_job", "actor": "bob", "job": 0 },
//!     { "op": "complete_job", "actor": "bob", "job": 0, "expect_error": "unauthorized" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hire_core::{Address, Amount, Clock, JobId, ManualClock, Role, Timestamp};
use hire_escrow::InMemoryBank;
use hire_market::{ErrorKind, EventRecord, Job, MarketConfig, MarketError, Marketplace};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CliError;

const DEFAULT_DEADLINE_DAYS: i64 = 7;

/// A scenario file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Actor names and their starting bank balance.
    pub actors: BTreeMap<String, u64>,
    /// Scenario start time; defaults to the Unix epoch.
    #[serde(default)]
    pub start: Option<Timestamp>,
    /// Operations, run in order.
    pub steps: Vec<Step>,
}

/// One scripted step.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Acting participant.
    pub actor: String,
    /// Seconds to advance the clock before running.
    #[serde(default)]
    pub after_secs: u32,
    /// Error class the step must fail with, if any.
    #[serde(default)]
    pub expect_error: Option<ErrorKind>,
    /// The operation.
    #[serde(flatten)]
    pub op: Operation,
}

/// Marketplace operations a step can run.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Post a job.
    CreateJob {
        /// Description text.
        description: String,
        /// Skills text.
        skills: String,
        /// Attached value.
        value: u64,
        /// Days until the deadline.
        #[serde(default)]
        deadline_days: Option<i64>,
    },
    /// Apply for a job.
    ApplyForJob {
        /// Target job.
        job: u64,
    },
    /// Assign an applicant.
    AssignJob {
        /// Target job.
        job: u64,
        /// Actor to assign.
        employee: String,
    },
    /// Submit work for review.
    AskToReviewJob {
        /// Target job.
        job: u64,
        /// Work result text.
        work_result: String,
    },
    /// Review submitted work.
    CreateReview {
        /// Target job.
        job: u64,
        /// Score 1..=5.
        score: u8,
        /// Comment text.
        comment: String,
    },
    /// Accept work and pay.
    CompleteJob {
        /// Target job.
        job: u64,
    },
    /// Cancel and refund.
    CancelJob {
        /// Target job.
        job: u64,
    },
    /// Reopen a cancelled job.
    ReopenJob {
        /// Target job.
        job: u64,
        /// Attached value.
        value: u64,
    },
    /// Rate the other party of a completed job.
    CreateRating {
        /// Target job.
        job: u64,
        /// Score 1..=5.
        score: u8,
        /// Comment text.
        comment: String,
        /// Role the ratee held.
        role: Role,
        /// Actor being rated.
        ratee: String,
    },
    /// Store a resume.
    CreateResume {
        /// Resume role.
        role: Role,
        /// Name text.
        name: String,
        /// Description text.
        description: String,
    },
}

impl Operation {
    /// Operation name as written in scenario files.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateJob { .. } => "create_job",
            Self::ApplyForJob { .. } => "apply_for_job",
            Self::AssignJob { .. } => "assign_job",
            Self::AskToReviewJob { .. } => "ask_to_review_job",
            Self::CreateReview { .. } => "create_review",
            Self::CompleteJob { .. } => "complete_job",
            Self::CancelJob { .. } => "cancel_job",
            Self::ReopenJob { .. } => "reopen_job",
            Self::CreateRating { .. } => "create_rating",
            Self::CreateResume { .. } => "create_resume",
        }
    }
}

impl Scenario {
    /// Parses a scenario document.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Parse` on malformed JSON.
    pub fn from_json(path: &str, json: &str) -> Result<Self, CliError> {
        serde_json::from_str(json).map_err(|e| CliError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// Final bank balance of an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorBalance {
    /// Actor name.
    pub name: String,
    /// Actor address.
    pub address: Address,
    /// Bank balance.
    pub balance: Amount,
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Committed events.
    pub events: Vec<EventRecord>,
    /// Final job states.
    pub jobs: Vec<Job>,
    /// Final actor balances.
    pub balances: Vec<ActorBalance>,
    /// Value still held in escrow.
    pub escrowed: Amount,
}

/// Runs scenarios against a fresh in-memory marketplace.
pub struct ScenarioRunner {
    bank: Arc<InMemoryBank>,
    clock: Arc<ManualClock>,
    market: Marketplace<Arc<InMemoryBank>>,
    actors: BTreeMap<String, Address>,
}

impl ScenarioRunner {
    /// Sets up the marketplace and funds the scenario's actors.
    #[must_use]
    pub fn new(scenario: &Scenario, config: MarketConfig) -> Self {
        let bank = Arc::new(InMemoryBank::new());
        let clock = Arc::new(ManualClock::new(
            scenario.start.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        ));
        let market = Marketplace::builder(Arc::clone(&bank))
            .config(config)
            .clock(clock.clone())
            .build();

        let mut actors = BTreeMap::new();
        for (name, funds) in &scenario.actors {
            let address = Address::random();
            bank.deposit(&address, Amount::new(*funds));
            debug!(actor = %name, %address, funds, "actor funded");
            actors.insert(name.clone(), address);
        }

        Self {
            bank,
            clock,
            market,
            actors,
        }
    }

    fn actor(&self, name: &str) -> Result<Address, CliError> {
        self.actors
            .get(name)
            .copied()
            .ok_or_else(|| CliError::UnknownActor(name.to_string()))
    }

    /// Runs every step, then collects the report.
    ///
    /// # Errors
    ///
    /// Returns the first step that failed unexpectedly, or that was expected
    /// to fail and did not.
    pub fn run(self, steps: &[Step]) -> Result<RunReport, CliError> {
        for (index, step) in steps.iter().enumerate() {
            self.clock.advance(Duration::seconds(i64::from(step.after_secs)));
            let caller = self.actor(&step.actor)?;
            let op = step.op.name();
            let outcome = self.execute(&caller, &step.op)?;

            match (outcome, step.expect_error) {
                (Ok(()), None) => debug!(step = index, op, "step ok"),
                (Err(err), Some(expected)) if err.kind() == expected => {
                    debug!(step = index, op, error = %err, "step failed as expected");
                }
                (Err(err), None) => {
                    return Err(CliError::Step {
                        step: index,
                        op,
                        source: err,
                    });
                }
                (outcome, Some(expected)) => {
                    return Err(CliError::UnexpectedOutcome {
                        step: index,
                        op,
                        expected,
                        actual: outcome.map_or_else(|e| e.to_string(), |()| "success".to_string()),
                    });
                }
            }
        }

        info!(steps = steps.len(), events = self.market.events().len(), "scenario finished");
        Ok(self.report())
    }

    /// Runs one operation. The outer error is a scenario problem, the inner
    /// one the marketplace's answer.
    fn execute(&self, caller: &Address, op: &Operation) -> Result<Result<(), MarketError>, CliError> {
        let market = &self.market;
        let outcome = match op {
            Operation::CreateJob {
                description,
                skills,
                value,
                deadline_days,
            } => {
                let days = deadline_days.unwrap_or(DEFAULT_DEADLINE_DAYS);
                let deadline = Duration::try_days(days)
                    .and_then(|offset| self.clock.now().checked_add_signed(offset))
                    .ok_or(CliError::InvalidDeadline(days))?;
                let value = Amount::new(*value);
                self.attach(caller, value, || {
                    market
                        .create_job(caller, deadline, description, skills, value)
                        .map(drop)
                })?
            }
            Operation::ApplyForJob { job } => market.apply_for_job(caller, JobId::new(*job)).map(drop),
            Operation::AssignJob { job, employee } => {
                let employee = self.actor(employee)?;
                market.assign_job(caller, JobId::new(*job), &employee)
            }
            Operation::AskToReviewJob { job, work_result } => {
                market.ask_to_review_job(caller, JobId::new(*job), work_result)
            }
            Operation::CreateReview { job, score, comment } => {
                market.create_review(caller, JobId::new(*job), *score, comment)
            }
            Operation::CompleteJob { job } => market.complete_job(caller, JobId::new(*job)).map(drop),
            Operation::CancelJob { job } => market.cancel_job(caller, JobId::new(*job)).map(drop),
            Operation::ReopenJob { job, value } => {
                let value = Amount::new(*value);
                self.attach(caller, value, || market.reopen_job(caller, JobId::new(*job), value))?
            }
            Operation::CreateRating {
                job,
                score,
                comment,
                role,
                ratee,
            } => {
                let ratee = self.actor(ratee)?;
                market
                    .create_rating(caller, JobId::new(*job), *score, comment, *role, &ratee)
                    .map(drop)
            }
            Operation::CreateResume {
                role,
                name,
                description,
            } => market.create_resume(caller, *role, name, description),
        };
        Ok(outcome)
    }

    /// Withdraws `value` from the payer, runs `call`, and pays it back if the
    /// call fails.
    fn attach(
        &self,
        payer: &Address,
        value: Amount,
        call: impl FnOnce() -> Result<(), MarketError>,
    ) -> Result<Result<(), MarketError>, CliError> {
        self.bank.withdraw(payer, value)?;
        let outcome = call();
        if outcome.is_err() {
            self.bank.deposit(payer, value);
        }
        Ok(outcome)
    }

    fn report(&self) -> RunReport {
        RunReport {
            events: self.market.events(),
            jobs: self.market.all_jobs(),
            balances: self
                .actors
                .iter()
                .map(|(name, address)| ActorBalance {
                    name: name.clone(),
                    address: *address,
                    balance: self.bank.balance(address),
                })
                .collect(),
            escrowed: self.market.total_escrowed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hire_market::JobStatus;
    use test_case::test_case;

    const HAPPY_PATH: &str = r#"{
        "actors": { "alice": 500, "bob": 0 },
        "steps": [
            { "op": "create_job", "actor": "alice", "description": "Test job", "skills": "rust", "value": 100 },
            { "op": "apply_for_job", "actor": "bob", "job": 0 },
            { "op": "assign_job", "actor": "alice", "job": 0, "employee": "bob" },
            { "op": "ask_to_review_job", "actor": "bob", "job": 0, "work_result": "test_url", "after_secs": 60 },
            { "op": "complete_job", "actor": "bob", "job": 0, "expect_error": "unauthorized" },
            { "op": "complete_job", "actor": "alice", "job": 0 },
            { "op": "create_rating", "actor": "alice", "job": 0, "score": 5, "comment": "great", "role": "employee", "ratee": "bob" }
        ]
    }"#;

    fn run(json: &str) -> Result<RunReport, CliError> {
        let scenario = Scenario::from_json("test.json", json)?;
        ScenarioRunner::new(&scenario, MarketConfig::default()).run(&scenario.steps)
    }

    fn balance(report: &RunReport, name: &str) -> Amount {
        report
            .balances
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.balance)
            .expect("actor")
    }

    #[test]
    fn happy_path_moves_value_to_employee() {
        let report = run(HAPPY_PATH).expect("run");
        assert_eq!(report.jobs[0].status, JobStatus::Completed);
        assert_eq!(balance(&report, "alice"), Amount::new(400));
        assert_eq!(balance(&report, "bob"), Amount::new(100));
        assert_eq!(report.escrowed, Amount::ZERO);
        assert_eq!(report.events.len(), 6);
    }

    #[test]
    fn unexpected_failure_stops_the_run() {
        let json = r#"{
            "actors": { "alice": 10 },
            "steps": [ { "op": "complete_job", "actor": "alice", "job": 0 } ]
        }"#;
        let err = run(json).unwrap_err();
        assert!(matches!(err, CliError::Step { step: 0, .. }));
    }

    #[test]
    fn expected_failure_that_succeeds_is_reported() {
        let json = r#"{
            "actors": { "alice": 10 },
            "steps": [ { "op": "create_job", "actor": "alice", "description": "d", "skills": "s", "value": 1, "expect_error": "unauthorized" } ]
        }"#;
        assert!(matches!(run(json).unwrap_err(), CliError::UnexpectedOutcome { .. }));
    }

    #[test_case(9_000_000_000_000_000 ; "beyond duration range")]
    #[test_case(200_000_000 ; "beyond calendar range")]
    #[test_case(-200_000_000 ; "before calendar range")]
    fn out_of_range_deadline_is_rejected(days: i64) {
        let json = format!(
            r#"{{
            "actors": {{ "alice": 10 }},
            "steps": [ {{ "op": "create_job", "actor": "alice", "description": "d", "skills": "s", "value": 1, "deadline_days": {days} }} ]
        }}"#
        );
        let err = run(&json).unwrap_err();
        assert!(matches!(err, CliError::InvalidDeadline(d) if d == days));
    }

    #[test]
    fn unfunded_value_is_a_funding_error() {
        let json = r#"{
            "actors": { "alice": 10 },
            "steps": [ { "op": "create_job", "actor": "alice", "description": "d", "skills": "s", "value": 50 } ]
        }"#;
        assert!(matches!(run(json).unwrap_err(), CliError::Funding(_)));
    }

    #[test]
    fn failed_reopen_returns_attached_value() {
        let json = r#"{
            "actors": { "alice": 100 },
            "steps": [
                { "op": "create_job", "actor": "alice", "description": "d", "skills": "s", "value": 50 },
                { "op": "reopen_job", "actor": "alice", "job": 0, "value": 30, "expect_error": "invalid_state" }
            ]
        }"#;
        let report = run(json).expect("run");
        assert_eq!(balance(&report, "alice"), Amount::new(50));
    }

    #[test]
    fn unknown_actor_is_rejected() {
        let json = r#"{ "actors": {}, "steps": [ { "op": "apply_for_job", "actor": "eve", "job": 0 } ] }"#;
        assert!(matches!(run(json).unwrap_err(), CliError::UnknownActor(_)));
    }

    #[test]
    fn malformed_scenario_is_a_parse_error() {
        let err = Scenario::from_json("bad.json", "{ \"steps\": [] }").unwrap_err();
        assert!(matches!(err, CliError::Parse { .. }));
    }
}
