//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use hire_market::{EventRecord, Job, JobSnapshot, MarketEvent};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;
use crate::scenario::RunReport;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

fn event_summary(event: &MarketEvent) -> String {
    match event {
        MarketEvent::JobCreated { employer, payment, .. } => format!("by {employer}, payment {payment}"),
        MarketEvent::JobApplication { applicant, .. } => format!("applicant {applicant}"),
        MarketEvent::JobAssigned { employee, .. } => format!("employee {employee}"),
        MarketEvent::JobWaitingReview { work_result, .. } => format!("work \"{work_result}\""),
        MarketEvent::JobCompleted { paid, .. } => format!("paid {paid}"),
        MarketEvent::JobCancelled { refunded, .. } => format!("refunded {refunded}"),
        MarketEvent::JobReopened { payment, .. } => format!("payment {payment}"),
        MarketEvent::ReviewCreated { score, .. } => format!("score {}", score.value()),
        MarketEvent::RatingCreated { ratee, role, score, .. } => {
            format!("{ratee} as {role}, score {}", score.value())
        }
        MarketEvent::ResumeCreated { owner, role, .. } => format!("{owner} as {role}"),
    }
}

fn write_events<W: Write>(writer: &mut W, events: &[EventRecord]) -> Result<(), CliError> {
    writeln!(writer, "Events")?;
    writeln!(writer, "══════════════════════════════════")?;
    writeln!(writer, "{:<5} {:<18} {:<8} DETAILS", "SEQ", "EVENT", "JOB")?;
    for record in events {
        let job = record
            .event
            .job_id()
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        writeln!(
            writer,
            "{:<5} {:<18} {:<8} {}",
            record.sequence,
            record.event.event_type(),
            job,
            event_summary(&record.event)
        )?;
    }
    Ok(())
}

fn write_jobs<W: Write>(writer: &mut W, jobs: &[Job]) -> Result<(), CliError> {
    writeln!(writer, "Jobs")?;
    writeln!(writer, "══════════════════════════════════")?;
    writeln!(writer, "{:<8} {:<16} {:<10} EMPLOYEE", "ID", "STATUS", "PAYMENT")?;
    for job in jobs {
        let employee = job
            .employee
            .map_or_else(|| "-".to_string(), |a| a.to_string());
        writeln!(
            writer,
            "{:<8} {:<16} {:<10} {}",
            job.id.to_string(),
            job.status.as_str(),
            job.payment.to_string(),
            employee
        )?;
    }
    Ok(())
}

impl TableDisplay for RunReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_events(writer, &self.events)?;
        writeln!(writer)?;
        write_jobs(writer, &self.jobs)?;
        writeln!(writer)?;
        writeln!(writer, "Balances")?;
        writeln!(writer, "══════════════════════════════════")?;
        for balance in &self.balances {
            writeln!(writer, "{:<12} {}", balance.name, balance.balance)?;
        }
        writeln!(writer, "{:<12} {}", "(escrow)", self.escrowed)?;
        Ok(())
    }
}

/// Job snapshots rebuilt from an event log.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Number of events replayed.
    pub events: usize,
    /// One snapshot per job, in id order.
    pub jobs: Vec<JobSnapshot>,
}

impl TableDisplay for ReplayReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Replayed {} events", self.events)?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(
            writer,
            "{:<8} {:<16} {:<10} {:<8} {:<8} TRAIL",
            "ID", "STATUS", "ESCROWED", "APPS", "REVIEWS"
        )?;
        for job in &self.jobs {
            let trail: Vec<&str> = job.status_trail.iter().map(|s| s.as_str()).collect();
            writeln!(
                writer,
                "{:<8} {:<16} {:<10} {:<8} {:<8} {}",
                job.job_id.to_string(),
                job.status.as_str(),
                job.escrowed.to_string(),
                job.applicants.len(),
                job.review_count,
                trail.join(" > ")
            )?;
        }
        Ok(())
    }
}
