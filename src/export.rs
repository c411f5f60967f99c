use chrono::{Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("Please fill in all fields.")]
    MissingDates,

    #[error("To Date must be after From Date.")]
    InvalidDateRange,

    #[error("Please assign an approver.")]
    MissingApprover,

    #[error("Approver and reviewer cannot be the same person.")]
    ApproverIsReviewer,

    #[error("Please assign a reviewer.")]
    MissingReviewer,

    #[error("Hour {0} is outside 0-23")]
    InvalidHour(u32),

    #[error("Day of month {0} is outside 1-31")]
    InvalidDayOfMonth(u32),
}

/// When a scheduled report runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "lowercase")]
pub enum Schedule {
    Daily { hour: u32 },
    Weekly { day: Weekday, hour: u32 },
    Monthly { day: u32, hour: u32 },
}

impl Schedule {
    pub fn frequency(&self) -> &'static str {
        match self {
            Schedule::Daily { .. } => "daily",
            Schedule::Weekly { .. } => "weekly",
            Schedule::Monthly { .. } => "monthly",
        }
    }

    fn validate(&self) -> Result<(), ExportError> {
        let hour = match self {
            Schedule::Daily { hour } | Schedule::Weekly { hour, .. } => *hour,
            Schedule::Monthly { day, hour } => {
                if !(1..=31).contains(day) {
                    return Err(ExportError::InvalidDayOfMonth(*day));
                }
                *hour
            }
        };
        if hour > 23 {
            return Err(ExportError::InvalidHour(hour));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExportMode {
    Manual,
    Schedule { schedule: Schedule },
}

/// Shortcut date ranges offered by the export form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePreset {
    Yesterday,
    OneWeek,
    OneMonth,
}

impl DatePreset {
    /// `(from, to)` for this preset, relative to `today`
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            DatePreset::Yesterday => {
                let yesterday = today - Duration::days(1);
                (yesterday, yesterday)
            }
            DatePreset::OneWeek => (today - Duration::days(7), today),
            DatePreset::OneMonth => (
                today.checked_sub_months(Months::new(1)).unwrap_or(today),
                today,
            ),
        }
    }
}

/// Export or schedule request for one template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub template_id: i64,
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
    pub mode: ExportMode,
    /// Reviewer of the generated report
    #[serde(default)]
    pub assigned_to: String,
    /// Set when an approver is required
    #[serde(default)]
    pub approver: Option<String>,
}

impl ExportRequest {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.mode == ExportMode::Manual {
            match (self.from_date, self.to_date) {
                (Some(from), Some(to)) => {
                    if to <= from {
                        return Err(ExportError::InvalidDateRange);
                    }
                }
                _ => return Err(ExportError::MissingDates),
            }
        }

        if let Some(approver) = &self.approver {
            if approver.is_empty() {
                return Err(ExportError::MissingApprover);
            }
            if *approver == self.assigned_to {
                return Err(ExportError::ApproverIsReviewer);
            }
        }

        if let ExportMode::Schedule { schedule } = &self.mode {
            if self.assigned_to.is_empty() {
                return Err(ExportError::MissingReviewer);
            }
            schedule.validate()?;
        }

        Ok(())
    }

    /// Query string of the backend `exportReport` call
    ///
    /// # Arguments
    /// * `username` - User generating the report
    ///
    /// # Returns
    /// * `Result<String, ExportError>` - URL encoded query without the leading `?`
    pub fn export_query(&self, username: &str) -> Result<String, ExportError> {
        let (from, to) = match (self.from_date, self.to_date) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(ExportError::MissingDates),
        };
        let approver = self.approver.as_deref().unwrap_or("");

        let pairs = [
            ("id", self.template_id.to_string()),
            ("fromDate", backend_date(from)),
            ("toDate", backend_date(to)),
            ("username", username.to_string()),
            ("assignedTo", self.assigned_to.clone()),
            ("assigned_approver", approver.to_string()),
        ];

        Ok(pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&"))
    }
}

/// Date format the backend expects: `MM/DD/YYYY 00:00`
pub fn backend_date(date: NaiveDate) -> String {
    format!("{} 00:00", date.format("%m/%d/%Y"))
}
