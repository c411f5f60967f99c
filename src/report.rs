use chrono::{TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("You are not assigned to {action} this report.")]
    NotAssigned { action: ReportAction },

    #[error("Unknown report type '{0}'")]
    UnknownKind(String),

    #[error("Unknown report action '{0}'")]
    UnknownAction(String),
}

/// Which list of generated reports is being looked at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Manual,
    Daily,
    Weekly,
    Monthly,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Manual,
        ReportKind::Daily,
        ReportKind::Weekly,
        ReportKind::Monthly,
    ];

    /// Backend list endpoint, relative to the API base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            ReportKind::Manual => "reports",
            ReportKind::Daily => "daily-reports",
            ReportKind::Weekly => "weekly-reports",
            ReportKind::Monthly => "monthly-reports",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Manual => "manual",
            ReportKind::Daily => "daily",
            ReportKind::Weekly => "weekly",
            ReportKind::Monthly => "monthly",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ReportKind::Manual),
            "daily" => Ok(ReportKind::Daily),
            "weekly" => Ok(ReportKind::Weekly),
            "monthly" => Ok(ReportKind::Monthly),
            other => Err(ReportError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportAction {
    Approve,
    Review,
    Delete,
}

impl ReportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportAction::Approve => "approve",
            ReportAction::Review => "review",
            ReportAction::Delete => "delete",
        }
    }
}

impl fmt::Display for ReportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportAction {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(ReportAction::Approve),
            "review" => Ok(ReportAction::Review),
            "delete" => Ok(ReportAction::Delete),
            other => Err(ReportError::UnknownAction(other.to_string())),
        }
    }
}

/// Generated report as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub name: String,
    /// Epoch milliseconds; the backend sends either a number or a numeric string
    #[serde(deserialize_with = "epoch_millis", default)]
    pub generated_date: Option<i64>,
    #[serde(default)]
    pub generated_by: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub is_approved: bool,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub assigned_approver: String,
    #[serde(default)]
    pub assigned_review: String,
    #[serde(default = "pending")]
    pub status: ReportStatus,
}

fn pending() -> ReportStatus {
    ReportStatus::Pending
}

fn epoch_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

impl Report {
    /// Badge text shown next to the report
    pub fn status_label(&self) -> &'static str {
        if self.is_approved {
            "Approved"
        } else if self.reviewed_by.is_some() {
            "Reviewed"
        } else {
            "Pending"
        }
    }

    pub fn formatted_date(&self) -> String {
        format_generated_date(self.generated_date)
    }
}

/// Format epoch milliseconds as `dd-MMM-yyyy HH:mm:ss` (UTC)
///
/// # Examples
/// ```
/// use report_console::report::format_generated_date;
///
/// assert_eq!(format_generated_date(Some(0)), "01-Jan-1970 00:00:00");
/// assert_eq!(format_generated_date(None), "Invalid date");
/// ```
pub fn format_generated_date(millis: Option<i64>) -> String {
    millis
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%d-%b-%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| "Invalid date".to_string())
}

/// Check that `username` may perform `action` on `report`
///
/// Approving needs the assigned approver, reviewing the assigned reviewer.
/// Anyone may delete.
pub fn authorize(report: &Report, username: &str, action: ReportAction) -> Result<(), ReportError> {
    let allowed = match action {
        ReportAction::Approve => report.assigned_approver == username,
        ReportAction::Review => report.assigned_review == username,
        ReportAction::Delete => true,
    };

    if allowed {
        Ok(())
    } else {
        Err(ReportError::NotAssigned { action })
    }
}

/// Counters of the dashboard cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub approved_count: usize,
    pub pending_count: usize,
    pub total_count: usize,
    pub approved_percentage: u32,
}

impl DashboardStats {
    pub fn from_reports(reports: &[Report]) -> Self {
        let total_count = reports.len();
        let approved_count = reports.iter().filter(|r| r.is_approved).count();
        let approved_percentage = if total_count > 0 {
            ((approved_count as f64 / total_count as f64) * 100.0).round() as u32
        } else {
            0
        };

        DashboardStats {
            approved_count,
            pending_count: total_count - approved_count,
            total_count,
            approved_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: i64, approved: bool) -> Report {
        Report {
            id,
            name: format!("Report {}", id),
            generated_date: Some(1_700_000_000_000),
            generated_by: "alice".to_string(),
            created_at: String::new(),
            is_approved: approved,
            reviewed_by: None,
            assigned_approver: "bob".to_string(),
            assigned_review: "carol".to_string(),
            status: ReportStatus::Pending,
        }
    }

    #[test]
    fn generated_date_accepts_number_or_string() {
        let a: Report = serde_json::from_str(r#"{"id":1,"name":"a","generatedDate":1700000000000}"#).unwrap();
        let b: Report = serde_json::from_str(r#"{"id":2,"name":"b","generatedDate":"1700000000000"}"#).unwrap();
        let c: Report = serde_json::from_str(r#"{"id":3,"name":"c","generatedDate":"soon"}"#).unwrap();
        assert_eq!(a.generated_date, Some(1_700_000_000_000));
        assert_eq!(b.generated_date, a.generated_date);
        assert_eq!(c.generated_date, None);
        assert_eq!(c.status, ReportStatus::Pending);
        assert_eq!(a.formatted_date(), "14-Nov-2023 22:13:20");
        assert_eq!(c.formatted_date(), "Invalid date");
    }

    #[test]
    fn status_label_precedence() {
        let mut r = report(1, false);
        assert_eq!(r.status_label(), "Pending");
        r.reviewed_by = Some("carol".to_string());
        assert_eq!(r.status_label(), "Reviewed");
        r.is_approved = true;
        assert_eq!(r.status_label(), "Approved");
    }

    #[test]
    fn only_assignees_may_act() {
        let r = report(1, false);
        assert!(authorize(&r, "bob", ReportAction::Approve).is_ok());
        assert_eq!(
            authorize(&r, "carol", ReportAction::Approve),
            Err(ReportError::NotAssigned {
                action: ReportAction::Approve
            })
        );
        assert!(authorize(&r, "carol", ReportAction::Review).is_ok());
        assert!(authorize(&r, "bob", ReportAction::Review).is_err());
        assert!(authorize(&r, "mallory", ReportAction::Delete).is_ok());
        assert_eq!(
            ReportError::NotAssigned {
                action: ReportAction::Review
            }
            .to_string(),
            "You are not assigned to review this report."
        );
    }

    #[test]
    fn dashboard_counts() {
        let reports = vec![report(1, true), report(2, false), report(3, true)];
        let stats = DashboardStats::from_reports(&reports);
        assert_eq!(stats.approved_count, 2);
        assert_eq!(stats.pending_count, 1);
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.approved_percentage, 67);
        assert_eq!(DashboardStats::from_reports(&[]), DashboardStats::default());
    }

    #[test]
    fn kinds_map_to_endpoints() {
        assert_eq!("weekly".parse::<ReportKind>().unwrap().endpoint(), "weekly-reports");
        assert_eq!(ReportKind::Manual.endpoint(), "reports");
        assert!("yearly".parse::<ReportKind>().is_err());
        assert_eq!("approve".parse::<ReportAction>().unwrap(), ReportAction::Approve);
    }
}
