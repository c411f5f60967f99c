#![cfg(feature = "web")]

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::report::{Report, ReportAction, ReportKind};
use crate::session::UserSession;
use crate::template::{Template, TemplatePayload};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request to reporting API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Reporting API returned {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid credentials")]
    InvalidCredentials,
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// User entry of the `users` endpoint, used to pick reviewers and approvers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GroupEntry {
    name: String,
}

/// Audit trail entries the console reports to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    Login { username: String },
    AuditLogin { username: String },
    DeletedTemplates { username: String, ids: Vec<i64>, names: Vec<String> },
    EditedTemplate { username: String, id: i64, name: String },
    GeneratedReport { username: String, id: i64, name: String },
}

impl AuditEvent {
    pub fn endpoint(&self) -> &'static str {
        match self {
            AuditEvent::Login { .. } => "log-login",
            AuditEvent::AuditLogin { .. } => "audit-login",
            AuditEvent::DeletedTemplates { .. } => "log-deleted-template",
            AuditEvent::EditedTemplate { .. } => "log-edited-template",
            AuditEvent::GeneratedReport { .. } => "log-generated-report",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            AuditEvent::Login { username } | AuditEvent::AuditLogin { username } => {
                json!({ "username": username })
            }
            AuditEvent::DeletedTemplates { username, ids, names } => json!({
                "username": username,
                "templateIds": ids,
                "templateNames": names,
            }),
            AuditEvent::EditedTemplate { username, id, name } => json!({
                "username": username,
                "templateId": id,
                "templateName": name,
            }),
            AuditEvent::GeneratedReport { username, id, name } => json!({
                "username": username,
                "reportId": id,
                "reportName": name,
            }),
        }
    }
}

/// Operations of the remote reporting API the console relies on
#[async_trait]
pub trait ReportBackend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<UserSession>;
    async fn log_event(&self, event: &AuditEvent) -> Result<()>;

    async fn templates(&self) -> Result<Vec<Template>>;
    async fn create_template(&self, payload: &TemplatePayload) -> Result<()>;
    async fn edit_template(&self, id: i64, payload: &TemplatePayload) -> Result<Template>;
    async fn delete_templates(&self, ids: &[i64]) -> Result<()>;

    async fn parameters(&self) -> Result<Vec<String>>;
    async fn groups(&self) -> Result<Vec<String>>;
    async fn add_group(&self, name: &str) -> Result<()>;
    async fn users(&self) -> Result<Vec<BackendUser>>;

    /// Template ids with a schedule of this kind; empty for manual reports
    async fn scheduled_template_ids(&self, kind: ReportKind) -> Result<Vec<i64>>;

    async fn reports(&self, kind: ReportKind) -> Result<Vec<Report>>;
    async fn report_document(&self, kind: ReportKind, id: i64) -> Result<Vec<u8>>;
    async fn report_action(&self, kind: ReportKind, id: i64, action: ReportAction) -> Result<()>;

    /// Generate a report; `query` comes from `ExportRequest::export_query`
    async fn export_report(&self, query: &str) -> Result<Vec<u8>>;
}

/// [`ReportBackend`] over HTTP with `reqwest`
pub struct HttpBackend {
    client: Client,
    base: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpBackend {
            client: Client::new(),
            base: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base, endpoint)
    }

    fn checked(endpoint: &str, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(BackendError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        debug!("GET {}", endpoint);
        let resp = self.client.get(self.url(endpoint)).send().await?;
        Ok(Self::checked(endpoint, resp)?.json().await?)
    }

    async fn get_bytes(&self, endpoint: &str) -> Result<Vec<u8>> {
        debug!("GET {}", endpoint);
        let resp = self.client.get(self.url(endpoint)).send().await?;
        Ok(Self::checked(endpoint, resp)?.bytes().await?.to_vec())
    }

    async fn post_json<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> Result<Response> {
        debug!("POST {}", endpoint);
        let resp = self.client.post(self.url(endpoint)).json(body).send().await?;
        Self::checked(endpoint, resp)
    }
}

#[async_trait]
impl ReportBackend for HttpBackend {
    async fn login(&self, username: &str, password: &str) -> Result<UserSession> {
        let resp = self
            .client
            .post(self.url("login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BackendError::InvalidCredentials);
        }
        Ok(resp.json().await?)
    }

    async fn log_event(&self, event: &AuditEvent) -> Result<()> {
        self.post_json(event.endpoint(), &event.body()).await?;
        Ok(())
    }

    async fn templates(&self) -> Result<Vec<Template>> {
        self.get_json("templates").await
    }

    async fn create_template(&self, payload: &TemplatePayload) -> Result<()> {
        self.post_json("createTemplate", payload).await?;
        Ok(())
    }

    async fn edit_template(&self, id: i64, payload: &TemplatePayload) -> Result<Template> {
        let endpoint = format!("editTemplate/{}", id);
        debug!("PUT {}", endpoint);
        let resp = self.client.put(self.url(&endpoint)).json(payload).send().await?;
        Ok(Self::checked(&endpoint, resp)?.json().await?)
    }

    async fn delete_templates(&self, ids: &[i64]) -> Result<()> {
        self.post_json("deleteTemplates", ids).await?;
        Ok(())
    }

    async fn parameters(&self) -> Result<Vec<String>> {
        self.get_json("parameters").await
    }

    async fn groups(&self) -> Result<Vec<String>> {
        let groups: Vec<GroupEntry> = self.get_json("groups").await?;
        Ok(groups.into_iter().map(|g| g.name).collect())
    }

    async fn add_group(&self, name: &str) -> Result<()> {
        self.post_json("add_group", &json!({ "name": name })).await?;
        Ok(())
    }

    async fn users(&self) -> Result<Vec<BackendUser>> {
        self.get_json("users").await
    }

    async fn scheduled_template_ids(&self, kind: ReportKind) -> Result<Vec<i64>> {
        if kind == ReportKind::Manual {
            return Ok(Vec::new());
        }
        let endpoint = format!("get-all-{}-scheduled-reports", kind.as_str());
        self.get_json(&endpoint).await
    }

    async fn reports(&self, kind: ReportKind) -> Result<Vec<Report>> {
        self.get_json(kind.endpoint()).await
    }

    async fn report_document(&self, kind: ReportKind, id: i64) -> Result<Vec<u8>> {
        self.get_bytes(&format!("{}/{}", kind.endpoint(), id)).await
    }

    async fn report_action(&self, kind: ReportKind, id: i64, action: ReportAction) -> Result<()> {
        let endpoint = format!("{}/{}/{}", kind.endpoint(), id, action.as_str());
        self.post_json(&endpoint, &json!({})).await?;
        Ok(())
    }

    async fn export_report(&self, query: &str) -> Result<Vec<u8>> {
        self.get_bytes(&format!("exportReport?{}", query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_events_match_backend_payloads() {
        let event = AuditEvent::DeletedTemplates {
            username: "alice".to_string(),
            ids: vec![1, 2],
            names: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(event.endpoint(), "log-deleted-template");
        assert_eq!(
            event.body(),
            json!({"username": "alice", "templateIds": [1, 2], "templateNames": ["A", "B"]})
        );

        let event = AuditEvent::GeneratedReport {
            username: "bob".to_string(),
            id: 4,
            name: "Energy".to_string(),
        };
        assert_eq!(event.endpoint(), "log-generated-report");
        assert_eq!(event.body()["reportId"], 4);
    }

    #[test]
    fn base_url_is_normalised() {
        let backend = HttpBackend::new("http://localhost:8080/bms-reports/v1/");
        assert_eq!(backend.url("templates"), "http://localhost:8080/bms-reports/v1/templates");
    }
}
