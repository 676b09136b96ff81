//! Application records: the unit of work tracked by the ledger.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Ledger-assigned identity of an application record.
pub type ApplicationId = i64;

/// Stage of an application. Transitions are unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    New,
    Applied,
    #[serde(rename = "Interview Scheduled")]
    InterviewScheduled,
    Rejected,
    Offer,
}

impl ApplicationStatus {
    /// Every status, in dashboard order.
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::New,
        ApplicationStatus::Applied,
        ApplicationStatus::InterviewScheduled,
        ApplicationStatus::Rejected,
        ApplicationStatus::Offer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::New => "New",
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::InterviewScheduled => "Interview Scheduled",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Offer => "Offer",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// A persisted application record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    /// Stored as text, `YYYY-MM-DD`.
    pub date_applied: Option<String>,
    /// Name of the collector that produced the record, `None` when added by hand.
    pub source: Option<String>,
    pub document_url: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub cv_created: bool,
    pub cover_letter_created: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A candidate record, not yet assigned an identity.
///
/// Produced by collectors in bulk and by the manual-add path one at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub date_applied: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl NewApplication {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: None,
            status: ApplicationStatus::New,
            notes: None,
            date_applied: None,
            source: None,
        }
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn status(mut self, status: ApplicationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn date_applied(mut self, date: NaiveDate) -> Self {
        self.date_applied = Some(date.format("%Y-%m-%d").to_string());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Check the record invariants: non-empty title and company, and a
    /// well-formed `date_applied` when present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if self.company.trim().is_empty() {
            return Err(ValidationError::MissingField("company"));
        }
        if let Some(date) = self.date_applied.as_deref() {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| ValidationError::InvalidDate(date.to_string()))?;
        }
        Ok(())
    }
}

/// Workspace flags flipped by document generation. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(default)]
    pub cv_created: Option<bool>,
    #[serde(default)]
    pub cover_letter_created: Option<bool>,
    #[serde(default)]
    pub document_url: Option<String>,
}

/// Number of records in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: ApplicationStatus,
    pub count: usize,
}

/// Count records per status. Every status appears, zero-filled, in dashboard order.
pub fn status_counts(records: &[ApplicationRecord]) -> Vec<StatusCount> {
    ApplicationStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: records.iter().filter(|r| r.status == status).count(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: ApplicationId, status: ApplicationStatus) -> ApplicationRecord {
        let now = Utc::now();
        ApplicationRecord {
            id,
            title: format!("Role {id}"),
            company: "Acme".to_string(),
            location: None,
            status,
            notes: None,
            date_applied: None,
            source: None,
            document_url: None,
            contact_name: None,
            contact_phone: None,
            contact_email: None,
            cv_created: false,
            cover_letter_created: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_parses_display_names() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>(), Ok(status));
        }
        assert_eq!(
            "Interview Scheduled".parse::<ApplicationStatus>(),
            Ok(ApplicationStatus::InterviewScheduled)
        );
    }

    #[test]
    fn status_rejects_unknown_value() {
        let err = "Ghosted".parse::<ApplicationStatus>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownStatus("Ghosted".to_string()));
    }

    #[test]
    fn status_serializes_with_spaces() {
        let json = serde_json::to_string(&ApplicationStatus::InterviewScheduled).unwrap();
        assert_eq!(json, "\"Interview Scheduled\"");
        let back: ApplicationStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ApplicationStatus::InterviewScheduled);
    }

    #[test]
    fn new_application_defaults_to_new_status() {
        let app: NewApplication =
            serde_json::from_str(r#"{"title":"Dev","company":"Acme"}"#).unwrap();
        assert_eq!(app.status, ApplicationStatus::New);
        assert!(app.location.is_none());
        assert!(app.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_title_and_company() {
        assert_eq!(
            NewApplication::new("  ", "Acme").validate(),
            Err(ValidationError::MissingField("title"))
        );
        assert_eq!(
            NewApplication::new("Dev", "").validate(),
            Err(ValidationError::MissingField("company"))
        );
    }

    #[test]
    fn validate_checks_date_format() {
        let mut app = NewApplication::new("Dev", "Acme");
        app.date_applied = Some("yesterday".to_string());
        assert_eq!(
            app.validate(),
            Err(ValidationError::InvalidDate("yesterday".to_string()))
        );

        let app = NewApplication::new("Dev", "Acme")
            .date_applied(NaiveDate::from_ymd_opt(2025, 10, 25).unwrap());
        assert_eq!(app.date_applied.as_deref(), Some("2025-10-25"));
        assert!(app.validate().is_ok());
    }

    #[test]
    fn status_counts_are_zero_filled_in_order() {
        let records = vec![
            record(1, ApplicationStatus::New),
            record(2, ApplicationStatus::New),
            record(3, ApplicationStatus::Offer),
        ];
        let counts = status_counts(&records);
        let flat: Vec<(&str, usize)> = counts
            .iter()
            .map(|c| (c.status.as_str(), c.count))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("New", 2),
                ("Applied", 0),
                ("Interview Scheduled", 0),
                ("Rejected", 0),
                ("Offer", 1),
            ]
        );
    }
}
