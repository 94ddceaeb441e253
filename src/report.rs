//! Report data model - the aggregate persisted for one calendar event.
//!
//! Field names serialize in camelCase, which is also the shape the
//! summarizer is asked to produce for the research findings.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Provenance tag recorded when a research source fell back.
pub const ERROR_SOURCE: &str = "Error";

/// Person and company named in an event description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntities {
    pub person_name: String,
    pub company_name: String,
}

/// Snapshot of the calendar event a report was generated for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

/// What the summarizer is asked to return about a person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonFindings {
    /// Current job title
    pub job_title: String,
    /// Professional background, as text or a structured object
    pub background: Value,
    /// Recent news items mentioning the person, most relevant first
    pub recent_news: Vec<String>,
    /// LinkedIn profile URL, empty when unknown
    pub linked_in_profile: String,
}

/// What the summarizer is asked to return about a company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyFindings {
    /// What the company does
    pub description: String,
    /// Primary industry
    pub industry: String,
    /// Company size, as text or a structured object
    pub size: Value,
    /// Recent news items about the company, most relevant first
    pub recent_news: Vec<String>,
    /// Company website URL, empty when unknown
    pub website: String,
}

/// Researched intelligence about the person in a meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonIntelligence {
    pub job_title: String,
    pub background: Value,
    pub recent_news: Vec<String>,
    pub linked_in_profile: String,
    pub source: String,
}

impl PersonIntelligence {
    /// Tag summarizer findings with the systems that produced them
    pub fn from_findings(findings: PersonFindings, source: impl Into<String>) -> Self {
        Self {
            job_title: findings.job_title,
            background: findings.background,
            recent_news: findings.recent_news,
            linked_in_profile: findings.linked_in_profile,
            source: source.into(),
        }
    }

    /// Value used when person research failed
    pub fn unavailable() -> Self {
        Self {
            job_title: "Unknown".to_string(),
            background: Value::String("Unable to retrieve information".to_string()),
            recent_news: Vec::new(),
            linked_in_profile: String::new(),
            source: ERROR_SOURCE.to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == ERROR_SOURCE
    }
}

/// Researched intelligence about the company in a meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyIntelligence {
    pub description: String,
    pub industry: String,
    pub size: Value,
    pub recent_news: Vec<String>,
    pub website: String,
    pub source: String,
}

impl CompanyIntelligence {
    /// Tag summarizer findings with the systems that produced them
    pub fn from_findings(findings: CompanyFindings, source: impl Into<String>) -> Self {
        Self {
            description: findings.description,
            industry: findings.industry,
            size: findings.size,
            recent_news: findings.recent_news,
            website: findings.website,
            source: source.into(),
        }
    }

    /// Value used when company research failed
    pub fn unavailable() -> Self {
        Self {
            description: "Unable to retrieve information".to_string(),
            industry: "Unknown".to_string(),
            size: Value::String("Unknown".to_string()),
            recent_news: Vec::new(),
            website: String::new(),
            source: ERROR_SOURCE.to_string(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == ERROR_SOURCE
    }
}

/// Meeting summary and preparation tips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Preparation {
    /// Concise meeting summary, 2-3 sentences
    pub summary: String,
    /// Five actionable, standalone preparation tips
    pub tips: Vec<String>,
}

impl Preparation {
    pub const FALLBACK_SUMMARY: &'static str = "Meeting preparation analysis unavailable.";

    /// Generic preparation used when synthesis failed
    pub fn fallback() -> Self {
        Self {
            summary: Self::FALLBACK_SUMMARY.to_string(),
            tips: Self::fallback_tips(),
        }
    }

    pub fn fallback_tips() -> Vec<String> {
        vec![
            "Review meeting agenda".to_string(),
            "Prepare relevant questions".to_string(),
            "Research company background".to_string(),
        ]
    }
}

/// The persisted intelligence report for one calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub event_id: String,
    pub user_id: String,
    pub event_details: EventDetails,
    pub extracted_info: ExtractedEntities,
    pub person_intelligence: PersonIntelligence,
    pub company_intelligence: CompanyIntelligence,
    pub generated_summary: String,
    pub preparation_tips: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Report {
    /// Assemble a new report, stamped with the current time
    pub fn new(
        event_id: impl Into<String>,
        user_id: impl Into<String>,
        event_details: EventDetails,
        extracted_info: ExtractedEntities,
        person_intelligence: PersonIntelligence,
        company_intelligence: CompanyIntelligence,
        preparation: Preparation,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            event_id: event_id.into(),
            user_id: user_id.into(),
            event_details,
            extracted_info,
            person_intelligence,
            company_intelligence,
            generated_summary: preparation.summary,
            preparation_tips: preparation.tips,
            created_at: now,
            last_updated: now,
        }
    }
}

/// Render a free-form summarizer field (text or structured) as plain text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
