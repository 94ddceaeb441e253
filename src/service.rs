//! Report orchestration: cache lookup, extraction, parallel research,
//! synthesis and persistence.

use crate::agent::{build_completer, AgentError, Completer};
use crate::coalesce::GenerationLocks;
use crate::config::{Config, ConfigError};
use crate::extract::extract_entities;
use crate::report::{EventDetails, Report};
use crate::research::Researcher;
use crate::search::{SearchDepth, SearchError, TavilyClient, WebSearch};
use crate::storage::{InsertOutcome, ReportStore, StorageError};
use crate::synthesis::Synthesizer;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

/// Failures that reach callers of [`ReportService`].
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(
        "could not find a \"Person Name - Company\" pair in the description of event {event_id}"
    )]
    Unresolvable { event_id: String },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Failures while wiring the service from configuration.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Entry point for generating, listing and deleting reports.
pub struct ReportService {
    store: ReportStore,
    researcher: Researcher,
    synthesizer: Synthesizer,
    locks: GenerationLocks,
}

impl ReportService {
    pub fn new(store: ReportStore, search: Arc<dyn WebSearch>, completer: Arc<dyn Completer>) -> Self {
        Self {
            store,
            researcher: Researcher::new(search, Arc::clone(&completer)),
            synthesizer: Synthesizer::new(completer),
            locks: GenerationLocks::new(),
        }
    }

    /// Build the production clients and open the store described by the config
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        let completer = build_completer(config)?;
        let search = Arc::new(TavilyClient::new(
            config.search_api_key()?,
            SearchDepth::from_config(&config.search.depth),
        )?);
        let store = ReportStore::open(config.reports_path())?;
        Ok(Self::new(store, search, completer))
    }

    /// Return the user's cached report for an event, generating it on a miss.
    ///
    /// A report another user already stored for the same event id is
    /// returned as is.
    ///
    /// Only an unresolvable description or a storage failure is an error;
    /// research and synthesis failures degrade into fallback content.
    #[instrument(skip(self, event), fields(title = %event.title))]
    pub async fn get_or_generate(
        &self,
        event_id: &str,
        user_id: &str,
        event: EventDetails,
    ) -> Result<Report, ReportError> {
        if let Some(report) = self.store.find(user_id, event_id)? {
            info!("report cache hit");
            return Ok(report);
        }

        // Event ids are unique across owners, so any stored report for the
        // event is the one an insert would collide with
        let _guard = self.locks.acquire(event_id).await;
        if let Some(report) = self.store.find_by_event(event_id)? {
            info!(owner = %report.user_id, "report already stored for event");
            return Ok(report);
        }

        let entities = extract_entities(&event.description).ok_or_else(|| ReportError::Unresolvable {
            event_id: event_id.to_string(),
        })?;
        info!(person = %entities.person_name, company = %entities.company_name, "generating report");

        let (person, company) = tokio::join!(
            self.researcher
                .research_person(&entities.person_name, &entities.company_name),
            self.researcher.research_company(&entities.company_name),
        );
        let preparation = self
            .synthesizer
            .synthesize(&entities, &person, &company, &event)
            .await;

        let report = Report::new(event_id, user_id, event, entities, person, company, preparation);
        match self.store.insert(&report)? {
            InsertOutcome::Inserted => {
                info!(report_id = %report.id, "report stored");
                Ok(report)
            }
            InsertOutcome::Conflict(existing) => {
                info!(owner = %existing.user_id, "event already has a report, returning it");
                Ok(existing)
            }
        }
    }

    /// All of a user's reports, newest first
    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Report>, ReportError> {
        Ok(self.store.list_by_user(user_id)?)
    }

    /// Delete one of the user's reports; absent or foreign reports are left alone
    #[instrument(skip(self))]
    pub fn delete_one(&self, report_id: Uuid, user_id: &str) -> Result<bool, ReportError> {
        let deleted = self.store.delete_one(report_id, user_id)?;
        info!(deleted, "delete report");
        Ok(deleted)
    }

    /// Delete all of a user's reports, returning the count removed
    #[instrument(skip(self))]
    pub fn clear_all(&self, user_id: &str) -> Result<usize, ReportError> {
        let removed = self.store.clear_user(user_id)?;
        info!(removed, "cleared report cache");
        Ok(removed)
    }
}
