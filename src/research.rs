//! Person and company research: web search, then summarization into a fixed schema.
//!
//! Research never fails. Any search, completion or parse error is logged and
//! replaced with the `unavailable()` value tagged with the `"Error"` source.

use crate::agent::{parse_json_object, schema_instruction, AgentError, Completer, CompletionRequest};
use crate::report::{CompanyFindings, CompanyIntelligence, PersonFindings, PersonIntelligence};
use crate::search::{corpus, SearchError, SearchQuery, WebSearch};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

const PERSON_RESULTS: usize = 3;
const COMPANY_RESULTS: usize = 5;
const RESEARCH_TEMPERATURE: f32 = 0.3;

#[derive(Error, Debug)]
enum ResearchError {
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Researches people and companies with an injected search provider and model.
#[derive(Clone)]
pub struct Researcher {
    search: Arc<dyn WebSearch>,
    completer: Arc<dyn Completer>,
}

impl Researcher {
    pub fn new(search: Arc<dyn WebSearch>, completer: Arc<dyn Completer>) -> Self {
        Self { search, completer }
    }

    /// Research a person at a company, falling back on any failure
    #[instrument(skip(self))]
    pub async fn research_person(&self, person_name: &str, company_name: &str) -> PersonIntelligence {
        match self.try_research_person(person_name, company_name).await {
            Ok(intel) => {
                info!(source = %intel.source, "person research complete");
                intel
            }
            Err(e) => {
                warn!(error = %e, "person research failed, using fallback");
                PersonIntelligence::unavailable()
            }
        }
    }

    /// Research a company, falling back on any failure
    #[instrument(skip(self))]
    pub async fn research_company(&self, company_name: &str) -> CompanyIntelligence {
        match self.try_research_company(company_name).await {
            Ok(intel) => {
                info!(source = %intel.source, "company research complete");
                intel
            }
            Err(e) => {
                warn!(error = %e, "company research failed, using fallback");
                CompanyIntelligence::unavailable()
            }
        }
    }

    async fn try_research_person(
        &self,
        person_name: &str,
        company_name: &str,
    ) -> Result<PersonIntelligence, ResearchError> {
        let query = SearchQuery::new(
            format!("{} {} linkedin profile job title", person_name, company_name),
            PERSON_RESULTS,
        );
        let hits = self.search.search(&query).await?;

        let prompt = format!(
            "Analyze the following search results about {} from {}. \
             Extract key information including job title, background, recent news and LinkedIn profile.\n\n\
             {}\n\nSearch Results:\n{}",
            person_name,
            company_name,
            schema_instruction::<PersonFindings>(),
            corpus(&hits, "\n")
        );
        let raw = self
            .completer
            .complete(&CompletionRequest::new(prompt, RESEARCH_TEMPERATURE))
            .await?;
        let findings: PersonFindings = parse_json_object(&raw)?;

        let source = format!("{} + {}", self.completer.name(), self.search.name());
        Ok(PersonIntelligence::from_findings(findings, source))
    }

    async fn try_research_company(&self, company_name: &str) -> Result<CompanyIntelligence, ResearchError> {
        let query = SearchQuery::new(
            format!("{} company information business industry news", company_name),
            COMPANY_RESULTS,
        );
        let hits = self.search.search(&query).await?;

        let prompt = format!(
            "Analyze the following search results about {}. \
             Extract key company information including description, industry, size, recent news, and website.\n\n\
             {}\n\nSearch Results:\n{}",
            company_name,
            schema_instruction::<CompanyFindings>(),
            corpus(&hits, "\n")
        );
        let raw = self
            .completer
            .complete(&CompletionRequest::new(prompt, RESEARCH_TEMPERATURE))
            .await?;
        let findings: CompanyFindings = parse_json_object(&raw)?;

        let source = format!("{} + {}", self.search.name(), self.completer.name());
        Ok(CompanyIntelligence::from_findings(findings, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchHit;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubSearch {
        fail: bool,
        queries: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl WebSearch for StubSearch {
        fn name(&self) -> &str {
            "Stub"
        }

        async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError> {
            self.queries
                .lock()
                .unwrap()
                .push((query.query.clone(), query.max_results));
            if self.fail {
                return Err(SearchError::Provider {
                    status: 503,
                    body: "down".to_string(),
                });
            }
            Ok(vec![SearchHit {
                title: "Profile".to_string(),
                content: "Jane is CTO".to_string(),
                url: String::new(),
            }])
        }
    }

    struct StubModel(&'static str);

    #[async_trait]
    impl Completer for StubModel {
        fn name(&self) -> &str {
            "Model"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
            assert!(request.prompt.contains("Jane is CTO"));
            Ok(self.0.to_string())
        }
    }

    fn researcher(fail_search: bool, reply: &'static str) -> (Researcher, Arc<StubSearch>) {
        let search = Arc::new(StubSearch {
            fail: fail_search,
            queries: Mutex::new(Vec::new()),
        });
        let researcher = Researcher::new(search.clone(), Arc::new(StubModel(reply)));
        (researcher, search)
    }

    #[tokio::test]
    async fn person_research_uses_template_and_tags_source() {
        let (researcher, search) = researcher(
            false,
            "```json\n{\"jobTitle\":\"CTO\",\"recentNews\":[\"Keynote\"]}\n```",
        );
        let intel = researcher.research_person("Jane Doe", "Acme").await;

        assert_eq!(intel.job_title, "CTO");
        assert_eq!(intel.recent_news, vec!["Keynote".to_string()]);
        assert_eq!(intel.source, "Model + Stub");
        assert_eq!(
            search.queries.lock().unwrap()[0],
            ("Jane Doe Acme linkedin profile job title".to_string(), 3)
        );
    }

    #[tokio::test]
    async fn company_research_uses_template_and_tags_source() {
        let (researcher, search) = researcher(false, r#"{"industry":"Manufacturing","size":{"employees":500}}"#);
        let intel = researcher.research_company("Acme").await;

        assert_eq!(intel.industry, "Manufacturing");
        assert_eq!(intel.size["employees"], 500);
        assert_eq!(intel.source, "Stub + Model");
        assert_eq!(
            search.queries.lock().unwrap()[0],
            ("Acme company information business industry news".to_string(), 5)
        );
    }

    #[tokio::test]
    async fn unparseable_output_yields_empty_findings_not_fallback() {
        let (researcher, _) = researcher(false, "I could not find anything.");
        let intel = researcher.research_person("Jane Doe", "Acme").await;

        assert!(!intel.is_degraded());
        assert!(intel.job_title.is_empty());
        assert!(intel.recent_news.is_empty());
    }

    #[tokio::test]
    async fn search_failure_falls_back() {
        let (researcher, _) = researcher(true, "{}");
        assert_eq!(
            researcher.research_person("Jane Doe", "Acme").await,
            PersonIntelligence::unavailable()
        );
        assert_eq!(
            researcher.research_company("Acme").await,
            CompanyIntelligence::unavailable()
        );
    }

    #[tokio::test]
    async fn mistyped_fields_fall_back() {
        let (researcher, _) = researcher(false, r#"{"recentNews": 42}"#);
        assert!(researcher.research_company("Acme").await.is_degraded());
    }
}
