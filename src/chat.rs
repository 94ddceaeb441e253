//! Follow-up questions about a meeting, answered from a fresh web search.

use crate::agent::{AgentError, Completer, CompletionRequest};
use crate::search::{corpus, SearchHit, SearchQuery, WebSearch};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, warn};

const CHAT_RESULTS: usize = 3;
const SHOWN_RESULTS: usize = 2;
const CHAT_TEMPERATURE: f32 = 0.7;
const CHAT_MAX_TOKENS: u32 = 200;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("failed to answer: {0}")]
    Completion(#[from] AgentError),
}

/// What is known about the meeting a question refers to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub person_name: Option<String>,
    pub company_name: Option<String>,
    pub event_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatAnswer {
    pub message: String,
    /// Leading search results shown alongside the answer
    pub search_results: Vec<SearchHit>,
}

/// Answer a question about a meeting in a few plain sentences.
#[instrument(skip(search, completer, context))]
pub async fn ask(
    search: &dyn WebSearch,
    completer: &dyn Completer,
    question: &str,
    context: &ChatContext,
) -> Result<ChatAnswer, ChatError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(ChatError::EmptyQuestion);
    }

    let person = context.person_name.as_deref().filter(|s| !s.is_empty());
    let company = context.company_name.as_deref().filter(|s| !s.is_empty());

    let hits = match (person, company) {
        (Some(person), Some(company)) => {
            let query = SearchQuery::new(format!("{} {} {}", question, person, company), CHAT_RESULTS);
            search.search(&query).await.unwrap_or_else(|e| {
                warn!(error = %e, "chat search failed, answering without results");
                Vec::new()
            })
        }
        _ => Vec::new(),
    };

    let system = build_system_prompt(context, &hits);
    let request = CompletionRequest::new(question, CHAT_TEMPERATURE)
        .with_system(system)
        .with_max_tokens(CHAT_MAX_TOKENS);
    let message = completer.complete(&request).await?;

    Ok(ChatAnswer {
        message: message.trim().to_string(),
        search_results: hits.into_iter().take(SHOWN_RESULTS).collect(),
    })
}

fn build_system_prompt(context: &ChatContext, hits: &[SearchHit]) -> String {
    let mut prompt = format!(
        "You are a meeting prep assistant. Give short, concise answers (2-3 sentences max). \
         No markdown formatting - use plain text only.\n\n\
         Meeting: {} with {} from {}\n\n",
        context.event_summary.as_deref().unwrap_or("Meeting"),
        context.person_name.as_deref().unwrap_or("someone"),
        context.company_name.as_deref().unwrap_or("a company"),
    );
    if !hits.is_empty() {
        prompt.push_str(&format!("Search Results: {}\n\n", corpus(hits, " | ")));
    }
    prompt.push_str("Keep responses brief and actionable. If you don't know something, just say so.");
    prompt
}
