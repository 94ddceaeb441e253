//! Meeting preparation synthesis from researched intelligence.

use crate::agent::{parse_json_object, schema_instruction, AgentError, Completer, CompletionRequest};
use crate::report::{
    value_text, CompanyIntelligence, EventDetails, ExtractedEntities, PersonIntelligence, Preparation,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const SYNTHESIS_TEMPERATURE: f32 = 0.7;

/// Turns person and company intelligence into a summary and tips.
#[derive(Clone)]
pub struct Synthesizer {
    completer: Arc<dyn Completer>,
}

impl Synthesizer {
    pub fn new(completer: Arc<dyn Completer>) -> Self {
        Self { completer }
    }

    /// Produce a summary and tips; never fails, degrading to [`Preparation::fallback`]
    #[instrument(skip_all, fields(person = %entities.person_name, company = %entities.company_name))]
    pub async fn synthesize(
        &self,
        entities: &ExtractedEntities,
        person: &PersonIntelligence,
        company: &CompanyIntelligence,
        event: &EventDetails,
    ) -> Preparation {
        match self.try_synthesize(entities, person, company, event).await {
            Ok(prep) => {
                info!(tips = prep.tips.len(), "meeting preparation synthesized");
                prep
            }
            Err(e) => {
                warn!(error = %e, "synthesis failed, using fallback");
                Preparation::fallback()
            }
        }
    }

    async fn try_synthesize(
        &self,
        entities: &ExtractedEntities,
        person: &PersonIntelligence,
        company: &CompanyIntelligence,
        event: &EventDetails,
    ) -> Result<Preparation, AgentError> {
        let prompt = build_prompt(entities, person, company, event);
        let raw = self
            .completer
            .complete(&CompletionRequest::new(prompt, SYNTHESIS_TEMPERATURE))
            .await?;
        let mut prep: Preparation = parse_json_object(&raw)?;

        if prep.summary.trim().is_empty() {
            prep.summary = Preparation::FALLBACK_SUMMARY.to_string();
        }
        prep.tips.retain(|tip| !tip.trim().is_empty());
        if prep.tips.is_empty() {
            prep.tips = Preparation::fallback_tips();
        }
        Ok(prep)
    }
}

fn build_prompt(
    entities: &ExtractedEntities,
    person: &PersonIntelligence,
    company: &CompanyIntelligence,
    event: &EventDetails,
) -> String {
    format!(
        "As a business consultant, generate a professional meeting preparation summary \
         and actionable tips based on the following information:\n\n\
         Meeting: {}\n\
         Person: {} - {}\n\
         Company: {} - {}\n\n\
         Person Background: {}\n\
         Company Description: {}\n\n\
         Generate:\n\
         1. A concise meeting summary (2-3 sentences)\n\
         2. 5 actionable preparation tips for the consultant, each a standalone instruction\n\n\
         {}",
        event.title,
        entities.person_name,
        person.job_title,
        entities.company_name,
        company.industry,
        value_text(&person.background),
        company.description,
        schema_instruction::<Preparation>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: Result<&'static str, ()>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Completer for ScriptedModel {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.reply
                .map(str::to_string)
                .map_err(|_| AgentError::RequestFailed("offline".to_string()))
        }
    }

    fn inputs() -> (ExtractedEntities, PersonIntelligence, CompanyIntelligence, EventDetails) {
        let entities = ExtractedEntities {
            person_name: "Jane Doe".to_string(),
            company_name: "Acme Corp".to_string(),
        };
        let mut person = PersonIntelligence::unavailable();
        person.job_title = "CTO".to_string();
        let mut company = CompanyIntelligence::unavailable();
        company.industry = "Robotics".to_string();
        let event = EventDetails {
            title: "Quarterly review".to_string(),
            description: "Jane Doe - Acme Corp".to_string(),
            start_time: Utc::now(),
            end_time: Utc::now(),
            attendees: vec!["jane@acme.test".to_string()],
        };
        (entities, person, company, event)
    }

    fn synthesizer(reply: Result<&'static str, ()>) -> (Synthesizer, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        (Synthesizer::new(model.clone()), model)
    }

    #[tokio::test]
    async fn prompt_embeds_meeting_context() {
        let (synth, model) = synthesizer(Ok(r#"{"summary":"Discuss roadmap.","tips":["Ask about Q3"]}"#));
        let (entities, person, company, event) = inputs();
        let prep = synth.synthesize(&entities, &person, &company, &event).await;

        assert_eq!(prep.summary, "Discuss roadmap.");
        assert_eq!(prep.tips, vec!["Ask about Q3".to_string()]);

        let prompt = &model.prompts.lock().unwrap()[0];
        assert!(prompt.contains("Meeting: Quarterly review"));
        assert!(prompt.contains("Person: Jane Doe - CTO"));
        assert!(prompt.contains("Company: Acme Corp - Robotics"));
        assert!(prompt.contains("Person Background: Unable to retrieve information"));
    }

    #[tokio::test]
    async fn model_failure_returns_fallback() {
        let (synth, _) = synthesizer(Err(()));
        let (entities, person, company, event) = inputs();
        assert_eq!(
            synth.synthesize(&entities, &person, &company, &event).await,
            Preparation::fallback()
        );
    }

    #[tokio::test]
    async fn missing_fields_are_filled_from_fallback() {
        let (synth, _) = synthesizer(Ok("```json\n{\"summary\": \"Short intro call.\"}\n```"));
        let (entities, person, company, event) = inputs();
        let prep = synth.synthesize(&entities, &person, &company, &event).await;

        assert_eq!(prep.summary, "Short intro call.");
        assert_eq!(prep.tips, Preparation::fallback_tips());
    }

    #[tokio::test]
    async fn non_json_output_becomes_fallback_content() {
        let (synth, _) = synthesizer(Ok("Here are some thoughts..."));
        let (entities, person, company, event) = inputs();
        assert_eq!(
            synth.synthesize(&entities, &person, &company, &event).await,
            Preparation::fallback()
        );
    }
}
