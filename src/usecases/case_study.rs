use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::failover::{FallbackOrchestrator, Payload};
use crate::request::{CompletionOptions, Message};
use crate::store::{CaseStudy, CaseStudyDetails, Service, Store};

/// `{"caseStudy": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCaseStudy
{   pub case_study: CaseStudyDetails
}

impl Payload for GeneratedCaseStudy
{   const EXPECTED_KEY: &'static str = "caseStudy";
}

pub fn build_messages(query: &str, catalog: &[Service]) -> Vec<Message>
{   let services = super::bullets(catalog.iter().map(|s| s.title.as_str()));
    vec![
      Message::system(super::CONSULTANT_PERSONA)
    , Message::user(format!(
"Write an illustrative, anonymised case study for this request:
\"{query}\"

It should showcase one or more of our services:
{services}

Keep the figures realistic. Respond in JSON:
{{
  \"caseStudy\": {{
    \"title\": \"short headline\",
    \"client\": \"anonymised client description\",
    \"industry\": \"industry\",
    \"challenge\": \"the business problem\",
    \"solution\": \"what was delivered\",
    \"results\": [\"measurable outcome\", \"measurable outcome\"],
    \"technologies\": [\"technology\"],
    \"duration\": \"e.g. 6 months\"
  }}
}}"
      ))
    ]
}

/// Generates and persists a case study. Exhaustion propagates.
pub async fn generate(
  orchestrator: &FallbackOrchestrator
, store: &dyn Store
, query: &str
) -> Result<CaseStudy>
{   let catalog = store.list_services().await?;
    let messages = build_messages(query, &catalog);
    let resolved = orchestrator
      .resolve::<GeneratedCaseStudy>(&messages, &CompletionOptions::json())
      .await?;

    let record = store.insert_case_study(resolved.payload.case_study).await?;
    info!("Stored generated case study {} from {}", record.id, resolved.provider);
    Ok(record)
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::failover::{classify, CompletionOutcome};

    #[test]
    fn prompt_names_query_and_services()
    {   let msgs = build_messages("logistics company using AI", &crate::store::default_services());
        assert!(msgs[1].content.contains("\"logistics company using AI\""));
        assert!(msgs[1].content.contains("- Cloud Migration & Modernization"));
    }

    #[test]
    fn case_study_key_is_required()
    {   assert!(matches!(
          classify::<GeneratedCaseStudy>(r#"{"title":"no wrapper"}"#),
          CompletionOutcome::HardFailure(_)
        ));
        match classify::<GeneratedCaseStudy>(r#"{"caseStudy":{"title":"T","results":["x"]}}"#)
        {   CompletionOutcome::Success(g) => {
              assert_eq!(g.case_study.title, "T");
              assert_eq!(g.case_study.results, vec!["x".to_string()]);
            }
          , other => panic!("unexpected {:?}", other)
        }
    }
}
