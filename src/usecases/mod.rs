//! Prompt templates, payload types and exhaustion policy per feature.
//!
//! | use case       | expected key         | all providers exhausted     |
//! |----------------|----------------------|-----------------------------|
//! | recommendation | `serviceSuggestions` | error (HTTP 500)            |
//! | case study     | `caseStudy`          | error (HTTP 500)            |
//! | ROI calculator | `estimatedROI`       | deterministic local estimate|
//! | chat           | free text            | error (HTTP 500)            |

pub mod recommendation;
pub mod case_study;
pub mod roi;
pub mod chat;

/// Persona shared by every prompt
pub const CONSULTANT_PERSONA: &str
  = "You are a senior digital-transformation consultant at a firm that \
     helps mid-sized businesses adopt AI, automation, cloud and data \
     platforms. You are practical, specific and ROI-focused.";

/// One `- item` line per entry
pub(crate) fn bullets<I, S>(items: I) -> String
where
  I: IntoIterator<Item = S>
, S: AsRef<str>
{   items
      .into_iter()
      .map(|s| format!("- {}", s.as_ref()))
      .collect::<Vec<_>>()
      .join("\n")
}
