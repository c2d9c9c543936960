//! ROI projection, with a rule-based estimate when no provider answers

use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::failover::{FallbackOrchestrator, Payload};
use crate::request::{CompletionOptions, Message};

/// Calculator form as posted by the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiInput
{   pub industry: String
  , pub annual_revenue: String
  , pub business_goal: String
  , pub team_size: u32
  , pub automation_level: String
  , pub implementation_timeline: String
}

/// `{"estimatedROI": ..., ...}`; numbers may arrive as `"250%"` or `"$1.2M"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiProjection
{   #[serde(rename = "estimatedROI", deserialize_with = "amount")]
    pub estimated_roi: f64
  , #[serde(default, deserialize_with = "amount_or_zero")]
    pub cost_reduction: f64
  , #[serde(default, deserialize_with = "months_or_zero")]
    pub timeline_months: u32
  , #[serde(default, deserialize_with = "amount_or_zero")]
    pub potential_savings: f64
  , #[serde(default)]
    pub key_benefits: Vec<String>
  , #[serde(default)]
    pub summary: String
  , /// Set when the numbers come from the local table, not a model
    #[serde(default)]
    pub is_estimate: bool
}

impl Payload for RoiProjection
{   const EXPECTED_KEY: &'static str = "estimatedROI";
}

/// Parse `360`, `"360%"`, `"$540,000"`, `"1.2M"`, `"75k"`
pub fn parse_amount(raw: &str) -> Option<f64>
{   let cleaned: String = raw
      .chars()
      .filter(|c| !matches!(c, '$' | ',' | '%' | ' ' | '+'))
      .collect();
    let (digits, scale) = match cleaned.chars().last()
    {   Some('k') | Some('K') => (&cleaned[..cleaned.len() - 1], 1e3)
      , Some('m') | Some('M') => (&cleaned[..cleaned.len() - 1], 1e6)
      , Some('b') | Some('B') => (&cleaned[..cleaned.len() - 1], 1e9)
      , _ => (cleaned.as_str(), 1.0)
    };
    digits.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v * scale)
}

fn value_to_amount(value: &serde_json::Value) -> Option<f64>
{   match value
    {   serde_json::Value::Number(n) => n.as_f64()
      , serde_json::Value::String(s) => parse_amount(s)
      , _ => None
    }
}

fn amount<'de, D>(d: D) -> std::result::Result<f64, D::Error>
where
  D: Deserializer<'de>
{   let value = serde_json::Value::deserialize(d)?;
    value_to_amount(&value).ok_or_else(|| {
      serde::de::Error::custom(format!("not an amount: {}", value))
    })
}

fn amount_or_zero<'de, D>(d: D) -> std::result::Result<f64, D::Error>
where
  D: Deserializer<'de>
{   let value = serde_json::Value::deserialize(d)?;
    Ok(value_to_amount(&value).unwrap_or(0.0))
}

fn months_or_zero<'de, D>(d: D) -> std::result::Result<u32, D::Error>
where
  D: Deserializer<'de>
{   let value = serde_json::Value::deserialize(d)?;
    let months = value_to_amount(&value)
      .or_else(|| value.as_str().and_then(leading_number))
      .unwrap_or(0.0);
    Ok(if months > 0.0 { months.round() as u32 } else { 0 })
}

/// `"6 months"` -> 6
fn leading_number(s: &str) -> Option<f64>
{   s.split_whitespace().next().and_then(parse_amount)
}

pub fn build_messages(input: &RoiInput) -> Vec<Message>
{   let RoiInput
    {   industry
      , annual_revenue
      , business_goal
      , team_size
      , automation_level
      , implementation_timeline
    } = input;
    vec![
      Message::system(super::CONSULTANT_PERSONA)
    , Message::user(format!(
"Estimate the return on a digital-transformation programme for this business:
- Industry: {industry}
- Annual revenue: {annual_revenue}
- Primary goal: {business_goal}
- Team size: {team_size}
- Current automation level: {automation_level}
- Desired timeline: {implementation_timeline}

Respond in JSON with numeric values:
{{
  \"estimatedROI\": 250,
  \"costReduction\": 120000,
  \"timelineMonths\": 6,
  \"potentialSavings\": 360000,
  \"keyBenefits\": [\"benefit\", \"benefit\", \"benefit\"],
  \"summary\": \"two sentences\"
}}
estimatedROI is a percentage; money values are in USD per year except potentialSavings, which covers three years."
      ))
    ]
}

// ===== Local estimate =====

/// Base ROI percentage: less automation today means more headroom
pub fn base_roi(automation_level: &str) -> f64
{   match automation_level.trim().to_ascii_lowercase().as_str()
    {   "very low" => 300.0
      , "low" => 250.0
      , "medium" => 200.0
      , "high" => 150.0
      , "very high" => 100.0
      , _ => 200.0
    }
}

fn timeline_key(timeline: &str) -> String
{   timeline.to_ascii_lowercase().chars().filter(|c| !c.is_whitespace()).collect()
}

/// (urgency multiplier, months to value)
pub fn timeline_factors(timeline: &str) -> (f64, u32)
{   match timeline_key(timeline).as_str()
    {   "asap" => (1.2, 3)
      , "1-3months" => (1.1, 3)
      , "3-6months" => (1.0, 6)
      , "6-12months" => (0.9, 12)
      , "12+months" => (0.8, 18)
      , _ => (1.0, 6)
    }
}

/// (revenue estimate in USD, ROI multiplier), by substring of the bracket label
pub fn revenue_bracket(annual_revenue: &str) -> (f64, f64)
{   let key: String = annual_revenue
      .to_ascii_lowercase()
      .chars()
      .filter(|c| !matches!(c, '$' | ' ' | ','))
      .collect();

    if key.contains("50m+") || key.contains("over50m") || key.contains(">50m")
    {   (75_000_000.0, 0.85)
    } else if key.contains("10m-50m")
    {   (30_000_000.0, 0.9)
    } else if key.contains("5m-10m")
    {   (7_500_000.0, 0.95)
    } else if key.contains("1m-5m")
    {   (3_000_000.0, 1.0)
    } else if key.contains("under1m") || key.contains("<1m") || key.contains("0-1m")
    {   (500_000.0, 1.1)
    } else
    {   (1_000_000.0, 1.0)
    }
}

fn goal_benefits(goal: &str) -> Vec<String>
{   let goal = goal.to_ascii_lowercase();
    let benefits: &[&str] = if goal.contains("cost")
    {   &["Lower operating costs", "Fewer manual errors", "Leaner back-office processes"]
    } else if goal.contains("growth") || goal.contains("revenue") || goal.contains("sales")
    {   &["Faster time to market", "Higher conversion from better data", "Capacity to scale without new headcount"]
    } else if goal.contains("customer")
    {   &["Faster response times", "Personalised customer journeys", "Higher retention"]
    } else if goal.contains("efficien") || goal.contains("productiv")
    {   &["Hours returned to high-value work", "Shorter cycle times", "Consistent process quality"]
    } else
    {   &["Reduced manual workload", "Better decisions from unified data", "A platform ready for future AI initiatives"]
    };
    benefits.iter().map(|b| b.to_string()).collect()
}

/// Deterministic projection, no model involved:
/// `round(base × urgency × revenue multiplier)` percent,
/// cost reduction = revenue × ROI/100 × 0.05, savings over three years.
pub fn estimate_roi(input: &RoiInput) -> RoiProjection
{   let base = base_roi(&input.automation_level);
    let (urgency, months) = timeline_factors(&input.implementation_timeline);
    let (revenue, revenue_mult) = revenue_bracket(&input.annual_revenue);

    let estimated_roi = (base * urgency * revenue_mult).round();
    let cost_reduction = (revenue * estimated_roi / 100.0 * 0.05).round();

    RoiProjection
    {   estimated_roi
      , cost_reduction
      , timeline_months: months
      , potential_savings: cost_reduction * 3.0
      , key_benefits: goal_benefits(&input.business_goal)
      , summary: format!(
          "Based on typical {} engagements at your automation level, \
           we project roughly {}% ROI within {} months."
        , input.industry, estimated_roi, months
        )
      , is_estimate: true
    }
}

/// AI projection, or the local estimate when every provider is out
pub async fn project(
  orchestrator: &FallbackOrchestrator
, input: &RoiInput
) -> Result<RoiProjection>
{   let messages = build_messages(input);
    match orchestrator
      .resolve::<RoiProjection>(&messages, &CompletionOptions::json())
      .await
    {   Ok(resolved) => {
          let mut projection = resolved.payload;
          projection.is_estimate = false;
          Ok(projection)
        }
      , Err(Error::AllProvidersExhausted { last_reason }) => {
          warn!("ROI falling back to local estimate: {}", last_reason);
          let projection = estimate_roi(input);
          info!("Local ROI estimate {}%", projection.estimated_roi);
          Ok(projection)
        }
      , Err(e) => Err(e)
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    fn input(level: &str, timeline: &str, revenue: &str) -> RoiInput
    {   RoiInput
        {   industry: "Manufacturing".to_string()
          , annual_revenue: revenue.to_string()
          , business_goal: "Reduce costs".to_string()
          , team_size: 40
          , automation_level: level.to_string()
          , implementation_timeline: timeline.to_string()
        }
    }

    #[test]
    fn very_low_asap_one_to_five_million()
    {   let p = estimate_roi(&input("Very Low", "ASAP", "$1M-5M"));
        assert_eq!(p.estimated_roi, 360.0);
        assert_eq!(p.cost_reduction, 540_000.0);
        assert_eq!(p.potential_savings, 1_620_000.0);
        assert_eq!(p.timeline_months, 3);
        assert!(p.is_estimate);
    }

    #[test]
    fn medium_six_to_twelve_months_ten_to_fifty_million()
    {   let p = estimate_roi(&input("Medium", "6-12 months", "$10M-50M"));
        assert_eq!(p.estimated_roi, 162.0);
        assert_eq!(p.cost_reduction, 2_430_000.0);
        assert_eq!(p.timeline_months, 12);
    }

    #[test]
    fn very_high_three_to_six_months_under_one_million()
    {   let p = estimate_roi(&input("Very High", "3-6 months", "Under $1M"));
        assert_eq!(p.estimated_roi, 110.0);
        assert_eq!(p.cost_reduction, 27_500.0);
        assert_eq!(p.potential_savings, 82_500.0);
    }

    #[test]
    fn high_long_horizon_large_revenue()
    {   let p = estimate_roi(&input("High", "12+ months", "$50M+"));
        assert_eq!(p.estimated_roi, 102.0);
        assert_eq!(p.cost_reduction, 3_825_000.0);
        assert_eq!(p.timeline_months, 18);
    }

    #[test]
    fn low_one_to_three_months_five_to_ten_million()
    {   let p = estimate_roi(&input("Low", "1-3 months", "$5M-10M"));
        assert_eq!(p.estimated_roi, 261.0);
        assert_eq!(p.cost_reduction, 978_750.0);
    }

    #[test]
    fn unknown_labels_use_neutral_defaults()
    {   let p = estimate_roi(&input("Somewhat", "whenever", "undisclosed"));
        assert_eq!(p.estimated_roi, 200.0);
        assert_eq!(p.cost_reduction, 100_000.0);
        assert_eq!(p.timeline_months, 6);
    }

    #[test]
    fn estimate_is_deterministic()
    {   let i = input("Low", "ASAP", "1M-5M");
        assert_eq!(estimate_roi(&i), estimate_roi(&i));
    }

    #[test]
    fn ai_numbers_are_lenient()
    {   let p: RoiProjection = serde_json::from_str(r#"{
          "estimatedROI": "250%",
          "costReduction": "$1.2M",
          "timelineMonths": "6 months",
          "potentialSavings": "n/a"
        }"#).unwrap();
        assert_eq!(p.estimated_roi, 250.0);
        assert_eq!(p.cost_reduction, 1_200_000.0);
        assert_eq!(p.timeline_months, 6);
        assert_eq!(p.potential_savings, 0.0);
        assert!(!p.is_estimate);
    }

    #[test]
    fn unreadable_roi_is_rejected()
    {   assert!(serde_json::from_str::<RoiProjection>(r#"{"estimatedROI":"high"}"#).is_err());
    }

    #[test]
    fn serializes_with_site_field_names()
    {   let json = serde_json::to_value(estimate_roi(&input("Low", "ASAP", "1M-5M"))).unwrap();
        assert!(json.get("estimatedROI").is_some());
        assert!(json.get("costReduction").is_some());
        assert_eq!(json["isEstimate"], true);
    }
}
