//! HTTP surface consumed by the marketing site

use std::sync::Arc;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::failover::FallbackOrchestrator;
use crate::store::{
  CaseStudy
, ContactSubmission
, Conversation
, ConversationMessage
, MemStore
, NewContact
, Service
, Store
};
use crate::usecases::chat::ChatExchange;
use crate::usecases::recommendation::ServiceRecommendation;
use crate::usecases::roi::{RoiInput, RoiProjection};
use crate::usecases::{case_study, chat, recommendation, roi};

pub const UNAVAILABLE_MESSAGE: &str = "AI service temporarily unavailable";

/// Everything a handler needs; cheap to clone
#[derive(Clone)]
pub struct AppState
{   pub orchestrator: Arc<FallbackOrchestrator>
  , pub store: Arc<dyn Store>
}

impl AppState
{   pub fn new(
      orchestrator: FallbackOrchestrator
    , store: Arc<dyn Store>
    ) -> Self
    {   AppState
        {   orchestrator: Arc::new(orchestrator)
          , store
        }
    }
}

pub fn router(state: AppState) -> Router
{   Router::new()
      .route("/api/health", get(health))
      .route("/api/services", get(list_services))
      .route("/api/case-studies", get(list_case_studies))
      .route("/api/case-studies/:id", get(get_case_study))
      .route("/api/contact", post(submit_contact))
      .route("/api/ai/service-recommendation", post(service_recommendation))
      .route("/api/ai/generate-case-study", post(generate_case_study))
      .route("/api/ai/roi-calculator", post(roi_calculator))
      .route("/api/conversations", post(create_conversation))
      .route("/api/conversations/:id", get(get_conversation))
      .route("/api/conversations/:id/messages", post(post_message))
      .with_state(state)
}

/// Build providers, chain and store from config, then serve until error
pub async fn serve(config: GatewayConfig) -> Result<()>
{   let providers = crate::providers::from_configs(&config.providers)?;
    let orchestrator = FallbackOrchestrator::new(providers, &config.failover);
    let state = AppState::new(orchestrator, Arc::new(MemStore::seeded()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
      .await
      .map_err(|e| Error::InvalidConfiguration(
        format!("cannot bind {}: {}", config.bind_addr, e)
      ))?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, router(state))
      .await
      .map_err(|e| Error::Other(format!("server error: {}", e)))
}

// ===== Errors =====

impl IntoResponse for Error
{   fn into_response(self) -> Response
    {   let (status, body) = match &self
        {   Error::Validation(msg) => (
              StatusCode::BAD_REQUEST
            , json!({ "message": msg })
            )
          , Error::NotFound(what) => (
              StatusCode::NOT_FOUND
            , json!({ "message": format!("Not found: {}", what) })
            )
          , Error::AllProvidersExhausted { .. } => (
              StatusCode::INTERNAL_SERVER_ERROR
            , json!({
                "message": UNAVAILABLE_MESSAGE
              , "error": "all AI providers are unavailable"
              })
            )
          , other => {
              error!("Unhandled error: {}", other);
              (
                StatusCode::INTERNAL_SERVER_ERROR
              , json!({
                  "message": "Internal server error"
                , "error": "unexpected error"
                })
              )
            }
        };
        (status, Json(body)).into_response()
    }
}

// ===== Validation =====

/// Malformed JSON is a 400 here, not axum's default 422
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T>
{   payload
      .map(|Json(inner)| inner)
      .map_err(|rejection| {
        warn!("Rejected body: {}", rejection.body_text());
        Error::Validation(rejection.body_text())
      })
}

/// Length in characters, inclusive bounds
fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<()>
{   let len = value.chars().count();
    if len < min || len > max
    {   return Err(Error::Validation(format!(
          "{} must be between {} and {} characters"
        , field, min, max
        )));
    }
    Ok(())
}

fn check_required(field: &str, value: &str) -> Result<()>
{   if value.trim().is_empty()
    {   return Err(Error::Validation(format!("{} is required", field)));
    }
    check_len(field, value, 1, 200)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationBody
{   pub business_challenge: String
}

#[derive(Debug, Deserialize)]
pub struct CaseStudyBody
{   pub query: String
}

#[derive(Debug, Deserialize)]
pub struct ChatBody
{   pub message: String
}

#[derive(Debug, Default, Deserialize)]
pub struct NewConversationBody
{   #[serde(default)]
    pub title: Option<String>
}

// ===== Handlers =====

#[derive(Serialize)]
struct ProviderStatus
{   name: &'static str
  , configured: bool
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value>
{   let providers: Vec<ProviderStatus> = state.orchestrator
      .providers()
      .iter()
      .map(|p| ProviderStatus
        {   name: p.provider().as_str()
          , configured: p.is_configured()
        })
      .collect();
    Json(json!({ "status": "ok", "providers": providers }))
}

async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<Service>>>
{   Ok(Json(state.store.list_services().await?))
}

async fn list_case_studies(State(state): State<AppState>) -> Result<Json<Vec<CaseStudy>>>
{   Ok(Json(state.store.list_case_studies().await?))
}

async fn get_case_study(
  Path(id): Path<u64>
, State(state): State<AppState>
) -> Result<Json<CaseStudy>>
{   Ok(Json(state.store.get_case_study(id).await?))
}

async fn submit_contact(
  State(state): State<AppState>
, payload: std::result::Result<Json<NewContact>, JsonRejection>
) -> Result<(StatusCode, Json<ContactSubmission>)>
{   let contact = json_body(payload)?;
    check_len("name", contact.name.trim(), 1, 100)?;
    check_len("email", &contact.email, 3, 254)?;
    if !contact.email.contains('@')
    {   return Err(Error::Validation("email is invalid".to_string()));
    }
    check_len("message", contact.message.trim(), 1, 2000)?;

    let record = state.store.insert_contact(contact).await?;
    info!("Contact submission {} received", record.id);
    Ok((StatusCode::CREATED, Json(record)))
}

async fn service_recommendation(
  State(state): State<AppState>
, payload: std::result::Result<Json<RecommendationBody>, JsonRejection>
) -> Result<Json<ServiceRecommendation>>
{   let req = json_body(payload)?;
    check_len("businessChallenge", &req.business_challenge, 5, 500)?;

    let catalog = state.store.list_services().await?;
    let rec = recommendation::recommend(
      &state.orchestrator
    , &req.business_challenge
    , &catalog
    ).await?;
    Ok(Json(rec))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CaseStudyReply
{   case_study: CaseStudy
}

async fn generate_case_study(
  State(state): State<AppState>
, payload: std::result::Result<Json<CaseStudyBody>, JsonRejection>
) -> Result<Json<CaseStudyReply>>
{   let req = json_body(payload)?;
    check_len("query", &req.query, 5, 500)?;

    let record = case_study::generate(
      &state.orchestrator
    , state.store.as_ref()
    , &req.query
    ).await?;
    Ok(Json(CaseStudyReply { case_study: record }))
}

async fn roi_calculator(
  State(state): State<AppState>
, payload: std::result::Result<Json<RoiInput>, JsonRejection>
) -> Result<Json<RoiProjection>>
{   let input = json_body(payload)?;
    check_required("industry", &input.industry)?;
    check_required("annualRevenue", &input.annual_revenue)?;
    check_required("businessGoal", &input.business_goal)?;
    check_required("automationLevel", &input.automation_level)?;
    check_required("implementationTimeline", &input.implementation_timeline)?;
    if input.team_size == 0
    {   return Err(Error::Validation("teamSize must be at least 1".to_string()));
    }

    Ok(Json(roi::project(&state.orchestrator, &input).await?))
}

async fn create_conversation(
  State(state): State<AppState>
, payload: std::result::Result<Json<NewConversationBody>, JsonRejection>
) -> Result<(StatusCode, Json<Conversation>)>
{   let req = json_body(payload)?;
    let title = req.title
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
      .unwrap_or_else(|| "New conversation".to_string());
    check_len("title", &title, 1, 200)?;

    let conversation = state.store.create_conversation(title).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

#[derive(Serialize)]
struct ConversationReply
{   conversation: Conversation
  , messages: Vec<ConversationMessage>
}

async fn get_conversation(
  Path(id): Path<u64>
, State(state): State<AppState>
) -> Result<Json<ConversationReply>>
{   let conversation = state.store.get_conversation(id).await?;
    let messages = state.store.list_messages(id).await?;
    Ok(Json(ConversationReply { conversation, messages }))
}

async fn post_message(
  Path(id): Path<u64>
, State(state): State<AppState>
, payload: std::result::Result<Json<ChatBody>, JsonRejection>
) -> Result<Json<ChatExchange>>
{   let req = json_body(payload)?;
    check_len("message", &req.message, 1, 1000)?;

    let exchange = chat::reply(
      &state.orchestrator
    , state.store.as_ref()
    , id
    , &req.message
    ).await?;
    Ok(Json(exchange))
}
