//! Process-lifetime record store.
//!
//! `Store` is the seam a persistent backend would plug into. `MemStore`
//! keeps everything in one tokio task that owns the maps and id counters;
//! callers only hold a command sender, so there is no shared lock.

use std::collections::BTreeMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::request::Role;

// ===== Records =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service
{   pub id: u64
  , pub slug: String
  , pub title: String
  , pub category: String
  , pub summary: String
  , pub features: Vec<String>
}

/// Case study body; also the shape the model is asked to produce
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseStudyDetails
{   pub title: String
  , pub client: String
  , pub industry: String
  , pub challenge: String
  , pub solution: String
  , pub results: Vec<String>
  , pub technologies: Vec<String>
  , pub duration: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStudy
{   pub id: u64
  , #[serde(flatten)]
    pub details: CaseStudyDetails
  , pub created_at: DateTime<Utc>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation
{   pub id: u64
  , pub title: String
  , pub created_at: DateTime<Utc>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage
{   pub id: u64
  , pub conversation_id: u64
  , pub role: Role
  , pub content: String
  , pub created_at: DateTime<Utc>
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact
{   pub name: String
  , pub email: String
  , #[serde(default)]
    pub company: Option<String>
  , pub message: String
  , #[serde(default)]
    pub interests: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission
{   pub id: u64
  , #[serde(flatten)]
    pub contact: NewContact
  , pub created_at: DateTime<Utc>
}

// ===== Store interface =====

#[async_trait]
pub trait Store: Send + Sync
{   async fn list_services(&self) -> Result<Vec<Service>>;

    async fn list_case_studies(&self) -> Result<Vec<CaseStudy>>;

    /// `Error::NotFound` for unknown ids
    async fn get_case_study(&self, id: u64) -> Result<CaseStudy>;

    async fn insert_case_study(
      &self
    , details: CaseStudyDetails
    ) -> Result<CaseStudy>;

    async fn create_conversation(&self, title: String) -> Result<Conversation>;

    /// `Error::NotFound` for unknown ids
    async fn get_conversation(&self, id: u64) -> Result<Conversation>;

    /// Oldest first
    async fn list_messages(
      &self
    , conversation_id: u64
    ) -> Result<Vec<ConversationMessage>>;

    /// `Error::NotFound` when the conversation does not exist
    async fn append_message(
      &self
    , conversation_id: u64
    , role: Role
    , content: String
    ) -> Result<ConversationMessage>;

    async fn insert_contact(
      &self
    , contact: NewContact
    ) -> Result<ContactSubmission>;
}

// ===== MemStore actor =====

/// Commands for the MemStore actor
enum StoreCommand
{   ListServices
    {   reply: oneshot::Sender<Vec<Service>>
    }
  , ListCaseStudies
    {   reply: oneshot::Sender<Vec<CaseStudy>>
    }
  , GetCaseStudy
    {   id: u64
      , reply: oneshot::Sender<Result<CaseStudy>>
    }
  , InsertCaseStudy
    {   details: CaseStudyDetails
      , reply: oneshot::Sender<CaseStudy>
    }
  , CreateConversation
    {   title: String
      , reply: oneshot::Sender<Conversation>
    }
  , GetConversation
    {   id: u64
      , reply: oneshot::Sender<Result<Conversation>>
    }
  , ListMessages
    {   conversation_id: u64
      , reply: oneshot::Sender<Vec<ConversationMessage>>
    }
  , AppendMessage
    {   conversation_id: u64
      , role: Role
      , content: String
      , reply: oneshot::Sender<Result<ConversationMessage>>
    }
  , InsertContact
    {   contact: NewContact
      , reply: oneshot::Sender<ContactSubmission>
    }
  , Shutdown
}

/// Actor-owned state
#[derive(Default)]
struct MemStoreState
{   services: BTreeMap<u64, Service>
  , case_studies: BTreeMap<u64, CaseStudy>
  , conversations: BTreeMap<u64, Conversation>
  , messages: BTreeMap<u64, ConversationMessage>
  , contacts: BTreeMap<u64, ContactSubmission>
  , next_case_study_id: u64
  , next_conversation_id: u64
  , next_message_id: u64
  , next_contact_id: u64
}

fn bump(counter: &mut u64) -> u64
{   *counter += 1;
    *counter
}

impl MemStoreState
{   fn new(services: Vec<Service>, case_studies: Vec<CaseStudyDetails>) -> Self
    {   let mut state = MemStoreState
        {   services: services.into_iter().map(|s| (s.id, s)).collect()
          , ..Default::default()
        };
        for details in case_studies
        {   state.insert_case_study(details);
        }
        state
    }

    fn insert_case_study(&mut self, details: CaseStudyDetails) -> CaseStudy
    {   let record = CaseStudy
        {   id: bump(&mut self.next_case_study_id)
          , details
          , created_at: Utc::now()
        };
        trace!("Stored case study {}", record.id);
        self.case_studies.insert(record.id, record.clone());
        record
    }

    fn create_conversation(&mut self, title: String) -> Conversation
    {   let record = Conversation
        {   id: bump(&mut self.next_conversation_id)
          , title
          , created_at: Utc::now()
        };
        self.conversations.insert(record.id, record.clone());
        record
    }

    fn append_message(
      &mut self
    , conversation_id: u64
    , role: Role
    , content: String
    ) -> Result<ConversationMessage>
    {   if !self.conversations.contains_key(&conversation_id)
        {   return Err(Error::NotFound(
              format!("conversation {}", conversation_id)
            ));
        }
        let record = ConversationMessage
        {   id: bump(&mut self.next_message_id)
          , conversation_id
          , role
          , content
          , created_at: Utc::now()
        };
        self.messages.insert(record.id, record.clone());
        Ok(record)
    }

    fn insert_contact(&mut self, contact: NewContact) -> ContactSubmission
    {   let record = ContactSubmission
        {   id: bump(&mut self.next_contact_id)
          , contact
          , created_at: Utc::now()
        };
        self.contacts.insert(record.id, record.clone());
        record
    }
}

/// In-memory `Store`; must be created inside a tokio runtime
pub struct MemStore
{   tx: mpsc::UnboundedSender<StoreCommand>
  , _task: tokio::task::JoinHandle<()>
}

impl MemStore
{   /// Empty store
    pub fn new() -> Self
    {   Self::with_records(vec![], vec![])
    }

    /// Store seeded with the service catalog and sample case studies
    pub fn seeded() -> Self
    {   Self::with_records(default_services(), default_case_studies())
    }

    pub fn with_records(
      services: Vec<Service>
    , case_studies: Vec<CaseStudyDetails>
    ) -> Self
    {   debug!(
          "Creating MemStore with {} services, {} case studies"
        , services.len()
        , case_studies.len()
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let state = MemStoreState::new(services, case_studies);
        let _task = tokio::spawn(async move {
          run_store_loop(rx, state).await;
        });
        MemStore { tx, _task }
    }

    /// Stop the actor; later calls fail with a disconnected error
    pub fn shutdown(&self) -> Result<()>
    {   debug!("Shutting down MemStore");
        self.tx.send(StoreCommand::Shutdown)
          .map_err(|_| Error::Other("Store already shutdown".to_string()))
    }

    async fn request<R>(
      &self
    , make: impl FnOnce(oneshot::Sender<R>) -> StoreCommand
    ) -> Result<R>
    {   let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| {
          error!("Store actor disconnected");
          Error::Other("Store disconnected".to_string())
        })?;
        rx.await.map_err(|_| {
          error!("Store actor dropped reply");
          Error::Other("Store disconnected".to_string())
        })
    }
}

impl Default for MemStore
{   fn default() -> Self
    {   Self::new()
    }
}

#[async_trait]
impl Store for MemStore
{   async fn list_services(&self) -> Result<Vec<Service>>
    {   self.request(|reply| StoreCommand::ListServices { reply }).await
    }

    async fn list_case_studies(&self) -> Result<Vec<CaseStudy>>
    {   self.request(|reply| StoreCommand::ListCaseStudies { reply }).await
    }

    async fn get_case_study(&self, id: u64) -> Result<CaseStudy>
    {   self.request(|reply| StoreCommand::GetCaseStudy { id, reply }).await?
    }

    async fn insert_case_study(
      &self
    , details: CaseStudyDetails
    ) -> Result<CaseStudy>
    {   self.request(|reply| StoreCommand::InsertCaseStudy { details, reply }).await
    }

    async fn create_conversation(&self, title: String) -> Result<Conversation>
    {   self.request(|reply| StoreCommand::CreateConversation { title, reply }).await
    }

    async fn get_conversation(&self, id: u64) -> Result<Conversation>
    {   self.request(|reply| StoreCommand::GetConversation { id, reply }).await?
    }

    async fn list_messages(
      &self
    , conversation_id: u64
    ) -> Result<Vec<ConversationMessage>>
    {   self.request(|reply| StoreCommand::ListMessages { conversation_id, reply }).await
    }

    async fn append_message(
      &self
    , conversation_id: u64
    , role: Role
    , content: String
    ) -> Result<ConversationMessage>
    {   self.request(|reply| StoreCommand::AppendMessage
        {   conversation_id
          , role
          , content
          , reply
        }).await?
    }

    async fn insert_contact(
      &self
    , contact: NewContact
    ) -> Result<ContactSubmission>
    {   self.request(|reply| StoreCommand::InsertContact { contact, reply }).await
    }
}

/// Main store event loop
async fn run_store_loop(
  mut rx: mpsc::UnboundedReceiver<StoreCommand>
, mut state: MemStoreState
)
{   debug!("Starting MemStore loop");

    loop
    { match rx.recv().await
      {   Some(StoreCommand::ListServices { reply }) => {
            let _ = reply.send(state.services.values().cloned().collect());
          }
        , Some(StoreCommand::ListCaseStudies { reply }) => {
            let _ = reply.send(state.case_studies.values().cloned().collect());
          }
        , Some(StoreCommand::GetCaseStudy { id, reply }) => {
            let result = state.case_studies.get(&id).cloned()
              .ok_or_else(|| Error::NotFound(format!("case study {}", id)));
            let _ = reply.send(result);
          }
        , Some(StoreCommand::InsertCaseStudy { details, reply }) => {
            let _ = reply.send(state.insert_case_study(details));
          }
        , Some(StoreCommand::CreateConversation { title, reply }) => {
            let _ = reply.send(state.create_conversation(title));
          }
        , Some(StoreCommand::GetConversation { id, reply }) => {
            let result = state.conversations.get(&id).cloned()
              .ok_or_else(|| Error::NotFound(format!("conversation {}", id)));
            let _ = reply.send(result);
          }
        , Some(StoreCommand::ListMessages { conversation_id, reply }) => {
            let messages = state.messages
              .values()
              .filter(|m| m.conversation_id == conversation_id)
              .cloned()
              .collect();
            let _ = reply.send(messages);
          }
        , Some(StoreCommand::AppendMessage {
            conversation_id, role, content, reply
          }) => {
            let _ = reply.send(state.append_message(conversation_id, role, content));
          }
        , Some(StoreCommand::InsertContact { contact, reply }) => {
            let _ = reply.send(state.insert_contact(contact));
          }
        , Some(StoreCommand::Shutdown) => {
            info!("MemStore shutting down");
            break;
          }
        , None => {
            debug!("Store channel closed");
            break;
          }
      }
    }
}

// ===== Seed data =====

fn service(
  id: u64
, slug: &str
, title: &str
, category: &str
, summary: &str
, features: &[&str]
) -> Service
{   Service
    {   id
      , slug: slug.to_string()
      , title: title.to_string()
      , category: category.to_string()
      , summary: summary.to_string()
      , features: features.iter().map(|f| f.to_string()).collect()
    }
}

/// Service catalog offered by the consultancy
pub fn default_services() -> Vec<Service>
{   vec![
      service(1, "ai-strategy", "AI Strategy & Implementation", "AI"
      , "Identify high-value AI use cases and take them from pilot to production."
      , &["AI readiness assessment", "Use-case prioritisation", "Model deployment and MLOps"])
    , service(2, "process-automation", "Intelligent Process Automation", "Automation"
      , "Automate repetitive workflows with RPA, integrations and AI agents."
      , &["Process mining", "RPA bots", "Workflow orchestration"])
    , service(3, "cloud-migration", "Cloud Migration & Modernization", "Cloud"
      , "Move legacy systems to scalable cloud platforms with minimal disruption."
      , &["Migration roadmap", "Containerisation", "Cost optimisation"])
    , service(4, "data-analytics", "Data Analytics & BI", "Data"
      , "Unify data sources and turn them into dashboards and forecasts."
      , &["Data warehouse design", "Self-service BI", "Predictive analytics"])
    , service(5, "custom-software", "Custom Software Development", "Engineering"
      , "Design and build web, mobile and internal platforms around your processes."
      , &["Product discovery", "Full-stack delivery", "API integrations"])
    , service(6, "cybersecurity", "Cybersecurity & Compliance", "Security"
      , "Harden infrastructure and meet regulatory requirements as you transform."
      , &["Security audits", "Zero-trust architecture", "Compliance automation"])
    ]
}

fn default_case_studies() -> Vec<CaseStudyDetails>
{   vec![
      CaseStudyDetails
      {   title: "Automating claims intake for a regional insurer".to_string()
        , client: "Regional insurance carrier".to_string()
        , industry: "Insurance".to_string()
        , challenge: "Manual claims triage took three days per claim.".to_string()
        , solution: "Document AI extraction feeding an automated routing workflow.".to_string()
        , results: vec![
            "Triage time reduced from 3 days to 4 hours".to_string()
          , "42% lower processing cost".to_string()
          ]
        , technologies: vec!["Azure AI Document Intelligence".to_string(), "Power Automate".to_string()]
        , duration: "5 months".to_string()
      }
    , CaseStudyDetails
      {   title: "Cloud-native inventory platform for a retailer".to_string()
        , client: "Mid-market retail chain".to_string()
        , industry: "Retail".to_string()
        , challenge: "Nightly batch inventory sync caused frequent stock-outs.".to_string()
        , solution: "Event-driven inventory service on Kubernetes with real-time sync.".to_string()
        , results: vec![
            "Stock-outs down 30%".to_string()
          , "Infrastructure cost down 25%".to_string()
          ]
        , technologies: vec!["Kubernetes".to_string(), "Kafka".to_string(), "PostgreSQL".to_string()]
        , duration: "8 months".to_string()
      }
    ]
}

#[cfg(test)]
mod tests
{   use super::*;

    #[tokio::test]
    async fn seeded_store_lists_catalog_and_case_studies()
    {   let store = MemStore::seeded();
        assert_eq!(store.list_services().await.unwrap().len(), 6);
        let studies = store.list_case_studies().await.unwrap();
        assert_eq!(studies.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn ids_auto_increment()
    {   let store = MemStore::new();
        let a = store.insert_case_study(CaseStudyDetails::default()).await.unwrap();
        let b = store.insert_case_study(CaseStudyDetails::default()).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.get_case_study(2).await.unwrap(), b);
        assert_eq!(
          store.get_case_study(3).await.unwrap_err(),
          Error::NotFound("case study 3".to_string())
        );
    }

    #[tokio::test]
    async fn messages_belong_to_existing_conversations()
    {   let store = MemStore::new();
        let convo = store.create_conversation("Intro".to_string()).await.unwrap();
        store.append_message(convo.id, Role::User, "hi".to_string()).await.unwrap();
        store.append_message(convo.id, Role::Assistant, "hello".to_string()).await.unwrap();

        let history = store.list_messages(convo.id).await.unwrap();
        assert_eq!(
          history.iter().map(|m| m.role).collect::<Vec<_>>(),
          vec![Role::User, Role::Assistant]
        );

        let err = store
          .append_message(99, Role::User, "lost".to_string())
          .await
          .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn shutdown_disconnects_callers()
    {   let store = MemStore::new();
        store.shutdown().unwrap();
        let err = store.list_services().await.unwrap_err();
        assert_eq!(err, Error::Other("Store disconnected".to_string()));
    }

    #[test]
    fn case_study_serializes_flat_camel_case()
    {   let record = CaseStudy
        {   id: 7
          , details: CaseStudyDetails
            {   title: "T".to_string()
              , ..Default::default()
            }
          , created_at: Utc::now()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["title"], "T");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("details").is_none());
    }
}
