use log::debug;
use serde::Serialize;

use crate::error::Result;
use crate::failover::FallbackOrchestrator;
use crate::request::{CompletionOptions, Message, Role};
use crate::store::{Conversation, ConversationMessage, Store};

/// Most recent stored turns sent along with a new message
pub const HISTORY_WINDOW: usize = 20;

pub const CHAT_INSTRUCTIONS: &str
  = "Answer questions from website visitors about digital transformation \
     and our services. Keep replies under 150 words, plain text, no JSON. \
     Suggest booking a consultation when the visitor describes a concrete \
     project.";

/// Reply body for a posted chat message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatExchange
{   pub message: ConversationMessage
  , pub conversation: Conversation
}

/// System prompt, the newest stored turns, then the visitor's new message.
/// Stored turns and the new one together stay within `HISTORY_WINDOW`.
pub fn build_messages(history: &[ConversationMessage], text: &str) -> Vec<Message>
{   let skip = (history.len() + 1).saturating_sub(HISTORY_WINDOW);
    let mut messages = vec![Message::system(format!(
      "{}\n\n{}"
    , super::CONSULTANT_PERSONA
    , CHAT_INSTRUCTIONS
    ))];
    messages.extend(
      history
        .iter()
        .skip(skip)
        .filter(|m| m.role != Role::System)
        .map(|m| Message { role: m.role, content: m.content.clone() })
    );
    messages.push(Message::user(text));
    messages
}

/// Ask the chain, then store the visitor's message and the reply together.
/// No JSON mode; exhaustion propagates and leaves the conversation untouched.
pub async fn reply(
  orchestrator: &FallbackOrchestrator
, store: &dyn Store
, conversation_id: u64
, text: &str
) -> Result<ChatExchange>
{   let conversation = store.get_conversation(conversation_id).await?;
    let history = store.list_messages(conversation_id).await?;
    debug!("Conversation {} has {} turns", conversation_id, history.len());

    let resolved = orchestrator
      .resolve_text(&build_messages(&history, text), &CompletionOptions::default())
      .await?;

    store
      .append_message(conversation_id, Role::User, text.to_string())
      .await?;
    let message = store
      .append_message(conversation_id, Role::Assistant, resolved.payload)
      .await?;
    Ok(ChatExchange { message, conversation })
}

#[cfg(test)]
mod tests
{   use super::*;
    use chrono::Utc;

    fn turn(id: u64, role: Role) -> ConversationMessage
    {   ConversationMessage
        {   id
          , conversation_id: 1
          , role
          , content: format!("turn {}", id)
          , created_at: Utc::now()
        }
    }

    #[test]
    fn history_is_windowed_after_system_prompt()
    {   let history: Vec<_> = (1..=25)
          .map(|i| turn(i, if i % 2 == 1 { Role::User } else { Role::Assistant }))
          .collect();
        let msgs = build_messages(&history, "turn 26");
        assert_eq!(msgs.len(), HISTORY_WINDOW + 1);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].content, "turn 7");
        assert_eq!(msgs[HISTORY_WINDOW - 1].content, "turn 25");
        assert_eq!(msgs.last(), Some(&Message::user("turn 26")));
    }

    #[test]
    fn empty_history_sends_only_the_new_turn()
    {   let msgs = build_messages(&[], "hello?");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1], Message::user("hello?"));
    }
}
