//! Inbound activities.
//!
//! An [`Activity`] is the payload of one turn: what arrived from the channel.
//! The routing engine never interprets it beyond what predicates and handlers
//! read from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification of an inbound activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    /// A user message, usually carrying text.
    #[default]
    Message,
    /// Members joined or left the conversation.
    ConversationUpdate,
    /// The user is typing.
    Typing,
    /// The conversation ended.
    EndOfConversation,
    /// A named, channel-specific event.
    Event,
}

impl ActivityKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::ConversationUpdate => "conversationUpdate",
            Self::Typing => "typing",
            Self::EndOfConversation => "endOfConversation",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "message" => Self::Message,
            "conversationupdate" | "conversation_update" => Self::ConversationUpdate,
            "typing" => Self::Typing,
            "endofconversation" | "end_of_conversation" => Self::EndOfConversation,
            "event" => Self::Event,
            _ => return Err(()),
        })
    }
}

/// The inbound payload of a single turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// What kind of activity this is.
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,

    /// Message text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Channel the activity arrived on (e.g. "console", "wechat").
    #[serde(default)]
    pub channel_id: String,

    /// Conversation identifier within the channel.
    #[serde(default)]
    pub conversation_id: String,

    /// Sender identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl Activity {
    /// Creates a message activity with the given text.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: ActivityKind::Message,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Creates a text-less activity of the given kind.
    pub fn of_kind(kind: ActivityKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Sets the channel identifier.
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    /// Sets the conversation identifier.
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = conversation_id.into();
        self
    }

    /// Sets the sender identifier.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Returns `true` for message activities.
    pub fn is_message(&self) -> bool {
        self.kind == ActivityKind::Message
    }

    /// Returns the text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
