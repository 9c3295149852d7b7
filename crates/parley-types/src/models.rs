use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An entry in the static user directory.
///
/// Users come from a fixture shipped with the application and are never
/// written to the channel store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub avatar: String,
}

/// A single chat message.
///
/// Serialized field names (`id`, `userId`, `text`, `timestamp`) are part of
/// the persisted format and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub user_id: String,
    pub text: String,
    /// Unix milliseconds.
    pub timestamp: i64,
}

/// A named conversation: a creator, an ordered participant list, and an
/// append-only message log.
///
/// Serialized field names (`id`, `name`, `creatorId`, `participants`,
/// `messages`, `createdAt`) are part of the persisted format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub participants: Vec<String>,
    pub messages: Vec<Message>,
    /// Unix milliseconds.
    pub created_at: i64,
}

/// The entire persisted document: channel id -> channel, stored as one
/// serialized blob under one fixed key.
pub type ChannelTable = HashMap<String, Channel>;
