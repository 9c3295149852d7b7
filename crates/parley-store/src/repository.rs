use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use parley_types::{Channel, ChannelTable, Message};
use tracing::debug;

use crate::store::ChannelStore;

static LAST_MESSAGE_ID: AtomicI64 = AtomicI64::new(0);

/// Mint a strictly-increasing message id from the Unix-millisecond clock.
///
/// The browser build used `now + random fraction`, which could collide for
/// two messages in the same millisecond. Here the id is `max(now, last + 1)`
/// through a process-wide atomic: still a JSON number, still roughly a
/// timestamp, but unique within the process.
fn next_message_id(now_ms: i64) -> i64 {
    let update =
        LAST_MESSAGE_ID.fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now_ms.max(last + 1))
        });
    match update {
        Ok(prev) | Err(prev) => now_ms.max(prev + 1),
    }
}

/// Domain operations over the channel table.
///
/// Every call is a whole-table read-modify-write against the store; there
/// is no isolation between interleaved callers (last write wins at table
/// granularity). Intended for a single logical session.
pub struct ChannelRepository {
    store: ChannelStore,
}

impl ChannelRepository {
    pub fn new(store: ChannelStore) -> Self {
        Self { store }
    }

    /// The whole table, verbatim from storage.
    pub fn get_all(&self) -> ChannelTable {
        self.store.load()
    }

    /// One channel, or `None` when the id is unknown.
    pub fn get(&self, channel_id: &str) -> Option<Channel> {
        self.store.load().remove(channel_id)
    }

    /// Create a channel with the creator as its only participant. An
    /// existing entry under the same id is silently overwritten.
    pub fn create(&self, channel_id: &str, name: &str, creator_id: &str) -> Channel {
        let mut table = self.store.load();
        let channel = Channel {
            id: channel_id.to_string(),
            name: name.to_string(),
            creator_id: creator_id.to_string(),
            participants: vec![creator_id.to_string()],
            messages: Vec::new(),
            created_at: Utc::now().timestamp_millis(),
        };
        table.insert(channel_id.to_string(), channel.clone());
        self.store.save(&table);
        debug!("Created channel {} ({})", channel_id, name);
        channel
    }

    /// Append a message and return it. Returns `None` without touching
    /// storage when the channel does not exist. Text is stored as given;
    /// trimming and emptiness checks are the caller's concern.
    pub fn add_message(&self, channel_id: &str, user_id: &str, text: &str) -> Option<Message> {
        let mut table = self.store.load();
        let channel = table.get_mut(channel_id)?;

        let now = Utc::now().timestamp_millis();
        let message = Message {
            id: next_message_id(now),
            user_id: user_id.to_string(),
            text: text.to_string(),
            timestamp: now,
        };
        channel.messages.push(message.clone());
        self.store.save(&table);
        Some(message)
    }

    /// Add a participant. Returns `false` when the channel does not exist.
    /// Adding a user who is already a member is a no-op that still reports
    /// success, so the participant list never holds duplicates.
    pub fn add_participant(&self, channel_id: &str, user_id: &str) -> bool {
        let mut table = self.store.load();
        let Some(channel) = table.get_mut(channel_id) else {
            return false;
        };

        if !channel.participants.iter().any(|id| id == user_id) {
            channel.participants.push(user_id.to_string());
            self.store.save(&table);
        }
        true
    }

    /// Remove every occurrence of `user_id` from the participant list.
    /// Returns `false` when the channel does not exist; removing a user who
    /// is not a member succeeds as a no-op. Creator membership is
    /// established at creation and not re-enforced here, so the creator can
    /// leave (or be removed from) their own channel.
    pub fn remove_participant(&self, channel_id: &str, user_id: &str) -> bool {
        let mut table = self.store.load();
        let Some(channel) = table.get_mut(channel_id) else {
            return false;
        };

        channel.participants.retain(|id| id != user_id);
        self.store.save(&table);
        true
    }

    /// True iff the channel exists and was created by `user_id`.
    pub fn is_creator(&self, channel_id: &str, user_id: &str) -> bool {
        self.get(channel_id)
            .is_some_and(|channel| channel.creator_id == user_id)
    }
}
