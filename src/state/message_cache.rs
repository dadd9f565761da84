//! Recently seen guild messages.
//!
//! The gateway only ships message ids on delete and the new content on edit,
//! so the event log keeps its own bounded copy of recent messages to be able
//! to show what was removed or changed.

use dashmap::DashMap;
use parking_lot::Mutex;
use poise::serenity_prelude::{ChannelId, MessageId, UserId};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub content: String,
}

/// Bounded message cache, oldest entries evicted first
pub struct MessageCache {
    messages: DashMap<MessageId, CachedMessage>,
    /// Insertion order for eviction
    order: Mutex<VecDeque<MessageId>>,
    max_entries: usize,
}

impl MessageCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            messages: DashMap::new(),
            order: Mutex::new(VecDeque::with_capacity(max_entries)),
            max_entries: max_entries.max(1),
        }
    }

    pub fn insert(&self, message: CachedMessage) {
        let id = message.id;
        if self.messages.insert(id, message).is_some() {
            return;
        }

        let mut order = self.order.lock();
        order.push_back(id);
        while order.len() > self.max_entries {
            if let Some(evicted) = order.pop_front() {
                self.messages.remove(&evicted);
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, id: MessageId) -> Option<CachedMessage> {
        self.messages.get(&id).map(|m| m.clone())
    }

    /// Swap in new content, returning the previous copy
    pub fn update_content(&self, id: MessageId, content: &str) -> Option<CachedMessage> {
        let mut entry = self.messages.get_mut(&id)?;
        let previous = entry.clone();
        entry.content = content.to_string();
        Some(previous)
    }

    pub fn take(&self, id: MessageId) -> Option<CachedMessage> {
        let removed = self.messages.remove(&id).map(|(_, m)| m);
        if removed.is_some() {
            self.order.lock().retain(|m| *m != id);
        }
        removed
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

/// Shared message cache type
pub type SharedMessageCache = Arc<MessageCache>;

pub fn create_message_cache(max_entries: usize) -> SharedMessageCache {
    Arc::new(MessageCache::new(max_entries))
}
