use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use poise::serenity_prelude::{ChannelId, GuildId, MessageId, RoleId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::{
    ChannelRequest, ChannelSummary, HistoryMessage, MemberSummary, OutgoingMessage, Platform,
};
use crate::error::{BotError, Result};

/// Every mutating call the fake has seen, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SendMessage {
        channel: ChannelId,
        message: OutgoingMessage,
    },
    SendDirectMessage {
        user: UserId,
        message: OutgoingMessage,
    },
    CreateChannel {
        guild: GuildId,
        id: ChannelId,
        request: ChannelRequest,
    },
    RenameChannel {
        channel: ChannelId,
        name: String,
    },
    DeleteChannel {
        channel: ChannelId,
    },
    AddRole {
        user: UserId,
        role: RoleId,
    },
    Ban {
        user: UserId,
        reason: String,
    },
    Unban {
        user: UserId,
    },
    Kick {
        user: UserId,
        reason: String,
    },
    Timeout {
        user: UserId,
        until: Option<DateTime<Utc>>,
    },
    MoveMember {
        user: UserId,
        channel: ChannelId,
    },
    SetAccess {
        channel: ChannelId,
        user: UserId,
        granted: bool,
    },
}

/// In-memory platform that records calls instead of talking to Discord
pub struct FakePlatform {
    bot_id: UserId,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicU64,
    channels: Mutex<HashMap<ChannelId, ChannelSummary>>,
    members: Mutex<HashMap<UserId, MemberSummary>>,
    roles: Mutex<HashSet<RoleId>>,
    history: Mutex<HashMap<ChannelId, Vec<HistoryMessage>>>,
    occupancy: Mutex<HashMap<ChannelId, usize>>,
    fail_direct_messages: AtomicBool,
    fail_deletes: AtomicBool,
    fail_moves: AtomicBool,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            bot_id: UserId::new(999),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(10_000),
            channels: Mutex::new(HashMap::new()),
            members: Mutex::new(HashMap::new()),
            roles: Mutex::new(HashSet::new()),
            history: Mutex::new(HashMap::new()),
            occupancy: Mutex::new(HashMap::new()),
            fail_direct_messages: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_moves: AtomicBool::new(false),
        }
    }

    pub fn with_member(self, id: u64, name: &str, is_admin: bool) -> Self {
        self.members.lock().insert(
            UserId::new(id),
            MemberSummary {
                user_id: UserId::new(id),
                name: name.to_string(),
                is_bot: false,
                is_admin,
                avatar_url: None,
            },
        );
        self
    }

    pub fn with_role(self, id: u64) -> Self {
        self.roles.lock().insert(RoleId::new(id));
        self
    }

    pub fn with_channel(self, summary: ChannelSummary) -> Self {
        self.channels.lock().insert(summary.id, summary);
        self
    }

    pub fn set_history(&self, channel: ChannelId, messages: Vec<HistoryMessage>) {
        self.history.lock().insert(channel, messages);
    }

    pub fn set_occupancy(&self, channel: ChannelId, count: usize) {
        self.occupancy.lock().insert(channel, count);
    }

    pub fn fail_direct_messages(&self, fail: bool) {
        self.fail_direct_messages.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }

    /// Forget a channel without recording a call, as if deleted by hand
    pub fn drop_channel(&self, channel: ChannelId) {
        self.channels.lock().remove(&channel);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn channel_exists(&self, channel: ChannelId) -> bool {
        self.channels.lock().contains_key(&channel)
    }

    pub fn channel_name(&self, channel: ChannelId) -> Option<String> {
        self.channels.lock().get(&channel).map(|c| c.name.clone())
    }

    pub fn created_channels(&self) -> Vec<(ChannelId, ChannelRequest)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateChannel { id, request, .. } => Some((id, request)),
                _ => None,
            })
            .collect()
    }

    pub fn messages_in(&self, channel: ChannelId) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendMessage { channel: c, message } if c == channel => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn direct_messages_to(&self, user: UserId) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendDirectMessage { user: u, message } if u == user => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for FakePlatform {
    fn bot_user_id(&self) -> UserId {
        self.bot_id
    }

    async fn send_message(&self, channel: ChannelId, message: OutgoingMessage) -> Result<MessageId> {
        self.record(Call::SendMessage { channel, message });
        Ok(MessageId::new(self.next_id()))
    }

    async fn send_direct_message(&self, user: UserId, message: OutgoingMessage) -> Result<()> {
        if self.fail_direct_messages.load(Ordering::SeqCst) {
            return Err(BotError::Discord {
                message: "Cannot send messages to this user".to_string(),
            });
        }
        self.record(Call::SendDirectMessage { user, message });
        Ok(())
    }

    async fn create_channel(&self, guild: GuildId, request: ChannelRequest) -> Result<ChannelId> {
        let id = ChannelId::new(self.next_id());
        self.channels.lock().insert(
            id,
            ChannelSummary {
                id,
                name: request.name.clone(),
                parent_id: request.parent,
            },
        );
        self.record(Call::CreateChannel { guild, id, request });
        Ok(id)
    }

    async fn rename_channel(&self, channel: ChannelId, name: &str) -> Result<()> {
        match self.channels.lock().get_mut(&channel) {
            Some(summary) => summary.name = name.to_string(),
            None => {
                return Err(BotError::ChannelNotFound {
                    id: channel.to_string(),
                })
            }
        }
        self.record(Call::RenameChannel {
            channel,
            name: name.to_string(),
        });
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BotError::Discord {
                message: "Service unavailable".to_string(),
            });
        }
        if self.channels.lock().remove(&channel).is_none() {
            return Err(BotError::ChannelNotFound {
                id: channel.to_string(),
            });
        }
        self.record(Call::DeleteChannel { channel });
        Ok(())
    }

    async fn channel(&self, channel: ChannelId) -> Result<Option<ChannelSummary>> {
        Ok(self.channels.lock().get(&channel).cloned())
    }

    async fn message_history(&self, channel: ChannelId, limit: u8) -> Result<Vec<HistoryMessage>> {
        let history = self.history.lock();
        Ok(history
            .get(&channel)
            .map(|messages| messages.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn member(&self, _guild: GuildId, user: UserId) -> Result<Option<MemberSummary>> {
        Ok(self.members.lock().get(&user).cloned())
    }

    async fn role_exists(&self, _guild: GuildId, role: RoleId) -> Result<bool> {
        Ok(self.roles.lock().contains(&role))
    }

    async fn add_role(&self, _guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.record(Call::AddRole { user, role });
        Ok(())
    }

    async fn ban_member(&self, _guild: GuildId, user: UserId, reason: &str) -> Result<()> {
        self.record(Call::Ban {
            user,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn unban_member(&self, _guild: GuildId, user: UserId) -> Result<()> {
        self.record(Call::Unban { user });
        Ok(())
    }

    async fn kick_member(&self, _guild: GuildId, user: UserId, reason: &str) -> Result<()> {
        self.record(Call::Kick {
            user,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn timeout_member(
        &self,
        _guild: GuildId,
        user: UserId,
        until: Option<DateTime<Utc>>,
        _reason: &str,
    ) -> Result<()> {
        self.record(Call::Timeout { user, until });
        Ok(())
    }

    async fn move_member(&self, _guild: GuildId, user: UserId, channel: ChannelId) -> Result<()> {
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(BotError::Discord {
                message: "Target user is not connected to voice".to_string(),
            });
        }
        self.record(Call::MoveMember { user, channel });
        Ok(())
    }

    async fn voice_occupancy(&self, _guild: GuildId, channel: ChannelId) -> Result<usize> {
        Ok(self.occupancy.lock().get(&channel).copied().unwrap_or(0))
    }

    async fn set_member_access(&self, channel: ChannelId, user: UserId, granted: bool) -> Result<()> {
        self.record(Call::SetAccess {
            channel,
            user,
            granted,
        });
        Ok(())
    }
}
