//! Joins messages with the profile summaries of the users they reference.

use std::collections::HashMap;

use super::dto::{Message, MessageDetail, ReceivedMessage, SentMessage};
use crate::{
    store::StoreResult,
    users::{dto::UserSummary, repo::UserStore},
};

/// Caches lookups so a mailbox with many messages from one sender costs one query.
struct Summaries<'a> {
    users: &'a dyn UserStore,
    seen: HashMap<String, UserSummary>,
}

impl<'a> Summaries<'a> {
    fn new(users: &'a dyn UserStore) -> Self {
        Self {
            users,
            seen: HashMap::new(),
        }
    }

    async fn get(&mut self, username: &str) -> StoreResult<UserSummary> {
        if let Some(found) = self.seen.get(username) {
            return Ok(found.clone());
        }
        let summary: UserSummary = self.users.get(username).await?.into();
        self.seen.insert(username.to_string(), summary.clone());
        Ok(summary)
    }
}

pub async fn detail(users: &dyn UserStore, m: Message) -> StoreResult<MessageDetail> {
    let mut lookup = Summaries::new(users);
    Ok(MessageDetail {
        id: m.id,
        from_user: lookup.get(&m.from_username).await?,
        to_user: lookup.get(&m.to_username).await?,
        body: m.body,
        sent_at: m.sent_at,
        read_at: m.read_at,
    })
}

pub async fn sent(users: &dyn UserStore, messages: Vec<Message>) -> StoreResult<Vec<SentMessage>> {
    let mut lookup = Summaries::new(users);
    let mut out = Vec::with_capacity(messages.len());
    for m in messages {
        out.push(SentMessage {
            id: m.id,
            to_user: lookup.get(&m.to_username).await?,
            body: m.body,
            sent_at: m.sent_at,
            read_at: m.read_at,
        });
    }
    Ok(out)
}

pub async fn received(
    users: &dyn UserStore,
    messages: Vec<Message>,
) -> StoreResult<Vec<ReceivedMessage>> {
    let mut lookup = Summaries::new(users);
    let mut out = Vec::with_capacity(messages.len());
    for m in messages {
        out.push(ReceivedMessage {
            id: m.id,
            from_user: lookup.get(&m.from_username).await?,
            body: m.body,
            sent_at: m.sent_at,
            read_at: m.read_at,
        });
    }
    Ok(out)
}
