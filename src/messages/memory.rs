use std::collections::BTreeMap;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    dto::{Message, NewMessage},
    repo::{no_such_message, MessageStore},
};
use crate::store::StoreResult;

#[derive(Default)]
struct Inner {
    next_id: i64,
    messages: BTreeMap<i64, Message>,
}

/// Process-local message store. Recipient existence is checked by the caller.
#[derive(Default)]
pub struct MemoryMessageStore {
    inner: RwLock<Inner>,
}

impl MemoryMessageStore {
    async fn filtered(&self, keep: impl Fn(&Message) -> bool) -> Vec<Message> {
        self.inner
            .read()
            .await
            .messages
            .values()
            .filter(|&m| keep(m))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create(&self, msg: NewMessage) -> StoreResult<Message> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let message = Message {
            id: inner.next_id,
            from_username: msg.from_username,
            to_username: msg.to_username,
            body: msg.body,
            sent_at: OffsetDateTime::now_utc(),
            read_at: None,
        };
        inner.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn get(&self, id: i64) -> StoreResult<Message> {
        self.inner
            .read()
            .await
            .messages
            .get(&id)
            .cloned()
            .ok_or_else(|| no_such_message(id))
    }

    async fn list_from(&self, username: &str) -> StoreResult<Vec<Message>> {
        Ok(self.filtered(|m| m.from_username == username).await)
    }

    async fn list_to(&self, username: &str) -> StoreResult<Vec<Message>> {
        Ok(self.filtered(|m| m.to_username == username).await)
    }

    async fn mark_read(&self, id: i64) -> StoreResult<Message> {
        let mut inner = self.inner.write().await;
        let message = inner.messages.get_mut(&id).ok_or_else(|| no_such_message(id))?;
        message.read_at.get_or_insert_with(OffsetDateTime::now_utc);
        Ok(message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{messages::dto::ReadStatus, store::StoreError};

    fn note(from: &str, to: &str) -> NewMessage {
        NewMessage {
            from_username: from.into(),
            to_username: to.into(),
            body: format!("{from} -> {to}"),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_order() {
        let store = MemoryMessageStore::default();
        let a = store.create(note("alice", "bob")).await.unwrap();
        let b = store.create(note("bob", "alice")).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.get(a.id).await.unwrap(), a);
        assert!(matches!(store.get(999).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn lists_split_by_direction() {
        let store = MemoryMessageStore::default();
        store.create(note("alice", "bob")).await.unwrap();
        store.create(note("alice", "carol")).await.unwrap();
        store.create(note("bob", "alice")).await.unwrap();

        assert_eq!(store.list_from("alice").await.unwrap().len(), 2);
        assert_eq!(store.list_to("alice").await.unwrap().len(), 1);
        assert_eq!(store.list_to("bob").await.unwrap().len(), 1);
        assert!(store.list_from("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let store = MemoryMessageStore::default();
        let m = store.create(note("alice", "bob")).await.unwrap();
        assert_eq!(m.read_status(), ReadStatus::Unread);

        let first = store.mark_read(m.id).await.unwrap();
        assert_eq!(first.read_status(), ReadStatus::Read);
        let second = store.mark_read(m.id).await.unwrap();
        assert_eq!(second.read_at, first.read_at);

        assert!(matches!(store.mark_read(999).await, Err(StoreError::NotFound(_))));
    }
}
