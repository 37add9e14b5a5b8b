use std::collections::BTreeMap;

use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    dto::{NewUser, User, UserSummary},
    repo::{no_such_user, UserStore},
};
use crate::{
    auth::password::{hash_password, verify_password},
    store::{StoreError, StoreResult},
};

struct StoredUser {
    profile: User,
    password_hash: String,
}

/// Process-local credential store, used when no database is configured.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<String, StoredUser>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn register(&self, user: NewUser) -> StoreResult<User> {
        let password_hash = hash_password(&user.password)?;
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate(format!(
                "username already taken: {}",
                user.username
            )));
        }
        let profile = User {
            username: user.username.clone(),
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            join_at: OffsetDateTime::now_utc(),
            last_login_at: None,
        };
        users.insert(
            user.username,
            StoredUser {
                profile: profile.clone(),
                password_hash,
            },
        );
        Ok(profile)
    }

    async fn verify_credentials(&self, username: &str, password: &str) -> StoreResult<bool> {
        let users = self.users.read().await;
        Ok(users
            .get(username)
            .is_some_and(|u| verify_password(password, &u.password_hash)))
    }

    async fn touch_last_login(&self, username: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(username).ok_or_else(|| no_such_user(username))?;
        user.profile.last_login_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    async fn get(&self, username: &str) -> StoreResult<User> {
        self.users
            .read()
            .await
            .get(username)
            .map(|u| u.profile.clone())
            .ok_or_else(|| no_such_user(username))
    }

    async fn list(&self) -> StoreResult<Vec<UserSummary>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .map(|u| u.profile.clone().into())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            password: "password".into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            phone: "+1415555000".into(),
        }
    }

    #[tokio::test]
    async fn register_get_and_duplicate() {
        let store = MemoryUserStore::default();
        let alice = store.register(new_user("alice")).await.unwrap();
        assert_eq!(alice.username, "alice");
        assert!(alice.last_login_at.is_none());

        let err = store.register(new_user("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        assert_eq!(store.get("alice").await.unwrap().first_name, "First");
        assert!(matches!(store.get("nobody").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn credentials_and_last_login() {
        let store = MemoryUserStore::default();
        store.register(new_user("alice")).await.unwrap();

        assert!(store.verify_credentials("alice", "password").await.unwrap());
        assert!(!store.verify_credentials("alice", "nope").await.unwrap());
        assert!(!store.verify_credentials("nobody", "password").await.unwrap());

        store.touch_last_login("alice").await.unwrap();
        assert!(store.get("alice").await.unwrap().last_login_at.is_some());
        assert!(matches!(
            store.touch_last_login("nobody").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_is_sorted_by_username() {
        let store = MemoryUserStore::default();
        for name in ["carol", "alice", "bob"] {
            store.register(new_user(name)).await.unwrap();
        }
        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }
}
