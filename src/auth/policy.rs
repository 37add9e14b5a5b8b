//! Authorization decisions. Every function is pure and answers with
//! `AppError::Unauthorized` on denial, so handlers can `?` them before
//! touching a store.

use super::claims::Identity;
use crate::{error::AppError, messages::dto::Message};

pub fn require_authenticated(identity: Option<&Identity>) -> Result<&Identity, AppError> {
    identity.ok_or(AppError::Unauthorized)
}

/// Caller may only act on their own profile and mailboxes.
pub fn require_self(identity: &Identity, target_username: &str) -> Result<(), AppError> {
    if identity.username == target_username {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Sender or recipient.
pub fn require_message_party(identity: &Identity, message: &Message) -> Result<(), AppError> {
    if identity.username == message.from_username || identity.username == message.to_username {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Only the recipient moves a message from unread to read.
pub fn require_message_recipient(identity: &Identity, message: &Message) -> Result<(), AppError> {
    if identity.username == message.to_username {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}
