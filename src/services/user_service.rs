use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::UserProfile;
use crate::database::repository::{NicknameChange, UserRepository};
use crate::database::DatabaseError;

const NICKNAME_MAX_CHARS: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    UserNotFound(Uuid),
    #[error("Nickname '{0}' is already in use")]
    DuplicatedNickname(String),
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Profiles keyed by the user id carried in tokens
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// The caller's profile, registered on first call
    pub async fn me(&self, caller: &AuthUser) -> Result<UserProfile, UserError> {
        let profile = self.users.upsert(caller.user_id, &caller.username).await?;
        info!("Profile resolved: user_id={}, username={}", profile.user_id, profile.username);
        Ok(profile)
    }

    pub async fn get(&self, user_id: Uuid) -> Result<UserProfile, UserError> {
        info!("Profile lookup: user_id={}", user_id);
        self.users.find_by_id(user_id).await?.ok_or_else(|| {
            error!("Profile lookup failed: user_id={}", user_id);
            UserError::UserNotFound(user_id)
        })
    }

    pub async fn update_nickname(&self, caller: &AuthUser, nickname: &str) -> Result<UserProfile, UserError> {
        info!("Nickname change requested: user={}, nickname={}", caller.username, nickname);
        let nickname = validate_nickname(nickname)?;
        self.me(caller).await?;

        match self.users.update_nickname(caller.user_id, &nickname).await? {
            NicknameChange::Changed(profile) => {
                info!("Nickname changed: user_id={}, nickname={}", profile.user_id, nickname);
                Ok(profile)
            }
            NicknameChange::Taken => {
                error!("Nickname change failed: '{}' is in use", nickname);
                Err(UserError::DuplicatedNickname(nickname))
            }
            NicknameChange::UnknownUser => Err(UserError::UserNotFound(caller.user_id)),
        }
    }

    /// True when no user holds the nickname yet
    pub async fn nickname_available(&self, nickname: &str) -> Result<bool, UserError> {
        let nickname = validate_nickname(nickname)?;
        let available = !self.users.nickname_taken(&nickname).await?;
        info!("Nickname check: nickname={}, available={}", nickname, available);
        Ok(available)
    }
}

fn validate_nickname(nickname: &str) -> Result<String, UserError> {
    let nickname = nickname.trim();
    if nickname.is_empty() {
        return Err(UserError::Validation {
            field: "nickname",
            message: "must not be blank".to_string(),
        });
    }
    if nickname.chars().count() > NICKNAME_MAX_CHARS {
        return Err(UserError::Validation {
            field: "nickname",
            message: format!("must be at most {} characters", NICKNAME_MAX_CHARS),
        });
    }
    Ok(nickname.to_string())
}
