//! Accounts: registration, credentials, password reset and profiles.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::RngCore;
use uuid::Uuid;

use super::Actor;
use crate::domain::{MediaKind, ResetToken, StoredImage, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{
    MailMessage, MailSender, MediaStore, MediaUpload, PasswordService, UserRepository,
};

pub const MIN_PASSWORD_LEN: usize = 8;

const RESET_TOKEN_BYTES: usize = 20;

/// How password reset links are built and how long they stay valid.
#[derive(Debug, Clone)]
pub struct ResetSettings {
    /// The token is appended to this URL as a final path segment.
    pub link_base: String,
    pub token_ttl: Duration,
}

impl Default for ResetSettings {
    fn default() -> Self {
        Self {
            link_base: "http://localhost:3000/reset-password".to_string(),
            token_ttl: Duration::hours(1),
        }
    }
}

/// Fields a user may change on their own profile. Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub profile_img: Option<MediaUpload>,
    pub cover_img: Option<MediaUpload>,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    media: Arc<dyn MediaStore>,
    mail: Arc<dyn MailSender>,
    reset: ResetSettings,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        media: Arc<dyn MediaStore>,
        mail: Arc<dyn MailSender>,
        reset: ResetSettings,
    ) -> Self {
        Self {
            users,
            passwords,
            media,
            mail,
            reset,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        let username = normalize_username(username)?;
        let email = normalize_email(email)?;
        check_password_policy(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Duplicate("User already exists".into()));
        }
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(DomainError::Duplicate(format!(
                "Username '{username}' is taken"
            )));
        }

        let password_hash = self.hash(password)?;
        let user = self
            .users
            .save(User::new(username, email, password_hash))
            .await
            .map_err(duplicate_on_constraint)?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check an email/password pair. Unknown emails and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        if !self.verify(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(DomainError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }

    /// Issue a reset token and mail the reset link to the account owner.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let email = email.trim().to_lowercase();
        let mut user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::Validation("no account uses this email".into()))?;

        let token = generate_reset_token();
        user.reset_token = Some(ResetToken {
            token: token.clone(),
            expires_at: Utc::now() + self.reset.token_ttl,
        });
        user.touch();
        let user = self.users.save(user).await?;

        let link = format!("{}/{}", self.reset.link_base.trim_end_matches('/'), token);
        let message = MailMessage {
            to: user.email.clone(),
            subject: "Password Reset Link".to_string(),
            body: format!(
                "You are receiving this because a password reset was requested for your account.\n\n\
                 Open the following link to choose a new password:\n\n\
                 {link}\n\n\
                 If you did not request this, ignore this email and your password will remain unchanged."
            ),
        };

        self.mail
            .send(message)
            .await
            .map_err(|e| DomainError::Mail(e.to_string()))?;

        tracing::info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Replace the password of the user holding `token`. Tokens are single use.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), DomainError> {
        let mut user = self
            .users
            .find_by_reset_token(token)
            .await?
            .ok_or_else(|| DomainError::Validation("invalid reset token".into()))?;

        let expired = user
            .reset_token
            .as_ref()
            .is_none_or(|reset| reset.is_expired(Utc::now()));
        if expired {
            return Err(DomainError::Validation("reset token has expired".into()));
        }

        check_password_policy(new_password)?;
        user.password_hash = self.hash(new_password)?;
        user.reset_token = None;
        user.touch();
        self.users.save(user).await?;

        tracing::info!("Password reset completed");
        Ok(())
    }

    pub async fn update_profile(
        &self,
        actor: Actor,
        update: ProfileUpdate,
    ) -> Result<User, DomainError> {
        let mut user = self.profile(actor.id).await?;

        match (
            non_blank(update.current_password),
            non_blank(update.new_password),
        ) {
            (Some(current), Some(new)) => {
                if !self.verify(&current, &user.password_hash)? {
                    return Err(DomainError::InvalidCredentials);
                }
                check_password_policy(&new)?;
                user.password_hash = self.hash(&new)?;
            }
            (None, None) => {}
            _ => {
                return Err(DomainError::Validation(
                    "current password and new password are both required".into(),
                ));
            }
        }

        if let Some(username) = non_blank(update.username) {
            let username = normalize_username(&username)?;
            if username != user.username {
                if let Some(other) = self.users.find_by_username(&username).await? {
                    if other.id != user.id {
                        return Err(DomainError::Duplicate(format!(
                            "Username '{username}' is taken"
                        )));
                    }
                }
                user.username = username;
            }
        }

        if let Some(email) = non_blank(update.email) {
            let email = normalize_email(&email)?;
            if email != user.email {
                if let Some(other) = self.users.find_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(DomainError::Duplicate("Email already registered".into()));
                    }
                }
                user.email = email;
            }
        }

        if let Some(full_name) = non_blank(update.full_name) {
            user.full_name = Some(full_name);
        }
        if let Some(bio) = non_blank(update.bio) {
            user.bio = bio;
        }
        if let Some(link) = non_blank(update.link) {
            user.link = link;
        }

        let mut uploaded = Vec::new();
        let mut replaced = Vec::new();
        for (upload, slot) in [
            (update.profile_img, &mut user.profile_img),
            (update.cover_img, &mut user.cover_img),
        ] {
            let Some(upload) = upload else { continue };
            let image = match self.upload_image(upload).await {
                Ok(image) => image,
                Err(e) => {
                    self.discard_images(&uploaded).await;
                    return Err(e);
                }
            };
            uploaded.push(image.public_id.clone());
            if let Some(previous) = slot.replace(image) {
                replaced.push(previous.public_id);
            }
        }

        user.touch();
        let saved = match self.users.save(user).await {
            Ok(saved) => saved,
            Err(e) => {
                self.discard_images(&uploaded).await;
                return Err(duplicate_on_constraint(e));
            }
        };

        self.discard_images(&replaced).await;
        tracing::info!(user_id = %saved.id, "Profile updated");
        Ok(saved)
    }

    /// Users the actor might want to follow: everyone else not yet followed.
    pub async fn suggested(&self, actor: Actor) -> Result<Vec<User>, DomainError> {
        let current = self.profile(actor.id).await?;
        let users = self.users.find_all().await?;

        Ok(users
            .into_iter()
            .filter(|u| u.id != actor.id && !current.following.contains(&u.id))
            .collect())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<User>, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::Validation("search query is required".into()));
        }
        Ok(self.users.search(query).await?)
    }

    async fn upload_image(&self, upload: MediaUpload) -> Result<StoredImage, DomainError> {
        match MediaKind::classify(&upload.content_type) {
            Some(MediaKind::Image) => {}
            _ => {
                return Err(DomainError::UnsupportedMediaType(format!(
                    "{}; profile images must be images",
                    upload.content_type
                )));
            }
        }

        let stored = self
            .media
            .upload(&upload.bytes, MediaKind::Image, &upload.content_type)
            .await
            .map_err(|e| DomainError::Upload(e.to_string()))?;

        Ok(StoredImage {
            url: stored.url,
            public_id: stored.public_id,
        })
    }

    async fn discard_images(&self, public_ids: &[String]) {
        for public_id in public_ids {
            if let Err(e) = self.media.delete(public_id).await {
                tracing::warn!(public_id = %public_id, error = %e, "Failed to delete profile image");
            }
        }
    }

    fn hash(&self, password: &str) -> Result<String, DomainError> {
        self.passwords
            .hash(password)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError> {
        self.passwords
            .verify(password, hash)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::Validation("username is required".into()));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(DomainError::Validation(
            "username must not contain whitespace".into(),
        ));
    }
    Ok(username.to_string())
}

fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::Validation("invalid email address".into())),
    }
}

fn check_password_policy(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn duplicate_on_constraint(err: RepoError) -> DomainError {
    match err {
        RepoError::Constraint(msg) => DomainError::Duplicate(msg),
        other => DomainError::Store(other),
    }
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
