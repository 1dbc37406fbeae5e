use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - an account together with its side of the social graph.
///
/// `followers` and `following` mirror each other across users:
/// A is in B's followers exactly when B is in A's following.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub followers: BTreeSet<Uuid>,
    pub following: BTreeSet<Uuid>,
    pub liked_posts: BTreeSet<Uuid>,
    pub profile_img: Option<StoredImage>,
    pub cover_img: Option<StoredImage>,
    pub bio: String,
    pub link: String,
    pub reset_token: Option<ResetToken>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An uploaded profile or cover image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

/// A pending password reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            full_name: None,
            email,
            password_hash,
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            liked_posts: BTreeSet::new(),
            profile_img: None,
            cover_img: None,
            bio: String::new(),
            link: String::new(),
            reset_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_followed_by(&self, user_id: Uuid) -> bool {
        self.followers.contains(&user_id)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            profile_img: self.profile_img.as_ref().map(|img| img.url.clone()),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Public identity of a user, attached wherever another entity references one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub profile_img: Option<String>,
}
