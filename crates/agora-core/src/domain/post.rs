use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a declared content type such as `image/png` or `video/mp4`.
    /// Image formats that can carry script (SVG and other XML) are refused.
    pub fn classify(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
        let (top_level, subtype) = essence.split_once('/')?;
        if subtype.is_empty() {
            return None;
        }
        if top_level == "image" {
            if subtype.contains("svg") || subtype.contains("xml") {
                return None;
            }
            Some(Self::Image)
        } else if top_level == "video" {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(DomainError::UnsupportedMediaType(other.to_string())),
        }
    }
}

/// Media stored remotely and attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub url: String,
    /// Identifier the media store needs to delete the object.
    pub public_id: String,
    pub kind: MediaKind,
}

/// A comment embedded in a post. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a comment; the text is trimmed and must not be empty.
    pub fn new(user_id: Uuid, text: &str) -> Result<Self, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::Validation("comment text is required".into()));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            text: text.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// Post entity - text and/or media published by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: Option<String>,
    pub media: Option<MediaAttachment>,
    pub likes: BTreeSet<Uuid>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post. Blank text counts as no text, and a post needs
    /// text, media, or both.
    pub fn new(
        user_id: Uuid,
        text: Option<String>,
        media: Option<MediaAttachment>,
    ) -> Result<Self, DomainError> {
        let text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if text.is_none() && media.is_none() {
            return Err(DomainError::Validation(
                "a post needs text or media".into(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            text,
            media,
            likes: BTreeSet::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// `image`, `video` or `none`.
    pub fn media_type(&self) -> &'static str {
        self.media.as_ref().map_or("none", |m| m.kind.as_str())
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
