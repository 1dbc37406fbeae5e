//! Services - the operations behind every request.
//!
//! Each operation receives the acting user as an explicit [`Actor`] value
//! and talks to collaborators only through the ports.

mod accounts;
mod engagement;
mod notifications;
mod posts;

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::UserSummary;
use crate::error::RepoError;
use crate::ports::UserRepository;

pub use accounts::{AccountService, MIN_PASSWORD_LEN, ProfileUpdate, ResetSettings};
pub use engagement::{EngagementService, LikeToggle};
pub use notifications::Notifier;
pub use posts::{FeedFilter, MediaCleanup, NewPost, PostDeletion, PostService};

/// The authenticated user issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
}

impl Actor {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Look up the public identity of every id in `ids`.
pub(crate) async fn resolve_summaries(
    users: &dyn UserRepository,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, UserSummary>, RepoError> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(users
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user.summary()))
        .collect())
}
