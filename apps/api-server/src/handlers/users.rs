//! User handlers: profiles, the follow graph, search and notifications.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use agora_core::services::ProfileUpdate;
use agora_shared::dto::{
    MessageResponse, NotificationsEnvelope, SearchQuery, UpdateProfileRequest, UserEnvelope,
    UsersEnvelope,
};

use super::presenter;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/users/profile/{id}
pub async fn profile(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        message: None,
        user: presenter::user(&user),
    }))
}

/// GET /api/users/suggested
pub async fn suggested(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let users = state.accounts.suggested(identity.actor()).await?;

    Ok(HttpResponse::Ok().json(UsersEnvelope {
        users: users
            .iter()
            .map(|user| presenter::summary(user.summary()))
            .collect(),
    }))
}

/// POST /api/users/follow/{id}
pub async fn follow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let target = state
        .engagement
        .follow(identity.actor(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(format!(
        "You are now following {}",
        target.username
    ))))
}

/// POST /api/users/unfollow/{id}
pub async fn unfollow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let target = state
        .engagement
        .unfollow(identity.actor(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(format!(
        "You unfollowed {}",
        target.username
    ))))
}

/// POST /api/users/update
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let max_bytes = state.config.media.max_upload_bytes;

    let update = ProfileUpdate {
        full_name: req.full_name,
        username: req.username,
        email: req.email,
        bio: req.bio,
        link: req.link,
        current_password: req.current_password,
        new_password: req.new_password,
        profile_img: req
            .profile_img
            .map(|payload| presenter::media(payload, max_bytes))
            .transpose()?,
        cover_img: req
            .cover_img
            .map(|payload| presenter::media(payload, max_bytes))
            .transpose()?,
    };

    let user = state
        .accounts
        .update_profile(identity.actor(), update)
        .await?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        message: Some("Profile updated successfully".to_string()),
        user: presenter::user(&user),
    }))
}

/// GET /api/users/search?query=
pub async fn search(
    state: web::Data<AppState>,
    _identity: Identity,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let users = state.accounts.search(&query.query).await?;

    Ok(HttpResponse::Ok().json(UsersEnvelope {
        users: users
            .iter()
            .map(|user| presenter::summary(user.summary()))
            .collect(),
    }))
}

/// GET /api/users/notifications
pub async fn notifications(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let notifications = state.notifier.list(identity.actor()).await?;

    Ok(HttpResponse::Ok().json(NotificationsEnvelope {
        notifications: notifications
            .into_iter()
            .map(presenter::notification)
            .collect(),
    }))
}
