//! Authentication handlers.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{HttpResponse, web};

use agora_core::domain::User;
use agora_shared::dto::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterUserRequest,
    ResetPasswordRequest, UserEnvelope,
};

use super::presenter;
use crate::middleware::auth::{Identity, SESSION_COOKIE};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.production)
        .max_age(CookieDuration::seconds(state.tokens.expiration_seconds()))
        .finish()
}

fn issue_token(state: &AppState, user: &User) -> AppResult<String> {
    state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .accounts
        .register(&req.username, &req.email, &req.password)
        .await?;
    let token = issue_token(&state, &user)?;

    Ok(HttpResponse::Created()
        .cookie(session_cookie(&state, token))
        .json(UserEnvelope {
            message: Some("User registered successfully".to_string()),
            user: presenter::user(&user),
        }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state.accounts.authenticate(&req.email, &req.password).await?;
    let token = issue_token(&state, &user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&state, token.clone()))
        .json(AuthResponse {
            message: "Logged in successfully".to_string(),
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: state.tokens.expiration_seconds().max(0) as u64,
            user: presenter::user(&user),
        }))
}

/// POST /api/auth/logout - tokens are stateless, so this only drops the cookie.
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(MessageResponse::new("Logged out successfully"))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(identity.user_id).await?;

    Ok(HttpResponse::Ok().json(UserEnvelope {
        message: None,
        user: presenter::user(&user),
    }))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<ForgotPasswordRequest>,
) -> AppResult<HttpResponse> {
    state.accounts.request_password_reset(&body.email).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Password reset link sent to your email",
    )))
}

/// POST /api/auth/reset-password/{token}
pub async fn reset_password(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let token = path.into_inner();
    state
        .accounts
        .reset_password(&token, &body.password)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password reset successful")))
}
