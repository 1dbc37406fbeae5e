//! HTTP handlers and route configuration.

mod auth;
mod health;
mod media;
mod posts;
mod presenter;
mod users;

#[cfg(test)]
mod tests;

use actix_web::{HttpResponse, error, web};
use agora_shared::ErrorResponse;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/me", web::get().to(auth::me))
                    .route("/forgot-password", web::post().to(auth::forgot_password))
                    .route(
                        "/reset-password/{token}",
                        web::post().to(auth::reset_password),
                    ),
            )
            // User routes
            .service(
                web::scope("/users")
                    .route("/profile/{id}", web::get().to(users::profile))
                    .route("/suggested", web::get().to(users::suggested))
                    .route("/follow/{id}", web::post().to(users::follow))
                    .route("/unfollow/{id}", web::post().to(users::unfollow))
                    .route("/update", web::post().to(users::update))
                    .route("/search", web::get().to(users::search))
                    .route("/notifications", web::get().to(users::notifications)),
            )
            // Post routes
            .service(
                web::scope("/posts")
                    .route("/create", web::post().to(posts::create))
                    .route("/all", web::get().to(posts::all))
                    .route("/delete/{id}", web::delete().to(posts::delete))
                    .route("/like/{id}", web::post().to(posts::like))
                    .route("/comment/{id}", web::post().to(posts::comment)),
            ),
    )
    .route("/media/{file}", web::get().to(media::serve));
}

/// JSON body settings: size limit and RFC 7807 errors for bad payloads.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let body = ErrorResponse::bad_request(err.to_string());
            error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

/// Query string settings: RFC 7807 errors for bad parameters.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse::bad_request(err.to_string());
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}
