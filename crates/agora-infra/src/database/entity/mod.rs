//! SeaORM entities backing the PostgreSQL document store.

pub mod comment;
pub mod follow;
pub mod notification;
pub mod post;
pub mod post_like;
pub mod user;
