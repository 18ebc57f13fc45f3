pub mod articles;
pub mod auth;
pub mod chat;
pub mod comments;
pub mod interactions;
pub mod notifications;
pub mod thumbnail;
