//! HTTP 处理器

pub mod admin;
pub mod auth;
pub mod health;
