//! 会员管理系统的认证服务
//! 令牌签发与校验、密码哈希、角色鉴权以及对应的 HTTP 接口

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
