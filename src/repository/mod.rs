//! Repository layer - 数据访问层

pub mod member_repo;

pub use member_repo::{MemberRepository, PgMemberRepository};
