//! Member repository (数据库访问层)

use crate::{error::AppError, models::member::Member};
use async_trait::async_trait;
use sqlx::PgPool;

/// 会员凭据存储
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// 根据邮箱查找会员（不区分大小写）
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, AppError>;

    /// 根据 ID 查找会员
    async fn find_by_id(&self, id: i64) -> Result<Option<Member>, AppError>;

    /// 更新密码哈希，返回是否有记录被更新
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool, AppError>;

    /// 存储可用性检查
    async fn ping(&self) -> Result<(), AppError>;
}

pub struct PgMemberRepository {
    db: PgPool,
}

impl PgMemberRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MemberRepository for PgMemberRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, AppError> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, email, name, password_hash, role, created_at, updated_at
            FROM members
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(member)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Member>, AppError> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, email, name, password_hash, role, created_at, updated_at
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(member)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET
                password_hash = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
