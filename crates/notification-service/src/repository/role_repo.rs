//! 用户角色仓储实现
//!
//! 角色体系由平台的用户中心维护，本服务只做只读查询，
//! 用于在扇出时按角色展开接收者集合。

use async_trait::async_trait;

use diwan_shared::Database;

use crate::error::Result;

use super::traits::UserRoleRepositoryTrait;

/// 用户角色仓储（只读）
#[derive(Clone)]
pub struct UserRoleRepository {
    db: Database,
}

impl UserRoleRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRoleRepositoryTrait for UserRoleRepository {
    async fn list_user_ids_in_roles(&self, roles: &[&'static str]) -> Result<Vec<i64>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT user_id FROM user_roles WHERE role = ANY($1)",
        )
        .bind(&roles)
        .fetch_all(self.db.pool())
        .await?;
        Ok(ids)
    }

    async fn list_user_ids_not_in_roles(&self, roles: &[&'static str]) -> Result<Vec<i64>> {
        let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT user_id FROM user_roles
            WHERE user_id NOT IN (
                SELECT user_id FROM user_roles WHERE role = ANY($1)
            )
            "#,
        )
        .bind(&roles)
        .fetch_all(self.db.pool())
        .await?;
        Ok(ids)
    }
}
