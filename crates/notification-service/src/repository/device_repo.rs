//! 设备仓储实现

use async_trait::async_trait;

use diwan_shared::Database;

use crate::error::Result;
use crate::models::{Device, Language};

use super::traits::DeviceRepositoryTrait;

/// 设备仓储
#[derive(Clone)]
pub struct DeviceRepository {
    db: Database,
}

impl DeviceRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeviceRepositoryTrait for DeviceRepository {
    async fn upsert(
        &self,
        user_id: Option<i64>,
        device_token: &str,
        push_token: &str,
        language: Language,
    ) -> Result<Device> {
        // 唯一约束对 NULL user_id 也去重（NULLS NOT DISTINCT），
        // 匿名设备重复注册只刷新 push_token 与语言
        let device = sqlx::query_as::<_, Device>(
            r#"
            INSERT INTO devices (user_id, device_token, push_token, language)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, device_token)
            DO UPDATE SET push_token = EXCLUDED.push_token,
                          language = EXCLUDED.language,
                          updated_at = now()
            RETURNING id, user_id, device_token, push_token, language, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(device_token)
        .bind(push_token)
        .bind(language.as_str())
        .fetch_one(self.db.pool())
        .await?;

        Ok(device)
    }

    async fn find_by_device_token(&self, device_token: &str) -> Result<Option<Device>> {
        let device = sqlx::query_as::<_, Device>(
            r#"
            SELECT id, user_id, device_token, push_token, language, created_at, updated_at
            FROM devices
            WHERE device_token = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(device_token)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(device)
    }

    async fn list_by_user_ids(&self, user_ids: &[i64]) -> Result<Vec<Device>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let devices = sqlx::query_as::<_, Device>(
            r#"
            SELECT id, user_id, device_token, push_token, language, created_at, updated_at
            FROM devices
            WHERE user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(self.db.pool())
        .await?;

        Ok(devices)
    }

    async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<Device>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let devices = sqlx::query_as::<_, Device>(
            r#"
            SELECT id, user_id, device_token, push_token, language, created_at, updated_at
            FROM devices
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(self.db.pool())
        .await?;

        Ok(devices)
    }

    async fn list_anonymous(&self) -> Result<Vec<Device>> {
        let devices = sqlx::query_as::<_, Device>(
            r#"
            SELECT id, user_id, device_token, push_token, language, created_at, updated_at
            FROM devices
            WHERE user_id IS NULL
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(devices)
    }
}
