//! 通知记录仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use diwan_shared::Database;

use crate::error::Result;
use crate::models::{
    EntityKind, EntityRef, NewNotification, Notification, NotificationKind, RecipientRef,
};

use super::traits::NotificationRepositoryTrait;

/// 通知记录仓储
#[derive(Clone)]
pub struct NotificationRepository {
    db: Database,
}

/// 通知表行，kind/实体标签在数据库中存为字符串
#[derive(Debug, FromRow)]
struct NotificationRow {
    id: i64,
    kind: String,
    source_kind: Option<String>,
    source_id: Option<i64>,
    target_kind: Option<String>,
    target_id: Option<i64>,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

/// 带已读标志的关联查询行
#[derive(Debug, FromRow)]
struct RecipientNotificationRow {
    id: i64,
    kind: String,
    source_kind: Option<String>,
    source_id: Option<i64>,
    target_kind: Option<String>,
    target_id: Option<i64>,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
    read: bool,
}

fn entity_ref(kind: Option<String>, id: Option<i64>) -> Result<Option<EntityRef>> {
    match (kind, id) {
        (Some(kind), Some(id)) => Ok(Some(EntityRef::new(EntityKind::parse(&kind)?, id))),
        _ => Ok(None),
    }
}

impl NotificationRow {
    fn into_notification(self) -> Result<Notification> {
        Ok(Notification {
            id: self.id,
            kind: NotificationKind::parse(&self.kind)?,
            source: entity_ref(self.source_kind, self.source_id)?,
            target: entity_ref(self.target_kind, self.target_id)?,
            payload: self.payload,
            created_at: self.created_at,
        })
    }
}

impl RecipientNotificationRow {
    fn into_pair(self) -> Result<(Notification, bool)> {
        let read = self.read;
        let notification = Notification {
            id: self.id,
            kind: NotificationKind::parse(&self.kind)?,
            source: entity_ref(self.source_kind, self.source_id)?,
            target: entity_ref(self.target_kind, self.target_id)?,
            payload: self.payload,
            created_at: self.created_at,
        };
        Ok((notification, read))
    }
}

/// 接收者对应的关联表列名与 ID
fn recipient_column(recipient: RecipientRef) -> (&'static str, i64) {
    match recipient {
        RecipientRef::User(id) => ("user_id", id),
        RecipientRef::Device(id) => ("device_id", id),
    }
}

impl NotificationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepositoryTrait for NotificationRepository {
    async fn create(&self, new: &NewNotification) -> Result<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (kind, source_kind, source_id, target_kind, target_id, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, kind, source_kind, source_id, target_kind, target_id, payload, created_at
            "#,
        )
        .bind(new.kind.as_str())
        .bind(new.source.map(|s| s.kind.as_str()))
        .bind(new.source.map(|s| s.id))
        .bind(new.target.map(|t| t.kind.as_str()))
        .bind(new.target.map(|t| t.id))
        .bind(&new.payload)
        .fetch_one(self.db.pool())
        .await?;

        row.into_notification()
    }

    async fn attach_recipients(
        &self,
        notification_id: i64,
        recipients: &[RecipientRef],
    ) -> Result<u64> {
        let mut user_ids = Vec::new();
        let mut device_ids = Vec::new();
        for recipient in recipients {
            match recipient {
                RecipientRef::User(id) => user_ids.push(*id),
                RecipientRef::Device(id) => device_ids.push(*id),
            }
        }

        let mut inserted = 0u64;

        // 重复挂接依赖部分唯一索引 + DO NOTHING 去重，保持幂等
        if !user_ids.is_empty() {
            let result = sqlx::query(
                r#"
                INSERT INTO notification_recipients (notification_id, user_id)
                SELECT $1, uid FROM unnest($2::bigint[]) AS uid
                ON CONFLICT (notification_id, user_id) WHERE user_id IS NOT NULL DO NOTHING
                "#,
            )
            .bind(notification_id)
            .bind(&user_ids)
            .execute(self.db.pool())
            .await?;
            inserted += result.rows_affected();
        }

        if !device_ids.is_empty() {
            let result = sqlx::query(
                r#"
                INSERT INTO notification_recipients (notification_id, device_id)
                SELECT $1, did FROM unnest($2::bigint[]) AS did
                ON CONFLICT (notification_id, device_id) WHERE device_id IS NOT NULL DO NOTHING
                "#,
            )
            .bind(notification_id)
            .bind(&device_ids)
            .execute(self.db.pool())
            .await?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    async fn list_for_recipient(
        &self,
        recipient: RecipientRef,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<(Notification, bool)>, i64)> {
        let (column, id) = recipient_column(recipient);
        let offset = (page - 1) * per_page;

        let query = format!(
            r#"
            SELECT n.id, n.kind, n.source_kind, n.source_id, n.target_kind, n.target_id,
                   n.payload, n.created_at, r.read
            FROM notifications n
            JOIN notification_recipients r ON r.notification_id = n.id
            WHERE r.{column} = $1
            ORDER BY n.created_at DESC, n.id DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, RecipientNotificationRow>(&query)
            .bind(id)
            .bind(per_page)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await?;

        let count_query = format!(
            "SELECT COUNT(*) FROM notification_recipients WHERE {column} = $1"
        );
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;

        let items = rows
            .into_iter()
            .map(RecipientNotificationRow::into_pair)
            .collect::<Result<Vec<_>>>()?;

        Ok((items, total))
    }

    async fn unread_count(&self, recipient: RecipientRef) -> Result<i64> {
        let (column, id) = recipient_column(recipient);
        let query = format!(
            "SELECT COUNT(*) FROM notification_recipients WHERE {column} = $1 AND read = FALSE"
        );
        let count: i64 = sqlx::query_scalar(&query)
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    async fn mark_read(&self, recipient: RecipientRef, notification_ids: &[i64]) -> Result<u64> {
        if notification_ids.is_empty() {
            return Ok(0);
        }
        let (column, id) = recipient_column(recipient);
        // 只更新属于该接收者的行，别人的通知 ID 不受影响
        let query = format!(
            r#"
            UPDATE notification_recipients
            SET read = TRUE
            WHERE {column} = $1 AND notification_id = ANY($2) AND read = FALSE
            "#
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(notification_ids)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn mark_all_read(&self, recipient: RecipientRef) -> Result<u64> {
        let (column, id) = recipient_column(recipient);
        let query = format!(
            "UPDATE notification_recipients SET read = TRUE WHERE {column} = $1 AND read = FALSE"
        );
        let result = sqlx::query(&query)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_column() {
        assert_eq!(recipient_column(RecipientRef::User(3)), ("user_id", 3));
        assert_eq!(recipient_column(RecipientRef::Device(9)), ("device_id", 9));
    }

    #[test]
    fn test_entity_ref_from_columns() {
        let some = entity_ref(Some("user".to_string()), Some(5)).unwrap();
        assert_eq!(some, Some(EntityRef::new(EntityKind::User, 5)));

        // 半空列按无引用处理
        assert_eq!(entity_ref(None, Some(5)).unwrap(), None);
        assert_eq!(entity_ref(Some("user".to_string()), None).unwrap(), None);
        assert_eq!(entity_ref(None, None).unwrap(), None);
    }

    #[test]
    fn test_entity_ref_unknown_kind_is_error() {
        assert!(entity_ref(Some("order".to_string()), Some(1)).is_err());
    }

    #[test]
    fn test_row_conversion() {
        let row = NotificationRow {
            id: 10,
            kind: "from_admin".to_string(),
            source_kind: None,
            source_id: None,
            target_kind: Some("poem".to_string()),
            target_id: Some(77),
            payload: serde_json::json!({"title": {"ar": "مرحبا", "en": "Hi"}}),
            created_at: Utc::now(),
        };
        let notification = row.into_notification().unwrap();
        assert_eq!(notification.kind, NotificationKind::FromAdmin);
        assert_eq!(notification.source, None);
        assert_eq!(
            notification.target,
            Some(EntityRef::new(EntityKind::Poem, 77))
        );
    }
}
