//! 通知分发器
//!
//! 扇出的唯一入口：展开受众、落库、挂接接收者，最后尽力推送。
//! 记录与关联在推送尝试之前已提交，推送失败不会回滚任何数据。

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::models::{
    AdminMessage, EntityKind, EntityRef, NewNotification, Notification, NotificationKind,
};
use crate::push::PushGateway;
use crate::recipients::{Audience, RecipientResolver};
use crate::repository::NotificationRepositoryTrait;

/// 通知分发器
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepositoryTrait>,
    resolver: RecipientResolver,
    gateway: Arc<PushGateway>,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationRepositoryTrait>,
        resolver: RecipientResolver,
        gateway: Arc<PushGateway>,
    ) -> Self {
        Self {
            notifications,
            resolver,
            gateway,
        }
    }

    /// 创建通知并扇出到受众
    ///
    /// 受众为空时通知照常创建，只是没有接收者也不推送。
    pub async fn dispatch(
        &self,
        new: NewNotification,
        audience: Audience,
    ) -> Result<Notification> {
        let recipients = self.resolver.resolve(&audience).await?;

        let notification = self.notifications.create(&new).await?;
        let attached = self
            .notifications
            .attach_recipients(notification.id, &recipients)
            .await?;

        info!(
            notification_id = notification.id,
            kind = notification.kind.as_str(),
            recipients = recipients.len(),
            attached,
            "通知已创建并扇出"
        );

        if !recipients.is_empty() {
            self.gateway.deliver(&notification, &recipients).await;
        }

        Ok(notification)
    }

    /// 管理员公告：广播给全体普通用户与匿名设备
    pub async fn dispatch_admin_broadcast(
        &self,
        admin_user_id: i64,
        message: AdminMessage,
        target: Option<EntityRef>,
    ) -> Result<Notification> {
        message.validate()?;

        let mut new = NewNotification::new(NotificationKind::FromAdmin)
            .with_source(EntityRef::new(EntityKind::User, admin_user_id))
            .with_payload(message.into_payload()?);
        if let Some(target) = target {
            new = new.with_target(target);
        }

        self.dispatch(new, Audience::AllUsers).await
    }

    /// 新的入驻申请：通知全体管理员
    pub async fn dispatch_new_join_request(
        &self,
        applicant_user_id: i64,
        applicant_name: &str,
        join_request_id: i64,
    ) -> Result<Notification> {
        let new = NewNotification::new(NotificationKind::NewJoinRequest)
            .with_source(EntityRef::new(EntityKind::User, applicant_user_id))
            .with_target(EntityRef::new(EntityKind::JoinRequest, join_request_id))
            .with_payload(serde_json::json!({ "user_name": applicant_name }));

        self.dispatch(new, Audience::Admins).await
    }

    /// 入驻申请结果：通知申请人本人
    pub async fn dispatch_join_request_decision(
        &self,
        applicant_user_id: i64,
        join_request_id: i64,
        approved: bool,
    ) -> Result<Notification> {
        let kind = if approved {
            NotificationKind::JoinRequestApproved
        } else {
            NotificationKind::JoinRequestRejected
        };

        let new = NewNotification::new(kind)
            .with_target(EntityRef::new(EntityKind::JoinRequest, join_request_id));

        self.dispatch(new, Audience::User(applicant_user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::models::{Language, RecipientRef};
    use crate::push::credentials::MockAccessTokenProvider;
    use crate::push::fcm::MockPushSender;
    use crate::repository::traits::{
        MockDeviceRepositoryTrait, MockNotificationRepositoryTrait, MockUserRoleRepositoryTrait,
    };
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn stored(id: i64, new: &NewNotification) -> Notification {
        Notification {
            id,
            kind: new.kind,
            source: new.source,
            target: new.target,
            payload: new.payload.clone(),
            created_at: Utc::now(),
        }
    }

    /// 无设备、无推送的网关（查询返回空集）
    fn quiet_gateway() -> Arc<PushGateway> {
        let mut devices = MockDeviceRepositoryTrait::new();
        devices.expect_list_by_user_ids().returning(|_| Ok(vec![]));
        devices.expect_list_by_ids().returning(|_| Ok(vec![]));
        Arc::new(PushGateway::new(
            Arc::new(devices),
            Arc::new(MockAccessTokenProvider::new()),
            Arc::new(MockPushSender::new()),
        ))
    }

    fn resolver_with_admins(admin_ids: Vec<i64>) -> RecipientResolver {
        let mut roles = MockUserRoleRepositoryTrait::new();
        roles
            .expect_list_user_ids_not_in_roles()
            .returning(move |_| Ok(admin_ids.clone()));
        RecipientResolver::new(Arc::new(MockDeviceRepositoryTrait::new()), Arc::new(roles))
    }

    fn admin_message() -> AdminMessage {
        let mut title = BTreeMap::new();
        let mut body = BTreeMap::new();
        for lang in Language::SUPPORTED {
            title.insert(lang, format!("title-{}", lang.as_str()));
            body.insert(lang, format!("body-{}", lang.as_str()));
        }
        AdminMessage { title, body }
    }

    #[tokio::test]
    async fn test_new_join_request_notifies_admins() {
        let mut notifications = MockNotificationRepositoryTrait::new();
        notifications
            .expect_create()
            .withf(|new| new.kind == NotificationKind::NewJoinRequest)
            .returning(|new| Ok(stored(1, new)));
        notifications
            .expect_attach_recipients()
            .withf(|id, recipients| {
                *id == 1 && recipients == [RecipientRef::User(10), RecipientRef::User(11)]
            })
            .returning(|_, recipients| Ok(recipients.len() as u64));

        let dispatcher = NotificationDispatcher::new(
            Arc::new(notifications),
            resolver_with_admins(vec![10, 11]),
            quiet_gateway(),
        );

        let notification = dispatcher
            .dispatch_new_join_request(7, "أحمد", 42)
            .await
            .unwrap();
        assert_eq!(notification.kind, NotificationKind::NewJoinRequest);
        assert_eq!(notification.payload["user_name"], "أحمد");
    }

    #[tokio::test]
    async fn test_decision_targets_applicant_only() {
        let mut notifications = MockNotificationRepositoryTrait::new();
        notifications
            .expect_create()
            .returning(|new| Ok(stored(2, new)));
        notifications
            .expect_attach_recipients()
            .withf(|_, recipients| recipients == [RecipientRef::User(7)])
            .returning(|_, recipients| Ok(recipients.len() as u64));

        let resolver = RecipientResolver::new(
            Arc::new(MockDeviceRepositoryTrait::new()),
            Arc::new(MockUserRoleRepositoryTrait::new()),
        );
        let dispatcher =
            NotificationDispatcher::new(Arc::new(notifications), resolver, quiet_gateway());

        let notification = dispatcher
            .dispatch_join_request_decision(7, 42, false)
            .await
            .unwrap();
        assert_eq!(notification.kind, NotificationKind::JoinRequestRejected);
    }

    #[tokio::test]
    async fn test_admin_broadcast_validates_message() {
        let notifications = MockNotificationRepositoryTrait::new();
        let resolver = RecipientResolver::new(
            Arc::new(MockDeviceRepositoryTrait::new()),
            Arc::new(MockUserRoleRepositoryTrait::new()),
        );
        let dispatcher =
            NotificationDispatcher::new(Arc::new(notifications), resolver, quiet_gateway());

        let mut message = admin_message();
        message.body.remove(&Language::En);

        // 校验失败时不应触碰任何仓储
        let err = dispatcher
            .dispatch_admin_broadcast(1, message, None)
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_audience_creates_without_push() {
        let mut notifications = MockNotificationRepositoryTrait::new();
        notifications
            .expect_create()
            .returning(|new| Ok(stored(3, new)));
        notifications
            .expect_attach_recipients()
            .withf(|_, recipients| recipients.is_empty())
            .returning(|_, _| Ok(0));

        let dispatcher = NotificationDispatcher::new(
            Arc::new(notifications),
            resolver_with_admins(vec![]),
            quiet_gateway(),
        );

        let notification = dispatcher
            .dispatch(
                NewNotification::new(NotificationKind::NewJoinRequest),
                Audience::Admins,
            )
            .await
            .unwrap();
        assert_eq!(notification.id, 3);
    }
}
