//! 推送网关
//!
//! 扇出完成后把通知投递到接收者的全部设备。
//! 设备按语言分组，每种语言只渲染一次；令牌每批获取一次。
//! 整个投递过程不返回错误：失败的设备记录日志后跳过。

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::models::{Device, Language, Notification, RecipientRef};
use crate::push::credentials::AccessTokenProvider;
use crate::push::fcm::{PushMessage, PushSender};
use crate::repository::DeviceRepositoryTrait;
use crate::template::{TemplateEngine, destination};

/// 推送网关
pub struct PushGateway {
    devices: Arc<dyn DeviceRepositoryTrait>,
    token_provider: Arc<dyn AccessTokenProvider>,
    sender: Arc<dyn PushSender>,
    templates: TemplateEngine,
}

impl PushGateway {
    pub fn new(
        devices: Arc<dyn DeviceRepositoryTrait>,
        token_provider: Arc<dyn AccessTokenProvider>,
        sender: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            devices,
            token_provider,
            sender,
            templates: TemplateEngine::new(),
        }
    }

    /// 向一组接收者的设备投递通知（尽力而为，从不报错）
    pub async fn deliver(&self, notification: &Notification, recipients: &[RecipientRef]) {
        let devices = match self.resolve_devices(recipients).await {
            Ok(devices) => devices,
            Err(e) => {
                error!(
                    notification_id = notification.id,
                    error = %e,
                    "推送前设备查询失败，本次投递跳过"
                );
                return;
            }
        };

        if devices.is_empty() {
            debug!(notification_id = notification.id, "接收者没有注册设备，无需推送");
            return;
        }

        let access_token = match self.token_provider.access_token().await {
            Ok(token) => token,
            Err(e) => {
                error!(
                    notification_id = notification.id,
                    error = %e,
                    "获取推送访问令牌失败，本次投递跳过"
                );
                return;
            }
        };

        // 按语言分组，每种语言渲染一次
        let mut by_language: BTreeMap<Language, Vec<&Device>> = BTreeMap::new();
        for device in &devices {
            by_language
                .entry(device.preferred_language())
                .or_default()
                .push(device);
        }

        let mut delivered = 0usize;
        let mut failed = 0usize;

        for (lang, group) in by_language {
            let rendered = match self.templates.render(notification, lang) {
                Ok(rendered) => rendered,
                Err(e) => {
                    error!(
                        notification_id = notification.id,
                        language = lang.as_str(),
                        error = %e,
                        "通知渲染失败，跳过该语言分组"
                    );
                    failed += group.len();
                    continue;
                }
            };

            let message = PushMessage {
                notification_id: notification.id,
                kind: notification.kind,
                title: rendered.title,
                body: rendered.message,
                destination: destination(notification),
            };

            for device in group {
                match self
                    .sender
                    .send(&access_token, &device.push_token, &message)
                    .await
                {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        failed += 1;
                        error!(
                            notification_id = notification.id,
                            device_id = device.id,
                            error = %e,
                            "单设备推送失败，继续投递其余设备"
                        );
                    }
                }
            }
        }

        info!(
            notification_id = notification.id,
            delivered, failed, "推送投递完成"
        );
    }

    /// 展开接收者为设备列表
    async fn resolve_devices(
        &self,
        recipients: &[RecipientRef],
    ) -> crate::error::Result<Vec<Device>> {
        let mut user_ids = Vec::new();
        let mut device_ids = Vec::new();
        for recipient in recipients {
            match recipient {
                RecipientRef::User(id) => user_ids.push(*id),
                RecipientRef::Device(id) => device_ids.push(*id),
            }
        }

        let mut devices = self.devices.list_by_user_ids(&user_ids).await?;
        devices.extend(self.devices.list_by_ids(&device_ids).await?);
        Ok(devices)
    }
}
