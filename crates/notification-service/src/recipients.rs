//! 接收者解析
//!
//! 把业务层的受众描述展开为具体的接收者引用集合。
//! 展开结果去重；空集合合法（通知创建，无人接收，不推送）。

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::models::RecipientRef;
use crate::repository::{DeviceRepositoryTrait, UserRoleRepositoryTrait};

/// 普通用户角色白名单
///
/// 广播面按白名单圈定；白名单之外的任何角色（admin 及后续新增的
/// 运营角色）都归入管理侧，接收运营告警而不是公告。
pub const NON_ADMIN_ROLES: [&str; 2] = ["user", "poet"];

/// 通知受众
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// 单个用户
    User(i64),
    /// 显式用户列表
    Users(Vec<i64>),
    /// 全体普通用户 + 所有匿名设备（管理员公告的广播面）
    AllUsers,
    /// 全体管理员
    Admins,
    /// 仅匿名设备
    AnonymousDevices,
}

/// 受众展开器
#[derive(Clone)]
pub struct RecipientResolver {
    devices: Arc<dyn DeviceRepositoryTrait>,
    roles: Arc<dyn UserRoleRepositoryTrait>,
}

impl RecipientResolver {
    pub fn new(
        devices: Arc<dyn DeviceRepositoryTrait>,
        roles: Arc<dyn UserRoleRepositoryTrait>,
    ) -> Self {
        Self { devices, roles }
    }

    /// 展开受众为去重后的接收者引用集合
    pub async fn resolve(&self, audience: &Audience) -> Result<Vec<RecipientRef>> {
        let mut recipients = BTreeSet::new();

        match audience {
            Audience::User(user_id) => {
                recipients.insert(RecipientRef::User(*user_id));
            }
            Audience::Users(user_ids) => {
                for user_id in user_ids {
                    recipients.insert(RecipientRef::User(*user_id));
                }
            }
            Audience::AllUsers => {
                // 普通用户按角色白名单圈定
                let user_ids = self
                    .roles
                    .list_user_ids_in_roles(&NON_ADMIN_ROLES)
                    .await?;
                for user_id in user_ids {
                    recipients.insert(RecipientRef::User(user_id));
                }
                // 匿名设备没有用户行，按设备行 ID 直接挂接
                for device in self.devices.list_anonymous().await? {
                    recipients.insert(RecipientRef::Device(device.id));
                }
            }
            Audience::Admins => {
                // 管理侧 = 白名单之外的全部角色
                let user_ids = self
                    .roles
                    .list_user_ids_not_in_roles(&NON_ADMIN_ROLES)
                    .await?;
                for user_id in user_ids {
                    recipients.insert(RecipientRef::User(user_id));
                }
            }
            Audience::AnonymousDevices => {
                for device in self.devices.list_anonymous().await? {
                    recipients.insert(RecipientRef::Device(device.id));
                }
            }
        }

        Ok(recipients.into_iter().collect())
    }
}
