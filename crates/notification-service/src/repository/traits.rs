//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Device, Language, NewNotification, Notification, RecipientRef};

/// 通知记录仓储接口
///
/// create 与 attach_recipients 是仅有的两个写入口（read 标记除外）；
/// 推送投递不参与事务，记录在投递尝试前已提交。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepositoryTrait: Send + Sync {
    /// 创建通知行，返回带新 ID 的完整实体
    async fn create(&self, new: &NewNotification) -> Result<Notification>;

    /// 插入接收者关联行（read=false）
    ///
    /// 重复挂接同一接收者既不报错也不产生第二行（幂等），
    /// 返回实际新插入的行数。
    async fn attach_recipients(
        &self,
        notification_id: i64,
        recipients: &[RecipientRef],
    ) -> Result<u64>;

    /// 按接收者分页查询通知（新到旧），返回 (通知, read) 列表和总数
    async fn list_for_recipient(
        &self,
        recipient: RecipientRef,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<(Notification, bool)>, i64)>;

    /// 该接收者未读通知数
    async fn unread_count(&self, recipient: RecipientRef) -> Result<i64>;

    /// 将指定通知标记为已读
    ///
    /// 只更新属于该接收者的关联行，不属于它的 ID 静默跳过。
    /// 返回实际更新的行数。
    async fn mark_read(&self, recipient: RecipientRef, notification_ids: &[i64]) -> Result<u64>;

    /// 将该接收者的全部通知标记为已读
    async fn mark_all_read(&self, recipient: RecipientRef) -> Result<u64>;
}

/// 设备仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRepositoryTrait: Send + Sync {
    /// 注册/更新设备（按 (user_id, device_token) upsert）
    async fn upsert(
        &self,
        user_id: Option<i64>,
        device_token: &str,
        push_token: &str,
        language: Language,
    ) -> Result<Device>;

    /// 按客户端设备标识查找
    async fn find_by_device_token(&self, device_token: &str) -> Result<Option<Device>>;

    /// 查询一组用户关联的全部设备
    async fn list_by_user_ids(&self, user_ids: &[i64]) -> Result<Vec<Device>>;

    /// 按设备行 ID 批量查询
    async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<Device>>;

    /// 查询未关联用户的设备（匿名广播通道）
    async fn list_anonymous(&self) -> Result<Vec<Device>>;
}

/// 用户角色仓储接口（角色/权限协作方的窄接口）
///
/// 角色集合在每次调用时实时查询，发送前的角色变更立即生效。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRoleRepositoryTrait: Send + Sync {
    /// 角色在给定集合内的用户 ID
    async fn list_user_ids_in_roles(&self, roles: &[&'static str]) -> Result<Vec<i64>>;

    /// 角色在给定集合外的用户 ID
    async fn list_user_ids_not_in_roles(&self, roles: &[&'static str]) -> Result<Vec<i64>>;
}
