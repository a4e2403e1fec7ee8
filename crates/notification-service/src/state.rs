//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use crate::auth::JwtManager;
use crate::dispatch::NotificationDispatcher;
use crate::identity::IdentityResolver;
use crate::push::PushGateway;
use crate::recipients::RecipientResolver;
use crate::repository::{
    DeviceRepositoryTrait, NotificationRepositoryTrait, UserRoleRepositoryTrait,
};
use crate::template::TemplateEngine;

/// Axum 应用共享状态
///
/// 仓储与推送组件都以 trait 对象注入，测试时可整体替换为内存实现。
#[derive(Clone)]
pub struct AppState {
    pub notifications: Arc<dyn NotificationRepositoryTrait>,
    pub devices: Arc<dyn DeviceRepositoryTrait>,
    pub identity: IdentityResolver,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub templates: Arc<TemplateEngine>,
    pub jwt_manager: JwtManager,
}

impl AppState {
    /// 组装应用状态
    pub fn new(
        notifications: Arc<dyn NotificationRepositoryTrait>,
        devices: Arc<dyn DeviceRepositoryTrait>,
        roles: Arc<dyn UserRoleRepositoryTrait>,
        gateway: Arc<PushGateway>,
        jwt_manager: JwtManager,
    ) -> Self {
        let identity = IdentityResolver::new(devices.clone());
        let resolver = RecipientResolver::new(devices.clone(), roles);
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notifications.clone(),
            resolver,
            gateway,
        ));

        Self {
            notifications,
            devices,
            identity,
            dispatcher,
            templates: Arc::new(TemplateEngine::new()),
            jwt_manager,
        }
    }
}
