//! 领域模型定义

pub mod device;
pub mod notification;

pub use device::Device;
pub use notification::{
    AdminMessage, EntityKind, EntityRef, Language, NewNotification, Notification,
    NotificationKind, RecipientRef,
};
