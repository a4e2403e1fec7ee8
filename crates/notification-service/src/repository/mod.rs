//! 数据库仓储层

pub mod device_repo;
pub mod notification_repo;
pub mod role_repo;
pub mod traits;

pub use device_repo::DeviceRepository;
pub use notification_repo::NotificationRepository;
pub use role_repo::UserRoleRepository;
pub use traits::{DeviceRepositoryTrait, NotificationRepositoryTrait, UserRoleRepositoryTrait};
