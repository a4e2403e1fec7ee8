//! 推送投递
//!
//! 推送是尽力而为的副作用：通知记录在投递前已落库，
//! 任何推送失败只记录日志，绝不影响扇出结果。

pub mod credentials;
pub mod fcm;
pub mod gateway;

pub use credentials::{AccessTokenProvider, ServiceAccountKey, ServiceAccountTokenProvider};
pub use fcm::{FcmSender, PushMessage, PushSender};
pub use gateway::PushGateway;
