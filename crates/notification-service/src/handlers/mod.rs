//! HTTP API 处理器

pub mod admin;
pub mod notification;
