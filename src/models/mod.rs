//! 数据模型模块
//! 账户、认证与任务模型

pub mod account;
pub mod auth;
pub mod task;
