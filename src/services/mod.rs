//! Business logic services layer

pub mod auth_service;
pub mod profile_service;
pub mod task_service;

pub use auth_service::AuthService;
pub use profile_service::ProfileService;
pub use task_service::TaskService;
