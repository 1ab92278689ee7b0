pub mod activity_log;
pub mod admin_service;
pub mod assignment_service;
pub mod auth;
pub mod project_service;
pub mod worker_service;
