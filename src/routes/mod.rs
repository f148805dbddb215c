//! HTTP routes for Laurel
//!
//! Each module owns one path prefix and returns `None` for requests it does
//! not recognize, letting the server fall through to a 404.

pub mod achievement_routes;
pub mod auth_routes;
pub mod health;
pub mod helpers;
pub mod lecturer_routes;
pub mod report_routes;
pub mod student_routes;
pub mod user_routes;

pub use achievement_routes::handle_achievement_request;
pub use auth_routes::handle_auth_request;
pub use health::{health_check, readiness_check, version_info};
pub use lecturer_routes::handle_lecturer_request;
pub use report_routes::handle_report_request;
pub use student_routes::handle_student_request;
pub use user_routes::handle_user_request;
