mod contact;
mod csrf;
mod health;
mod json;
mod projects;

pub use contact::submit_contact;
pub use csrf::csrf_token;
pub use health::{health_check, readiness_check};
pub use json::ApiJson;
pub use projects::{create_project, list_projects};
