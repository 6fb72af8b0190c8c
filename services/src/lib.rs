pub mod admin_service;
pub mod attendance_service;
pub mod audit;
pub mod course_service;
pub mod error;
pub mod professor_service;
pub mod report_service;
pub mod session_service;

pub use error::{ServiceError, ServiceResult};
