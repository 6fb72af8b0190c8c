pub mod admin;
pub mod attendance_record;
pub mod attendance_session;
pub mod course;
pub mod professor;
pub mod professor_course;
pub mod system_log;

pub use admin::Entity as Admin;
pub use attendance_record::Entity as AttendanceRecord;
pub use attendance_session::Entity as AttendanceSession;
pub use course::Entity as Course;
pub use professor::Entity as Professor;
pub use professor_course::Entity as ProfessorCourse;
pub use system_log::Entity as SystemLog;
