pub mod m202601200001_create_professors;
pub mod m202601200002_create_attendance;
pub mod m202601200003_create_courses;
pub mod m202601200004_create_admins;
pub mod m202601200005_create_system_logs;
