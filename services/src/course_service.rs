use db::models::{
    course::{self, Entity as CourseEntity},
    professor_course::{self, Column, Entity},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::audit;
use crate::error::{ServiceError, ServiceResult};

pub use db::models::course::Model as Course;
pub use db::models::professor_course::Model as CourseAssignment;

pub const DEFAULT_UNITS: i32 = 3;
pub const DEFAULT_SEMESTER: &str = "1st";
pub const DEFAULT_ACADEMIC_YEAR: &str = "2024-2025";

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub course_code: String,
    pub course_name: String,
    pub department: Option<String>,
    pub units: Option<i32>,
    pub semester: Option<String>,
    pub academic_year: Option<String>,
}

/// One row of a professor's timetable: the course joined onto its assignment.
#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct ScheduleRow {
    pub course_code: String,
    pub course_name: String,
    pub schedule: Option<String>,
    pub room: Option<String>,
    pub department: Option<String>,
}

pub struct CourseService;

impl CourseService {
    pub async fn add(db: &DatabaseConnection, data: NewCourse) -> ServiceResult<Course> {
        let row = course::ActiveModel {
            course_code: Set(data.course_code),
            course_name: Set(data.course_name),
            department: Set(data.department),
            units: Set(data.units.unwrap_or(DEFAULT_UNITS)),
            semester: Set(data.semester.unwrap_or_else(|| DEFAULT_SEMESTER.to_owned())),
            academic_year: Set(data
                .academic_year
                .unwrap_or_else(|| DEFAULT_ACADEMIC_YEAR.to_owned())),
            ..Default::default()
        };

        let created = row.insert(db).await.map_err(|err| {
            ServiceError::on_conflict(
                err,
                ServiceError::DuplicateKey("Course code already exists".into()),
            )
        })?;

        audit::log_action(
            db,
            "ADD_COURSE",
            &format!("Added course {}", created.course_code),
            None,
        )
        .await;

        Ok(created)
    }

    pub async fn assign(
        db: &DatabaseConnection,
        professor_id: &str,
        course_id: i64,
        schedule: Option<&str>,
        room: Option<&str>,
    ) -> ServiceResult<CourseAssignment> {
        let row = professor_course::ActiveModel {
            professor_id: Set(professor_id.to_owned()),
            course_id: Set(course_id),
            schedule: Set(schedule.map(str::to_owned)),
            room: Set(room.map(str::to_owned)),
            ..Default::default()
        };

        let created = row
            .insert(db)
            .await
            .map_err(|err| ServiceError::on_conflict(err, ServiceError::DuplicateAssignment))?;

        audit::log_action(
            db,
            "ASSIGN_COURSE",
            &format!("Assigned course {course_id} to professor {professor_id}"),
            None,
        )
        .await;

        Ok(created)
    }

    /// A professor's timetable, ordered by the schedule string.
    pub async fn schedule(
        db: &DatabaseConnection,
        professor_id: &str,
    ) -> ServiceResult<Vec<ScheduleRow>> {
        Ok(Entity::find()
            .select_only()
            .column_as(course::Column::CourseCode, "course_code")
            .column_as(course::Column::CourseName, "course_name")
            .columns([Column::Schedule, Column::Room])
            .column_as(course::Column::Department, "department")
            .join(
                JoinType::InnerJoin,
                professor_course::Relation::Course.def(),
            )
            .filter(Column::ProfessorId.eq(professor_id))
            .order_by_asc(Column::Schedule)
            .into_model::<ScheduleRow>()
            .all(db)
            .await?)
    }

    pub async fn get(db: &DatabaseConnection, id: i64) -> ServiceResult<Option<Course>> {
        Ok(CourseEntity::find_by_id(id).one(db).await?)
    }
}
