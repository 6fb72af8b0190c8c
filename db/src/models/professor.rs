use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

/// A registered professor. Soft-deleted via `is_active`; the id is supplied
/// by the caller (staff number), not generated.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, serde::Serialize)]
#[sea_orm(table_name = "professors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub department: String,
    pub contact: Option<String>,
    pub email: String,
    pub date_registered: NaiveDate,
    pub is_active: bool,
    pub password_hash: Option<String>,
    pub role: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,
    #[sea_orm(has_many = "super::professor_course::Entity")]
    CourseAssignments,
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl Related<super::professor_course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseAssignments.def()
    }
    fn via() -> Option<RelationDef> {
        None
    }
}

impl ActiveModelBehavior for ActiveModel {}
