use chrono::{NaiveDate, NaiveTime};
use db::models::attendance_session::{self, Column, Entity};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::audit;
use crate::error::ServiceResult;

pub use db::models::attendance_session::Model as AttendanceSession;

#[derive(Debug, Clone)]
pub struct NewSession {
    pub session_type: String,
    pub venue: String,
    pub remarks: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub created_by: Option<String>,
    pub qr_code_data: Option<String>,
}

pub struct SessionService;

impl SessionService {
    /// Opens a new attendance session and returns it with its generated id.
    pub async fn create(db: &DatabaseConnection, data: NewSession) -> ServiceResult<AttendanceSession> {
        let row = attendance_session::ActiveModel {
            session_type: Set(data.session_type),
            venue: Set(data.venue),
            remarks: Set(data.remarks),
            date: Set(data.date),
            start_time: Set(data.start_time),
            end_time: Set(data.end_time),
            created_by: Set(data.created_by.unwrap_or_else(|| "system".to_owned())),
            qr_code_data: Set(data.qr_code_data),
            is_active: Set(true),
            ..Default::default()
        };

        let created = row.insert(db).await?;

        audit::log_action(
            db,
            "CREATE_SESSION",
            &format!("Created session {}", created.id),
            None,
        )
        .await;

        Ok(created)
    }

    /// Sessions open on `date`, ordered by start time.
    pub async fn list_active(
        db: &DatabaseConnection,
        date: NaiveDate,
    ) -> ServiceResult<Vec<AttendanceSession>> {
        Ok(Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::Date.eq(date))
            .order_by_asc(Column::StartTime)
            .all(db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::test_utils::setup_test_db;

    fn session_on(date: NaiveDate, start: &str, venue: &str) -> NewSession {
        NewSession {
            session_type: "Lecture".to_owned(),
            venue: venue.to_owned(),
            remarks: None,
            date,
            start_time: start.parse().unwrap(),
            end_time: None,
            created_by: None,
            qr_code_data: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_defaults() {
        let db = setup_test_db().await;
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();

        let first = SessionService::create(&db, session_on(date, "08:00:00", "Room 101"))
            .await
            .unwrap();
        let second = SessionService::create(&db, session_on(date, "10:00:00", "Room 102"))
            .await
            .unwrap();

        assert!(first.id > 0);
        assert_ne!(first.id, second.id);
        assert_eq!(first.created_by, "system");
        assert!(first.is_active);
    }

    #[tokio::test]
    async fn test_list_active_filters_date_and_orders_by_start() {
        let db = setup_test_db().await;
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        SessionService::create(&db, session_on(today, "10:00:00", "Late"))
            .await
            .unwrap();
        SessionService::create(&db, session_on(today, "08:00:00", "Early"))
            .await
            .unwrap();
        SessionService::create(&db, session_on(tomorrow, "09:00:00", "Other day"))
            .await
            .unwrap();

        let active = SessionService::list_active(&db, today).await.unwrap();
        let venues: Vec<&str> = active.iter().map(|s| s.venue.as_str()).collect();
        assert_eq!(venues, ["Early", "Late"]);
    }
}
