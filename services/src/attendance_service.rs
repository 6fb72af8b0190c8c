use std::collections::HashMap;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};
use db::models::{
    attendance_record::{self, Column, Entity, Relation},
    attendance_session, professor,
};
use sea_orm::sea_query::{Alias, Expr, Func, IntoCondition};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::audit;
use crate::error::{ServiceError, ServiceResult};

pub use db::models::attendance_record::Model as AttendanceRecord;

#[derive(Debug, Clone)]
pub struct NewAttendanceRecord {
    pub professor_id: String,
    pub session_id: Option<i64>,
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub status: Option<String>,
    pub venue: Option<String>,
    pub session_type: Option<String>,
    pub remarks: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_id: Option<String>,
}

/// Optional filters for [`AttendanceService::query`]. Any subset may be set;
/// the date range is applied only when both ends are present and is inclusive
/// on both ends.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub date: Option<NaiveDate>,
    pub professor_id: Option<String>,
    pub session_type: Option<String>,
    pub department: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// An attendance record joined with its professor's name and department.
#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct AttendanceRow {
    pub id: i64,
    pub professor_id: String,
    pub session_id: Option<i64>,
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: Option<NaiveTime>,
    pub status: String,
    pub venue: Option<String>,
    pub remarks: Option<String>,
    pub session_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub device_id: Option<String>,
    pub name: String,
    pub department: String,
}

#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct ProfessorCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AttendanceSummary {
    pub total_attendance: u64,
    pub by_department: HashMap<String, i64>,
    pub by_session_type: HashMap<String, i64>,
    pub top_professors: Vec<ProfessorCount>,
    pub date_range: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_professors: u64,
    pub attended: u64,
    pub attendance_rate: f64,
    pub by_department: HashMap<String, i64>,
    pub absent: u64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardStats {
    pub total_professors: u64,
    pub today_attendance: u64,
    pub month_attendance: u64,
    pub active_sessions: u64,
    pub attendance_rate: f64,
    pub recent_attendance: HashMap<NaiveDate, i64>,
}

#[derive(FromQueryResult)]
struct BucketRow {
    bucket: Option<String>,
    count: i64,
}

#[derive(FromQueryResult)]
struct DayRow {
    date: NaiveDate,
    count: i64,
}

pub struct AttendanceService;

impl AttendanceService {
    /// Records a check-in. At most one record may exist per
    /// (professor_id, session_id, date); the unique index rejects the
    /// duplicate for a concrete session, and a session-less check-in is
    /// guarded explicitly because SQLite treats NULLs as distinct.
    pub async fn record(
        db: &DatabaseConnection,
        data: NewAttendanceRecord,
    ) -> ServiceResult<AttendanceRecord> {
        if data.session_id.is_none() {
            let existing = Entity::find()
                .filter(Column::ProfessorId.eq(&data.professor_id))
                .filter(Column::SessionId.is_null())
                .filter(Column::Date.eq(data.date))
                .one(db)
                .await?;
            if existing.is_some() {
                return Err(ServiceError::DuplicateAttendance);
            }
        }

        let row = attendance_record::ActiveModel {
            professor_id: Set(data.professor_id),
            session_id: Set(data.session_id),
            date: Set(data.date),
            time_in: Set(data.time_in),
            status: Set(data.status.unwrap_or_else(|| "Present".to_owned())),
            venue: Set(data.venue),
            remarks: Set(data.remarks),
            session_type: Set(data.session_type),
            latitude: Set(data.latitude),
            longitude: Set(data.longitude),
            device_id: Set(data.device_id),
            ..Default::default()
        };

        let created = row
            .insert(db)
            .await
            .map_err(|err| ServiceError::on_conflict(err, ServiceError::DuplicateAttendance))?;

        audit::log_action(
            db,
            "RECORD_ATTENDANCE",
            &format!("Professor {} attendance recorded", created.professor_id),
            None,
        )
        .await;

        Ok(created)
    }

    /// Joined professor + record rows, newest first.
    pub async fn query(
        db: &DatabaseConnection,
        filter: &AttendanceFilter,
    ) -> ServiceResult<Vec<AttendanceRow>> {
        let mut query = Entity::find()
            .select_only()
            .columns([
                Column::Id,
                Column::ProfessorId,
                Column::SessionId,
                Column::Date,
                Column::TimeIn,
                Column::TimeOut,
                Column::Status,
                Column::Venue,
                Column::Remarks,
                Column::SessionType,
                Column::Latitude,
                Column::Longitude,
                Column::DeviceId,
            ])
            .column_as(professor::Column::Name, "name")
            .column_as(professor::Column::Department, "department")
            .join(JoinType::InnerJoin, Relation::Professor.def());

        if let Some(date) = filter.date {
            query = query.filter(Column::Date.eq(date));
        }
        if let Some(ref professor_id) = filter.professor_id {
            query = query.filter(Column::ProfessorId.eq(professor_id));
        }
        if let Some(ref session_type) = filter.session_type {
            query = query.filter(Column::SessionType.eq(session_type));
        }
        if let Some(ref department) = filter.department {
            query = query.filter(professor::Column::Department.eq(department));
        }
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            query = query.filter(Column::Date.between(start, end));
        }

        Ok(query
            .order_by_desc(Column::Date)
            .order_by_desc(Column::TimeIn)
            .into_model::<AttendanceRow>()
            .all(db)
            .await?)
    }

    /// Aggregates over an inclusive date range: total count, counts by
    /// department and session type, and the ten most frequent attendees.
    pub async fn summarize(
        db: &DatabaseConnection,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<AttendanceSummary> {
        let total_attendance = Entity::find()
            .filter(Column::Date.between(start, end))
            .count(db)
            .await?;

        let department_rows: Vec<BucketRow> = Entity::find()
            .select_only()
            .column_as(professor::Column::Department, "bucket")
            .column_as(
                Expr::expr(Func::count(Expr::col((Entity, Column::Id)))),
                "count",
            )
            .join(JoinType::InnerJoin, Relation::Professor.def())
            .filter(Column::Date.between(start, end))
            .group_by(professor::Column::Department)
            .into_model::<BucketRow>()
            .all(db)
            .await?;

        let session_rows: Vec<BucketRow> = Entity::find()
            .select_only()
            .column_as(Column::SessionType, "bucket")
            .column_as(Expr::expr(Func::count(Expr::col(Column::Id))), "count")
            .filter(Column::Date.between(start, end))
            .group_by(Column::SessionType)
            .into_model::<BucketRow>()
            .all(db)
            .await?;

        let top_professors: Vec<ProfessorCount> = Entity::find()
            .select_only()
            .column_as(professor::Column::Name, "name")
            .column_as(
                Expr::expr(Func::count(Expr::col((Entity, Column::Id)))),
                "count",
            )
            .join(JoinType::InnerJoin, Relation::Professor.def())
            .filter(Column::Date.between(start, end))
            .group_by(Column::ProfessorId)
            .order_by_desc(Expr::col(Alias::new("count")))
            .limit(10)
            .into_model::<ProfessorCount>()
            .all(db)
            .await?;

        Ok(AttendanceSummary {
            total_attendance,
            by_department: bucket_map(department_rows),
            by_session_type: bucket_map(session_rows),
            top_professors,
            date_range: format!("{start} to {end}"),
        })
    }

    /// Daily statistics; `date` defaults to today. Departments of active
    /// professors with no attendance that day appear with a zero count.
    pub async fn daily_stats(
        db: &DatabaseConnection,
        date: Option<NaiveDate>,
    ) -> ServiceResult<DailyStats> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());

        let total_professors = professor::Entity::find()
            .filter(professor::Column::IsActive.eq(true))
            .count(db)
            .await?;

        let attended = Self::distinct_attendees(db, date).await?;

        let department_rows: Vec<BucketRow> = professor::Entity::find()
            .select_only()
            .column_as(professor::Column::Department, "bucket")
            .column_as(
                Expr::expr(Func::count_distinct(Expr::col((
                    attendance_record::Entity,
                    Column::ProfessorId,
                )))),
                "count",
            )
            .join(
                JoinType::LeftJoin,
                professor::Relation::AttendanceRecords
                    .def()
                    .on_condition(move |_left, right| {
                        Expr::col((right, Column::Date)).eq(date).into_condition()
                    }),
            )
            .filter(professor::Column::IsActive.eq(true))
            .group_by(professor::Column::Department)
            .into_model::<BucketRow>()
            .all(db)
            .await?;

        let attendance_rate = percentage(attended, total_professors);

        Ok(DailyStats {
            date,
            total_professors,
            attended,
            attendance_rate,
            by_department: bucket_map(department_rows),
            // Check-ins from since-deactivated professors can push `attended`
            // past the active headcount.
            absent: total_professors.saturating_sub(attended),
        })
    }

    /// Rolled-up numbers for the dashboard, relative to `today`: totals,
    /// month-to-date volume, sessions open today, and a per-day count for the
    /// trailing week ([today - 7, today], days without records omitted).
    pub async fn dashboard_stats(
        db: &DatabaseConnection,
        today: NaiveDate,
    ) -> ServiceResult<DashboardStats> {
        let total_professors = professor::Entity::find()
            .filter(professor::Column::IsActive.eq(true))
            .count(db)
            .await?;

        let today_attendance = Self::distinct_attendees(db, today).await?;

        let month_start = today.with_day(1).unwrap_or(today);
        let month_attendance = Entity::find()
            .filter(Column::Date.between(month_start, today))
            .count(db)
            .await?;

        let active_sessions = attendance_session::Entity::find()
            .filter(attendance_session::Column::IsActive.eq(true))
            .filter(attendance_session::Column::Date.eq(today))
            .count(db)
            .await?;

        let window_start = today - Duration::days(7);
        let day_rows: Vec<DayRow> = Entity::find()
            .select_only()
            .column_as(Column::Date, "date")
            .column_as(Expr::expr(Func::count(Expr::col(Column::Id))), "count")
            .filter(Column::Date.between(window_start, today))
            .group_by(Column::Date)
            .into_model::<DayRow>()
            .all(db)
            .await?;

        Ok(DashboardStats {
            total_professors,
            today_attendance,
            month_attendance,
            active_sessions,
            attendance_rate: percentage(today_attendance, total_professors),
            recent_attendance: day_rows.into_iter().map(|r| (r.date, r.count)).collect(),
        })
    }

    async fn distinct_attendees(db: &DatabaseConnection, date: NaiveDate) -> ServiceResult<u64> {
        Ok(Entity::find()
            .select_only()
            .column(Column::ProfessorId)
            .distinct()
            .filter(Column::Date.eq(date))
            .count(db)
            .await?)
    }
}

fn bucket_map(rows: Vec<BucketRow>) -> HashMap<String, i64> {
    rows.into_iter()
        .map(|r| (r.bucket.unwrap_or_default(), r.count))
        .collect()
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::professor_service::{NewProfessor, ProfessorService};
    use crate::session_service::{NewSession, SessionService};
    use db::test_utils::setup_test_db;

    async fn seed_professor(db: &DatabaseConnection, id: &str, name: &str, department: &str) {
        ProfessorService::add(
            db,
            NewProfessor {
                id: id.to_owned(),
                name: name.to_owned(),
                department: department.to_owned(),
                contact: None,
                email: format!("{id}@uni.edu"),
            },
        )
        .await
        .unwrap();
    }

    async fn seed_session(db: &DatabaseConnection, date: NaiveDate) -> i64 {
        SessionService::create(
            db,
            NewSession {
                session_type: "Lecture".to_owned(),
                venue: "Hall A".to_owned(),
                remarks: None,
                date,
                start_time: "08:00:00".parse().unwrap(),
                end_time: None,
                created_by: None,
                qr_code_data: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn check_in(professor_id: &str, session_id: Option<i64>, date: NaiveDate) -> NewAttendanceRecord {
        NewAttendanceRecord {
            professor_id: professor_id.to_owned(),
            session_id,
            date,
            time_in: "08:05:00".parse().unwrap(),
            status: None,
            venue: None,
            session_type: Some("Lecture".to_owned()),
            remarks: None,
            latitude: None,
            longitude: None,
            device_id: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_record_defaults_status_to_present() {
        let db = setup_test_db().await;
        seed_professor(&db, "P1", "Ada", "A").await;
        let date = day(2024, 1, 1);
        let session = seed_session(&db, date).await;

        let created = AttendanceService::record(&db, check_in("P1", Some(session), date))
            .await
            .unwrap();
        assert_eq!(created.status, "Present");
    }

    #[tokio::test]
    async fn test_duplicate_check_in_rejected_once_recorded() {
        let db = setup_test_db().await;
        seed_professor(&db, "P1", "Ada", "A").await;
        let date = day(2024, 1, 1);
        let session = seed_session(&db, date).await;

        AttendanceService::record(&db, check_in("P1", Some(session), date))
            .await
            .unwrap();
        let err = AttendanceService::record(&db, check_in("P1", Some(session), date))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateAttendance));

        let rows = Entity::find().count(&db).await.unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_duplicate_check_in_without_session_rejected() {
        let db = setup_test_db().await;
        seed_professor(&db, "P1", "Ada", "A").await;
        let date = day(2024, 1, 1);

        AttendanceService::record(&db, check_in("P1", None, date))
            .await
            .unwrap();
        let err = AttendanceService::record(&db, check_in("P1", None, date))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateAttendance));

        // A different day is still fine.
        AttendanceService::record(&db, check_in("P1", None, day(2024, 1, 2)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_query_filters_and_ordering() {
        let db = setup_test_db().await;
        seed_professor(&db, "P1", "Ada", "A").await;
        seed_professor(&db, "P2", "Grace", "B").await;

        AttendanceService::record(&db, check_in("P1", None, day(2024, 1, 1)))
            .await
            .unwrap();
        AttendanceService::record(&db, check_in("P1", None, day(2024, 1, 2)))
            .await
            .unwrap();
        AttendanceService::record(&db, check_in("P2", None, day(2024, 1, 1)))
            .await
            .unwrap();

        let all = AttendanceService::query(&db, &AttendanceFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        // Newest date first; joined fields come through.
        assert_eq!(all[0].date, day(2024, 1, 2));
        assert_eq!(all[0].name, "Ada");
        assert_eq!(all[0].department, "A");

        let dept_b = AttendanceService::query(
            &db,
            &AttendanceFilter {
                department: Some("B".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(dept_b.len(), 1);
        assert_eq!(dept_b[0].professor_id, "P2");

        let ranged = AttendanceService::query(
            &db,
            &AttendanceFilter {
                start_date: Some(day(2024, 1, 2)),
                end_date: Some(day(2024, 1, 2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ranged.len(), 1);

        let by_professor = AttendanceService::query(
            &db,
            &AttendanceFilter {
                professor_id: Some("P1".to_owned()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_professor.len(), 2);
    }

    #[tokio::test]
    async fn test_summarize_department_counts_sum_to_total() {
        let db = setup_test_db().await;
        seed_professor(&db, "P1", "Ada", "A").await;
        seed_professor(&db, "P2", "Grace", "B").await;

        AttendanceService::record(&db, check_in("P1", None, day(2024, 1, 1)))
            .await
            .unwrap();
        AttendanceService::record(&db, check_in("P1", None, day(2024, 1, 2)))
            .await
            .unwrap();
        AttendanceService::record(&db, check_in("P2", None, day(2024, 1, 1)))
            .await
            .unwrap();

        let summary = AttendanceService::summarize(&db, day(2024, 1, 1), day(2024, 1, 2))
            .await
            .unwrap();

        assert_eq!(summary.total_attendance, 3);
        assert_eq!(summary.by_department.get("A"), Some(&2));
        assert_eq!(summary.by_department.get("B"), Some(&1));
        let dept_sum: i64 = summary.by_department.values().sum();
        assert_eq!(dept_sum as u64, summary.total_attendance);

        assert_eq!(summary.by_session_type.get("Lecture"), Some(&3));
        assert_eq!(summary.top_professors[0].name, "Ada");
        assert_eq!(summary.top_professors[0].count, 2);
        assert_eq!(summary.date_range, "2024-01-01 to 2024-01-02");
    }

    #[tokio::test]
    async fn test_daily_stats_zero_professors_has_zero_rate() {
        let db = setup_test_db().await;

        let stats = AttendanceService::daily_stats(&db, Some(day(2024, 1, 1)))
            .await
            .unwrap();
        assert_eq!(stats.total_professors, 0);
        assert_eq!(stats.attendance_rate, 0.0);
        assert_eq!(stats.absent, 0);
    }

    #[tokio::test]
    async fn test_daily_stats_counts_and_zero_departments() {
        let db = setup_test_db().await;
        seed_professor(&db, "P1", "Ada", "A").await;
        seed_professor(&db, "P2", "Grace", "B").await;
        let date = day(2024, 1, 1);

        AttendanceService::record(&db, check_in("P1", None, date))
            .await
            .unwrap();

        let stats = AttendanceService::daily_stats(&db, Some(date)).await.unwrap();
        assert_eq!(stats.total_professors, 2);
        assert_eq!(stats.attended, 1);
        assert_eq!(stats.absent, 1);
        assert!((stats.attendance_rate - 50.0).abs() < f64::EPSILON);
        assert_eq!(stats.by_department.get("A"), Some(&1));
        // Department with no check-ins that day still shows up, at zero.
        assert_eq!(stats.by_department.get("B"), Some(&0));
    }

    #[tokio::test]
    async fn test_dashboard_stats_window_and_month() {
        let db = setup_test_db().await;
        seed_professor(&db, "P1", "Ada", "A").await;
        let today = day(2024, 1, 15);

        AttendanceService::record(&db, check_in("P1", None, today))
            .await
            .unwrap();
        AttendanceService::record(&db, check_in("P1", None, day(2024, 1, 10)))
            .await
            .unwrap();
        // Outside the trailing week but inside the month.
        AttendanceService::record(&db, check_in("P1", None, day(2024, 1, 2)))
            .await
            .unwrap();
        // Previous month: excluded from the month-to-date count.
        AttendanceService::record(&db, check_in("P1", None, day(2023, 12, 31)))
            .await
            .unwrap();

        seed_session(&db, today).await;

        let stats = AttendanceService::dashboard_stats(&db, today).await.unwrap();
        assert_eq!(stats.total_professors, 1);
        assert_eq!(stats.today_attendance, 1);
        assert_eq!(stats.month_attendance, 3);
        assert_eq!(stats.active_sessions, 1);
        assert!((stats.attendance_rate - 100.0).abs() < f64::EPSILON);

        assert_eq!(stats.recent_attendance.get(&today), Some(&1));
        assert_eq!(stats.recent_attendance.get(&day(2024, 1, 10)), Some(&1));
        assert!(stats.recent_attendance.get(&day(2024, 1, 2)).is_none());
        assert!(stats
            .recent_attendance
            .keys()
            .all(|d| *d >= today - Duration::days(7) && *d <= today));
    }
}
