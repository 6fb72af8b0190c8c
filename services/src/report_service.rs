use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveTime};
use db::models::{
    attendance_record::{Column, Entity, Relation},
    attendance_session, professor,
};
use rust_xlsxwriter::Workbook;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use crate::attendance_service::{AttendanceFilter, AttendanceRow, AttendanceService};
use crate::audit;
use crate::error::ServiceResult;

/// One line of the detailed report: record × professor × (optional) session.
#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub time_in: NaiveTime,
    pub time_out: Option<NaiveTime>,
    pub professor_id: String,
    pub name: String,
    pub department: String,
    pub session_type: Option<String>,
    pub venue: Option<String>,
    pub status: String,
    pub remarks: Option<String>,
    pub session_start: Option<NaiveTime>,
    pub session_end: Option<NaiveTime>,
}

const EXPORT_HEADERS: [&str; 15] = [
    "id",
    "professor_id",
    "session_id",
    "date",
    "time_in",
    "time_out",
    "status",
    "venue",
    "remarks",
    "session_type",
    "latitude",
    "longitude",
    "device_id",
    "name",
    "department",
];

pub struct ReportService;

impl ReportService {
    /// Detailed rows for an inclusive date range, oldest first. The session
    /// join is a LEFT JOIN: a record may predate session tracking.
    pub async fn detailed(
        db: &DatabaseConnection,
        start: NaiveDate,
        end: NaiveDate,
        department: Option<&str>,
    ) -> ServiceResult<Vec<ReportRow>> {
        let mut query = Entity::find()
            .select_only()
            .columns([Column::Date, Column::TimeIn, Column::TimeOut])
            .column(Column::ProfessorId)
            .column_as(professor::Column::Name, "name")
            .column_as(professor::Column::Department, "department")
            .columns([
                Column::SessionType,
                Column::Venue,
                Column::Status,
                Column::Remarks,
            ])
            .column_as(attendance_session::Column::StartTime, "session_start")
            .column_as(attendance_session::Column::EndTime, "session_end")
            .join(JoinType::InnerJoin, Relation::Professor.def())
            .join(JoinType::LeftJoin, Relation::Session.def())
            .filter(Column::Date.between(start, end));

        if let Some(dept) = department {
            query = query.filter(professor::Column::Department.eq(dept));
        }

        Ok(query
            .order_by_asc(Column::Date)
            .order_by_asc(Column::TimeIn)
            .into_model::<ReportRow>()
            .all(db)
            .await?)
    }

    /// Writes the filtered attendance records to a single-sheet workbook.
    /// Returns `Ok(None)` without touching the filesystem when nothing
    /// matches. Without an explicit path the file lands in the working
    /// directory under a timestamped name.
    pub async fn export_xlsx(
        db: &DatabaseConnection,
        filter: &AttendanceFilter,
        output_path: Option<PathBuf>,
    ) -> ServiceResult<Option<PathBuf>> {
        let records = AttendanceService::query(db, filter).await?;
        if records.is_empty() {
            return Ok(None);
        }

        let path = output_path.unwrap_or_else(|| {
            PathBuf::from(format!(
                "attendance_report_{}.xlsx",
                Local::now().format("%Y%m%d_%H%M%S")
            ))
        });

        let mut workbook = Workbook::new();
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Attendance Records")?;

            for (col, header) in EXPORT_HEADERS.iter().enumerate() {
                sheet.write_string(0, col as u16, *header)?;
            }
            for (i, record) in records.iter().enumerate() {
                write_record(sheet, (i + 1) as u32, record)?;
            }
            sheet.autofit();
        }
        workbook.save(&path)?;

        audit::log_action(
            db,
            "EXPORT_EXCEL",
            &format!("Exported to {}", path.display()),
            None,
        )
        .await;

        Ok(Some(path))
    }

    /// Online copy of the whole store to `destination`. Failures go to the
    /// process log and come back as `false`; they never propagate.
    pub async fn backup(db: &DatabaseConnection, destination: &Path) -> bool {
        let escaped = destination.to_string_lossy().replace('\'', "''");
        match db
            .execute_unprepared(&format!("VACUUM INTO '{escaped}'"))
            .await
        {
            Ok(_) => {
                audit::log_action(
                    db,
                    "DATABASE_BACKUP",
                    &format!("Backup created at {}", destination.display()),
                    None,
                )
                .await;
                true
            }
            Err(err) => {
                log::error!("database backup to {} failed: {err}", destination.display());
                false
            }
        }
    }
}

fn write_record(
    sheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    record: &AttendanceRow,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    sheet.write_number(row, 0, record.id as f64)?;
    sheet.write_string(row, 1, record.professor_id.as_str())?;
    if let Some(session_id) = record.session_id {
        sheet.write_number(row, 2, session_id as f64)?;
    }
    sheet.write_string(row, 3, record.date.to_string())?;
    sheet.write_string(row, 4, record.time_in.to_string())?;
    if let Some(time_out) = record.time_out {
        sheet.write_string(row, 5, time_out.to_string())?;
    }
    sheet.write_string(row, 6, record.status.as_str())?;
    sheet.write_string(row, 7, record.venue.as_deref().unwrap_or(""))?;
    sheet.write_string(row, 8, record.remarks.as_deref().unwrap_or(""))?;
    sheet.write_string(row, 9, record.session_type.as_deref().unwrap_or(""))?;
    if let Some(latitude) = record.latitude {
        sheet.write_number(row, 10, latitude)?;
    }
    if let Some(longitude) = record.longitude {
        sheet.write_number(row, 11, longitude)?;
    }
    sheet.write_string(row, 12, record.device_id.as_deref().unwrap_or(""))?;
    sheet.write_string(row, 13, record.name.as_str())?;
    sheet.write_string(row, 14, record.department.as_str())?;
    Ok(())
}
