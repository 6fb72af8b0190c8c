pub mod models;
pub mod test_utils;

use common::config::Config;
use migration::Migrator;
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;

/// Opens the database configured via `DATABASE_PATH` and brings the schema
/// up to date. Safe to call on every process start.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    connect_path(&Config::get().database_path).await
}

/// Opens (creating if absent) the SQLite database at `path` and runs all
/// pending migrations. Accepts a ready-made DSN as well as a bare file path.
pub async fn connect_path(path: &str) -> Result<DatabaseConnection, DbErr> {
    let url = if path.starts_with("sqlite:") {
        path.to_owned()
    } else {
        // SQLite won't create intermediate directories on its own.
        if let Some(parent) = Path::new(path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        format!("sqlite://{path}?mode=rwc")
    };

    log::debug!("opening sqlite store at {url}");
    let db = Database::connect(&url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::professor;
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};

    #[tokio::test]
    async fn test_connect_path_creates_file_and_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.db");
        let path_str = path.to_str().unwrap().to_owned();

        let db = connect_path(&path_str).await.unwrap();
        assert!(path.exists());

        professor::ActiveModel {
            id: Set("P001".to_owned()),
            name: Set("Ada".to_owned()),
            department: Set("CS".to_owned()),
            email: Set("ada@uni.edu".to_owned()),
            date_registered: Set(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            is_active: Set(true),
            role: Set("professor".to_owned()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        drop(db);

        // Opening again re-runs migrations without disturbing existing rows.
        let db = connect_path(&path_str).await.unwrap();
        let found = professor::Entity::find_by_id("P001".to_owned())
            .one(&db)
            .await
            .unwrap();
        assert_eq!(found.unwrap().name, "Ada");
    }
}
