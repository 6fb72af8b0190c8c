use db::models::system_log;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Appends one row to the audit trail. Best effort: a failed insert goes to
/// the process log and never aborts the operation that triggered it.
pub async fn log_action(
    db: &DatabaseConnection,
    action: &str,
    details: &str,
    user_id: Option<&str>,
) {
    let entry = system_log::ActiveModel {
        user_id: Set(user_id.map(str::to_owned)),
        action: Set(action.to_owned()),
        details: Set(Some(details.to_owned())),
        ..Default::default()
    };

    if let Err(err) = entry.insert(db).await {
        log::error!("failed to append '{action}' to system log: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::system_log::{Column, Entity};
    use db::test_utils::setup_test_db;
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    #[tokio::test]
    async fn test_log_action_appends_row() {
        let db = setup_test_db().await;

        log_action(&db, "TEST_ACTION", "something happened", Some("admin1")).await;

        let count = Entity::find()
            .filter(Column::Action.eq("TEST_ACTION"))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let row = Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(row.user_id.as_deref(), Some("admin1"));
        assert_eq!(row.details.as_deref(), Some("something happened"));
    }
}
