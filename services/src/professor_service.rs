use chrono::Local;
use db::models::professor::{self, Column, Entity};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::audit;
use crate::error::{ServiceError, ServiceResult};

pub use db::models::professor::Model as Professor;

#[derive(Debug, Clone)]
pub struct NewProfessor {
    pub id: String,
    pub name: String,
    pub department: String,
    pub contact: Option<String>,
    pub email: String,
}

pub struct ProfessorService;

impl ProfessorService {
    /// Registers a professor. The id is the caller-supplied staff number;
    /// `date_registered` is set to the current date.
    pub async fn add(db: &DatabaseConnection, data: NewProfessor) -> ServiceResult<Professor> {
        if data.id.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "professor id cannot be empty".into(),
            ));
        }

        let row = professor::ActiveModel {
            id: Set(data.id),
            name: Set(data.name),
            department: Set(data.department),
            contact: Set(data.contact),
            email: Set(data.email),
            date_registered: Set(Local::now().date_naive()),
            is_active: Set(true),
            role: Set("professor".to_owned()),
            ..Default::default()
        };

        let created = row.insert(db).await.map_err(|err| {
            ServiceError::on_conflict(
                err,
                ServiceError::DuplicateKey("Professor ID or email already exists".into()),
            )
        })?;

        audit::log_action(
            db,
            "ADD_PROFESSOR",
            &format!("Added professor {}", created.id),
            None,
        )
        .await;

        Ok(created)
    }

    /// Absence is not an error.
    pub async fn get(db: &DatabaseConnection, id: &str) -> ServiceResult<Option<Professor>> {
        Ok(Entity::find_by_id(id.to_owned()).one(db).await?)
    }

    /// Active professors ordered by name, optionally restricted to one
    /// department.
    pub async fn list(
        db: &DatabaseConnection,
        department: Option<&str>,
    ) -> ServiceResult<Vec<Professor>> {
        let mut query = Entity::find().filter(Column::IsActive.eq(true));
        if let Some(dept) = department {
            query = query.filter(Column::Department.eq(dept));
        }
        Ok(query.order_by_asc(Column::Name).all(db).await?)
    }

    /// Soft delete. Returns false when the id is unknown.
    pub async fn deactivate(db: &DatabaseConnection, id: &str) -> ServiceResult<bool> {
        let Some(found) = Entity::find_by_id(id.to_owned()).one(db).await? else {
            return Ok(false);
        };

        let mut active: professor::ActiveModel = found.into();
        active.is_active = Set(false);
        active.update(db).await?;

        audit::log_action(
            db,
            "DEACTIVATE_PROFESSOR",
            &format!("Deactivated professor {id}"),
            None,
        )
        .await;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::system_log;
    use db::test_utils::setup_test_db;
    use sea_orm::PaginatorTrait;

    fn new_professor(id: &str, name: &str, department: &str, email: &str) -> NewProfessor {
        NewProfessor {
            id: id.to_owned(),
            name: name.to_owned(),
            department: department.to_owned(),
            contact: None,
            email: email.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let db = setup_test_db().await;

        let created = ProfessorService::add(
            &db,
            new_professor("P001", "Ada Lovelace", "Computer Science", "ada@uni.edu"),
        )
        .await
        .unwrap();
        assert_eq!(created.id, "P001");
        assert!(created.is_active);
        assert_eq!(created.role, "professor");

        let found = ProfessorService::get(&db, "P001").await.unwrap();
        assert_eq!(found.unwrap().name, "Ada Lovelace");

        let missing = ProfessorService::get(&db, "P999").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_blank_id_rejected_before_insert() {
        let db = setup_test_db().await;

        let err = ProfessorService::add(&db, new_professor("   ", "Ada", "CS", "ada@uni.edu"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        assert!(ProfessorService::list(&db, None).await.unwrap().is_empty());
        let logged = system_log::Entity::find().count(&db).await.unwrap();
        assert_eq!(logged, 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected_and_row_unchanged() {
        let db = setup_test_db().await;

        ProfessorService::add(&db, new_professor("P001", "Ada", "CS", "ada@uni.edu"))
            .await
            .unwrap();

        let err = ProfessorService::add(&db, new_professor("P001", "Imposter", "EE", "other@uni.edu"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey(_)));

        let row = ProfessorService::get(&db, "P001").await.unwrap().unwrap();
        assert_eq!(row.name, "Ada");
        assert_eq!(row.email, "ada@uni.edu");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = setup_test_db().await;

        ProfessorService::add(&db, new_professor("P001", "Ada", "CS", "shared@uni.edu"))
            .await
            .unwrap();

        let err = ProfessorService::add(&db, new_professor("P002", "Grace", "CS", "shared@uni.edu"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_list_orders_by_name_and_filters_department() {
        let db = setup_test_db().await;

        ProfessorService::add(&db, new_professor("P002", "Grace Hopper", "CS", "grace@uni.edu"))
            .await
            .unwrap();
        ProfessorService::add(&db, new_professor("P001", "Ada Lovelace", "CS", "ada@uni.edu"))
            .await
            .unwrap();
        ProfessorService::add(&db, new_professor("P003", "Nikola Tesla", "EE", "tesla@uni.edu"))
            .await
            .unwrap();

        let all = ProfessorService::list(&db, None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ada Lovelace", "Grace Hopper", "Nikola Tesla"]);

        let cs_only = ProfessorService::list(&db, Some("CS")).await.unwrap();
        assert_eq!(cs_only.len(), 2);
        assert!(cs_only.iter().all(|p| p.department == "CS"));
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_list() {
        let db = setup_test_db().await;

        ProfessorService::add(&db, new_professor("P001", "Ada", "CS", "ada@uni.edu"))
            .await
            .unwrap();

        assert!(ProfessorService::deactivate(&db, "P001").await.unwrap());
        assert!(!ProfessorService::deactivate(&db, "P404").await.unwrap());

        let listed = ProfessorService::list(&db, None).await.unwrap();
        assert!(listed.is_empty());

        // Still retrievable directly: deactivation is a soft delete.
        let row = ProfessorService::get(&db, "P001").await.unwrap().unwrap();
        assert!(!row.is_active);
    }

    #[tokio::test]
    async fn test_add_writes_audit_row() {
        let db = setup_test_db().await;

        ProfessorService::add(&db, new_professor("P001", "Ada", "CS", "ada@uni.edu"))
            .await
            .unwrap();

        let logged = system_log::Entity::find().count(&db).await.unwrap();
        assert_eq!(logged, 1);
    }
}
