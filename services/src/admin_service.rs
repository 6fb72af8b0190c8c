use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use db::models::admin::{self, Column, Entity};
use rand::rngs::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::audit;
use crate::error::{ServiceError, ServiceResult};

pub use db::models::admin::Model as Admin;

pub struct AdminService;

impl AdminService {
    /// Creates an admin user. The password is stored as a salted Argon2 PHC
    /// string.
    pub async fn create(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
        full_name: &str,
        role: Option<&str>,
    ) -> ServiceResult<Admin> {
        let row = admin::ActiveModel {
            username: Set(username.to_owned()),
            password_hash: Set(hash_password(password)?),
            full_name: Set(full_name.to_owned()),
            role: Set(role.unwrap_or("admin").to_owned()),
            ..Default::default()
        };

        let created = row.insert(db).await.map_err(|err| {
            ServiceError::on_conflict(err, ServiceError::DuplicateKey("Username already exists".into()))
        })?;

        audit::log_action(db, "CREATE_ADMIN", &format!("Created admin {username}"), None).await;

        Ok(created)
    }

    /// `Ok(Some(admin))` on a matching username/password pair, `Ok(None)`
    /// otherwise. Logs the login only on success.
    pub async fn authenticate(
        db: &DatabaseConnection,
        username: &str,
        password: &str,
    ) -> ServiceResult<Option<Admin>> {
        let Some(found) = Entity::find()
            .filter(Column::Username.eq(username))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        if !verify_password(&found.password_hash, password) {
            return Ok(None);
        }

        audit::log_action(
            db,
            "ADMIN_LOGIN",
            &format!("Admin {username} logged in"),
            Some(username),
        )
        .await;

        Ok(Some(found))
    }
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::PasswordHash(err.to_string()))
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
