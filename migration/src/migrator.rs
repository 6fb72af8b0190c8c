use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202601200001_create_professors::Migration),
            Box::new(migrations::m202601200002_create_attendance::Migration),
            Box::new(migrations::m202601200003_create_courses::Migration),
            Box::new(migrations::m202601200004_create_admins::Migration),
            Box::new(migrations::m202601200005_create_system_logs::Migration),
        ]
    }
}
