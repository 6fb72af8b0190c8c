use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202601200002_create_attendance"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // attendance_sessions
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("attendance_sessions"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("session_type"))
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("venue")).string().not_null())
                    .col(ColumnDef::new(Alias::new("remarks")).string())
                    .col(ColumnDef::new(Alias::new("date")).date().not_null())
                    .col(ColumnDef::new(Alias::new("start_time")).time().not_null())
                    .col(ColumnDef::new(Alias::new("end_time")).time())
                    .col(
                        ColumnDef::new(Alias::new("created_by"))
                            .string()
                            .not_null()
                            .default("system"),
                    )
                    .col(ColumnDef::new(Alias::new("qr_code_data")).string())
                    .col(
                        ColumnDef::new(Alias::new("is_active"))
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .to_owned(),
            )
            .await?;

        // attendance_records
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("attendance_records"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("professor_id"))
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("session_id")).big_integer())
                    .col(ColumnDef::new(Alias::new("date")).date().not_null())
                    .col(ColumnDef::new(Alias::new("time_in")).time().not_null())
                    .col(ColumnDef::new(Alias::new("time_out")).time())
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .string()
                            .not_null()
                            .default("Present"),
                    )
                    .col(ColumnDef::new(Alias::new("venue")).string())
                    .col(ColumnDef::new(Alias::new("remarks")).string())
                    .col(ColumnDef::new(Alias::new("session_type")).string())
                    .col(ColumnDef::new(Alias::new("latitude")).double())
                    .col(ColumnDef::new(Alias::new("longitude")).double())
                    .col(ColumnDef::new(Alias::new("device_id")).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_att_rec_professor")
                            .from(Alias::new("attendance_records"), Alias::new("professor_id"))
                            .to(Alias::new("professors"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_att_rec_session")
                            .from(Alias::new("attendance_records"), Alias::new("session_id"))
                            .to(Alias::new("attendance_sessions"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One check-in per professor per session per day. NULL session ids
        // compare distinct in SQLite; the service layer guards that case.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_att_rec_professor_session_date")
                    .table(Alias::new("attendance_records"))
                    .col(Alias::new("professor_id"))
                    .col(Alias::new("session_id"))
                    .col(Alias::new("date"))
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("attendance_records"))
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(Alias::new("attendance_sessions"))
                    .to_owned(),
            )
            .await
    }
}
