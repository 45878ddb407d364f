use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create tickets table
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tickets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tickets::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Tickets::Number).string().not_null())
                    .col(ColumnDef::new(Tickets::AccountId).uuid())
                    .col(ColumnDef::new(Tickets::ContactEmail).string().not_null())
                    .col(ColumnDef::new(Tickets::Subject).string().not_null())
                    .col(ColumnDef::new(Tickets::Description).text().not_null())
                    .col(ColumnDef::new(Tickets::Status).string().not_null())
                    .col(ColumnDef::new(Tickets::Priority).string().not_null())
                    .col(ColumnDef::new(Tickets::AssigneeId).uuid())
                    .col(ColumnDef::new(Tickets::Channel).string().not_null())
                    .col(
                        ColumnDef::new(Tickets::SlaDueAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Tickets::FirstResponseAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tickets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_tenant_status")
                    .table(Tickets::Table)
                    .col(Tickets::TenantId)
                    .col(Tickets::Status)
                    .to_owned(),
            )
            .await?;

        // Create ticket comments table
        manager
            .create_table(
                Table::create()
                    .table(TicketComments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketComments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TicketComments::TenantId).uuid().not_null())
                    .col(ColumnDef::new(TicketComments::TicketId).uuid().not_null())
                    .col(ColumnDef::new(TicketComments::AuthorType).string().not_null())
                    .col(ColumnDef::new(TicketComments::AuthorId).uuid())
                    .col(ColumnDef::new(TicketComments::Body).text().not_null())
                    .col(
                        ColumnDef::new(TicketComments::Internal)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TicketComments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ticket_comments_ticket")
                    .table(TicketComments::Table)
                    .col(TicketComments::TicketId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TicketComments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    TenantId,
    Number,
    AccountId,
    ContactEmail,
    Subject,
    Description,
    Status,
    Priority,
    AssigneeId,
    Channel,
    SlaDueAt,
    FirstResponseAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TicketComments {
    Table,
    Id,
    TenantId,
    TicketId,
    AuthorType,
    AuthorId,
    Body,
    Internal,
    CreatedAt,
}
