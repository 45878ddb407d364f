use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::Domain).string())
                    .col(ColumnDef::new(Accounts::Industry).string())
                    .col(ColumnDef::new(Accounts::OwnerId).uuid())
                    .col(
                        ColumnDef::new(Accounts::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
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
                    .name("idx_accounts_tenant")
                    .table(Accounts::Table)
                    .col(Accounts::TenantId)
                    .to_owned(),
            )
            .await?;

        // Create contacts table
        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Contacts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Contacts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Contacts::AccountId).uuid())
                    .col(ColumnDef::new(Contacts::FirstName).string().not_null())
                    .col(ColumnDef::new(Contacts::LastName).string().not_null())
                    .col(ColumnDef::new(Contacts::Email).string())
                    .col(ColumnDef::new(Contacts::Phone).string())
                    .col(ColumnDef::new(Contacts::Title).string())
                    .col(
                        ColumnDef::new(Contacts::CreatedAt)
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
                    .name("idx_contacts_tenant_account")
                    .table(Contacts::Table)
                    .col(Contacts::TenantId)
                    .col(Contacts::AccountId)
                    .to_owned(),
            )
            .await?;

        // Create deals table
        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Deals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Deals::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Deals::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Deals::Name).string().not_null())
                    .col(
                        ColumnDef::new(Deals::Amount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Deals::Stage).string().not_null())
                    .col(ColumnDef::new(Deals::ExpectedClose).date())
                    .col(
                        ColumnDef::new(Deals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Deals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create CRM history table
        manager
            .create_table(
                Table::create()
                    .table(CrmEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CrmEvents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CrmEvents::TenantId).uuid().not_null())
                    .col(ColumnDef::new(CrmEvents::AccountId).uuid())
                    .col(ColumnDef::new(CrmEvents::EntityType).string().not_null())
                    .col(ColumnDef::new(CrmEvents::EntityId).uuid().not_null())
                    .col(ColumnDef::new(CrmEvents::Kind).string().not_null())
                    .col(ColumnDef::new(CrmEvents::Data).json_binary().not_null())
                    .col(
                        ColumnDef::new(CrmEvents::CreatedAt)
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
                    .name("idx_crm_events_account")
                    .table(CrmEvents::Table)
                    .col(CrmEvents::TenantId)
                    .col(CrmEvents::AccountId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrmEvents::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Contacts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    TenantId,
    Name,
    Domain,
    Industry,
    OwnerId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
    TenantId,
    AccountId,
    FirstName,
    LastName,
    Email,
    Phone,
    Title,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Deals {
    Table,
    Id,
    TenantId,
    AccountId,
    Name,
    Amount,
    Stage,
    ExpectedClose,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CrmEvents {
    Table,
    Id,
    TenantId,
    AccountId,
    EntityType,
    EntityId,
    Kind,
    Data,
    CreatedAt,
}
