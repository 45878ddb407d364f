use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create products table
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Products::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Products::Sku).string().not_null())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::UnitPrice).big_integer().not_null())
                    .col(ColumnDef::new(Products::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Products::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Products::CreatedAt)
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
                    .name("idx_products_tenant_sku")
                    .table(Products::Table)
                    .col(Products::TenantId)
                    .col(Products::Sku)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create bundles table
        manager
            .create_table(
                Table::create()
                    .table(Bundles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bundles::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bundles::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Bundles::Name).string().not_null())
                    .col(ColumnDef::new(Bundles::Items).json_binary().not_null())
                    .col(ColumnDef::new(Bundles::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bundles::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Bundles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create discounts table
        manager
            .create_table(
                Table::create()
                    .table(Discounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Discounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Discounts::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Discounts::Code).string().not_null())
                    .col(ColumnDef::new(Discounts::Kind).string().not_null())
                    .col(ColumnDef::new(Discounts::Value).big_integer().not_null())
                    .col(
                        ColumnDef::new(Discounts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Discounts::ExpiresAt).date())
                    .col(
                        ColumnDef::new(Discounts::CreatedAt)
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
                    .name("idx_discounts_tenant_code")
                    .table(Discounts::Table)
                    .col(Discounts::TenantId)
                    .col(Discounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Discounts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Bundles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    TenantId,
    Sku,
    Name,
    UnitPrice,
    Kind,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Bundles {
    Table,
    Id,
    TenantId,
    Name,
    Items,
    Price,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Discounts {
    Table,
    Id,
    TenantId,
    Code,
    Kind,
    Value,
    Active,
    ExpiresAt,
    CreatedAt,
}
