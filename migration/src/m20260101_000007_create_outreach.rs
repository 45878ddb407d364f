use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create email templates table
        manager
            .create_table(
                Table::create()
                    .table(EmailTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailTemplates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailTemplates::TenantId).uuid().not_null())
                    .col(ColumnDef::new(EmailTemplates::Name).string().not_null())
                    .col(ColumnDef::new(EmailTemplates::Subject).string().not_null())
                    .col(ColumnDef::new(EmailTemplates::HtmlBody).text().not_null())
                    .col(
                        ColumnDef::new(EmailTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create outreach sequences table
        manager
            .create_table(
                Table::create()
                    .table(OutreachSequences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OutreachSequences::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OutreachSequences::TenantId).uuid().not_null())
                    .col(ColumnDef::new(OutreachSequences::Name).string().not_null())
                    .col(ColumnDef::new(OutreachSequences::Steps).json_binary().not_null())
                    .col(
                        ColumnDef::new(OutreachSequences::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(OutreachSequences::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create enrollments table
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Enrollments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Enrollments::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Enrollments::SequenceId).uuid().not_null())
                    .col(ColumnDef::new(Enrollments::ContactId).uuid().not_null())
                    .col(
                        ColumnDef::new(Enrollments::CurrentStep)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Enrollments::Status).string().not_null())
                    .col(ColumnDef::new(Enrollments::NextSendAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Enrollments::LastError).text())
                    .col(
                        ColumnDef::new(Enrollments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Enrollments::UpdatedAt)
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
                    .name("idx_enrollments_due")
                    .table(Enrollments::Table)
                    .col(Enrollments::Status)
                    .col(Enrollments::NextSendAt)
                    .to_owned(),
            )
            .await?;

        // Create campaigns table
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Campaigns::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Campaigns::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Campaigns::Name).string().not_null())
                    .col(ColumnDef::new(Campaigns::Subject).string().not_null())
                    .col(ColumnDef::new(Campaigns::HtmlBody).text().not_null())
                    .col(ColumnDef::new(Campaigns::Status).string().not_null())
                    .col(ColumnDef::new(Campaigns::RecipientIds).json_binary())
                    .col(ColumnDef::new(Campaigns::SentAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create email messages table
        manager
            .create_table(
                Table::create()
                    .table(EmailMessages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailMessages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailMessages::TenantId).uuid().not_null())
                    .col(ColumnDef::new(EmailMessages::ContactId).uuid())
                    .col(ColumnDef::new(EmailMessages::Recipient).string().not_null())
                    .col(ColumnDef::new(EmailMessages::Channel).string().not_null())
                    .col(ColumnDef::new(EmailMessages::Subject).string())
                    .col(ColumnDef::new(EmailMessages::CampaignId).uuid())
                    .col(ColumnDef::new(EmailMessages::EnrollmentId).uuid())
                    .col(ColumnDef::new(EmailMessages::Provider).string().not_null())
                    .col(ColumnDef::new(EmailMessages::ProviderMessageId).string())
                    .col(ColumnDef::new(EmailMessages::Status).string().not_null())
                    .col(
                        ColumnDef::new(EmailMessages::CreatedAt)
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
                    .name("idx_email_messages_provider_id")
                    .table(EmailMessages::Table)
                    .col(EmailMessages::ProviderMessageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_email_messages_campaign")
                    .table(EmailMessages::Table)
                    .col(EmailMessages::CampaignId)
                    .to_owned(),
            )
            .await?;

        // Create email events table
        manager
            .create_table(
                Table::create()
                    .table(EmailEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EmailEvents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(EmailEvents::TenantId).uuid().not_null())
                    .col(ColumnDef::new(EmailEvents::MessageId).uuid().not_null())
                    .col(ColumnDef::new(EmailEvents::Kind).string().not_null())
                    .col(ColumnDef::new(EmailEvents::Url).text())
                    .col(
                        ColumnDef::new(EmailEvents::CreatedAt)
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
                    .name("idx_email_events_message")
                    .table(EmailEvents::Table)
                    .col(EmailEvents::MessageId)
                    .to_owned(),
            )
            .await?;

        // Create suppression list table
        manager
            .create_table(
                Table::create()
                    .table(Unsubscribes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Unsubscribes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Unsubscribes::TenantId).uuid().not_null())
                    .col(ColumnDef::new(Unsubscribes::Email).string().not_null())
                    .col(ColumnDef::new(Unsubscribes::Reason).string())
                    .col(
                        ColumnDef::new(Unsubscribes::CreatedAt)
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
                    .name("idx_unsubscribes_tenant_email")
                    .table(Unsubscribes::Table)
                    .col(Unsubscribes::TenantId)
                    .col(Unsubscribes::Email)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Unsubscribes::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EmailEvents::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EmailMessages::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(OutreachSequences::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EmailTemplates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EmailTemplates {
    Table,
    Id,
    TenantId,
    Name,
    Subject,
    HtmlBody,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OutreachSequences {
    Table,
    Id,
    TenantId,
    Name,
    Steps,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Enrollments {
    Table,
    Id,
    TenantId,
    SequenceId,
    ContactId,
    CurrentStep,
    Status,
    NextSendAt,
    LastError,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    TenantId,
    Name,
    Subject,
    HtmlBody,
    Status,
    RecipientIds,
    SentAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EmailMessages {
    Table,
    Id,
    TenantId,
    ContactId,
    Recipient,
    Channel,
    Subject,
    CampaignId,
    EnrollmentId,
    Provider,
    ProviderMessageId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EmailEvents {
    Table,
    Id,
    TenantId,
    MessageId,
    Kind,
    Url,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Unsubscribes {
    Table,
    Id,
    TenantId,
    Email,
    Reason,
    CreatedAt,
}
