// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub number: String,
    pub account_id: Uuid,
    pub billing_email: Option<String>,
    pub status: String,
    pub issue_date: Option<Date>,
    pub due_date: Date,
    pub currency: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub lines: Json,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub discount: Option<Json>,
    pub tax_rate_bps: i32,
    pub subtotal: i64,
    pub discount_total: i64,
    pub tax_total: i64,
    pub total: i64,
    pub amount_paid: i64,
    pub amount_refunded: i64,
    pub source: String,
    pub quote_id: Option<Uuid>,
    pub renewal_id: Option<Uuid>,
    pub issuance_entry_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
