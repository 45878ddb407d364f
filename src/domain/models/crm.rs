// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// 客户（公司）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub domain: Option<String>,
    pub industry: Option<String>,
    /// 负责人（员工ID）
    pub owner_id: Option<Uuid>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

string_enum!(AccountStatus {
    Active => "active",
    Inactive => "inactive",
});

/// 联系人
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub account_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// 商机阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    #[default]
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

string_enum!(DealStage {
    Lead => "lead",
    Qualified => "qualified",
    Proposal => "proposal",
    Negotiation => "negotiation",
    ClosedWon => "closed_won",
    ClosedLost => "closed_lost",
});

impl DealStage {
    /// 阶段对应的成交概率（百分比）
    pub fn probability(&self) -> u8 {
        match self {
            DealStage::Lead => 10,
            DealStage::Qualified => 25,
            DealStage::Proposal => 50,
            DealStage::Negotiation => 75,
            DealStage::ClosedWon => 100,
            DealStage::ClosedLost => 0,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }
}

/// 商机
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub amount: i64,
    pub stage: DealStage,
    pub expected_close: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deal {
    /// 变更阶段，已关闭的商机不能再变更
    pub fn move_to(&mut self, stage: DealStage) -> Result<(), DomainError> {
        if self.stage.is_closed() && self.stage != stage {
            return Err(DomainError::transition(self.stage, stage));
        }
        self.stage = stage;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// 历史记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub account_id: Option<Uuid>,
    /// 实体类型，如 invoice、payment、quote、ticket、renewal
    pub entity_type: String,
    pub entity_id: Uuid,
    /// 事件类型，如 invoice.issued
    pub kind: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl CrmEvent {
    pub fn new(
        tenant_id: Uuid,
        account_id: Option<Uuid>,
        entity_type: &str,
        entity_id: Uuid,
        kind: &str,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            account_id,
            entity_type: entity_type.to_string(),
            entity_id,
            kind: kind.to_string(),
            data,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(stage: DealStage) -> Deal {
        Deal {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            name: "Expansion".into(),
            amount: 100_00,
            stage,
            expected_close: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stage_probability() {
        assert_eq!(DealStage::Lead.probability(), 10);
        assert_eq!(DealStage::Negotiation.probability(), 75);
        assert_eq!(DealStage::ClosedWon.probability(), 100);
        assert_eq!(DealStage::ClosedLost.probability(), 0);
    }

    #[test]
    fn test_closed_deal_cannot_reopen() {
        let mut open = deal(DealStage::Proposal);
        assert!(open.move_to(DealStage::ClosedWon).is_ok());
        assert!(matches!(
            open.move_to(DealStage::Negotiation),
            Err(DomainError::InvalidTransition { .. })
        ));

        let mut lost = deal(DealStage::ClosedLost);
        assert!(lost.move_to(DealStage::Lead).is_err());
    }
}
