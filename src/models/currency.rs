//! 币种模型（全局唯一默认币种）

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::repository::default_flag::DefaultFlagged;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Currency {
    pub id: Uuid,
    /// ISO 4217 代码
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DefaultFlagged for Currency {
    const TABLE: &'static str = "currencies";
    const FLAG_COLUMN: &'static str = "is_default";
    const ENTITY: &'static str = "currency";

    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn is_flagged(&self) -> bool {
        self.is_default
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCurrencyRequest {
    #[validate(length(equal = 3))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub symbol: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCurrencyRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub is_default: Option<bool>,
    pub is_active: Option<bool>,
}
