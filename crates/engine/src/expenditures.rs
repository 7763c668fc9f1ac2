//! Expenditure primitives.
//!
//! An `Expenditure` is a single recorded purchase. Responsibility for it is
//! divided among users by the split rows attached to it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expenditure {
    pub id: Uuid,
    pub spender_id: String,
    pub amount: Money,
    pub currency: Currency,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub entered_at: DateTime<Utc>,
}

impl Expenditure {
    pub fn new(
        spender_id: String,
        amount: Money,
        description: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            spender_id,
            amount,
            currency: Currency::default(),
            description,
            occurred_at,
            entered_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenditures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub spender_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub description: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub entered_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SpenderId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Spender,
    #[sea_orm(has_many = "super::splits::Entity")]
    Splits,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Spender.def()
    }
}

impl Related<super::splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Splits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expenditure> for ActiveModel {
    fn from(expenditure: &Expenditure) -> Self {
        Self {
            id: ActiveValue::Set(expenditure.id.to_string()),
            spender_id: ActiveValue::Set(expenditure.spender_id.clone()),
            amount_minor: ActiveValue::Set(expenditure.amount.cents()),
            currency: ActiveValue::Set(expenditure.currency.code().to_string()),
            description: ActiveValue::Set(expenditure.description.clone()),
            occurred_at: ActiveValue::Set(expenditure.occurred_at),
            entered_at: ActiveValue::Set(expenditure.entered_at),
        }
    }
}

impl TryFrom<Model> for Expenditure {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|_| EngineError::KeyNotFound(model.id.clone()))?;
        Ok(Self {
            id,
            spender_id: model.spender_id,
            amount: Money::new(model.amount_minor),
            currency: Currency::try_from(model.currency.as_str())?,
            description: model.description,
            occurred_at: model.occurred_at,
            entered_at: model.entered_at,
        })
    }
}
