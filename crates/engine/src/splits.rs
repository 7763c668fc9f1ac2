//! Split rows: one `(expenditure, user, share)` record per participant.
//!
//! Rows for an expenditure are always replaced as a unit (delete-then-insert
//! inside one DB transaction), so the stored shares of an expenditure sum
//! exactly to its amount at all times.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::Money;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub expenditure_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub share_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenditures::Entity",
        from = "Column::ExpenditureId",
        to = "super::expenditures::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenditure,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    User,
}

impl Related<super::expenditures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenditure.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn from_share(expenditure_id: &str, user_id: &str, share: Money) -> Self {
        Self {
            expenditure_id: ActiveValue::Set(expenditure_id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            share_minor: ActiveValue::Set(share.cents()),
        }
    }
}
