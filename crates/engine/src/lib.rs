//! Financial core of a shared-expense tracker.
//!
//! The interesting part lives in [`split`]: normalizing share weights and
//! allocating an amount into per-participant parts that sum back exactly,
//! cent for cent. [`Engine`] is the thin orchestration layer that ties the
//! split core to the persisted users / expenditures / splits tables.

use std::collections::HashMap;

pub use currency::Currency;
pub use error::EngineError;
pub use expenditures::Expenditure;
pub use money::Money;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, DatabaseConnection, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

mod currency;
mod error;
pub mod expenditures;
mod money;
pub mod split;
pub mod splits;
pub mod users;

type ResultEngine<T> = Result<T, EngineError>;

/// Orchestrates splits against the database.
///
/// Holds only the connection; every operation is stateless and reads what it
/// needs per call.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Add a new user.
    pub async fn new_user(
        &self,
        username: &str,
        name: Option<&str>,
        resident: bool,
    ) -> ResultEngine<()> {
        let user = users::ActiveModel {
            username: ActiveValue::Set(username.to_string()),
            name: ActiveValue::Set(name.map(|s| s.to_string())),
            resident: ActiveValue::Set(resident),
            email: ActiveValue::Set(None),
            password: ActiveValue::Set(None),
        };
        user.insert(&self.database).await?;
        Ok(())
    }

    /// Usernames of all resident users, the default even-split participants.
    pub async fn residents(&self) -> ResultEngine<Vec<String>> {
        let rows = users::Entity::find()
            .filter(users::Column::Resident.eq(true))
            .order_by_asc(users::Column::Username)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(|user| user.username).collect())
    }

    /// Record a new expenditure; returns its id.
    ///
    /// The expenditure carries no splits until [`split_expenditure`] or
    /// [`even_split`] is called for it.
    ///
    /// [`split_expenditure`]: Engine::split_expenditure
    /// [`even_split`]: Engine::even_split
    pub async fn new_expenditure(
        &self,
        spender_id: &str,
        amount: Money,
        description: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        users::Entity::find_by_id(spender_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(spender_id.to_string()))?;

        let expenditure = Expenditure::new(
            spender_id.to_string(),
            amount,
            description.map(|s| s.to_string()),
            occurred_at,
        );
        let id = expenditure.id;
        expenditures::ActiveModel::from(&expenditure)
            .insert(&self.database)
            .await?;

        tracing::debug!(%id, spender = spender_id, %amount, "recorded expenditure");
        Ok(id)
    }

    /// Return an [`Expenditure`].
    pub async fn expenditure(&self, expenditure_id: Uuid) -> ResultEngine<Expenditure> {
        let model = expenditures::Entity::find_by_id(expenditure_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(expenditure_id.to_string()))?;
        Expenditure::try_from(model)
    }

    /// Split an expenditure among users according to `weights`.
    ///
    /// Weights are normalized, the amount is allocated exactly (see
    /// [`split::split_amount`]), and the expenditure's split rows are
    /// replaced: prior rows are deleted and the fresh allocation inserted
    /// within a single DB transaction, so readers never observe a partial
    /// split.
    ///
    /// Returns the stored allocation.
    pub async fn split_expenditure<R: Rng>(
        &self,
        expenditure_id: Uuid,
        weights: &HashMap<String, Decimal>,
        rng: &mut R,
    ) -> ResultEngine<HashMap<String, Money>> {
        let expenditure = self.expenditure(expenditure_id).await?;
        let shares = split::split_amount(expenditure.amount, weights, rng)?;

        let expenditure_key = expenditure_id.to_string();
        let db_tx = self.database.begin().await?;
        splits::Entity::delete_many()
            .filter(splits::Column::ExpenditureId.eq(expenditure_key.clone()))
            .exec(&db_tx)
            .await?;
        splits::Entity::insert_many(shares.iter().map(|(user_id, share)| {
            splits::ActiveModel::from_share(&expenditure_key, user_id, *share)
        }))
        .exec(&db_tx)
        .await?;
        db_tx.commit().await?;

        tracing::debug!(
            %expenditure_id,
            participants = shares.len(),
            amount = %expenditure.amount,
            "replaced splits"
        );
        Ok(shares)
    }

    /// Split an expenditure evenly among the resident users.
    pub async fn even_split<R: Rng>(
        &self,
        expenditure_id: Uuid,
        rng: &mut R,
    ) -> ResultEngine<HashMap<String, Money>> {
        let residents = self.residents().await?;
        let weights = split::even_weights(&residents)?;
        self.split_expenditure(expenditure_id, &weights, rng).await
    }

    /// Stored splits of an expenditure as `(username, share)` pairs.
    pub async fn splits_for_expenditure(
        &self,
        expenditure_id: Uuid,
    ) -> ResultEngine<Vec<(String, Money)>> {
        let rows = splits::Entity::find()
            .filter(splits::Column::ExpenditureId.eq(expenditure_id.to_string()))
            .order_by_asc(splits::Column::UserId)
            .all(&self.database)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.user_id, Money::new(row.share_minor)))
            .collect())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
