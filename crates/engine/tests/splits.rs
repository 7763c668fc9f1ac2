use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection};
use std::collections::HashMap;

use engine::{Engine, EngineError, Money};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

async fn seed_household(engine: &Engine) {
    engine.new_user("alice", Some("Alice"), true).await.unwrap();
    engine.new_user("bob", Some("Bob"), true).await.unwrap();
    engine.new_user("carol", Some("Carol"), true).await.unwrap();
    // Moved out; must never appear in an even split.
    engine.new_user("dave", Some("Dave"), false).await.unwrap();
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(1)
}

#[tokio::test]
async fn residents_excludes_non_residents() {
    let (engine, _db) = engine_with_db().await;
    seed_household(&engine).await;

    let residents = engine.residents().await.unwrap();
    assert_eq!(residents, vec!["alice", "bob", "carol"]);
}

#[tokio::test]
async fn even_split_is_exact_and_skips_non_residents() {
    let (engine, _db) = engine_with_db().await;
    seed_household(&engine).await;

    let expenditure_id = engine
        .new_expenditure("alice", Money::new(100_00), Some("groceries"), Utc::now())
        .await
        .unwrap();

    engine.even_split(expenditure_id, &mut rng()).await.unwrap();

    let stored = engine.splits_for_expenditure(expenditure_id).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|(user, _)| user != "dave"));

    let total: Money = stored.iter().map(|(_, share)| *share).sum();
    assert_eq!(total, Money::new(100_00));

    let mut shares: Vec<i64> = stored.iter().map(|(_, share)| share.cents()).collect();
    shares.sort_unstable();
    assert_eq!(shares, vec![33_33, 33_33, 33_34]);
}

#[tokio::test]
async fn weighted_split_stores_normalized_shares() {
    let (engine, _db) = engine_with_db().await;
    seed_household(&engine).await;

    let expenditure_id = engine
        .new_expenditure("bob", Money::from_major(10), Some("internet"), Utc::now())
        .await
        .unwrap();

    // Raw weights do not sum to 100; normalization handles that.
    let weights = HashMap::from([
        ("alice".to_string(), dec!(7)),
        ("bob".to_string(), dec!(3)),
    ]);
    let shares = engine
        .split_expenditure(expenditure_id, &weights, &mut rng())
        .await
        .unwrap();
    assert_eq!(shares["alice"], Money::new(7_00));
    assert_eq!(shares["bob"], Money::new(3_00));

    let stored = engine.splits_for_expenditure(expenditure_id).await.unwrap();
    assert_eq!(
        stored,
        vec![
            ("alice".to_string(), Money::new(7_00)),
            ("bob".to_string(), Money::new(3_00)),
        ]
    );
}

#[tokio::test]
async fn resplit_replaces_prior_rows() {
    let (engine, _db) = engine_with_db().await;
    seed_household(&engine).await;

    let expenditure_id = engine
        .new_expenditure("carol", Money::from_major(60), Some("utilities"), Utc::now())
        .await
        .unwrap();

    let weights = HashMap::from([
        ("alice".to_string(), dec!(50)),
        ("bob".to_string(), dec!(50)),
    ]);
    engine
        .split_expenditure(expenditure_id, &weights, &mut rng())
        .await
        .unwrap();

    // Re-splitting evenly must drop the two-way rows, not accumulate.
    engine.even_split(expenditure_id, &mut rng()).await.unwrap();

    let stored = engine.splits_for_expenditure(expenditure_id).await.unwrap();
    assert_eq!(stored.len(), 3);
    let total: Money = stored.iter().map(|(_, share)| *share).sum();
    assert_eq!(total, Money::new(60_00));
}

#[tokio::test]
async fn negative_expenditure_splits_exactly() {
    let (engine, _db) = engine_with_db().await;
    seed_household(&engine).await;

    let expenditure_id = engine
        .new_expenditure("alice", Money::new(-50_00), Some("refund"), Utc::now())
        .await
        .unwrap();

    let weights = HashMap::from([
        ("alice".to_string(), dec!(1)),
        ("bob".to_string(), dec!(1)),
    ]);
    let shares = engine
        .split_expenditure(expenditure_id, &weights, &mut rng())
        .await
        .unwrap();
    assert_eq!(shares["alice"], Money::new(-25_00));
    assert_eq!(shares["bob"], Money::new(-25_00));
}

#[tokio::test]
async fn split_of_unknown_expenditure_fails() {
    let (engine, _db) = engine_with_db().await;
    seed_household(&engine).await;

    let missing = Uuid::new_v4();
    let err = engine.even_split(missing, &mut rng()).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound(missing.to_string()));
}

#[tokio::test]
async fn even_split_without_residents_fails() {
    let (engine, _db) = engine_with_db().await;
    engine.new_user("dave", Some("Dave"), false).await.unwrap();

    let expenditure_id = engine
        .new_expenditure("dave", Money::new(10_00), None, Utc::now())
        .await
        .unwrap();

    let err = engine
        .even_split(expenditure_id, &mut rng())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSplit(_)));
}

#[tokio::test]
async fn zero_weight_is_rejected_before_any_write() {
    let (engine, _db) = engine_with_db().await;
    seed_household(&engine).await;

    let expenditure_id = engine
        .new_expenditure("alice", Money::new(100_00), None, Utc::now())
        .await
        .unwrap();

    let weights = HashMap::from([
        ("alice".to_string(), dec!(1)),
        ("bob".to_string(), dec!(0)),
    ]);
    let err = engine
        .split_expenditure(expenditure_id, &weights, &mut rng())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSplit(_)));

    // Nothing was stored for the expenditure.
    let stored = engine.splits_for_expenditure(expenditure_id).await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn expenditure_with_unknown_spender_fails() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .new_expenditure("nobody", Money::new(10_00), None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("nobody".to_string()));
}
