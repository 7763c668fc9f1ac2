//! Split computation: weight normalization and exact currency allocation.
//!
//! The two phases are pure functions; the only non-determinism is the random
//! draw used to distribute the rounding residual, and the caller supplies the
//! random source so tests can seed it.

use std::collections::HashMap;
use std::hash::Hash;

use rand::Rng;
use rust_decimal::prelude::*;

use crate::{EngineError, Money, ResultEngine};

/// Rescales raw weights into fractions that sum to 1.
///
/// Weights are arbitrary positive numbers (they do not have to sum to 100).
/// Each output value equals `weight / sum(weights)` at full `Decimal`
/// precision; no rounding happens at this stage.
pub fn normalize<P>(weights: &HashMap<P, Decimal>) -> ResultEngine<HashMap<P, Decimal>>
where
    P: Clone + Eq + Hash,
{
    if weights.is_empty() {
        return Err(EngineError::InvalidSplit(
            "no participants to split between".to_string(),
        ));
    }

    for weight in weights.values() {
        if *weight <= Decimal::ZERO {
            return Err(EngineError::InvalidSplit(format!(
                "weights must be positive, got {weight}"
            )));
        }
    }

    let total: Decimal = weights.values().copied().sum();
    if total.is_zero() {
        return Err(EngineError::InvalidSplit("weights sum to zero".to_string()));
    }

    weights
        .iter()
        .map(|(participant, weight)| {
            let fraction = weight
                .checked_div(total)
                .ok_or_else(|| EngineError::InvalidSplit("weight out of range".to_string()))?;
            Ok((participant.clone(), fraction))
        })
        .collect()
}

/// Builds the weight mapping for an even split among `participants`.
///
/// Every participant gets weight `100 / N`, which [`normalize`] turns into
/// `1 / N` — the same path as explicit weights, no separate algorithm.
pub fn even_weights<P>(participants: &[P]) -> ResultEngine<HashMap<P, Decimal>>
where
    P: Clone + Eq + Hash,
{
    if participants.is_empty() {
        return Err(EngineError::InvalidSplit(
            "no participants eligible for an even split".to_string(),
        ));
    }

    let share = Decimal::from(100)
        .checked_div(Decimal::from(participants.len() as u64))
        .ok_or_else(|| EngineError::InvalidSplit("too many participants".to_string()))?;

    Ok(participants
        .iter()
        .map(|participant| (participant.clone(), share))
        .collect())
}

/// Converts normalized fractions into exact per-participant amounts.
///
/// Each product `fraction * amount` is rounded to whole minor units with
/// round-half-to-even (banker's rounding). Independent rounding can leak or
/// gain up to half a minor unit per participant, so the residual
/// `amount - sum(rounded)` is eliminated by repeatedly picking one
/// participant uniformly at random (with replacement) and nudging their
/// share by one minor unit until the parts sum exactly to `amount`.
///
/// The winner is drawn from a sorted participant list, so runs with a seeded
/// `rng` are reproducible regardless of map iteration order.
pub fn allocate<P, R>(
    amount: Money,
    fractions: &HashMap<P, Decimal>,
    rng: &mut R,
) -> ResultEngine<HashMap<P, Money>>
where
    P: Clone + Eq + Hash + Ord,
    R: Rng + ?Sized,
{
    if fractions.is_empty() {
        return Err(EngineError::InvalidSplit(
            "no participants to allocate between".to_string(),
        ));
    }

    let total = Decimal::from(amount.cents());
    let mut shares: HashMap<P, i64> = HashMap::with_capacity(fractions.len());
    for (participant, fraction) in fractions {
        if *fraction <= Decimal::ZERO {
            return Err(EngineError::InvalidSplit(format!(
                "fractions must be positive, got {fraction}"
            )));
        }
        let raw = fraction
            .checked_mul(total)
            .ok_or_else(|| EngineError::InvalidSplit("amount out of range".to_string()))?;
        let cents = raw
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .to_i64()
            .ok_or_else(|| EngineError::InvalidSplit("amount out of range".to_string()))?;
        shares.insert(participant.clone(), cents);
    }

    let allocated: i64 = shares.values().sum();
    let mut residual = amount.cents() - allocated;

    // Fixed draw order for reproducibility under a seeded rng.
    let mut order: Vec<&P> = fractions.keys().collect();
    order.sort();

    while residual != 0 {
        let winner = order[rng.random_range(0..order.len())];
        let step = residual.signum();
        if let Some(share) = shares.get_mut(winner) {
            *share += step;
        }
        residual -= step;
    }

    Ok(shares
        .into_iter()
        .map(|(participant, cents)| (participant, Money::new(cents)))
        .collect())
}

/// Full split: [`normalize`] then [`allocate`].
///
/// The returned mapping always sums exactly to `amount`.
pub fn split_amount<P, R>(
    amount: Money,
    weights: &HashMap<P, Decimal>,
    rng: &mut R,
) -> ResultEngine<HashMap<P, Money>>
where
    P: Clone + Eq + Hash + Ord,
    R: Rng + ?Sized,
{
    let fractions = normalize(weights)?;
    allocate(amount, &fractions, rng)
}
