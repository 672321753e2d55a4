// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bonus arithmetic: sale aggregation, tier multipliers and money rounding.
//!
//! Everything here is pure. All amounts are `Decimal`; nothing is ever routed
//! through `f64`.

use crate::error::BonusError;
use crate::models::{Sale, Tier};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// 5% of completed sales.
pub const COMMISSION_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

pub const MONEY_DP: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalesTotal {
    pub total: Decimal,
    pub completed: usize,
    pub ignored: usize,
}

/// Sums the amounts of completed sales. Other statuses are skipped here even
/// if the caller already filtered them.
pub fn aggregate_completed(sales: &[Sale]) -> Result<SalesTotal, BonusError> {
    let mut out = SalesTotal {
        total: Decimal::ZERO,
        completed: 0,
        ignored: 0,
    };
    for sale in sales {
        if !sale.is_completed() {
            out.ignored += 1;
            continue;
        }
        let amount = parse_amount(sale)?;
        out.total = out
            .total
            .checked_add(amount)
            .ok_or_else(|| BonusError::DataIntegrity {
                partner_id: sale.partner_id,
                detail: format!("sales total overflows at sale {}", sale.id),
            })?;
        out.completed += 1;
    }
    Ok(out)
}

fn parse_amount(sale: &Sale) -> Result<Decimal, BonusError> {
    let raw = sale.amount.trim();
    Decimal::from_str_exact(raw).map_err(|err| BonusError::DataIntegrity {
        partner_id: sale.partner_id,
        detail: format!("sale {} has invalid amount '{}': {}", sale.id, sale.amount, err),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierMultiplier {
    pub tier: Option<Tier>,
    pub value: Decimal,
}

impl TierMultiplier {
    /// The label was not a known tier and the neutral multiplier was used.
    pub fn is_fallback(&self) -> bool {
        self.tier.is_none()
    }
}

impl Tier {
    pub fn multiplier(&self) -> Decimal {
        match self {
            Tier::Gold => Decimal::new(15, 1),
            Tier::Silver => Decimal::new(12, 1),
            Tier::Bronze => Decimal::ONE,
        }
    }
}

/// Unrecognized or empty labels get the neutral multiplier 1.0.
pub fn tier_multiplier(label: &str) -> TierMultiplier {
    match Tier::from_label(label) {
        Some(tier) => TierMultiplier {
            tier: Some(tier),
            value: tier.multiplier(),
        },
        None => TierMultiplier {
            tier: None,
            value: Decimal::ONE,
        },
    }
}

/// Rounds half away from zero to two places (0.125 -> 0.13).
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_DP);
    rounded
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BonusComputation {
    pub sales: SalesTotal,
    pub base: Decimal,
    pub multiplier: TierMultiplier,
    pub amount: Decimal,
}

pub fn compute_bonus(sales: &[Sale], tier_label: &str) -> Result<BonusComputation, BonusError> {
    let totals = aggregate_completed(sales)?;
    let multiplier = tier_multiplier(tier_label);
    let overflow = || BonusError::DataIntegrity {
        partner_id: sales.first().map(|s| s.partner_id).unwrap_or_default(),
        detail: format!("bonus for sales total {} overflows", totals.total),
    };
    let base = totals.total.checked_mul(COMMISSION_RATE).ok_or_else(overflow)?;
    let amount = round_money(base.checked_mul(multiplier.value).ok_or_else(overflow)?);
    Ok(BonusComputation {
        sales: totals,
        base,
        multiplier,
        amount,
    })
}
