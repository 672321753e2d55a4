// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SALE_STATUS_COMPLETED: &str = "completed";

/// Storage format for sale and bonus timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: i64,
    pub name: String,
    pub tier: String, // raw label as stored
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Gold,
    Silver,
    Bronze,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Gold, Tier::Silver, Tier::Bronze];

    /// Parses a stored tier label. Surrounding whitespace and ASCII case are ignored.
    pub fn from_label(label: &str) -> Option<Tier> {
        let label = label.trim();
        Tier::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(label))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Gold => "gold",
            Tier::Silver => "silver",
            Tier::Bronze => "bronze",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub partner_id: i64,
    pub amount: String, // decimal text, parsed by the aggregator
    pub product_name: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl Sale {
    pub fn is_completed(&self) -> bool {
        self.status == SALE_STATUS_COMPLETED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bonus {
    pub partner_id: i64,
    pub amount: Decimal, // scale 2
    pub period: String,
    pub calculated_at: NaiveDateTime,
}

impl Bonus {
    pub fn new(partner_id: i64, amount: Decimal, period: &str) -> Self {
        let calculated_at = Utc::now().naive_utc();
        Self::with_calculated_at(partner_id, amount, period, calculated_at)
    }

    pub fn with_calculated_at(
        partner_id: i64,
        mut amount: Decimal,
        period: &str,
        calculated_at: NaiveDateTime,
    ) -> Self {
        amount.rescale(2);
        Self {
            partner_id,
            amount,
            period: period.to_string(),
            calculated_at,
        }
    }

    pub fn amount_text(&self) -> String {
        format!("{:.2}", self.amount)
    }
}
