//! Fill — an executed trade, the atomic unit of the position ledger.

use super::money::Money;
use super::order::OrderSide;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique fill identity within a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FillId(pub Uuid);

impl fmt::Display for FillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Seed-deterministic fill id generator.
///
/// Ids are random-looking v4 uuids drawn from a seeded `StdRng`, so two runs
/// with the same seed produce identical id sequences regardless of wall clock
/// or thread scheduling.
#[derive(Debug)]
pub struct FillIdGen {
    rng: StdRng,
}

impl FillIdGen {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_id(&mut self) -> FillId {
        let bytes: [u8; 16] = self.rng.gen();
        FillId(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

/// Record of an executed trade. Immutable once appended to the fill log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub id: FillId,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub price: Money,
    pub created_at_ns: i64,
    pub leverage: f64,
    pub margin_used: Money,
}

impl Fill {
    pub fn is_buy(&self) -> bool {
        self.side == OrderSide::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == OrderSide::Sell
    }
}
