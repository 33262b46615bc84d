//! Standing orders

use serde::{Deserialize, Serialize};

use crate::core::types::AgentId;
use crate::goods::GoodId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Demand contribution of one attempt on this side
    pub fn demand_delta(self) -> f32 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

/// A request to trade `quantity` units of one good at the market price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub requestor: AgentId,
    pub good: GoodId,
    /// Remaining quantity, never negative
    pub quantity: f32,
    pub side: Side,
}

impl Order {
    pub fn buy(requestor: AgentId, good: GoodId, quantity: f32) -> Self {
        Self {
            requestor,
            good,
            quantity: quantity.max(0.0),
            side: Side::Buy,
        }
    }

    pub fn sell(requestor: AgentId, good: GoodId, quantity: f32) -> Self {
        Self {
            requestor,
            good,
            quantity: quantity.max(0.0),
            side: Side::Sell,
        }
    }
}
