//! Follow-up actions for finished top-level tasks
//!
//! A continuation is plain data: the agent loop looks at it together with
//! the finished task's value and decides what happens next. Nothing here
//! holds a closure, so queued tasks survive a save/load round trip.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuation {
    /// Carry the produced goods to market and post them for sale
    SellResult,
    /// Eat the produced food
    EatResult,
    /// Register the agent as a resident of the returned building
    MoveIntoHome,
    /// Withdraw every standing buy order the agent left behind
    ReleaseOrders,
}
