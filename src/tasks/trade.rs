//! Market leaf tasks

use serde::{Deserialize, Serialize};

use crate::goods::{Good, GoodId};
use crate::market::{Order, Side};
use crate::tasks::context::TaskContext;
use crate::tasks::status::TaskValue;
use crate::tasks::task::{Progress, TaskBehavior};

/// One buy attempt at the current price
///
/// Reports the quantity actually bought. Whatever did not fill stays on
/// the book as a standing buy order, unless nothing filled at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buy {
    pub good: GoodId,
    pub quantity: f32,
}

impl Buy {
    pub fn new(good: GoodId, quantity: f32) -> Self {
        Self { good, quantity }
    }
}

impl TaskBehavior for Buy {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let agent = ctx.agent;
        let epsilon = ctx.config.order_epsilon;
        let (exchange, mut accounts) = ctx.world.market();

        let outcome =
            exchange.attempt_transact(Order::buy(agent, self.good, self.quantity), &mut accounts);
        if outcome.filled < epsilon {
            exchange.cancel_orders(agent, self.good, Side::Buy);
            return Progress::Failed;
        }
        Progress::Done(TaskValue::Goods(vec![Good::new(self.good, outcome.filled)]))
    }

    fn describe(&self) -> String {
        format!("buy {:.2} of {}", self.quantity, self.good)
    }
}

/// Post sell orders for goods the agent carries
///
/// Anything not matched right away rests on the book, replacing whatever
/// the agent already had listed for that good. Fails only when the agent
/// holds none of the listed goods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sell {
    pub goods: Vec<Good>,
}

impl Sell {
    pub fn new(goods: Vec<Good>) -> Self {
        Self { goods }
    }
}

impl TaskBehavior for Sell {
    fn terminal(&mut self, ctx: &mut TaskContext) -> Progress {
        let agent = ctx.agent;
        let epsilon = ctx.config.order_epsilon;
        let mut sold = Vec::new();
        let mut posted = false;

        for good in &self.goods {
            let quantity = ctx.stockpile().get(good.id).min(good.quantity);
            if quantity < epsilon {
                continue;
            }
            posted = true;
            let (exchange, mut accounts) = ctx.world.market();
            exchange.cancel_orders(agent, good.id, Side::Sell);
            let outcome =
                exchange.attempt_transact(Order::sell(agent, good.id, quantity), &mut accounts);
            sold.push(Good::new(good.id, outcome.filled));
        }

        if posted {
            Progress::Done(TaskValue::Goods(sold))
        } else {
            Progress::Failed
        }
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.goods.iter().map(|g| g.id.to_string()).collect();
        format!("sell {}", names.join(", "))
    }
}
