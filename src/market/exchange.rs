//! Continuous double-auction exchange
//!
//! Every good has a buy book and a sell book, each kept in insertion order.
//! Incoming orders match against the opposite book oldest-first at the
//! current market price; there is no bid/ask auction. Prices drift with
//! the net demand signal and stay inside a band around the catalog price.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::config::SimulationConfig;
use crate::core::types::AgentId;
use crate::goods::{GoodId, GoodsCatalog};
use crate::market::order::{Order, Side};

/// Money and goods the exchange can inspect and move
///
/// The exchange never owns balances; it settles trades through this view.
pub trait Ledger {
    fn money(&self, agent: AgentId) -> f32;
    fn held(&self, agent: AgentId, good: GoodId) -> f32;
    fn withdraw(&mut self, agent: AgentId, amount: f32);
    fn deposit(&mut self, agent: AgentId, amount: f32);
    /// Move up to `quantity` units; returns the amount moved
    fn move_goods(&mut self, from: AgentId, to: AgentId, good: GoodId, quantity: f32) -> f32;
    fn credit_treasury(&mut self, amount: f32);
}

/// Result of one [`Exchange::attempt_transact`] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactOutcome {
    /// True only when the whole requested quantity matched
    pub success: bool,
    /// Quantity actually traded
    pub filled: f32,
}

impl TransactOutcome {
    fn rejected() -> Self {
        Self {
            success: false,
            filled: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    buy_orders: AHashMap<GoodId, VecDeque<Order>>,
    sell_orders: AHashMap<GoodId, VecDeque<Order>>,
    prices: AHashMap<GoodId, f32>,
    /// Net buy (+1) vs sell (-1) attempts, accumulated for the whole session
    demand: AHashMap<GoodId, f32>,
    default_prices: AHashMap<GoodId, f32>,
    tax_rate: f32,
    price_adjust_rate: f32,
    price_floor_ratio: f32,
    price_ceiling_ratio: f32,
    epsilon: f32,
}

impl Exchange {
    /// Open an exchange with every catalog good at its default price
    ///
    /// Default market price is the catalog price plus tax.
    pub fn new(catalog: &GoodsCatalog, config: &SimulationConfig) -> Self {
        let default_prices: AHashMap<GoodId, f32> = catalog
            .all()
            .iter()
            .map(|r| (r.good, r.base_price * (1.0 + config.tax_rate)))
            .collect();

        Self {
            buy_orders: AHashMap::new(),
            sell_orders: AHashMap::new(),
            prices: default_prices.clone(),
            demand: AHashMap::new(),
            default_prices,
            tax_rate: config.tax_rate,
            price_adjust_rate: config.price_adjust_rate,
            price_floor_ratio: config.price_floor_ratio,
            price_ceiling_ratio: config.price_ceiling_ratio,
            epsilon: config.order_epsilon,
        }
    }

    /// Current unit price, `None` for goods the market does not trade
    pub fn price(&self, good: GoodId) -> Option<f32> {
        self.prices.get(&good).copied()
    }

    pub fn default_price(&self, good: GoodId) -> Option<f32> {
        self.default_prices.get(&good).copied()
    }

    /// Override a price; the value is clamped to the allowed band
    pub fn set_price(&mut self, good: GoodId, price: f32) {
        if let Some((floor, ceiling)) = self.band(good) {
            self.prices.insert(good, price.clamp(floor, ceiling));
        }
    }

    pub fn demand(&self, good: GoodId) -> f32 {
        self.demand.get(&good).copied().unwrap_or(0.0)
    }

    pub fn tax_rate(&self) -> f32 {
        self.tax_rate
    }

    fn band(&self, good: GoodId) -> Option<(f32, f32)> {
        self.default_prices.get(&good).map(|d| {
            (d * self.price_floor_ratio, d * self.price_ceiling_ratio)
        })
    }

    fn book(&self, good: GoodId, side: Side) -> Option<&VecDeque<Order>> {
        match side {
            Side::Buy => self.buy_orders.get(&good),
            Side::Sell => self.sell_orders.get(&good),
        }
    }

    fn book_mut(&mut self, good: GoodId, side: Side) -> &mut VecDeque<Order> {
        match side {
            Side::Buy => self.buy_orders.entry(good).or_default(),
            Side::Sell => self.sell_orders.entry(good).or_default(),
        }
    }

    /// Standing orders for one good and side, oldest first
    pub fn standing_orders(&self, good: GoodId, side: Side) -> impl Iterator<Item = &Order> + '_ {
        self.book(good, side).into_iter().flatten()
    }

    /// Every standing order in the exchange
    pub fn all_orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.buy_orders
            .values()
            .chain(self.sell_orders.values())
            .flatten()
    }

    /// Quantity offered for sale by anyone other than `excluding`
    pub fn available(&self, good: GoodId, excluding: AgentId) -> f32 {
        self.standing_orders(good, Side::Sell)
            .filter(|o| o.requestor != excluding)
            .map(|o| o.quantity)
            .sum()
    }

    /// Like [`Exchange::available`], but only what sellers can still deliver
    ///
    /// A seller counts for at most what it holds now, however many orders
    /// it has resting.
    pub fn available_backed(&self, good: GoodId, excluding: AgentId, ledger: &dyn Ledger) -> f32 {
        let mut backing: AHashMap<AgentId, f32> = AHashMap::new();
        let mut total = 0.0;
        for order in self.standing_orders(good, Side::Sell) {
            if order.requestor == excluding {
                continue;
            }
            let left = backing
                .entry(order.requestor)
                .or_insert_with(|| ledger.held(order.requestor, good));
            let usable = order.quantity.min(*left);
            *left -= usable;
            total += usable;
        }
        total
    }

    /// Try to fill an order against the opposite book
    ///
    /// The demand signal moves whatever happens. A buyer who cannot pay for
    /// the whole order, or a seller who does not hold it, is rejected with
    /// no book change. Otherwise counter-orders are taken oldest-first,
    /// skipping the requestor's own and any whose owner cannot settle;
    /// scanning stops early when the requesting buyer runs out of money.
    /// A resting sell fills only up to what its seller still holds, and
    /// sells left with nothing behind them are dropped after a buy pass.
    /// Anything left unmatched rests in the requestor's own book and the
    /// outcome reports failure.
    pub fn attempt_transact(&mut self, order: Order, ledger: &mut dyn Ledger) -> TransactOutcome {
        let good = order.good;
        *self.demand.entry(good).or_insert(0.0) += order.side.demand_delta();

        let Some(price) = self.price(good) else {
            return TransactOutcome::rejected();
        };
        if order.quantity < self.epsilon {
            return TransactOutcome::rejected();
        }

        match order.side {
            Side::Buy if price * order.quantity > ledger.money(order.requestor) => {
                return TransactOutcome::rejected();
            }
            Side::Sell if ledger.held(order.requestor, good) < order.quantity => {
                return TransactOutcome::rejected();
            }
            _ => {}
        }

        let tax_share = 1.0 - 1.0 / (1.0 + self.tax_rate);
        let epsilon = self.epsilon;
        let mut remaining = order.quantity;

        let book = self.book_mut(good, order.side.opposite());
        for counter in book.iter_mut() {
            if remaining < epsilon {
                break;
            }
            if counter.requestor == order.requestor || counter.quantity < epsilon {
                continue;
            }

            let (buyer, seller) = match order.side {
                Side::Buy => (order.requestor, counter.requestor),
                Side::Sell => (counter.requestor, order.requestor),
            };
            let quantity = remaining
                .min(counter.quantity)
                .min(ledger.held(seller, good));
            if quantity < epsilon {
                continue;
            }
            let cost = quantity * price;
            let tax = cost * tax_share;

            if ledger.money(buyer) < cost {
                match order.side {
                    Side::Buy => break,
                    Side::Sell => continue,
                }
            }

            ledger.withdraw(buyer, cost);
            ledger.deposit(seller, cost - tax);
            ledger.credit_treasury(tax);
            ledger.move_goods(seller, buyer, good, quantity);

            counter.quantity -= quantity;
            remaining -= quantity;

            tracing::debug!(
                "Trade: {} bought {:.3} of {} from {} at {:.3}",
                buyer,
                quantity,
                good,
                seller,
                price
            );
        }
        let sells_scanned = order.side == Side::Buy;
        book.retain(|o| {
            o.quantity >= epsilon && !(sells_scanned && ledger.held(o.requestor, good) < epsilon)
        });

        let filled = order.quantity - remaining;
        if remaining < epsilon {
            return TransactOutcome {
                success: true,
                filled: order.quantity,
            };
        }

        self.book_mut(good, order.side).push_back(Order {
            quantity: remaining,
            ..order
        });
        TransactOutcome {
            success: false,
            filled,
        }
    }

    /// Remove every standing order of `requestor` for `good` on one side
    ///
    /// Returns the total quantity withdrawn.
    pub fn cancel_orders(&mut self, requestor: AgentId, good: GoodId, side: Side) -> f32 {
        let book = self.book_mut(good, side);
        let mut withdrawn = 0.0;
        book.retain(|o| {
            if o.requestor == requestor {
                withdrawn += o.quantity;
                false
            } else {
                true
            }
        });
        withdrawn
    }

    /// Remove every standing order of `requestor` on one side, for all goods
    pub fn cancel_all_orders(&mut self, requestor: AgentId, side: Side) {
        let books = match side {
            Side::Buy => &mut self.buy_orders,
            Side::Sell => &mut self.sell_orders,
        };
        for book in books.values_mut() {
            book.retain(|o| o.requestor != requestor);
        }
    }

    /// Walk every price by the accumulated demand, once per tick
    pub fn update_prices(&mut self, dt: f32) {
        for (good, default) in &self.default_prices {
            let demand = self.demand.get(good).copied().unwrap_or(0.0);
            let floor = default * self.price_floor_ratio;
            let ceiling = default * self.price_ceiling_ratio;
            let price = self.prices.entry(*good).or_insert(*default);
            *price = (*price * (1.0 + self.price_adjust_rate * demand * dt)).clamp(floor, ceiling);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goods::good::{BREAD, FLOUR, WHEAT};

    #[derive(Default)]
    struct TestLedger {
        money: AHashMap<AgentId, f32>,
        goods: AHashMap<(AgentId, GoodId), f32>,
        treasury: f32,
    }

    impl TestLedger {
        fn with_money(mut self, agent: AgentId, amount: f32) -> Self {
            self.money.insert(agent, amount);
            self
        }

        fn with_goods(mut self, agent: AgentId, good: GoodId, amount: f32) -> Self {
            self.goods.insert((agent, good), amount);
            self
        }
    }

    impl Ledger for TestLedger {
        fn money(&self, agent: AgentId) -> f32 {
            self.money.get(&agent).copied().unwrap_or(0.0)
        }
        fn held(&self, agent: AgentId, good: GoodId) -> f32 {
            self.goods.get(&(agent, good)).copied().unwrap_or(0.0)
        }
        fn withdraw(&mut self, agent: AgentId, amount: f32) {
            *self.money.entry(agent).or_default() -= amount;
        }
        fn deposit(&mut self, agent: AgentId, amount: f32) {
            *self.money.entry(agent).or_default() += amount;
        }
        fn move_goods(&mut self, from: AgentId, to: AgentId, good: GoodId, quantity: f32) -> f32 {
            let moved = quantity.min(self.held(from, good));
            *self.goods.entry((from, good)).or_default() -= moved;
            *self.goods.entry((to, good)).or_default() += moved;
            moved
        }
        fn credit_treasury(&mut self, amount: f32) {
            self.treasury += amount;
        }
    }

    const BUYER: AgentId = AgentId(0);
    const SELLER: AgentId = AgentId(1);

    fn exchange() -> Exchange {
        Exchange::new(&GoodsCatalog::with_defaults(), &SimulationConfig::default())
    }

    #[test]
    fn test_default_price_includes_tax() {
        let ex = exchange();
        // bread: base 4.0, tax 0.1
        assert!((ex.price(BREAD).unwrap() - 4.4).abs() < 0.0001);
        assert!((ex.default_price(BREAD).unwrap() - 4.4).abs() < 0.0001);
    }

    #[test]
    fn test_full_match_splits_tax() {
        let mut ex = exchange();
        ex.set_price(FLOUR, 2.0);
        let mut ledger = TestLedger::default()
            .with_money(BUYER, 50.0)
            .with_goods(SELLER, FLOUR, 10.0);

        let posted = ex.attempt_transact(Order::sell(SELLER, FLOUR, 10.0), &mut ledger);
        assert!(!posted.success);
        assert_eq!(posted.filled, 0.0);

        let bought = ex.attempt_transact(Order::buy(BUYER, FLOUR, 10.0), &mut ledger);
        assert!(bought.success);
        assert!((bought.filled - 10.0).abs() < 0.0001);

        let cost = 20.0;
        let tax = cost * (1.0 - 1.0 / 1.1);
        assert!((ledger.money(BUYER) - 30.0).abs() < 0.001);
        assert!((ledger.money(SELLER) - (cost - tax)).abs() < 0.001);
        assert!((ledger.treasury - tax).abs() < 0.001);
        assert!((ledger.held(BUYER, FLOUR) - 10.0).abs() < 0.0001);
        assert_eq!(ex.all_orders().count(), 0);
    }

    #[test]
    fn test_unaffordable_buy_leaves_books_untouched() {
        let mut ex = exchange();
        let mut ledger = TestLedger::default().with_money(BUYER, 1.0);

        let outcome = ex.attempt_transact(Order::buy(BUYER, BREAD, 5.0), &mut ledger);
        assert!(!outcome.success);
        assert_eq!(ex.all_orders().count(), 0);
        assert_eq!(ex.demand(BREAD), 1.0);
    }

    #[test]
    fn test_unheld_sell_rejected() {
        let mut ex = exchange();
        let mut ledger = TestLedger::default().with_goods(SELLER, BREAD, 1.0);

        let outcome = ex.attempt_transact(Order::sell(SELLER, BREAD, 2.0), &mut ledger);
        assert!(!outcome.success);
        assert_eq!(ex.all_orders().count(), 0);
        assert_eq!(ex.demand(BREAD), -1.0);
    }

    #[test]
    fn test_partial_fill_rests_remainder() {
        let mut ex = exchange();
        let mut ledger = TestLedger::default()
            .with_money(BUYER, 100.0)
            .with_goods(SELLER, WHEAT, 3.0);

        ex.attempt_transact(Order::sell(SELLER, WHEAT, 3.0), &mut ledger);
        let outcome = ex.attempt_transact(Order::buy(BUYER, WHEAT, 5.0), &mut ledger);

        assert!(!outcome.success);
        assert!((outcome.filled - 3.0).abs() < 0.0001);
        let resting: Vec<&Order> = ex.standing_orders(WHEAT, Side::Buy).collect();
        assert_eq!(resting.len(), 1);
        assert!((resting[0].quantity - 2.0).abs() < 0.0001);
        assert_eq!(ex.standing_orders(WHEAT, Side::Sell).count(), 0);
    }

    #[test]
    fn test_own_orders_are_skipped() {
        let mut ex = exchange();
        let mut ledger = TestLedger::default()
            .with_money(SELLER, 100.0)
            .with_goods(SELLER, WHEAT, 3.0);

        ex.attempt_transact(Order::sell(SELLER, WHEAT, 3.0), &mut ledger);
        let outcome = ex.attempt_transact(Order::buy(SELLER, WHEAT, 1.0), &mut ledger);
        assert_eq!(outcome.filled, 0.0);
        assert_eq!(ex.standing_orders(WHEAT, Side::Sell).count(), 1);
        assert_eq!(ex.standing_orders(WHEAT, Side::Buy).count(), 1);
    }

    #[test]
    fn test_seller_without_goods_is_skipped() {
        let mut ex = exchange();
        let other = AgentId(2);
        let mut ledger = TestLedger::default()
            .with_money(BUYER, 100.0)
            .with_goods(SELLER, WHEAT, 2.0)
            .with_goods(other, WHEAT, 2.0);

        ex.attempt_transact(Order::sell(SELLER, WHEAT, 2.0), &mut ledger);
        ex.attempt_transact(Order::sell(other, WHEAT, 2.0), &mut ledger);
        // First seller no longer has the goods to back the order
        ledger.goods.insert((SELLER, WHEAT), 0.0);

        let outcome = ex.attempt_transact(Order::buy(BUYER, WHEAT, 2.0), &mut ledger);
        assert!(outcome.success);
        assert!((ledger.held(other, WHEAT)).abs() < 0.0001);
        // Nothing backs the first order any more, so it is dropped
        assert_eq!(ex.standing_orders(WHEAT, Side::Sell).count(), 0);
    }

    #[test]
    fn test_resting_sell_fills_only_what_seller_holds() {
        let mut ex = exchange();
        let mut ledger = TestLedger::default()
            .with_money(BUYER, 100.0)
            .with_goods(SELLER, WHEAT, 4.0);

        ex.attempt_transact(Order::sell(SELLER, WHEAT, 4.0), &mut ledger);
        ledger.goods.insert((SELLER, WHEAT), 1.0);

        let outcome = ex.attempt_transact(Order::buy(BUYER, WHEAT, 3.0), &mut ledger);
        assert!(!outcome.success);
        assert!((outcome.filled - 1.0).abs() < 0.0001);
        assert!((ledger.held(BUYER, WHEAT) - 1.0).abs() < 0.0001);
        assert_eq!(ex.standing_orders(WHEAT, Side::Sell).count(), 0);
    }

    #[test]
    fn test_available_backed_counts_held_goods() {
        let mut ex = exchange();
        let other = AgentId(2);
        let mut ledger = TestLedger::default()
            .with_goods(SELLER, WHEAT, 4.0)
            .with_goods(other, WHEAT, 2.0);

        ex.attempt_transact(Order::sell(SELLER, WHEAT, 4.0), &mut ledger);
        ex.attempt_transact(Order::sell(SELLER, WHEAT, 4.0), &mut ledger);
        ex.attempt_transact(Order::sell(other, WHEAT, 2.0), &mut ledger);
        ledger.goods.insert((other, WHEAT), 0.5);

        assert!((ex.available(WHEAT, BUYER) - 10.0).abs() < 0.0001);
        // Two orders from one seller share its 4 units
        assert!((ex.available_backed(WHEAT, BUYER, &ledger) - 4.5).abs() < 0.0001);
        assert!((ex.available_backed(WHEAT, SELLER, &ledger) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_sell_skips_broke_buyer() {
        let mut ex = exchange();
        let broke = AgentId(2);
        let mut ledger = TestLedger::default()
            .with_money(broke, 100.0)
            .with_money(BUYER, 100.0)
            .with_goods(SELLER, WHEAT, 1.0);

        ex.attempt_transact(Order::buy(broke, WHEAT, 1.0), &mut ledger);
        ex.attempt_transact(Order::buy(BUYER, WHEAT, 1.0), &mut ledger);
        ledger.money.insert(broke, 0.0);

        let outcome = ex.attempt_transact(Order::sell(SELLER, WHEAT, 1.0), &mut ledger);
        assert!(outcome.success);
        assert!((ledger.held(BUYER, WHEAT) - 1.0).abs() < 0.0001);
        assert_eq!(ledger.held(broke, WHEAT), 0.0);
    }

    #[test]
    fn test_earlier_sell_orders_fill_first() {
        let mut ex = exchange();
        let first = AgentId(1);
        let second = AgentId(2);
        let mut ledger = TestLedger::default()
            .with_money(BUYER, 100.0)
            .with_goods(first, WHEAT, 2.0)
            .with_goods(second, WHEAT, 2.0);

        ex.attempt_transact(Order::sell(first, WHEAT, 2.0), &mut ledger);
        ex.attempt_transact(Order::sell(second, WHEAT, 2.0), &mut ledger);
        ex.attempt_transact(Order::buy(BUYER, WHEAT, 3.0), &mut ledger);

        assert!(ledger.held(first, WHEAT).abs() < 0.0001);
        assert!((ledger.held(second, WHEAT) - 1.0).abs() < 0.0001);
        let sells: Vec<&Order> = ex.standing_orders(WHEAT, Side::Sell).collect();
        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].requestor, second);
        assert!((sells[0].quantity - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cancel_orders() {
        let mut ex = exchange();
        let mut ledger = TestLedger::default().with_money(BUYER, 100.0);

        ex.attempt_transact(Order::buy(BUYER, WHEAT, 2.0), &mut ledger);
        ex.attempt_transact(Order::buy(BUYER, WHEAT, 1.0), &mut ledger);
        ex.attempt_transact(Order::buy(BUYER, BREAD, 1.0), &mut ledger);

        let withdrawn = ex.cancel_orders(BUYER, WHEAT, Side::Buy);
        assert!((withdrawn - 3.0).abs() < 0.0001);
        assert_eq!(ex.standing_orders(WHEAT, Side::Buy).count(), 0);
        assert_eq!(ex.standing_orders(BREAD, Side::Buy).count(), 1);

        ex.cancel_all_orders(BUYER, Side::Buy);
        assert_eq!(ex.all_orders().count(), 0);
    }

    #[test]
    fn test_price_walks_with_demand_and_clamps() {
        let mut ex = exchange();
        let mut ledger = TestLedger::default();
        for _ in 0..10 {
            ex.attempt_transact(Order::buy(BUYER, BREAD, 1.0), &mut ledger);
        }
        let before = ex.price(BREAD).unwrap();
        ex.update_prices(1.0);
        let expected = before * (1.0 + 0.00001 * 10.0);
        assert!((ex.price(BREAD).unwrap() - expected).abs() < 0.0001);

        // A huge step saturates at the ceiling
        ex.update_prices(1.0e6);
        assert!((ex.price(BREAD).unwrap() - 4.4 * 4.0).abs() < 0.001);
    }

    #[test]
    fn test_set_price_clamped() {
        let mut ex = exchange();
        ex.set_price(BREAD, 0.0);
        assert!((ex.price(BREAD).unwrap() - 4.4 * 0.25).abs() < 0.0001);
    }
}
