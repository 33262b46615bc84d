//! Stockpile - real-valued goods storage for agents and buildings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::goods::good::{Good, GoodId};

/// Quantities below this are treated as empty and dropped
pub const EMPTY: f32 = 0.0001;

/// A collection of goods keyed by id
///
/// Ordered by id so iteration (and anything that picks "the first edible
/// good") is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stockpile {
    goods: BTreeMap<GoodId, f32>,
}

impl Stockpile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current amount of a good
    pub fn get(&self, good: GoodId) -> f32 {
        self.goods.get(&good).copied().unwrap_or(0.0)
    }

    pub fn has(&self, good: GoodId, amount: f32) -> bool {
        self.get(good) + EMPTY >= amount
    }

    pub fn add(&mut self, good: GoodId, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        *self.goods.entry(good).or_insert(0.0) += amount;
    }

    /// Try to remove goods, returns amount actually removed
    pub fn remove(&mut self, good: GoodId, amount: f32) -> f32 {
        let Some(current) = self.goods.get_mut(&good) else {
            return 0.0;
        };
        let removed = amount.max(0.0).min(*current);
        *current -= removed;
        if *current < EMPTY {
            self.goods.remove(&good);
        }
        removed
    }

    /// Remove everything of one good
    pub fn take_all(&mut self, good: GoodId) -> f32 {
        self.goods.remove(&good).unwrap_or(0.0)
    }

    /// Check if the stockpile holds every listed good in full
    pub fn has_all(&self, requirements: &[Good]) -> bool {
        requirements.iter().all(|g| self.has(g.id, g.quantity))
    }

    /// Iterate held goods in id order
    pub fn iter(&self) -> impl Iterator<Item = Good> + '_ {
        self.goods.iter().map(|(id, q)| Good::new(*id, *q))
    }

    pub fn is_empty(&self) -> bool {
        self.goods.is_empty()
    }

    /// Total quantity of goods matching a predicate
    pub fn total_where(&self, pred: impl Fn(GoodId) -> bool) -> f32 {
        self.goods.iter().filter(|(id, _)| pred(**id)).map(|(_, q)| q).sum()
    }

    /// Lose a fraction of every edible good
    ///
    /// Returns the total quantity that spoiled.
    pub fn spoil(&mut self, fraction: f32) -> f32 {
        let fraction = fraction.clamp(0.0, 1.0);
        let mut lost = 0.0;
        for (id, quantity) in self.goods.iter_mut() {
            if id.is_edible() {
                let loss = *quantity * fraction;
                *quantity -= loss;
                lost += loss;
            }
        }
        self.goods.retain(|_, q| *q >= EMPTY);
        lost
    }

    /// Move every good matching a predicate into another stockpile
    pub fn transfer_where(&mut self, other: &mut Stockpile, pred: impl Fn(GoodId) -> bool) -> f32 {
        let ids: Vec<GoodId> = self.goods.keys().copied().filter(|id| pred(*id)).collect();
        let mut moved = 0.0;
        for id in ids {
            let amount = self.take_all(id);
            other.add(id, amount);
            moved += amount;
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goods::good::{AXE, BREAD, FLOUR, LOGS, WHEAT};

    #[test]
    fn test_stockpile_add_remove() {
        let mut stockpile = Stockpile::new();
        stockpile.add(LOGS, 30.0);
        assert!((stockpile.get(LOGS) - 30.0).abs() < 0.0001);

        assert!((stockpile.remove(LOGS, 20.0) - 20.0).abs() < 0.0001);
        assert!((stockpile.get(LOGS) - 10.0).abs() < 0.0001);

        // Can't remove more than held
        assert!((stockpile.remove(LOGS, 50.0) - 10.0).abs() < 0.0001);
        assert!(stockpile.is_empty());
    }

    #[test]
    fn test_stockpile_has_all() {
        let mut stockpile = Stockpile::new();
        stockpile.add(FLOUR, 2.0);
        stockpile.add(LOGS, 1.0);

        assert!(stockpile.has_all(&[Good::new(FLOUR, 2.0), Good::new(LOGS, 0.5)]));
        assert!(!stockpile.has_all(&[Good::new(FLOUR, 3.0)]));
    }

    #[test]
    fn test_stockpile_spoils_only_edible() {
        let mut stockpile = Stockpile::new();
        stockpile.add(BREAD, 10.0);
        stockpile.add(WHEAT, 10.0);
        stockpile.add(AXE, 1.0);

        let lost = stockpile.spoil(0.1);
        assert!((lost - 1.0).abs() < 0.0001);
        assert!((stockpile.get(BREAD) - 9.0).abs() < 0.0001);
        assert!((stockpile.get(WHEAT) - 10.0).abs() < 0.0001);
        assert!((stockpile.get(AXE) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_stockpile_transfer_where() {
        let mut personal = Stockpile::new();
        personal.add(BREAD, 2.0);
        personal.add(AXE, 1.0);
        let mut home = Stockpile::new();

        let moved = personal.transfer_where(&mut home, |id| !id.is_tool());
        assert!((moved - 2.0).abs() < 0.0001);
        assert!((home.get(BREAD) - 2.0).abs() < 0.0001);
        assert_eq!(personal.get(BREAD), 0.0);
        assert!((personal.get(AXE) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_stockpile_iterates_in_id_order() {
        let mut stockpile = Stockpile::new();
        stockpile.add(LOGS, 1.0);
        stockpile.add(BREAD, 1.0);
        stockpile.add(WHEAT, 1.0);
        let order: Vec<GoodId> = stockpile.iter().map(|g| g.id).collect();
        // Food sorts before material; grain before prepared
        assert_eq!(order, vec![WHEAT, BREAD, LOGS]);
    }
}
