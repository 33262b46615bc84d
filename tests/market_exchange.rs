//! Integration tests for the exchange settled against real world balances
//!
//! These tests drive `Exchange::attempt_transact` through `World::market()`
//! so money, goods and the treasury all move through the agent archetype:
//! - Full matches split the cost between seller and treasury
//! - The demand signal moves once per attempt regardless of outcome
//! - Unmatched remainders rest in the requestor's book

use guildhall::core::config::SimulationConfig;
use guildhall::core::types::{AgentId, Vec2};
use guildhall::ecs::world::World;
use guildhall::entity::skills::Profession;
use guildhall::goods::good::{BREAD, FLOUR, WHEAT};
use guildhall::goods::GoodsCatalog;
use guildhall::market::{Order, Side};
use guildhall::world::tiles::TileMap;

fn market_world() -> (World, AgentId, AgentId) {
    let catalog = GoodsCatalog::with_defaults();
    let config = SimulationConfig::default();
    let mut world = World::new(TileMap::new(4, 4, 16.0, 16.0), &catalog, &config, 1);
    let seller = world.spawn_agent("Miller".into(), Vec2::default(), Profession::Baker);
    let buyer = world.spawn_agent("Baker".into(), Vec2::default(), Profession::Baker);
    (world, seller, buyer)
}

// ============================================================================
// Settlement
// ============================================================================

/// Ten units at 2.0 with 10% tax: the buyer pays 20, the treasury keeps
/// exactly the tax share and both books end empty.
#[test]
fn test_full_match_settles_cost_and_tax() {
    let (mut world, seller, buyer) = market_world();
    world.agents.stockpiles[seller.index()].add(FLOUR, 10.0);
    world.agents.money[buyer.index()] = 50.0;
    world.exchange.set_price(FLOUR, 2.0);

    let (exchange, mut accounts) = world.market();
    let rested = exchange.attempt_transact(Order::sell(seller, FLOUR, 10.0), &mut accounts);
    assert!(!rested.success);
    assert_eq!(rested.filled, 0.0);

    let outcome = exchange.attempt_transact(Order::buy(buyer, FLOUR, 10.0), &mut accounts);
    assert!(outcome.success);
    assert!((outcome.filled - 10.0).abs() < 1e-4);

    let cost = 20.0;
    let tax = cost * (1.0 - 1.0 / 1.1);
    assert!((world.agents.money[buyer.index()] - 30.0).abs() < 1e-3);
    assert!((world.agents.money[seller.index()] - (cost - tax)).abs() < 1e-3);
    assert!((world.treasury - tax).abs() < 1e-3);
    assert!((world.agents.stockpiles[buyer.index()].get(FLOUR) - 10.0).abs() < 1e-4);
    assert!(world.agents.stockpiles[seller.index()].get(FLOUR) < 1e-4);

    assert_eq!(world.exchange.standing_orders(FLOUR, Side::Sell).count(), 0);
    assert_eq!(world.exchange.standing_orders(FLOUR, Side::Buy).count(), 0);
}

/// Money is conserved: whatever leaves the buyer lands with the seller or
/// the treasury.
#[test]
fn test_money_conserved_across_trades() {
    let (mut world, seller, buyer) = market_world();
    world.agents.stockpiles[seller.index()].add(WHEAT, 8.0);
    world.agents.money[buyer.index()] = 40.0;
    let before: f32 = world.agents.money.iter().sum::<f32>() + world.treasury;

    let (exchange, mut accounts) = world.market();
    exchange.attempt_transact(Order::sell(seller, WHEAT, 8.0), &mut accounts);
    exchange.attempt_transact(Order::buy(buyer, WHEAT, 3.0), &mut accounts);
    exchange.attempt_transact(Order::buy(buyer, WHEAT, 2.5), &mut accounts);

    let after: f32 = world.agents.money.iter().sum::<f32>() + world.treasury;
    assert!((before - after).abs() < 1e-3);
    assert!((world.exchange.available(WHEAT, buyer) - 2.5).abs() < 1e-4);
}

// ============================================================================
// Demand signal
// ============================================================================

/// Each buy attempt adds one to demand and each sell attempt removes one,
/// whether or not anything traded.
#[test]
fn test_demand_counts_attempts_not_fills() {
    let (mut world, seller, buyer) = market_world();
    world.agents.money[buyer.index()] = 1.0;

    let (exchange, mut accounts) = world.market();
    // Unaffordable: rejected, still counted
    let outcome = exchange.attempt_transact(Order::buy(buyer, BREAD, 50.0), &mut accounts);
    assert!(!outcome.success);
    assert_eq!(exchange.demand(BREAD), 1.0);

    // Seller holds nothing: rejected, still counted
    exchange.attempt_transact(Order::sell(seller, BREAD, 1.0), &mut accounts);
    exchange.attempt_transact(Order::sell(seller, BREAD, 1.0), &mut accounts);
    assert_eq!(exchange.demand(BREAD), -1.0);

    // Affordable but unmatched: rests, counted
    exchange.attempt_transact(Order::buy(buyer, BREAD, 0.1), &mut accounts);
    assert_eq!(exchange.demand(BREAD), 0.0);
    assert_eq!(exchange.standing_orders(BREAD, Side::Buy).count(), 1);
}

// ============================================================================
// Partial fills
// ============================================================================

/// A buy larger than the offer fills what it can, reports failure and
/// leaves the remainder resting for later sellers.
#[test]
fn test_partial_buy_rests_and_later_sell_fills_it() {
    let (mut world, seller, buyer) = market_world();
    world.agents.stockpiles[seller.index()].add(WHEAT, 2.0);
    world.agents.money[buyer.index()] = 100.0;

    let (exchange, mut accounts) = world.market();
    exchange.attempt_transact(Order::sell(seller, WHEAT, 2.0), &mut accounts);
    let outcome = exchange.attempt_transact(Order::buy(buyer, WHEAT, 5.0), &mut accounts);
    assert!(!outcome.success);
    assert!((outcome.filled - 2.0).abs() < 1e-4);

    let resting: Vec<_> = exchange.standing_orders(WHEAT, Side::Buy).collect();
    assert_eq!(resting.len(), 1);
    assert_eq!(resting[0].requestor, buyer);
    assert!((resting[0].quantity - 3.0).abs() < 1e-4);

    // The seller restocks and the resting buy absorbs the new offer
    world.agents.stockpiles[seller.index()].add(WHEAT, 3.0);
    let (exchange, mut accounts) = world.market();
    let outcome = exchange.attempt_transact(Order::sell(seller, WHEAT, 3.0), &mut accounts);
    assert!(outcome.success);
    assert_eq!(world.exchange.standing_orders(WHEAT, Side::Buy).count(), 0);
    assert!((world.agents.stockpiles[buyer.index()].get(WHEAT) - 5.0).abs() < 1e-4);
}

/// Prices never leave the configured band however lopsided demand gets.
#[test]
fn test_prices_stay_in_band_under_pressure() {
    let (mut world, _, buyer) = market_world();
    world.agents.money[buyer.index()] = 0.0;
    let default = world.exchange.default_price(BREAD).unwrap_or(0.0);

    let (exchange, mut accounts) = world.market();
    for _ in 0..500 {
        exchange.attempt_transact(Order::buy(buyer, BREAD, 1.0), &mut accounts);
    }
    for _ in 0..10_000 {
        exchange.update_prices(100.0);
    }
    let price = world.exchange.price(BREAD).unwrap_or(0.0);
    assert!(price <= default * 4.0 + 1e-3);
    assert!(price >= default * 0.25 - 1e-3);
}
