//! Property transactions: purchase, mortgage cycle and house building.

use crate::dice::Clock;
use crate::economy;
use crate::engine::{require_active_game, require_controls};
use crate::entities::{PlayerId, PropertyId};
use crate::errors::{EngineError, EngineResult};
use crate::store::GameStore;

/// Buy the property the player is standing on.
pub fn buy(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    property_id: PropertyId,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let property = store.property(property_id)?;
    if property.owner_id.is_some() {
        return Err(EngineError::rule_violation("property is already owned"));
    }
    let position = property.position;
    let price = property.price;
    let name = property.name.clone();
    let player = store.player(player_id)?;
    if player.position != position {
        return Err(EngineError::rule_violation(
            "player is not on the property's position",
        ));
    }
    if player.balance < price {
        return Err(EngineError::insufficient_funds(player_id, price, player.balance));
    }

    store.player_mut(player_id)?.balance -= price;
    store.property_mut(property_id)?.owner_id = Some(player_id);
    store.record_history(
        Some(player_id),
        "property_bought",
        Some(format!("{} for ${}", name, price)),
        clock.now(),
    );
    Ok(())
}

/// Mortgage an owned, unimproved property for its mortgage value.
pub fn mortgage(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    property_id: PropertyId,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let property = store.property(property_id)?;
    if property.owner_id != Some(player_id) {
        return Err(EngineError::rule_violation("player does not own this property"));
    }
    if property.is_mortgaged {
        return Err(EngineError::rule_violation("property is already mortgaged"));
    }
    if property.houses > 0 {
        return Err(EngineError::rule_violation(
            "houses must be sold before mortgaging",
        ));
    }
    let payout = economy::mortgage_value(property);
    let name = property.name.clone();

    store.property_mut(property_id)?.is_mortgaged = true;
    store.player_mut(player_id)?.balance += payout;
    store.record_history(
        Some(player_id),
        "property_mortgaged",
        Some(format!("{} for ${}", name, payout)),
        clock.now(),
    );
    Ok(())
}

/// Lift a mortgage for the mortgage value plus the 10% surcharge.
pub fn unmortgage(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    property_id: PropertyId,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let property = store.property(property_id)?;
    if property.owner_id != Some(player_id) {
        return Err(EngineError::rule_violation("player does not own this property"));
    }
    if !property.is_mortgaged {
        return Err(EngineError::rule_violation("property is not mortgaged"));
    }
    let cost = economy::unmortgage_cost(property);
    let name = property.name.clone();
    let balance = store.player(player_id)?.balance;
    if balance < cost {
        return Err(EngineError::insufficient_funds(player_id, cost, balance));
    }

    store.property_mut(property_id)?.is_mortgaged = false;
    store.player_mut(player_id)?.balance -= cost;
    store.record_history(
        Some(player_id),
        "property_unmortgaged",
        Some(format!("{} for ${}", name, cost)),
        clock.now(),
    );
    Ok(())
}

/// Build one house (the fifth level is the hotel). Requires the whole color
/// group and keeps house counts within one level of every sibling.
pub fn build_house(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    property_id: PropertyId,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let property = store.property(property_id)?;
    if property.owner_id != Some(player_id) {
        return Err(EngineError::rule_violation("player does not own this property"));
    }
    if property.is_mortgaged {
        return Err(EngineError::invalid_state(
            "cannot build on a mortgaged property",
        ));
    }
    if property.house_price == 0 {
        return Err(EngineError::rule_violation(
            "houses cannot be built on this property",
        ));
    }
    if property.houses >= 4 {
        return Err(EngineError::rule_violation("property already has a hotel"));
    }
    let group = store.properties_in_group(&property.color_group);
    if !group.iter().all(|p| p.owner_id == Some(player_id)) {
        return Err(EngineError::rule_violation(
            "the entire color group must be owned to build",
        ));
    }
    let after = property.houses + 1;
    if group.iter().any(|p| after > p.houses + 1) {
        return Err(EngineError::invalid_state(
            "houses must be built evenly across the color group",
        ));
    }
    let cost = economy::house_price(property);
    let name = property.name.clone();
    let balance = store.player(player_id)?.balance;
    if balance < cost {
        return Err(EngineError::insufficient_funds(player_id, cost, balance));
    }

    store.property_mut(property_id)?.houses = after;
    store.player_mut(player_id)?.balance -= cost;
    store.record_history(
        Some(player_id),
        "house_built",
        Some(format!("{} now has {} house(s)", name, after)),
        clock.now(),
    );
    Ok(())
}

/// Sell one house back for half its price. The even-building rule applies
/// in reverse: no sale may leave a sibling more than one level ahead.
pub fn sell_house(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    property_id: PropertyId,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let property = store.property(property_id)?;
    if property.owner_id != Some(player_id) {
        return Err(EngineError::rule_violation("player does not own this property"));
    }
    if property.houses == 0 {
        return Err(EngineError::rule_violation("no houses to sell"));
    }
    let after = property.houses - 1;
    let group = store.properties_in_group(&property.color_group);
    if group.iter().any(|p| p.houses > after + 1) {
        return Err(EngineError::invalid_state(
            "houses must be sold evenly across the color group",
        ));
    }
    let payout = economy::sell_house_value(property);
    let name = property.name.clone();

    store.property_mut(property_id)?.houses = after;
    store.player_mut(player_id)?.balance += payout;
    store.record_history(
        Some(player_id),
        "house_sold",
        Some(format!("{} now has {} house(s)", name, after)),
        clock.now(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{clock, give_group, started_game};

    #[test]
    fn test_buy_requires_standing_on_property() {
        let (mut store, alice, _bob) = started_game();
        let baltic = store.property_at_position(3).unwrap().id;
        let err = buy(&mut store, "user-a", alice, baltic, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }

    #[test]
    fn test_buy_exact_balance_succeeds() {
        let (mut store, alice, _bob) = started_game();
        let baltic = store.property_at_position(3).unwrap().id;
        {
            let player = store.player_mut(alice).unwrap();
            player.position = 3;
            player.balance = 60;
        }
        buy(&mut store, "user-a", alice, baltic, &clock()).unwrap();
        assert_eq!(store.player(alice).unwrap().balance, 0);
        assert_eq!(store.property(baltic).unwrap().owner_id, Some(alice));
    }

    #[test]
    fn test_buy_one_short_fails_unchanged() {
        let (mut store, alice, _bob) = started_game();
        let baltic = store.property_at_position(3).unwrap().id;
        {
            let player = store.player_mut(alice).unwrap();
            player.position = 3;
            player.balance = 59;
        }
        let err = buy(&mut store, "user-a", alice, baltic, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        assert_eq!(store.player(alice).unwrap().balance, 59);
        assert_eq!(store.property(baltic).unwrap().owner_id, None);
    }

    #[test]
    fn test_buy_owned_property_fails() {
        let (mut store, alice, bob) = started_game();
        let baltic = store.property_at_position(3).unwrap().id;
        store.property_mut(baltic).unwrap().owner_id = Some(bob);
        store.player_mut(alice).unwrap().position = 3;
        let err = buy(&mut store, "user-a", alice, baltic, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }

    #[test]
    fn test_mortgage_cycle() {
        let (mut store, alice, _bob) = started_game();
        let baltic = store.property_at_position(3).unwrap().id;
        store.property_mut(baltic).unwrap().owner_id = Some(alice);
        let balance = store.player(alice).unwrap().balance;

        mortgage(&mut store, "user-a", alice, baltic, &clock()).unwrap();
        assert!(store.property(baltic).unwrap().is_mortgaged);
        assert_eq!(store.player(alice).unwrap().balance, balance + 30);

        // Double-mortgage rejected.
        let err = mortgage(&mut store, "user-a", alice, baltic, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));

        unmortgage(&mut store, "user-a", alice, baltic, &clock()).unwrap();
        assert!(!store.property(baltic).unwrap().is_mortgaged);
        // 30 received, 33 repaid (30 + 10% truncated).
        assert_eq!(store.player(alice).unwrap().balance, balance - 3);
    }

    #[test]
    fn test_mortgage_with_houses_fails() {
        let (mut store, alice, _bob) = started_game();
        give_group(&mut store, "brown", alice);
        let baltic = store.property_at_position(3).unwrap().id;
        store.property_mut(baltic).unwrap().houses = 1;
        let err = mortgage(&mut store, "user-a", alice, baltic, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }

    #[test]
    fn test_unmortgage_requires_funds() {
        let (mut store, alice, _bob) = started_game();
        let baltic = store.property_at_position(3).unwrap().id;
        {
            let property = store.property_mut(baltic).unwrap();
            property.owner_id = Some(alice);
            property.is_mortgaged = true;
        }
        store.player_mut(alice).unwrap().balance = 32;
        let err = unmortgage(&mut store, "user-a", alice, baltic, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        assert!(store.property(baltic).unwrap().is_mortgaged);
    }

    #[test]
    fn test_build_requires_full_group() {
        let (mut store, alice, _bob) = started_game();
        let baltic = store.property_at_position(3).unwrap().id;
        store.property_mut(baltic).unwrap().owner_id = Some(alice);
        let err = build_house(&mut store, "user-a", alice, baltic, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }

    #[test]
    fn test_build_evenly_up_to_hotel() {
        let (mut store, alice, _bob) = started_game();
        give_group(&mut store, "brown", alice);
        let med = store.property_at_position(1).unwrap().id;
        let baltic = store.property_at_position(3).unwrap().id;
        let balance = store.player(alice).unwrap().balance;

        build_house(&mut store, "user-a", alice, med, &clock()).unwrap();
        // A second house here would outpace Baltic by two.
        let err = build_house(&mut store, "user-a", alice, med, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { .. }));

        build_house(&mut store, "user-a", alice, baltic, &clock()).unwrap();
        build_house(&mut store, "user-a", alice, med, &clock()).unwrap();
        assert_eq!(store.property(med).unwrap().houses, 2);
        assert_eq!(store.property(baltic).unwrap().houses, 1);
        assert_eq!(store.player(alice).unwrap().balance, balance - 3 * 50);
    }

    #[test]
    fn test_build_stops_at_hotel() {
        let (mut store, alice, _bob) = started_game();
        give_group(&mut store, "brown", alice);
        let med = store.property_at_position(1).unwrap().id;
        let baltic = store.property_at_position(3).unwrap().id;
        store.property_mut(med).unwrap().houses = 4;
        store.property_mut(baltic).unwrap().houses = 4;
        let err = build_house(&mut store, "user-a", alice, med, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }

    #[test]
    fn test_build_on_railroad_fails() {
        let (mut store, alice, _bob) = started_game();
        give_group(&mut store, "railroad", alice);
        let reading = store.property_at_position(5).unwrap().id;
        let err = build_house(&mut store, "user-a", alice, reading, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }

    #[test]
    fn test_sell_house_respects_evenness() {
        let (mut store, alice, _bob) = started_game();
        give_group(&mut store, "brown", alice);
        let med = store.property_at_position(1).unwrap().id;
        let baltic = store.property_at_position(3).unwrap().id;
        store.property_mut(med).unwrap().houses = 1;
        store.property_mut(baltic).unwrap().houses = 3;

        // Selling Mediterranean to 0 would leave Baltic 3 ahead.
        let err = sell_house(&mut store, "user-a", alice, med, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { .. }));

        let balance = store.player(alice).unwrap().balance;
        sell_house(&mut store, "user-a", alice, baltic, &clock()).unwrap();
        assert_eq!(store.property(baltic).unwrap().houses, 2);
        assert_eq!(store.player(alice).unwrap().balance, balance + 25);
    }

    #[test]
    fn test_sell_house_at_zero_fails() {
        let (mut store, alice, _bob) = started_game();
        give_group(&mut store, "brown", alice);
        let med = store.property_at_position(1).unwrap().id;
        let err = sell_house(&mut store, "user-a", alice, med, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }
}
