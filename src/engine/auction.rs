//! Auction state machine for properties the active player declined.
//! Bids are strictly increasing; the winner is settled at close, with an
//! affordability re-check because balances may have moved since the bid.

use crate::dice::Clock;
use crate::engine::{require_active_game, require_controls};
use crate::entities::{Auction, AuctionId, AuctionStatus, PlayerId, PropertyId};
use crate::errors::{EngineError, EngineResult};
use crate::store::GameStore;

/// Open an auction for an unowned property. The default starting bid is
/// half the catalog price; every bid must strictly beat it.
pub fn start(
    store: &mut GameStore,
    property_id: PropertyId,
    starting_bid: Option<i64>,
    clock: &dyn Clock,
) -> EngineResult<AuctionId> {
    require_active_game(store)?;
    let property = store.property(property_id)?;
    if property.owner_id.is_some() {
        return Err(EngineError::rule_violation(
            "owned properties cannot be auctioned",
        ));
    }
    let opening = starting_bid.unwrap_or(property.price / 2);
    if opening < 0 {
        return Err(EngineError::rule_violation("starting bid cannot be negative"));
    }
    let name = property.name.clone();

    let id = store.insert_auction(Auction {
        id: 0, // assigned by the store
        property_id,
        status: AuctionStatus::Active,
        current_bid: opening,
        current_bidder_id: None,
    });
    store.record_history(
        None,
        "auction_started",
        Some(format!("{} opening at ${}", name, opening)),
        clock.now(),
    );
    Ok(id)
}

/// Place a bid. Must strictly beat the current bid and be affordable at
/// bid time; `current_bid` only ever increases.
pub fn bid(
    store: &mut GameStore,
    actor: &str,
    auction_id: AuctionId,
    player_id: PlayerId,
    amount: i64,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let auction = store.auction(auction_id)?;
    if auction.status != AuctionStatus::Active {
        return Err(EngineError::AuctionNotActive { auction_id });
    }
    if amount <= auction.current_bid {
        return Err(EngineError::rule_violation(format!(
            "bid must exceed the current bid of ${}",
            auction.current_bid
        )));
    }
    let balance = store.player(player_id)?.balance;
    if balance < amount {
        return Err(EngineError::insufficient_funds(player_id, amount, balance));
    }

    let auction = store.auction_mut(auction_id)?;
    auction.current_bid = amount;
    auction.current_bidder_id = Some(player_id);
    store.record_history(
        Some(player_id),
        "auction_bid",
        Some(format!("${} on auction {}", amount, auction_id)),
        clock.now(),
    );
    Ok(())
}

/// Close the auction. With no bidder the property stays unowned; otherwise
/// the winner must still afford the final bid, and on success the debit and
/// ownership transfer commit together.
pub fn end(
    store: &mut GameStore,
    auction_id: AuctionId,
    clock: &dyn Clock,
) -> EngineResult<Option<PlayerId>> {
    require_active_game(store)?;
    let auction = store.auction(auction_id)?.clone();
    if auction.status != AuctionStatus::Active {
        return Err(EngineError::AuctionNotActive { auction_id });
    }

    let winner = match auction.current_bidder_id {
        None => {
            store.auction_mut(auction_id)?.status = AuctionStatus::Completed;
            store.record_history(
                None,
                "auction_ended",
                Some(format!("Auction {} closed with no bids", auction_id)),
                clock.now(),
            );
            return Ok(None);
        }
        Some(winner) => winner,
    };

    let balance = store.player(winner)?.balance;
    if balance < auction.current_bid {
        // Reported, not silently resolved; the auction stays open.
        return Err(EngineError::insufficient_funds(
            winner,
            auction.current_bid,
            balance,
        ));
    }

    store.player_mut(winner)?.balance -= auction.current_bid;
    store.property_mut(auction.property_id)?.owner_id = Some(winner);
    store.auction_mut(auction_id)?.status = AuctionStatus::Completed;
    store.record_history(
        Some(winner),
        "auction_won",
        Some(format!(
            "Property {} for ${}",
            auction.property_id, auction.current_bid
        )),
        clock.now(),
    );
    Ok(Some(winner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{clock, started_game};

    fn baltic_auction(store: &mut GameStore) -> (PropertyId, AuctionId) {
        let baltic = store.property_at_position(3).unwrap().id;
        let auction_id = start(store, baltic, None, &clock()).unwrap();
        (baltic, auction_id)
    }

    #[test]
    fn test_default_opening_is_half_price() {
        let (mut store, _alice, _bob) = started_game();
        let (_baltic, auction_id) = baltic_auction(&mut store);
        assert_eq!(store.auction(auction_id).unwrap().current_bid, 30);
        assert_eq!(store.auction(auction_id).unwrap().current_bidder_id, None);
    }

    #[test]
    fn test_start_on_owned_property_fails() {
        let (mut store, alice, _bob) = started_game();
        let baltic = store.property_at_position(3).unwrap().id;
        store.property_mut(baltic).unwrap().owner_id = Some(alice);
        let err = start(&mut store, baltic, None, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }

    #[test]
    fn test_first_bid_must_exceed_opening_value() {
        let (mut store, alice, _bob) = started_game();
        let (_baltic, auction_id) = baltic_auction(&mut store);
        // Opening is $30; matching it is not a raise.
        let err = bid(&mut store, "user-a", auction_id, alice, 30, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
        assert_eq!(store.auction(auction_id).unwrap().current_bidder_id, None);

        bid(&mut store, "user-a", auction_id, alice, 31, &clock()).unwrap();
        assert_eq!(store.auction(auction_id).unwrap().current_bid, 31);
    }

    #[test]
    fn test_bids_strictly_increase() {
        let (mut store, alice, bob) = started_game();
        let (_baltic, auction_id) = baltic_auction(&mut store);

        bid(&mut store, "user-a", auction_id, alice, 100, &clock()).unwrap();
        // Equal bid rejected.
        let err = bid(&mut store, "user-b", auction_id, bob, 100, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
        bid(&mut store, "user-b", auction_id, bob, 150, &clock()).unwrap();
        bid(&mut store, "user-a", auction_id, alice, 200, &clock()).unwrap();

        let auction = store.auction(auction_id).unwrap();
        assert_eq!(auction.current_bid, 200);
        assert_eq!(auction.current_bidder_id, Some(alice));
    }

    #[test]
    fn test_bid_must_be_affordable() {
        let (mut store, alice, _bob) = started_game();
        let (_baltic, auction_id) = baltic_auction(&mut store);
        store.player_mut(alice).unwrap().balance = 40;
        let err = bid(&mut store, "user-a", auction_id, alice, 50, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_end_settles_winner() {
        let (mut store, alice, bob) = started_game();
        let (baltic, auction_id) = baltic_auction(&mut store);
        bid(&mut store, "user-a", auction_id, alice, 100, &clock()).unwrap();
        bid(&mut store, "user-b", auction_id, bob, 150, &clock()).unwrap();
        bid(&mut store, "user-a", auction_id, alice, 200, &clock()).unwrap();

        let winner = end(&mut store, auction_id, &clock()).unwrap();
        assert_eq!(winner, Some(alice));
        assert_eq!(store.player(alice).unwrap().balance, 1300);
        assert_eq!(store.property(baltic).unwrap().owner_id, Some(alice));
        assert_eq!(store.auction(auction_id).unwrap().status, AuctionStatus::Completed);
    }

    #[test]
    fn test_end_without_bids_changes_nothing() {
        let (mut store, _alice, _bob) = started_game();
        let (baltic, auction_id) = baltic_auction(&mut store);
        let winner = end(&mut store, auction_id, &clock()).unwrap();
        assert_eq!(winner, None);
        assert_eq!(store.property(baltic).unwrap().owner_id, None);
        assert_eq!(store.auction(auction_id).unwrap().status, AuctionStatus::Completed);
    }

    #[test]
    fn test_end_reports_broke_winner_and_stays_open() {
        let (mut store, alice, _bob) = started_game();
        let (baltic, auction_id) = baltic_auction(&mut store);
        bid(&mut store, "user-a", auction_id, alice, 200, &clock()).unwrap();
        store.player_mut(alice).unwrap().balance = 100;

        let err = end(&mut store, auction_id, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        assert_eq!(store.auction(auction_id).unwrap().status, AuctionStatus::Active);
        assert_eq!(store.property(baltic).unwrap().owner_id, None);
    }

    #[test]
    fn test_completed_auction_rejects_bids() {
        let (mut store, alice, _bob) = started_game();
        let (_baltic, auction_id) = baltic_auction(&mut store);
        end(&mut store, auction_id, &clock()).unwrap();
        let err = bid(&mut store, "user-a", auction_id, alice, 100, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::AuctionNotActive { .. }));
        let err = end(&mut store, auction_id, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::AuctionNotActive { .. }));
    }
}
