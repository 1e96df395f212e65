//! Two-party barter. A trade is proposed with items tagged by direction,
//! then accepted or rejected exactly once. Acceptance re-validates every
//! item against current state before anything moves, so a drifted game
//! never produces a partial exchange.

use crate::dice::Clock;
use crate::engine::{require_active_game, require_controls};
use crate::entities::{PlayerId, Trade, TradeId, TradeItem, TradeItemKind, TradeStatus};
use crate::errors::{EngineError, EngineResult};
use crate::store::GameStore;

/// Create a pending trade. Nothing is moved at proposal time.
pub fn propose(
    store: &mut GameStore,
    actor: &str,
    sender_id: PlayerId,
    receiver_id: PlayerId,
    items: Vec<TradeItem>,
    clock: &dyn Clock,
) -> EngineResult<TradeId> {
    require_active_game(store)?;
    require_controls(store, actor, sender_id)?;
    if sender_id == receiver_id {
        return Err(EngineError::rule_violation("cannot trade with yourself"));
    }
    let receiver = store.player(receiver_id)?;
    if receiver.is_bankrupt {
        return Err(EngineError::rule_violation("receiver is bankrupt"));
    }
    if items.is_empty() {
        return Err(EngineError::rule_violation("trade has no items"));
    }
    for item in &items {
        if let TradeItemKind::Money { amount } = item.kind {
            if amount <= 0 {
                return Err(EngineError::rule_violation("money amounts must be positive"));
            }
        }
    }

    let id = store.insert_trade(Trade {
        id: 0, // assigned by the store
        sender_id,
        receiver_id,
        status: TradeStatus::Pending,
        items,
    });
    store.record_history(
        Some(sender_id),
        "trade_proposed",
        Some(format!("Trade {} offered to player {}", id, receiver_id)),
        clock.now(),
    );
    Ok(id)
}

/// Accept a pending trade. Only the receiver may accept. Every item is
/// checked against current ownership and balances first; the exchange then
/// commits in full.
pub fn accept(
    store: &mut GameStore,
    actor: &str,
    trade_id: TradeId,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    let trade = store.trade(trade_id)?.clone();
    if trade.status != TradeStatus::Pending {
        return Err(EngineError::TradeAlreadyProcessed { trade_id });
    }
    require_controls(store, actor, trade.receiver_id)?;
    if store.player(trade.sender_id)?.is_bankrupt {
        return Err(EngineError::rule_violation("sender is bankrupt"));
    }

    // Re-validate every item: the game may have drifted since proposal.
    let mut sender_money = 0i64;
    let mut receiver_money = 0i64;
    let mut sender_cards = 0u32;
    let mut receiver_cards = 0u32;
    for item in &trade.items {
        let giver = if item.from_sender {
            trade.sender_id
        } else {
            trade.receiver_id
        };
        match item.kind {
            TradeItemKind::Property { property_id } => {
                let property = store.property(property_id)?;
                if property.owner_id != Some(giver) {
                    return Err(EngineError::rule_violation(format!(
                        "player {} no longer owns property {}",
                        giver, property_id
                    )));
                }
            }
            TradeItemKind::Money { amount } => {
                if item.from_sender {
                    sender_money += amount;
                } else {
                    receiver_money += amount;
                }
            }
            TradeItemKind::JailCard => {
                if item.from_sender {
                    sender_cards += 1;
                } else {
                    receiver_cards += 1;
                }
            }
        }
    }
    let sender = store.player(trade.sender_id)?;
    if sender.balance < sender_money {
        return Err(EngineError::insufficient_funds(
            trade.sender_id,
            sender_money,
            sender.balance,
        ));
    }
    if sender.jail_cards < sender_cards {
        return Err(EngineError::rule_violation("sender lacks the offered jail cards"));
    }
    let receiver = store.player(trade.receiver_id)?;
    if receiver.balance < receiver_money {
        return Err(EngineError::insufficient_funds(
            trade.receiver_id,
            receiver_money,
            receiver.balance,
        ));
    }
    if receiver.jail_cards < receiver_cards {
        return Err(EngineError::rule_violation(
            "receiver lacks the requested jail cards",
        ));
    }

    // Commit. Every precondition has passed; these writes cannot fail.
    for item in &trade.items {
        let (giver, taker) = if item.from_sender {
            (trade.sender_id, trade.receiver_id)
        } else {
            (trade.receiver_id, trade.sender_id)
        };
        match item.kind {
            TradeItemKind::Property { property_id } => {
                store.property_mut(property_id)?.owner_id = Some(taker);
            }
            TradeItemKind::Money { amount } => {
                store.player_mut(giver)?.balance -= amount;
                store.player_mut(taker)?.balance += amount;
            }
            TradeItemKind::JailCard => {
                store.player_mut(giver)?.jail_cards -= 1;
                store.player_mut(taker)?.jail_cards += 1;
            }
        }
    }
    store.trade_mut(trade_id)?.status = TradeStatus::Accepted;
    store.record_history(
        Some(trade.receiver_id),
        "trade_accepted",
        Some(format!("Trade {} with player {}", trade_id, trade.sender_id)),
        clock.now(),
    );
    Ok(())
}

/// Reject a pending trade. Pure status flip; only the receiver may reject.
pub fn reject(
    store: &mut GameStore,
    actor: &str,
    trade_id: TradeId,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    let trade = store.trade(trade_id)?;
    if trade.status != TradeStatus::Pending {
        return Err(EngineError::TradeAlreadyProcessed { trade_id });
    }
    let receiver_id = trade.receiver_id;
    require_controls(store, actor, receiver_id)?;

    store.trade_mut(trade_id)?.status = TradeStatus::Rejected;
    store.record_history(
        Some(receiver_id),
        "trade_rejected",
        Some(format!("Trade {}", trade_id)),
        clock.now(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::{clock, started_game};

    fn property_for_money(store: &mut GameStore, alice: u32, amount: i64) -> (u32, TradeId) {
        let baltic = store.property_at_position(3).unwrap().id;
        store.property_mut(baltic).unwrap().owner_id = Some(alice);
        let bob = store.players().nth(1).unwrap().id;
        let items = vec![
            TradeItem {
                kind: TradeItemKind::Property { property_id: baltic },
                from_sender: true,
            },
            TradeItem {
                kind: TradeItemKind::Money { amount },
                from_sender: false,
            },
        ];
        let id = propose(store, "user-a", alice, bob, items, &clock()).unwrap();
        (baltic, id)
    }

    #[test]
    fn test_propose_moves_nothing() {
        let (mut store, alice, bob) = started_game();
        let (baltic, trade_id) = property_for_money(&mut store, alice, 300);
        assert_eq!(store.property(baltic).unwrap().owner_id, Some(alice));
        assert_eq!(store.player(bob).unwrap().balance, 1500);
        assert_eq!(store.trade(trade_id).unwrap().status, TradeStatus::Pending);
    }

    #[test]
    fn test_accept_exchanges_atomically() {
        let (mut store, alice, bob) = started_game();
        let (baltic, trade_id) = property_for_money(&mut store, alice, 300);

        accept(&mut store, "user-b", trade_id, &clock()).unwrap();

        assert_eq!(store.property(baltic).unwrap().owner_id, Some(bob));
        assert_eq!(store.player(alice).unwrap().balance, 1800);
        assert_eq!(store.player(bob).unwrap().balance, 1200);
        assert_eq!(store.trade(trade_id).unwrap().status, TradeStatus::Accepted);
    }

    #[test]
    fn test_accept_fails_when_receiver_balance_drifted() {
        let (mut store, alice, bob) = started_game();
        let (baltic, trade_id) = property_for_money(&mut store, alice, 300);
        store.player_mut(bob).unwrap().balance = 299;

        let err = accept(&mut store, "user-b", trade_id, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        // No partial effect.
        assert_eq!(store.property(baltic).unwrap().owner_id, Some(alice));
        assert_eq!(store.player(bob).unwrap().balance, 299);
        assert_eq!(store.trade(trade_id).unwrap().status, TradeStatus::Pending);
    }

    #[test]
    fn test_accept_fails_when_sender_sold_property() {
        let (mut store, alice, bob) = started_game();
        let (baltic, trade_id) = property_for_money(&mut store, alice, 300);
        store.property_mut(baltic).unwrap().owner_id = None;

        let err = accept(&mut store, "user-b", trade_id, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
        assert_eq!(store.player(bob).unwrap().balance, 1500);
    }

    #[test]
    fn test_only_receiver_may_accept() {
        let (mut store, alice, _bob) = started_game();
        let (_baltic, trade_id) = property_for_money(&mut store, alice, 300);
        let err = accept(&mut store, "user-a", trade_id, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::Forbidden { .. }));
    }

    #[test]
    fn test_reject_is_terminal() {
        let (mut store, alice, _bob) = started_game();
        let (baltic, trade_id) = property_for_money(&mut store, alice, 300);

        reject(&mut store, "user-b", trade_id, &clock()).unwrap();
        assert_eq!(store.trade(trade_id).unwrap().status, TradeStatus::Rejected);
        assert_eq!(store.property(baltic).unwrap().owner_id, Some(alice));

        let err = accept(&mut store, "user-b", trade_id, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::TradeAlreadyProcessed { .. }));
        let err = reject(&mut store, "user-b", trade_id, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::TradeAlreadyProcessed { .. }));
    }

    #[test]
    fn test_jail_cards_transfer() {
        let (mut store, alice, bob) = started_game();
        store.player_mut(alice).unwrap().jail_cards = 1;
        let items = vec![
            TradeItem {
                kind: TradeItemKind::JailCard,
                from_sender: true,
            },
            TradeItem {
                kind: TradeItemKind::Money { amount: 50 },
                from_sender: false,
            },
        ];
        let trade_id = propose(&mut store, "user-a", alice, bob, items, &clock()).unwrap();
        accept(&mut store, "user-b", trade_id, &clock()).unwrap();
        assert_eq!(store.player(alice).unwrap().jail_cards, 0);
        assert_eq!(store.player(bob).unwrap().jail_cards, 1);
        assert_eq!(store.player(alice).unwrap().balance, 1550);
    }

    #[test]
    fn test_self_trade_rejected() {
        let (mut store, alice, _bob) = started_game();
        let items = vec![TradeItem {
            kind: TradeItemKind::Money { amount: 10 },
            from_sender: true,
        }];
        let err = propose(&mut store, "user-a", alice, alice, items, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }

    #[test]
    fn test_empty_trade_rejected() {
        let (mut store, alice, bob) = started_game();
        let err = propose(&mut store, "user-a", alice, bob, Vec::new(), &clock()).unwrap_err();
        assert!(matches!(err, EngineError::RuleViolation { .. }));
    }
}
