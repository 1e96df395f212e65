//! Turn engine: dice resolution, movement, jail handling, landing-tile
//! evaluation, card draws and rent settlement.

use serde::Serialize;

use crate::board::{self, BOARD_SIZE, JAIL_FINE, JAIL_POSITION, MAX_JAIL_TURNS, PASS_GO_BONUS};
use crate::dice::{Clock, RandomSource};
use crate::economy;
use crate::engine::{require_active_game, require_controls};
use crate::entities::{Card, CardEffect, DeckType, PlayerId, PropertyId, RentDebt};
use crate::errors::{EngineError, EngineResult};
use crate::store::GameStore;

/// What the landing tile means for the player who just moved.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Landing {
    /// Unowned property: the mover may buy (or decline into an auction).
    BuyOffer {
        property_id: PropertyId,
        name: String,
        price: i64,
        can_buy: bool,
    },
    /// Another player's property. When `amount > 0` the debt is recorded
    /// and must be settled before the mover's next roll.
    RentDue {
        property_id: PropertyId,
        name: String,
        owner_id: PlayerId,
        amount: i64,
    },
    OwnProperty { property_id: PropertyId },
    /// A non-purchasable tile (go, tax, chance, ...).
    Tile { tile: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RollOutcome {
    pub dice: [u8; 2],
    pub is_double: bool,
    pub in_jail: bool,
    pub jail_turns: u8,
    /// None when the roll resolved entirely inside jail.
    pub new_position: Option<u8>,
    pub passed_go: bool,
    pub landing: Option<Landing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrawOutcome {
    pub card: Card,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentReceipt {
    pub property_id: PropertyId,
    pub owner_id: PlayerId,
    pub amount: i64,
}

/// Roll two dice and resolve the full turn step for `player_id`.
///
/// Jail rules follow the reference behavior exactly: a double releases the
/// player and the move still happens; a failed roll burns a jail turn and
/// returns without advancing the turn; the third failed roll forces the
/// fine (failing atomically with InsufficientFunds if the player cannot
/// pay, leaving them jailed). Outside jail the player moves by the dice
/// total with wrap-around, collecting the pass-go bonus when the move
/// crosses or lands on Go. A double retains the turn.
pub fn roll_and_move(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    rng: &mut dyn RandomSource,
    clock: &dyn Clock,
) -> EngineResult<RollOutcome> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let current = store.game().current_player_id;
    if current != Some(player_id) {
        return Err(EngineError::NotPlayerTurn {
            current,
            attempted: player_id,
        });
    }
    if store.player(player_id)?.pending_rent.is_some() {
        return Err(EngineError::rule_violation(
            "rent debt must be settled before rolling",
        ));
    }

    let (die1, die2) = rng.roll_dice();
    let total = die1 + die2;
    let is_double = die1 == die2;

    let player = store.player(player_id)?;
    if player.in_jail {
        if !is_double {
            if player.jail_turns + 1 >= MAX_JAIL_TURNS {
                // Forced fine on the third failed roll.
                let balance = player.balance;
                if balance < JAIL_FINE {
                    return Err(EngineError::insufficient_funds(player_id, JAIL_FINE, balance));
                }
                let player = store.player_mut(player_id)?;
                player.balance -= JAIL_FINE;
                player.in_jail = false;
                player.jail_turns = 0;
                store.record_history(
                    Some(player_id),
                    "paid_jail_fine",
                    Some(format!("Forced ${} fine after {} jail turns", JAIL_FINE, MAX_JAIL_TURNS)),
                    clock.now(),
                );
                return Ok(RollOutcome {
                    dice: [die1, die2],
                    is_double,
                    in_jail: false,
                    jail_turns: 0,
                    new_position: None,
                    passed_go: false,
                    landing: None,
                });
            }
            let player = store.player_mut(player_id)?;
            player.jail_turns += 1;
            let jail_turns = player.jail_turns;
            store.record_history(
                Some(player_id),
                "jail_turn",
                Some(format!("Rolled {}+{}, still in jail", die1, die2)),
                clock.now(),
            );
            return Ok(RollOutcome {
                dice: [die1, die2],
                is_double,
                in_jail: true,
                jail_turns,
                new_position: None,
                passed_go: false,
                landing: None,
            });
        }
        // A double releases the player; the move below still happens.
        let player = store.player_mut(player_id)?;
        player.in_jail = false;
        player.jail_turns = 0;
        store.record_history(
            Some(player_id),
            "released_from_jail",
            Some("Rolled a double".to_string()),
            clock.now(),
        );
    }

    let old_position = store.player(player_id)?.position;
    let new_position = (old_position + total) % BOARD_SIZE;
    let passed_go = u16::from(old_position) + u16::from(total) >= u16::from(BOARD_SIZE);
    {
        let player = store.player_mut(player_id)?;
        player.position = new_position;
        if passed_go {
            player.balance += PASS_GO_BONUS;
        }
    }
    store.record_history(
        Some(player_id),
        "rolled",
        Some(format!("{}+{} to position {}", die1, die2, new_position)),
        clock.now(),
    );
    if passed_go {
        store.record_history(
            Some(player_id),
            "passed_go",
            Some(format!("Received ${}", PASS_GO_BONUS)),
            clock.now(),
        );
    }

    if !is_double {
        let next = store.next_active_player_after(player_id);
        store.game_mut().current_player_id = next;
    }

    let landing = evaluate_landing(store, player_id, new_position)?;
    if let Some(Landing::RentDue {
        property_id,
        owner_id,
        amount,
        ..
    }) = &landing
    {
        if *amount > 0 {
            store.player_mut(player_id)?.pending_rent = Some(RentDebt {
                property_id: *property_id,
                owner_id: *owner_id,
                amount: *amount,
            });
        }
    }

    Ok(RollOutcome {
        dice: [die1, die2],
        is_double,
        in_jail: false,
        jail_turns: 0,
        new_position: Some(new_position),
        passed_go,
        landing,
    })
}

fn evaluate_landing(
    store: &GameStore,
    player_id: PlayerId,
    position: u8,
) -> EngineResult<Option<Landing>> {
    let property = match store.property_at_position(position) {
        Some(property) => property,
        None => {
            return Ok(Some(Landing::Tile {
                tile: board::tile_kind(position).label().to_string(),
            }))
        }
    };
    match property.owner_id {
        None => Ok(Some(Landing::BuyOffer {
            property_id: property.id,
            name: property.name.clone(),
            price: property.price,
            can_buy: store.player(player_id)?.balance >= property.price,
        })),
        Some(owner) if owner == player_id => Ok(Some(Landing::OwnProperty {
            property_id: property.id,
        })),
        Some(owner) => {
            let group = store.properties_in_group(&property.color_group);
            let amount = economy::rent(property, &group);
            Ok(Some(Landing::RentDue {
                property_id: property.id,
                name: property.name.clone(),
                owner_id: owner,
                amount,
            }))
        }
    }
}

/// Settle the rent debt recorded by the last roll.
pub fn pay_rent(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    clock: &dyn Clock,
) -> EngineResult<RentReceipt> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let debt = store
        .player(player_id)?
        .pending_rent
        .clone()
        .ok_or_else(|| EngineError::rule_violation("no rent is due"))?;
    let balance = store.player(player_id)?.balance;
    if balance < debt.amount {
        return Err(EngineError::insufficient_funds(player_id, debt.amount, balance));
    }

    {
        let tenant = store.player_mut(player_id)?;
        tenant.balance -= debt.amount;
        tenant.pending_rent = None;
    }
    store.player_mut(debt.owner_id)?.balance += debt.amount;
    store.record_history(
        Some(player_id),
        "rent_paid",
        Some(format!("${} to player {}", debt.amount, debt.owner_id)),
        clock.now(),
    );
    Ok(RentReceipt {
        property_id: debt.property_id,
        owner_id: debt.owner_id,
        amount: debt.amount,
    })
}

/// Draw a uniformly random card of the requested deck and apply its single
/// effect. A debit that would overdraw the balance fails with no effect:
/// committed balances are never negative.
pub fn draw_card(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    deck: DeckType,
    rng: &mut dyn RandomSource,
    clock: &dyn Clock,
) -> EngineResult<DrawOutcome> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let cards = store.cards_in_deck(deck);
    if cards.is_empty() {
        return Err(EngineError::DeckEmpty);
    }
    let card = cards[rng.pick(cards.len())].clone();

    let mut message = format!("Drew card: {}", card.title);
    match card.effect {
        CardEffect::Relocate { position } => {
            store.player_mut(player_id)?.position = position;
            message.push_str(&format!(". Moved to position {}", position));
        }
        CardEffect::Pay { amount } => {
            let balance = store.player(player_id)?.balance;
            if balance < amount {
                return Err(EngineError::insufficient_funds(player_id, amount, balance));
            }
            store.player_mut(player_id)?.balance -= amount;
            message.push_str(&format!(". Paid ${}", amount));
        }
        CardEffect::Collect { amount } => {
            store.player_mut(player_id)?.balance += amount;
            message.push_str(&format!(". Received ${}", amount));
        }
        CardEffect::GoToJail => {
            let player = store.player_mut(player_id)?;
            player.in_jail = true;
            player.jail_turns = 0;
            player.position = JAIL_POSITION;
            message.push_str(". Sent to jail");
        }
        CardEffect::GetOutOfJailFree => {
            store.player_mut(player_id)?.jail_cards += 1;
            message.push_str(". Received a Get Out of Jail Free card");
        }
    }
    store.record_history(Some(player_id), "card_drawn", Some(card.title.clone()), clock.now());
    Ok(DrawOutcome { card, message })
}

/// Pay the fixed fine to leave jail voluntarily.
pub fn pay_jail_fine(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let player = store.player(player_id)?;
    if !player.in_jail {
        return Err(EngineError::rule_violation("player is not in jail"));
    }
    if player.balance < JAIL_FINE {
        return Err(EngineError::insufficient_funds(player_id, JAIL_FINE, player.balance));
    }
    let player = store.player_mut(player_id)?;
    player.balance -= JAIL_FINE;
    player.in_jail = false;
    player.jail_turns = 0;
    store.record_history(
        Some(player_id),
        "paid_jail_fine",
        Some(format!("Paid ${} to leave jail", JAIL_FINE)),
        clock.now(),
    );
    Ok(())
}

/// Spend one Get Out of Jail Free card.
pub fn use_jail_card(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    clock: &dyn Clock,
) -> EngineResult<()> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;
    let player = store.player(player_id)?;
    if !player.in_jail {
        return Err(EngineError::rule_violation("player is not in jail"));
    }
    if player.jail_cards == 0 {
        return Err(EngineError::rule_violation("no Get Out of Jail Free cards held"));
    }
    let player = store.player_mut(player_id)?;
    player.jail_cards -= 1;
    player.in_jail = false;
    player.jail_turns = 0;
    store.record_history(Some(player_id), "used_jail_card", None, clock.now());
    Ok(())
}
