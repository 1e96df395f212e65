//! Player liquidation and game resolution: bankruptcy, the end-of-game
//! check, winner computation and placement ordering.

use serde::Serialize;

use crate::dice::Clock;
use crate::economy;
use crate::engine::{require_active_game, require_controls};
use crate::entities::{GameStatus, PlayerId};
use crate::errors::{EngineError, EngineResult};
use crate::store::{GameStore, UserDirectory};

/// One row of the end-of-game (or current-standings) ranking.
#[derive(Debug, Clone, Serialize)]
pub struct Placement {
    pub player_id: PlayerId,
    pub name: String,
    pub net_worth: i64,
    pub is_bankrupt: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameResult {
    pub winner_id: Option<PlayerId>,
    pub placements: Vec<Placement>,
}

/// Freeze the player, release their properties back to the unowned pool,
/// and end the game if at most one active player remains.
///
/// Released properties come back clean: owner cleared, houses demolished,
/// mortgage lifted. A second call fails on the bankruptcy guard.
pub fn declare_bankruptcy(
    store: &mut GameStore,
    actor: &str,
    player_id: PlayerId,
    users: &mut UserDirectory,
    clock: &dyn Clock,
) -> EngineResult<Option<GameResult>> {
    require_active_game(store)?;
    require_controls(store, actor, player_id)?;

    let owned = store.owned_property_ids(player_id);
    for property_id in &owned {
        let property = store.property_mut(*property_id)?;
        property.owner_id = None;
        property.houses = 0;
        property.is_mortgaged = false;
    }
    {
        let player = store.player_mut(player_id)?;
        player.is_bankrupt = true;
        player.pending_rent = None;
    }
    // Debts owed to the bankrupt player die with them.
    let debtors: Vec<PlayerId> = store
        .players()
        .filter(|p| {
            p.pending_rent
                .as_ref()
                .is_some_and(|debt| debt.owner_id == player_id)
        })
        .map(|p| p.id)
        .collect();
    for debtor in debtors {
        store.player_mut(debtor)?.pending_rent = None;
    }
    if store.game().current_player_id == Some(player_id) {
        let next = store.next_active_player_after(player_id);
        store.game_mut().current_player_id = next;
    }
    store.record_history(
        Some(player_id),
        "bankruptcy_declared",
        Some(format!("Released {} properties", owned.len())),
        clock.now(),
    );

    if store.active_players().count() <= 1 {
        return end_game(store, users, clock).map(Some);
    }
    Ok(None)
}

/// Finish the game: the highest net worth among non-bankrupt players wins,
/// ties broken by lowest player id. User counters move exactly once.
pub fn end_game(
    store: &mut GameStore,
    users: &mut UserDirectory,
    clock: &dyn Clock,
) -> EngineResult<GameResult> {
    require_active_game(store)?;

    let mut winner: Option<(PlayerId, i64)> = None;
    for player in store.active_players() {
        let worth = economy::net_worth(player.balance, &store.properties_owned_by(player.id));
        // Strict comparison over ascending ids: the lowest id wins ties.
        if winner.map_or(true, |(_, best)| worth > best) {
            winner = Some((player.id, worth));
        }
    }
    let winner_id = winner.map(|(id, _)| id);

    store.game_mut().status = GameStatus::Finished;
    store.game_mut().current_player_id = None;

    let participants: Vec<(PlayerId, String, String)> = store
        .players()
        .map(|p| (p.id, p.user_id.clone(), p.name.clone()))
        .collect();
    for (id, user_id, name) in &participants {
        let profile = users.get_or_create(user_id, name);
        profile.games_played += 1;
        if Some(*id) == winner_id {
            profile.games_won += 1;
        }
    }

    let detail = match winner_id {
        Some(id) => format!("Winner: player {}", id),
        None => "No remaining players".to_string(),
    };
    store.record_history(winner_id, "game_ended", Some(detail), clock.now());
    log::info!("game {} finished, winner {:?}", store.game().id, winner_id);

    Ok(GameResult {
        winner_id,
        placements: placements(store),
    })
}

/// All players ranked by descending net worth; bankrupt players sort after
/// active ones, ties resolved by ascending id.
pub fn placements(store: &GameStore) -> Vec<Placement> {
    let mut rows: Vec<Placement> = store
        .players()
        .map(|p| Placement {
            player_id: p.id,
            name: p.name.clone(),
            net_worth: economy::net_worth(p.balance, &store.properties_owned_by(p.id)),
            is_bankrupt: p.is_bankrupt,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.is_bankrupt
            .cmp(&b.is_bankrupt)
            .then(b.net_worth.cmp(&a.net_worth))
            .then(a.player_id.cmp(&b.player_id))
    });
    rows
}
