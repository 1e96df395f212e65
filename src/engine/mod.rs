//! The rules engines. Every inbound player action is resolved by exactly
//! one of these modules; each reads and writes the [`GameStore`], calls the
//! pure economy functions where money is involved, and appends to history.
//!
//! All operations follow a validate-then-commit discipline: nothing is
//! mutated until every precondition has passed, so a failed operation
//! leaves the store exactly as it was.

pub mod auction;
pub mod bankruptcy;
pub mod property;
pub mod trade;
pub mod turn;

use crate::entities::{GameStatus, PlayerId};
use crate::errors::{EngineError, EngineResult};
use crate::store::GameStore;

/// The game must be active for any gameplay action.
pub(crate) fn require_active_game(store: &GameStore) -> EngineResult<()> {
    if store.game().status != GameStatus::Active {
        return Err(EngineError::WrongGameStatus {
            expected: GameStatus::Active.to_string(),
            found: store.game().status.to_string(),
        });
    }
    Ok(())
}

/// The acting user must control the player, and a frozen (bankrupt) player
/// can take no further actions.
pub(crate) fn require_controls(
    store: &GameStore,
    actor: &str,
    player_id: PlayerId,
) -> EngineResult<()> {
    let player = store.player(player_id)?;
    if player.user_id != actor {
        return Err(EngineError::forbidden(format!(
            "user {} does not control player {}",
            actor, player_id
        )));
    }
    if player.is_bankrupt {
        return Err(EngineError::rule_violation("player is bankrupt"));
    }
    Ok(())
}
