//! Cross-game coordination: the lobby (create/join/start), read views, and
//! the concurrency model. One `Mutex` guards the game map for lookups; each
//! game carries its own `Mutex`, so operations on one game serialize while
//! different games proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use uuid::Uuid;

use crate::board::STARTING_BALANCE;
use crate::dice::{Clock, RandomSource, SystemClock, XorshiftSource};
use crate::engine::{auction, bankruptcy, property, trade, turn};
use crate::engine::bankruptcy::{GameResult, Placement};
use crate::engine::turn::{DrawOutcome, RentReceipt, RollOutcome};
use crate::entities::{
    Auction, AuctionId, DeckType, Game, GameId, GameStatus, HistoryRecord, Player, PlayerId,
    Property, PropertyId, Trade, TradeId, TradeItem, UserProfile,
};
use crate::errors::{EngineError, EngineResult};
use crate::store::{GameStore, UserDirectory};

/// Full read snapshot of one game for the transport layer.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub game: Game,
    pub players: Vec<Player>,
    pub properties: Vec<Property>,
    pub trades: Vec<Trade>,
    pub auctions: Vec<Auction>,
    pub placements: Vec<Placement>,
}

/// One game a user took part in, with their standing in it.
#[derive(Debug, Clone, Serialize)]
pub struct UserGameRecord {
    pub game_id: GameId,
    pub status: GameStatus,
    pub placement: usize,
    pub net_worth: i64,
    pub won: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub id: GameId,
    pub status: GameStatus,
    pub player_count: usize,
    pub max_players: usize,
}

pub struct GameManager {
    games: Mutex<HashMap<GameId, Arc<Mutex<GameStore>>>>,
    users: Mutex<UserDirectory>,
    rng: Mutex<Box<dyn RandomSource>>,
    clock: Box<dyn Clock>,
}

fn lock<T>(mutex: &Mutex<T>) -> EngineResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| EngineError::invalid_state("poisoned lock"))
}

impl GameManager {
    pub fn new() -> Self {
        Self::with_sources(Box::new(XorshiftSource::from_entropy()), Box::new(SystemClock))
    }

    /// Deterministic sources for tests.
    pub fn with_sources(rng: Box<dyn RandomSource>, clock: Box<dyn Clock>) -> Self {
        GameManager {
            games: Mutex::new(HashMap::new()),
            users: Mutex::new(UserDirectory::new()),
            rng: Mutex::new(rng),
            clock,
        }
    }

    fn game_handle(&self, game_id: &str) -> EngineResult<Arc<Mutex<GameStore>>> {
        lock(&self.games)?
            .get(game_id)
            .cloned()
            .ok_or_else(|| EngineError::GameNotFound {
                game_id: game_id.to_string(),
            })
    }

    fn with_game<T>(
        &self,
        game_id: &str,
        f: impl FnOnce(&mut GameStore) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let handle = self.game_handle(game_id)?;
        let mut store = lock(&handle)?;
        f(&mut store)
    }

    // ----- lobby -----

    /// Create a Waiting game; the creator joins immediately.
    pub fn create_game(
        &self,
        user_id: &str,
        user_name: &str,
        max_players: usize,
    ) -> EngineResult<(GameId, PlayerId)> {
        if !(2..=8).contains(&max_players) {
            return Err(EngineError::rule_violation(
                "max_players must be between 2 and 8",
            ));
        }
        let game_id = Uuid::new_v4().to_string();
        let mut store = GameStore::new(game_id.clone(), max_players, self.clock.now());
        let player_id =
            store.insert_player(user_id.to_string(), user_name.to_string(), STARTING_BALANCE);
        store.record_history(
            Some(player_id),
            "game_created",
            Some(format!("{} opened the table", user_name)),
            self.clock.now(),
        );
        lock(&self.users)?.get_or_create(user_id, user_name);
        lock(&self.games)?.insert(game_id.clone(), Arc::new(Mutex::new(store)));
        log::info!("game {} created by user {}", game_id, user_id);
        Ok((game_id, player_id))
    }

    pub fn join_game(
        &self,
        game_id: &str,
        user_id: &str,
        user_name: &str,
    ) -> EngineResult<PlayerId> {
        lock(&self.users)?.get_or_create(user_id, user_name);
        self.with_game(game_id, |store| {
            if store.game().status != GameStatus::Waiting {
                return Err(EngineError::WrongGameStatus {
                    expected: GameStatus::Waiting.to_string(),
                    found: store.game().status.to_string(),
                });
            }
            if store.player_of_user(user_id).is_some() {
                return Err(EngineError::rule_violation("user already joined this game"));
            }
            if store.player_count() >= store.game().max_players {
                return Err(EngineError::rule_violation("game is full"));
            }
            let player_id =
                store.insert_player(user_id.to_string(), user_name.to_string(), STARTING_BALANCE);
            store.record_history(
                Some(player_id),
                "player_joined",
                Some(user_name.to_string()),
                self.clock.now(),
            );
            Ok(player_id)
        })
    }

    /// Materialize the board and hand the first turn to the caller.
    pub fn start_game(&self, game_id: &str, user_id: &str) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            if store.game().status != GameStatus::Waiting {
                return Err(EngineError::WrongGameStatus {
                    expected: GameStatus::Waiting.to_string(),
                    found: store.game().status.to_string(),
                });
            }
            let starter = store
                .player_of_user(user_id)
                .ok_or_else(|| EngineError::forbidden("only a joined player may start the game"))?
                .id;
            if store.player_count() < 2 {
                return Err(EngineError::rule_violation(
                    "at least two players are required",
                ));
            }
            store.materialize_board();
            store.game_mut().status = GameStatus::Active;
            store.game_mut().current_player_id = Some(starter);
            store.record_history(Some(starter), "game_started", None, self.clock.now());
            log::info!("game {} started by user {}", game_id, user_id);
            Ok(())
        })
    }

    // ----- views -----

    pub fn list_games(&self) -> EngineResult<Vec<GameSummary>> {
        let handles: Vec<Arc<Mutex<GameStore>>> = lock(&self.games)?.values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let store = lock(&handle)?;
            summaries.push(GameSummary {
                id: store.game().id.clone(),
                status: store.game().status.clone(),
                player_count: store.player_count(),
                max_players: store.game().max_players,
            });
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    pub fn game_view(&self, game_id: &str) -> EngineResult<GameView> {
        self.with_game(game_id, |store| {
            Ok(GameView {
                game: store.game().clone(),
                players: store.players().cloned().collect(),
                properties: store.properties().cloned().collect(),
                trades: store.trades().cloned().collect(),
                auctions: store.auctions().cloned().collect(),
                placements: bankruptcy::placements(store),
            })
        })
    }

    pub fn history_view(&self, game_id: &str) -> EngineResult<Vec<HistoryRecord>> {
        self.with_game(game_id, |store| Ok(store.history().to_vec()))
    }

    pub fn user_profile(&self, user_id: &str) -> EngineResult<UserProfile> {
        lock(&self.users)?.get(user_id).cloned()
    }

    /// Every game the user joined, with their placement by net worth.
    pub fn user_history(&self, user_id: &str) -> EngineResult<Vec<UserGameRecord>> {
        {
            let users = lock(&self.users)?;
            users.get(user_id)?;
        }
        let handles: Vec<Arc<Mutex<GameStore>>> = lock(&self.games)?.values().cloned().collect();
        let mut records = Vec::new();
        for handle in handles {
            let store = lock(&handle)?;
            let player_id = match store.player_of_user(user_id) {
                Some(player) => player.id,
                None => continue,
            };
            let rows = bankruptcy::placements(&store);
            if let Some(rank) = rows.iter().position(|r| r.player_id == player_id) {
                records.push(UserGameRecord {
                    game_id: store.game().id.clone(),
                    status: store.game().status.clone(),
                    placement: rank + 1,
                    net_worth: rows[rank].net_worth,
                    won: store.game().status == GameStatus::Finished && rank == 0,
                });
            }
        }
        records.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        Ok(records)
    }

    // ----- gameplay pass-throughs -----

    pub fn roll(&self, game_id: &str, actor: &str, player_id: PlayerId) -> EngineResult<RollOutcome> {
        let handle = self.game_handle(game_id)?;
        let mut store = lock(&handle)?;
        let mut rng = lock(&self.rng)?;
        turn::roll_and_move(&mut store, actor, player_id, rng.as_mut(), self.clock.as_ref())
    }

    pub fn draw_card(
        &self,
        game_id: &str,
        actor: &str,
        player_id: PlayerId,
        deck: DeckType,
    ) -> EngineResult<DrawOutcome> {
        let handle = self.game_handle(game_id)?;
        let mut store = lock(&handle)?;
        let mut rng = lock(&self.rng)?;
        turn::draw_card(&mut store, actor, player_id, deck, rng.as_mut(), self.clock.as_ref())
    }

    pub fn pay_rent(&self, game_id: &str, actor: &str, player_id: PlayerId) -> EngineResult<RentReceipt> {
        self.with_game(game_id, |store| {
            turn::pay_rent(store, actor, player_id, self.clock.as_ref())
        })
    }

    pub fn pay_jail_fine(&self, game_id: &str, actor: &str, player_id: PlayerId) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            turn::pay_jail_fine(store, actor, player_id, self.clock.as_ref())
        })
    }

    pub fn use_jail_card(&self, game_id: &str, actor: &str, player_id: PlayerId) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            turn::use_jail_card(store, actor, player_id, self.clock.as_ref())
        })
    }

    pub fn buy_property(
        &self,
        game_id: &str,
        actor: &str,
        player_id: PlayerId,
        property_id: PropertyId,
    ) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            property::buy(store, actor, player_id, property_id, self.clock.as_ref())
        })
    }

    pub fn mortgage_property(
        &self,
        game_id: &str,
        actor: &str,
        player_id: PlayerId,
        property_id: PropertyId,
    ) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            property::mortgage(store, actor, player_id, property_id, self.clock.as_ref())
        })
    }

    pub fn unmortgage_property(
        &self,
        game_id: &str,
        actor: &str,
        player_id: PlayerId,
        property_id: PropertyId,
    ) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            property::unmortgage(store, actor, player_id, property_id, self.clock.as_ref())
        })
    }

    pub fn build_house(
        &self,
        game_id: &str,
        actor: &str,
        player_id: PlayerId,
        property_id: PropertyId,
    ) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            property::build_house(store, actor, player_id, property_id, self.clock.as_ref())
        })
    }

    pub fn sell_house(
        &self,
        game_id: &str,
        actor: &str,
        player_id: PlayerId,
        property_id: PropertyId,
    ) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            property::sell_house(store, actor, player_id, property_id, self.clock.as_ref())
        })
    }

    pub fn propose_trade(
        &self,
        game_id: &str,
        actor: &str,
        sender_id: PlayerId,
        receiver_id: PlayerId,
        items: Vec<TradeItem>,
    ) -> EngineResult<TradeId> {
        self.with_game(game_id, |store| {
            trade::propose(store, actor, sender_id, receiver_id, items, self.clock.as_ref())
        })
    }

    pub fn accept_trade(&self, game_id: &str, actor: &str, trade_id: TradeId) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            trade::accept(store, actor, trade_id, self.clock.as_ref())
        })
    }

    pub fn reject_trade(&self, game_id: &str, actor: &str, trade_id: TradeId) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            trade::reject(store, actor, trade_id, self.clock.as_ref())
        })
    }

    pub fn start_auction(
        &self,
        game_id: &str,
        property_id: PropertyId,
        starting_bid: Option<i64>,
    ) -> EngineResult<AuctionId> {
        self.with_game(game_id, |store| {
            auction::start(store, property_id, starting_bid, self.clock.as_ref())
        })
    }

    pub fn bid(
        &self,
        game_id: &str,
        actor: &str,
        auction_id: AuctionId,
        player_id: PlayerId,
        amount: i64,
    ) -> EngineResult<()> {
        self.with_game(game_id, |store| {
            auction::bid(store, actor, auction_id, player_id, amount, self.clock.as_ref())
        })
    }

    pub fn end_auction(&self, game_id: &str, auction_id: AuctionId) -> EngineResult<Option<PlayerId>> {
        self.with_game(game_id, |store| {
            auction::end(store, auction_id, self.clock.as_ref())
        })
    }

    pub fn declare_bankruptcy(
        &self,
        game_id: &str,
        actor: &str,
        player_id: PlayerId,
    ) -> EngineResult<Option<GameResult>> {
        let handle = self.game_handle(game_id)?;
        let mut store = lock(&handle)?;
        let mut users = lock(&self.users)?;
        bankruptcy::declare_bankruptcy(&mut store, actor, player_id, &mut users, self.clock.as_ref())
    }

    pub fn end_game(&self, game_id: &str) -> EngineResult<GameResult> {
        let handle = self.game_handle(game_id)?;
        let mut store = lock(&handle)?;
        let mut users = lock(&self.users)?;
        bankruptcy::end_game(&mut store, &mut users, self.clock.as_ref())
    }
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new()
    }
}
