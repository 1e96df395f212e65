//! In-memory entity store for one game. The engines treat this as their
//! transactional backend: get-by-id, list-by-filter, insert, update through
//! mutable accessors, and an append-only history insert. Numeric ids are
//! allocated monotonically per game; player iteration order is ascending id
//! (BTreeMap), which turn advancement and tie-breaking rely on.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::board;
use crate::entities::{
    Auction, AuctionId, Card, DeckType, Game, GameId, GameStatus, HistoryRecord, Player, PlayerId,
    Property, PropertyId, Trade, TradeId, UserId, UserProfile,
};
use crate::errors::{EngineError, EngineResult};

pub struct GameStore {
    game: Game,
    players: BTreeMap<PlayerId, Player>,
    properties: BTreeMap<PropertyId, Property>,
    trades: BTreeMap<TradeId, Trade>,
    auctions: BTreeMap<AuctionId, Auction>,
    cards: Vec<Card>,
    history: Vec<HistoryRecord>,
    next_id: u32,
    next_seq: u64,
}

impl GameStore {
    pub fn new(id: GameId, max_players: usize, created_at: DateTime<Utc>) -> Self {
        GameStore {
            game: Game {
                id,
                status: GameStatus::Waiting,
                max_players,
                current_player_id: None,
                created_at,
            },
            players: BTreeMap::new(),
            properties: BTreeMap::new(),
            trades: BTreeMap::new(),
            auctions: BTreeMap::new(),
            cards: Vec::new(),
            history: Vec::new(),
            next_id: 0,
            next_seq: 0,
        }
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    // ----- players -----

    pub fn insert_player(&mut self, user_id: UserId, name: String, balance: i64) -> PlayerId {
        let id = self.allocate_id();
        self.players
            .insert(id, Player::new(id, user_id, name, balance));
        id
    }

    pub fn player(&self, id: PlayerId) -> EngineResult<&Player> {
        self.players
            .get(&id)
            .ok_or(EngineError::PlayerNotFound { player_id: id })
    }

    pub fn player_mut(&mut self, id: PlayerId) -> EngineResult<&mut Player> {
        self.players
            .get_mut(&id)
            .ok_or(EngineError::PlayerNotFound { player_id: id })
    }

    /// All players in ascending-id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player_of_user(&self, user_id: &str) -> Option<&Player> {
        self.players.values().find(|p| p.user_id == user_id)
    }

    /// Non-bankrupt players in ascending-id order.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| !p.is_bankrupt)
    }

    /// The next non-bankrupt player after `id` in ascending-id cyclic order.
    /// `id` itself need not be active: after a bankruptcy the turn still
    /// passes to the first active id greater than the frozen player's.
    pub fn next_active_player_after(&self, id: PlayerId) -> Option<PlayerId> {
        let active: Vec<PlayerId> = self.active_players().map(|p| p.id).collect();
        active.iter().find(|&&p| p > id).or(active.first()).copied()
    }

    // ----- properties -----

    pub fn property(&self, id: PropertyId) -> EngineResult<&Property> {
        self.properties
            .get(&id)
            .ok_or(EngineError::PropertyNotFound { property_id: id })
    }

    pub fn property_mut(&mut self, id: PropertyId) -> EngineResult<&mut Property> {
        self.properties
            .get_mut(&id)
            .ok_or(EngineError::PropertyNotFound { property_id: id })
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    pub fn property_at_position(&self, position: u8) -> Option<&Property> {
        self.properties.values().find(|p| p.position == position)
    }

    pub fn properties_in_group(&self, color_group: &str) -> Vec<&Property> {
        self.properties
            .values()
            .filter(|p| p.color_group == color_group)
            .collect()
    }

    pub fn properties_owned_by(&self, player_id: PlayerId) -> Vec<&Property> {
        self.properties
            .values()
            .filter(|p| p.owner_id == Some(player_id))
            .collect()
    }

    pub fn owned_property_ids(&self, player_id: PlayerId) -> Vec<PropertyId> {
        self.properties_owned_by(player_id)
            .iter()
            .map(|p| p.id)
            .collect()
    }

    /// Load the static catalog and card decks into the store. Called once
    /// when the game starts.
    pub fn materialize_board(&mut self) {
        if !self.properties.is_empty() {
            return;
        }
        let mut next = self.next_id;
        let properties = board::build_properties(|| {
            next += 1;
            next
        });
        let cards = board::build_decks(|| {
            next += 1;
            next
        });
        self.next_id = next;
        for property in properties {
            self.properties.insert(property.id, property);
        }
        self.cards = cards;
    }

    // ----- trades -----

    pub fn insert_trade(&mut self, mut trade: Trade) -> TradeId {
        let id = self.allocate_id();
        trade.id = id;
        self.trades.insert(id, trade);
        id
    }

    pub fn trade(&self, id: TradeId) -> EngineResult<&Trade> {
        self.trades
            .get(&id)
            .ok_or(EngineError::TradeNotFound { trade_id: id })
    }

    pub fn trade_mut(&mut self, id: TradeId) -> EngineResult<&mut Trade> {
        self.trades
            .get_mut(&id)
            .ok_or(EngineError::TradeNotFound { trade_id: id })
    }

    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.values()
    }

    // ----- auctions -----

    pub fn insert_auction(&mut self, mut auction: Auction) -> AuctionId {
        let id = self.allocate_id();
        auction.id = id;
        self.auctions.insert(id, auction);
        id
    }

    pub fn auction(&self, id: AuctionId) -> EngineResult<&Auction> {
        self.auctions
            .get(&id)
            .ok_or(EngineError::AuctionNotFound { auction_id: id })
    }

    pub fn auction_mut(&mut self, id: AuctionId) -> EngineResult<&mut Auction> {
        self.auctions
            .get_mut(&id)
            .ok_or(EngineError::AuctionNotFound { auction_id: id })
    }

    pub fn auctions(&self) -> impl Iterator<Item = &Auction> {
        self.auctions.values()
    }

    // ----- cards -----

    pub fn cards_in_deck(&self, deck: DeckType) -> Vec<&Card> {
        self.cards.iter().filter(|c| c.deck == deck).collect()
    }

    // ----- history -----

    /// Append one immutable record. This is the only write path into the
    /// history table.
    pub fn record_history(
        &mut self,
        player_id: Option<PlayerId>,
        action: &str,
        details: Option<String>,
        timestamp: DateTime<Utc>,
    ) {
        self.next_seq += 1;
        self.history.push(HistoryRecord {
            seq: self.next_seq,
            player_id,
            action: action.to_string(),
            details,
            timestamp,
        });
        log::debug!(
            "game {}: history #{} {} ({:?})",
            self.game.id,
            self.next_seq,
            action,
            player_id
        );
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }
}

/// Cross-game user profiles with win/played counters.
#[derive(Default)]
pub struct UserDirectory {
    users: HashMap<UserId, UserProfile>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, user_id: &str, name: &str) -> &mut UserProfile {
        self.users
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id.to_string(), name.to_string()))
    }

    pub fn get(&self, user_id: &str) -> EngineResult<&UserProfile> {
        self.users.get(user_id).ok_or(EngineError::UserNotFound {
            user_id: user_id.to_string(),
        })
    }

    pub fn get_mut(&mut self, user_id: &str) -> EngineResult<&mut UserProfile> {
        self.users.get_mut(user_id).ok_or(EngineError::UserNotFound {
            user_id: user_id.to_string(),
        })
    }

    pub fn users(&self) -> impl Iterator<Item = &UserProfile> {
        self.users.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fresh_store() -> GameStore {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        GameStore::new("g1".to_string(), 4, t)
    }

    #[test]
    fn test_player_ids_ascend() {
        let mut store = fresh_store();
        let a = store.insert_player("u1".into(), "Alice".into(), 1500);
        let b = store.insert_player("u2".into(), "Bob".into(), 1500);
        assert!(b > a);
        let ids: Vec<_> = store.players().map(|p| p.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_next_active_player_skips_bankrupt() {
        let mut store = fresh_store();
        let a = store.insert_player("u1".into(), "Alice".into(), 1500);
        let b = store.insert_player("u2".into(), "Bob".into(), 1500);
        let c = store.insert_player("u3".into(), "Cleo".into(), 1500);

        assert_eq!(store.next_active_player_after(a), Some(b));
        store.player_mut(b).unwrap().is_bankrupt = true;
        assert_eq!(store.next_active_player_after(a), Some(c));
        assert_eq!(store.next_active_player_after(c), Some(a));
    }

    #[test]
    fn test_next_active_player_when_caller_is_bankrupt() {
        let mut store = fresh_store();
        let a = store.insert_player("u1".into(), "Alice".into(), 1500);
        let b = store.insert_player("u2".into(), "Bob".into(), 1500);
        let c = store.insert_player("u3".into(), "Cleo".into(), 1500);

        // The player handing the turn over has just been frozen and is no
        // longer in the active list; rotation must still pick the first
        // active id after theirs, not skip ahead.
        store.player_mut(a).unwrap().is_bankrupt = true;
        assert_eq!(store.next_active_player_after(a), Some(b));

        store.player_mut(c).unwrap().is_bankrupt = true;
        assert_eq!(store.next_active_player_after(c), Some(b));

        store.player_mut(b).unwrap().is_bankrupt = true;
        assert_eq!(store.next_active_player_after(b), None);
    }

    #[test]
    fn test_materialize_board_is_idempotent() {
        let mut store = fresh_store();
        store.materialize_board();
        let count = store.properties().count();
        assert_eq!(count, 28);
        store.materialize_board();
        assert_eq!(store.properties().count(), count);
        assert_eq!(store.cards_in_deck(DeckType::Chance).len(), 8);
    }

    #[test]
    fn test_history_is_append_only_and_ordered() {
        let mut store = fresh_store();
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        store.record_history(None, "game_started", None, t);
        store.record_history(Some(1), "passed_go", Some("Received $200".into()), t);
        let seqs: Vec<_> = store.history().iter().map(|h| h.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(store.history()[1].action, "passed_go");
    }

    #[test]
    fn test_property_lookup_by_position_and_group() {
        let mut store = fresh_store();
        store.materialize_board();
        let boardwalk = store.property_at_position(39).unwrap();
        assert_eq!(boardwalk.name, "Boardwalk");
        assert_eq!(store.properties_in_group("dark_blue").len(), 2);
        assert!(store.property_at_position(0).is_none());
    }
}
