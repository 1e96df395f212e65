use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for games
pub type GameId = String;

/// Unique identifier for users (issued by the external auth layer)
pub type UserId = String;

pub type PlayerId = u32;
pub type PropertyId = u32;
pub type TradeId = u32;
pub type AuctionId = u32;
pub type CardId = u32;

/// Game lifecycle. Transitions only ever run forward:
/// waiting -> active -> finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Active,
    Finished,
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Waiting => write!(f, "waiting"),
            GameStatus::Active => write!(f, "active"),
            GameStatus::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub status: GameStatus,
    pub max_players: usize,
    pub current_player_id: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
}

/// Rent owed after landing on another player's property. The debt must be
/// settled before the debtor's next roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentDebt {
    pub property_id: PropertyId,
    pub owner_id: PlayerId,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub user_id: UserId,
    pub name: String,
    pub balance: i64,
    pub position: u8,
    pub in_jail: bool,
    pub jail_turns: u8,
    pub jail_cards: u32,
    pub is_bankrupt: bool,
    pub pending_rent: Option<RentDebt>,
}

impl Player {
    pub fn new(id: PlayerId, user_id: UserId, name: String, balance: i64) -> Self {
        Player {
            id,
            user_id,
            name,
            balance,
            position: 0,
            in_jail: false,
            jail_turns: 0,
            jail_cards: 0,
            is_bankrupt: false,
            pending_rent: None,
        }
    }
}

/// A purchasable board tile materialized from the catalog at game start.
///
/// Invariants: `houses > 0` implies `!is_mortgaged`; `owner_id == None`
/// implies `houses == 0 && !is_mortgaged`. Houses run 0..=4 where 4 is a
/// hotel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub position: u8,
    pub price: i64,
    pub rent: i64,
    /// Rent with 1, 2 and 3 houses, then the hotel rent.
    pub rent_tiers: [i64; 4],
    pub mortgage_value: i64,
    pub house_price: i64,
    pub color_group: String,
    pub owner_id: Option<PlayerId>,
    pub is_mortgaged: bool,
    pub houses: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Pending,
    Accepted,
    Rejected,
}

/// One side of a barter. The enum payload guarantees exactly one value per
/// item kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradeItemKind {
    Property { property_id: PropertyId },
    Money { amount: i64 },
    JailCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeItem {
    pub kind: TradeItemKind,
    pub from_sender: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub sender_id: PlayerId,
    pub receiver_id: PlayerId,
    pub status: TradeStatus,
    pub items: Vec<TradeItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub property_id: PropertyId,
    pub status: AuctionStatus,
    pub current_bid: i64,
    pub current_bidder_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckType {
    Chance,
    CommunityChest,
}

impl std::fmt::Display for DeckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckType::Chance => write!(f, "chance"),
            DeckType::CommunityChest => write!(f, "community_chest"),
        }
    }
}

/// Exactly one effect class per card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CardEffect {
    Relocate { position: u8 },
    Pay { amount: i64 },
    Collect { amount: i64 },
    GoToJail,
    GetOutOfJailFree,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub deck: DeckType,
    pub title: String,
    pub effect: CardEffect,
}

/// Immutable audit record. Appended by every state-mutating operation and
/// never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub seq: u64,
    pub player_id: Option<PlayerId>,
    pub action: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Cross-game user profile with win/played counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub games_played: u32,
    pub games_won: u32,
}

impl UserProfile {
    pub fn new(id: UserId, name: String) -> Self {
        UserProfile {
            id,
            name,
            games_played: 0,
            games_won: 0,
        }
    }
}
