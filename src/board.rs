//! Static board reference data: the 40 tiles, the purchasable property
//! catalog with color groups and rent tables, and the two card decks.
//! Loaded once per game when it starts.

use crate::entities::{Card, CardEffect, DeckType, Property};

pub const BOARD_SIZE: u8 = 40;
pub const GO_POSITION: u8 = 0;
pub const JAIL_POSITION: u8 = 10;
pub const PASS_GO_BONUS: i64 = 200;
pub const JAIL_FINE: i64 = 50;
pub const STARTING_BALANCE: i64 = 1500;
/// A jailed player is forced to pay the fine on their third failed roll.
pub const MAX_JAIL_TURNS: u8 = 3;

/// What sits on a board position that is not a purchasable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Go,
    Street,
    Railroad,
    Utility,
    Chance,
    CommunityChest,
    Tax,
    Jail,
    FreeParking,
    GoToJail,
}

impl TileKind {
    pub fn label(self) -> &'static str {
        match self {
            TileKind::Go => "go",
            TileKind::Street => "street",
            TileKind::Railroad => "railroad",
            TileKind::Utility => "utility",
            TileKind::Chance => "chance",
            TileKind::CommunityChest => "community_chest",
            TileKind::Tax => "tax",
            TileKind::Jail => "jail",
            TileKind::FreeParking => "free_parking",
            TileKind::GoToJail => "go_to_jail",
        }
    }
}

/// Catalog row for one purchasable tile.
#[derive(Debug, Clone)]
pub struct PropertySpec {
    pub name: &'static str,
    pub position: u8,
    pub price: i64,
    pub rent: i64,
    pub rent_tiers: [i64; 4],
    pub mortgage_value: i64,
    pub house_price: i64,
    pub color_group: &'static str,
}

impl PropertySpec {
    const fn street(
        name: &'static str,
        position: u8,
        price: i64,
        rent: i64,
        rent_tiers: [i64; 4],
        house_price: i64,
        color_group: &'static str,
    ) -> Self {
        PropertySpec {
            name,
            position,
            price,
            rent,
            rent_tiers,
            mortgage_value: price / 2,
            house_price,
            color_group,
        }
    }

    const fn railroad(name: &'static str, position: u8) -> Self {
        PropertySpec {
            name,
            position,
            price: 200,
            rent: 25,
            rent_tiers: [0; 4],
            mortgage_value: 100,
            house_price: 0,
            color_group: "railroad",
        }
    }

    const fn utility(name: &'static str, position: u8) -> Self {
        PropertySpec {
            name,
            position,
            price: 150,
            rent: 10,
            rent_tiers: [0; 4],
            mortgage_value: 75,
            house_price: 0,
            color_group: "utility",
        }
    }
}

/// The 28 purchasable tiles of the standard board.
pub const PROPERTY_CATALOG: [PropertySpec; 28] = [
    PropertySpec::street("Mediterranean Avenue", 1, 60, 2, [10, 30, 90, 250], 50, "brown"),
    PropertySpec::street("Baltic Avenue", 3, 60, 4, [20, 60, 180, 450], 50, "brown"),
    PropertySpec::railroad("Reading Railroad", 5),
    PropertySpec::street("Oriental Avenue", 6, 100, 6, [30, 90, 270, 550], 50, "light_blue"),
    PropertySpec::street("Vermont Avenue", 8, 100, 6, [30, 90, 270, 550], 50, "light_blue"),
    PropertySpec::street("Connecticut Avenue", 9, 120, 8, [40, 100, 300, 600], 50, "light_blue"),
    PropertySpec::street("St. Charles Place", 11, 140, 10, [50, 150, 450, 750], 100, "pink"),
    PropertySpec::utility("Electric Company", 12),
    PropertySpec::street("States Avenue", 13, 140, 10, [50, 150, 450, 750], 100, "pink"),
    PropertySpec::street("Virginia Avenue", 14, 160, 12, [60, 180, 500, 900], 100, "pink"),
    PropertySpec::railroad("Pennsylvania Railroad", 15),
    PropertySpec::street("St. James Place", 16, 180, 14, [70, 200, 550, 950], 100, "orange"),
    PropertySpec::street("Tennessee Avenue", 18, 180, 14, [70, 200, 550, 950], 100, "orange"),
    PropertySpec::street("New York Avenue", 19, 200, 16, [80, 220, 600, 1000], 100, "orange"),
    PropertySpec::street("Kentucky Avenue", 21, 220, 18, [90, 250, 700, 1050], 150, "red"),
    PropertySpec::street("Indiana Avenue", 23, 220, 18, [90, 250, 700, 1050], 150, "red"),
    PropertySpec::street("Illinois Avenue", 24, 240, 20, [100, 300, 750, 1100], 150, "red"),
    PropertySpec::railroad("B. & O. Railroad", 25),
    PropertySpec::street("Atlantic Avenue", 26, 260, 22, [110, 330, 800, 1150], 150, "yellow"),
    PropertySpec::street("Ventnor Avenue", 27, 260, 22, [110, 330, 800, 1150], 150, "yellow"),
    PropertySpec::utility("Water Works", 28),
    PropertySpec::street("Marvin Gardens", 29, 280, 24, [120, 360, 850, 1200], 150, "yellow"),
    PropertySpec::street("Pacific Avenue", 31, 300, 26, [130, 390, 900, 1275], 200, "green"),
    PropertySpec::street("North Carolina Avenue", 32, 300, 26, [130, 390, 900, 1275], 200, "green"),
    PropertySpec::street("Pennsylvania Avenue", 34, 320, 28, [150, 450, 1000, 1400], 200, "green"),
    PropertySpec::railroad("Short Line", 35),
    PropertySpec::street("Park Place", 37, 350, 35, [175, 500, 1100, 1500], 200, "dark_blue"),
    PropertySpec::street("Boardwalk", 39, 400, 50, [200, 600, 1400, 2000], 200, "dark_blue"),
];

/// Tile kind for every board position.
pub fn tile_kind(position: u8) -> TileKind {
    match position % BOARD_SIZE {
        0 => TileKind::Go,
        2 | 17 | 33 => TileKind::CommunityChest,
        4 | 38 => TileKind::Tax,
        5 | 15 | 25 | 35 => TileKind::Railroad,
        7 | 22 | 36 => TileKind::Chance,
        10 => TileKind::Jail,
        12 | 28 => TileKind::Utility,
        20 => TileKind::FreeParking,
        30 => TileKind::GoToJail,
        _ => TileKind::Street,
    }
}

/// Materialize the catalog into `Property` rows for a fresh game. Ids are
/// assigned by the caller's store.
pub fn build_properties(mut next_id: impl FnMut() -> u32) -> Vec<Property> {
    PROPERTY_CATALOG
        .iter()
        .map(|spec| Property {
            id: next_id(),
            name: spec.name.to_string(),
            position: spec.position,
            price: spec.price,
            rent: spec.rent,
            rent_tiers: spec.rent_tiers,
            mortgage_value: spec.mortgage_value,
            house_price: spec.house_price,
            color_group: spec.color_group.to_string(),
            owner_id: None,
            is_mortgaged: false,
            houses: 0,
        })
        .collect()
}

/// Materialize the chance and community chest decks for a fresh game.
pub fn build_decks(mut next_id: impl FnMut() -> u32) -> Vec<Card> {
    let chance: [(&str, CardEffect); 8] = [
        ("Advance to Go", CardEffect::Relocate { position: GO_POSITION }),
        ("Advance to Illinois Avenue", CardEffect::Relocate { position: 24 }),
        ("Take a trip to Reading Railroad", CardEffect::Relocate { position: 5 }),
        ("Bank pays you dividend of $50", CardEffect::Collect { amount: 50 }),
        ("Speeding fine $15", CardEffect::Pay { amount: 15 }),
        ("Pay poor tax of $15", CardEffect::Pay { amount: 15 }),
        ("Go directly to Jail", CardEffect::GoToJail),
        ("Get Out of Jail Free", CardEffect::GetOutOfJailFree),
    ];
    let community_chest: [(&str, CardEffect); 8] = [
        ("Advance to Go", CardEffect::Relocate { position: GO_POSITION }),
        ("Bank error in your favor, collect $200", CardEffect::Collect { amount: 200 }),
        ("Doctor's fees, pay $50", CardEffect::Pay { amount: 50 }),
        ("From sale of stock you get $50", CardEffect::Collect { amount: 50 }),
        ("Hospital fees, pay $100", CardEffect::Pay { amount: 100 }),
        ("Income tax refund, collect $20", CardEffect::Collect { amount: 20 }),
        ("Go directly to Jail", CardEffect::GoToJail),
        ("Get Out of Jail Free", CardEffect::GetOutOfJailFree),
    ];

    let mut cards = Vec::with_capacity(chance.len() + community_chest.len());
    for (title, effect) in chance {
        cards.push(Card {
            id: next_id(),
            deck: DeckType::Chance,
            title: title.to_string(),
            effect,
        });
    }
    for (title, effect) in community_chest {
        cards.push(Card {
            id: next_id(),
            deck: DeckType::CommunityChest,
            title: title.to_string(),
            effect,
        });
    }
    cards
}
