//! HTTP transport over the game manager. Handlers are thin: extract the
//! caller from the `x-user-id` header, call one manager operation, map the
//! result to JSON or a status code derived from the error kind.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::entities::{DeckType, PlayerId, PropertyId, TradeItem};
use crate::errors::{EngineError, ErrorKind};
use crate::manager::GameManager;

pub type SharedState = Arc<GameManager>;

/// Engine failure carried to the wire.
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Precondition | ErrorKind::InsufficientFunds | ErrorKind::InvalidState => {
                StatusCode::BAD_REQUEST
            }
        };
        log::debug!("request failed: {}", self.0);
        let body = json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Caller identity, issued by the auth layer in front of this service.
fn actor(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ApiError(EngineError::forbidden("missing x-user-id header")))
}

#[derive(Debug, Deserialize)]
struct CreateGameRequest {
    name: String,
    max_players: usize,
}

#[derive(Debug, Serialize)]
struct CreateGameResponse {
    game_id: String,
    player_id: PlayerId,
}

#[derive(Debug, Deserialize)]
struct JoinRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PlayerAction {
    player_id: PlayerId,
}

#[derive(Debug, Deserialize)]
struct DrawCardRequest {
    player_id: PlayerId,
    deck: DeckType,
}

#[derive(Debug, Deserialize)]
struct ProposeTradeRequest {
    sender_id: PlayerId,
    receiver_id: PlayerId,
    items: Vec<TradeItem>,
}

#[derive(Debug, Deserialize)]
struct StartAuctionRequest {
    property_id: PropertyId,
    starting_bid: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BidRequest {
    player_id: PlayerId,
    amount: i64,
}

async fn health() -> &'static str {
    "ok"
}

async fn create_game(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<CreateGameRequest>,
) -> ApiResult<CreateGameResponse> {
    let user = actor(&headers)?;
    let (game_id, player_id) = state.create_game(&user, &req.name, req.max_players)?;
    Ok(Json(CreateGameResponse { game_id, player_id }))
}

async fn list_games(State(state): State<SharedState>) -> ApiResult<impl Serialize> {
    Ok(Json(state.list_games()?))
}

async fn get_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> ApiResult<impl Serialize> {
    Ok(Json(state.game_view(&game_id)?))
}

async fn get_history(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> ApiResult<impl Serialize> {
    Ok(Json(state.history_view(&game_id)?))
}

async fn get_user(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl Serialize> {
    Ok(Json(state.user_profile(&user_id)?))
}

async fn get_user_history(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl Serialize> {
    Ok(Json(state.user_history(&user_id)?))
}

async fn join_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<JoinRequest>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    let player_id = state.join_game(&game_id, &user, &req.name)?;
    Ok(Json(json!({ "player_id": player_id })))
}

async fn start_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.start_game(&game_id, &user)?;
    Ok(Json(state.game_view(&game_id)?))
}

async fn roll(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PlayerAction>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    Ok(Json(state.roll(&game_id, &user, req.player_id)?))
}

async fn draw_card(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<DrawCardRequest>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    Ok(Json(state.draw_card(&game_id, &user, req.player_id, req.deck)?))
}

async fn pay_rent(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PlayerAction>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    Ok(Json(state.pay_rent(&game_id, &user, req.player_id)?))
}

async fn pay_jail_fine(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PlayerAction>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.pay_jail_fine(&game_id, &user, req.player_id)?;
    Ok(Json(json!({ "released": true })))
}

async fn use_jail_card(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PlayerAction>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.use_jail_card(&game_id, &user, req.player_id)?;
    Ok(Json(json!({ "released": true })))
}

async fn buy_property(
    State(state): State<SharedState>,
    Path((game_id, property_id)): Path<(String, PropertyId)>,
    headers: HeaderMap,
    Json(req): Json<PlayerAction>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.buy_property(&game_id, &user, req.player_id, property_id)?;
    Ok(Json(json!({ "property_id": property_id, "owner_id": req.player_id })))
}

async fn mortgage_property(
    State(state): State<SharedState>,
    Path((game_id, property_id)): Path<(String, PropertyId)>,
    headers: HeaderMap,
    Json(req): Json<PlayerAction>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.mortgage_property(&game_id, &user, req.player_id, property_id)?;
    Ok(Json(json!({ "property_id": property_id, "is_mortgaged": true })))
}

async fn unmortgage_property(
    State(state): State<SharedState>,
    Path((game_id, property_id)): Path<(String, PropertyId)>,
    headers: HeaderMap,
    Json(req): Json<PlayerAction>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.unmortgage_property(&game_id, &user, req.player_id, property_id)?;
    Ok(Json(json!({ "property_id": property_id, "is_mortgaged": false })))
}

async fn build_house(
    State(state): State<SharedState>,
    Path((game_id, property_id)): Path<(String, PropertyId)>,
    headers: HeaderMap,
    Json(req): Json<PlayerAction>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.build_house(&game_id, &user, req.player_id, property_id)?;
    Ok(Json(json!({ "property_id": property_id })))
}

async fn sell_house(
    State(state): State<SharedState>,
    Path((game_id, property_id)): Path<(String, PropertyId)>,
    headers: HeaderMap,
    Json(req): Json<PlayerAction>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.sell_house(&game_id, &user, req.player_id, property_id)?;
    Ok(Json(json!({ "property_id": property_id })))
}

async fn propose_trade(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ProposeTradeRequest>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    let trade_id =
        state.propose_trade(&game_id, &user, req.sender_id, req.receiver_id, req.items)?;
    Ok(Json(json!({ "trade_id": trade_id })))
}

async fn accept_trade(
    State(state): State<SharedState>,
    Path((game_id, trade_id)): Path<(String, u32)>,
    headers: HeaderMap,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.accept_trade(&game_id, &user, trade_id)?;
    Ok(Json(json!({ "trade_id": trade_id, "status": "accepted" })))
}

async fn reject_trade(
    State(state): State<SharedState>,
    Path((game_id, trade_id)): Path<(String, u32)>,
    headers: HeaderMap,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.reject_trade(&game_id, &user, trade_id)?;
    Ok(Json(json!({ "trade_id": trade_id, "status": "rejected" })))
}

async fn start_auction(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Json(req): Json<StartAuctionRequest>,
) -> ApiResult<impl Serialize> {
    let auction_id = state.start_auction(&game_id, req.property_id, req.starting_bid)?;
    Ok(Json(json!({ "auction_id": auction_id })))
}

async fn bid(
    State(state): State<SharedState>,
    Path((game_id, auction_id)): Path<(String, u32)>,
    headers: HeaderMap,
    Json(req): Json<BidRequest>,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    state.bid(&game_id, &user, auction_id, req.player_id, req.amount)?;
    Ok(Json(json!({ "auction_id": auction_id, "current_bid": req.amount })))
}

async fn end_auction(
    State(state): State<SharedState>,
    Path((game_id, auction_id)): Path<(String, u32)>,
) -> ApiResult<impl Serialize> {
    let winner = state.end_auction(&game_id, auction_id)?;
    Ok(Json(json!({ "auction_id": auction_id, "winner_id": winner })))
}

async fn declare_bankruptcy(
    State(state): State<SharedState>,
    Path((game_id, player_id)): Path<(String, PlayerId)>,
    headers: HeaderMap,
) -> ApiResult<impl Serialize> {
    let user = actor(&headers)?;
    let result = state.declare_bankruptcy(&game_id, &user, player_id)?;
    Ok(Json(json!({ "player_id": player_id, "game_result": result })))
}

async fn end_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
) -> ApiResult<impl Serialize> {
    Ok(Json(state.end_game(&game_id)?))
}

/// The full application router.
pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/", get(health))
        .route("/games", post(create_game).get(list_games))
        .route("/games/{game_id}", get(get_game))
        .route("/games/{game_id}/join", post(join_game))
        .route("/games/{game_id}/start", post(start_game))
        .route("/games/{game_id}/roll", post(roll))
        .route("/games/{game_id}/cards/draw", post(draw_card))
        .route("/games/{game_id}/rent/pay", post(pay_rent))
        .route("/games/{game_id}/jail/pay", post(pay_jail_fine))
        .route("/games/{game_id}/jail/card", post(use_jail_card))
        .route("/games/{game_id}/properties/{property_id}/buy", post(buy_property))
        .route(
            "/games/{game_id}/properties/{property_id}/mortgage",
            post(mortgage_property),
        )
        .route(
            "/games/{game_id}/properties/{property_id}/unmortgage",
            post(unmortgage_property),
        )
        .route("/games/{game_id}/properties/{property_id}/build", post(build_house))
        .route(
            "/games/{game_id}/properties/{property_id}/sell_house",
            post(sell_house),
        )
        .route("/games/{game_id}/trades", post(propose_trade))
        .route("/games/{game_id}/trades/{trade_id}/accept", post(accept_trade))
        .route("/games/{game_id}/trades/{trade_id}/reject", post(reject_trade))
        .route("/games/{game_id}/auctions", post(start_auction))
        .route("/games/{game_id}/auctions/{auction_id}/bid", post(bid))
        .route("/games/{game_id}/auctions/{auction_id}/end", post(end_auction))
        .route(
            "/games/{game_id}/players/{player_id}/bankrupt",
            post(declare_bankruptcy),
        )
        .route("/games/{game_id}/end", post(end_game))
        .route("/games/{game_id}/history", get(get_history))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/history", get(get_user_history))
        .with_state(state)
        .layer(cors)
}
