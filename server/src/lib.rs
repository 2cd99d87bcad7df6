use axum::{
    body::Bytes,
    extract::{ws::WebSocketUpgrade, State as AxumState},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use casedrop_engine::{Layer, Memory, RngSecret, State};
use casedrop_types::{
    Case, CatalogSnapshot, Event, Key, Output, Pending, Player, PromoCode, RewardKind,
    RewardTableEntry, Submission, Transaction, Update, UpdatesFilter, Value,
};
use commonware_codec::{DecodeExt, Encode};
use commonware_cryptography::{
    ed25519::{Batch, PublicKey},
    BatchVerifier,
};
use commonware_utils::from_hex;
use futures::{SinkExt, StreamExt};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::{broadcast, RwLock};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{Any, CorsLayer};

/// The storefront authority: executes signed transactions against in-memory
/// state and broadcasts resulting events to subscribers.
pub struct Storefront {
    secret: RngSecret,
    state: RwLock<Memory>,
    update_tx: broadcast::Sender<Vec<Event>>,
    mempool_tx: broadcast::Sender<Pending>,
}

impl Storefront {
    pub fn new(secret: RngSecret) -> Self {
        let (update_tx, _) = broadcast::channel(1024);
        let (mempool_tx, _) = broadcast::channel(1024);

        Self {
            secret,
            state: RwLock::new(Memory::default()),
            update_tx,
            mempool_tx,
        }
    }

    /// Seed the genesis state: the operator account and the launch catalog.
    ///
    /// The admin role can only be granted by an existing admin, so the first
    /// one is written directly.
    pub async fn bootstrap(&self, admin: PublicKey, catalog: Vec<Case>) {
        let mut state = self.state.write().await;

        let mut operator = Player::new("operator".to_string());
        operator.is_admin = true;
        state
            .insert(Key::Player(admin), Value::Player(operator))
            .await;

        let ids = catalog.iter().map(|case| case.id).collect();
        state.insert(Key::Catalog, Value::Catalog(ids)).await;
        for case in catalog {
            state.insert(Key::Case(case.id), Value::Case(case)).await;
        }
    }

    /// Seed a promo code.
    pub async fn seed_promo(&self, promo: PromoCode) {
        let mut state = self.state.write().await;
        state
            .insert(Key::Promo(promo.code.clone()), Value::Promo(promo))
            .await;
    }

    /// Verify, announce, and execute a batch of transactions.
    ///
    /// Execution is synchronous: once this returns, queries reflect the
    /// batch. Returns the events the batch produced.
    pub async fn submit_transactions(&self, transactions: Vec<Transaction>) -> Vec<Event> {
        // Batch verify signatures; only when the batch fails do we fall back
        // to checking each transaction, so one bad signature drops that
        // transaction rather than the whole submission.
        let mut batcher = Batch::new();
        for tx in &transactions {
            tx.verify_batch(&mut batcher);
        }
        let accepted: Vec<Transaction> = if batcher.verify(&mut rand::rngs::OsRng) {
            transactions
        } else {
            transactions
                .into_iter()
                .filter(|tx| {
                    let valid = tx.verify();
                    if !valid {
                        tracing::warn!(public = ?tx.public, nonce = tx.nonce, "dropping transaction with invalid signature");
                    }
                    valid
                })
                .collect()
        };
        if accepted.is_empty() {
            return Vec::new();
        }

        if let Err(e) = self.mempool_tx.send(Pending {
            transactions: accepted.clone(),
        }) {
            tracing::debug!("No mempool subscribers: {}", e);
        }

        let events = {
            let mut state = self.state.write().await;
            let mut layer = Layer::new(&*state, self.secret.clone(), current_time());
            let (outputs, _) = layer.execute(accepted).await;
            let changes = layer.commit();
            state.apply(changes).await;

            outputs
                .into_iter()
                .filter_map(|output| match output {
                    Output::Event(event) => Some(event),
                    Output::Transaction(_) => None,
                })
                .collect::<Vec<_>>()
        };

        if !events.is_empty() {
            if let Err(e) = self.update_tx.send(events.clone()) {
                tracing::debug!("No update subscribers: {}", e);
            }
        }
        events
    }

    pub async fn query_player(&self, public: &PublicKey) -> Option<Player> {
        let state = self.state.read().await;
        match state.get(&Key::Player(public.clone())).await {
            Some(Value::Player(player)) => Some(player),
            _ => None,
        }
    }

    pub async fn query_case(&self, case_id: u64) -> Option<Case> {
        let state = self.state.read().await;
        match state.get(&Key::Case(case_id)).await {
            Some(Value::Case(case)) => Some(case),
            _ => None,
        }
    }

    pub async fn query_session(&self, session_id: u64) -> Option<casedrop_types::OpeningSession> {
        let state = self.state.read().await;
        match state.get(&Key::Session(session_id)).await {
            Some(Value::Session(session)) => Some(session),
            _ => None,
        }
    }

    pub async fn query_catalog(&self) -> CatalogSnapshot {
        let state = self.state.read().await;
        let ids = match state.get(&Key::Catalog).await {
            Some(Value::Catalog(ids)) => ids,
            _ => Vec::new(),
        };

        let mut cases = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(Value::Case(case)) = state.get(&Key::Case(id)).await {
                cases.push(case);
            }
        }
        CatalogSnapshot { cases }
    }

    pub fn update_subscriber(&self) -> broadcast::Receiver<Vec<Event>> {
        self.update_tx.subscribe()
    }

    pub fn mempool_subscriber(&self) -> broadcast::Receiver<Pending> {
        self.mempool_tx.subscribe()
    }
}

fn current_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// The launch catalog.
pub fn starter_catalog() -> Vec<Case> {
    let skin = |id, weight, name: &str, image: &str, value| RewardTableEntry {
        id,
        kind: RewardKind::Skin,
        weight,
        never_drop: false,
        display_name: name.to_string(),
        image_ref: image.to_string(),
        value,
    };
    let coins = |id, weight, name: &str, value| RewardTableEntry {
        id,
        kind: RewardKind::CoinBundle,
        weight,
        never_drop: false,
        display_name: name.to_string(),
        image_ref: "bundles/coins.png".to_string(),
        value,
    };

    vec![
        Case {
            id: 1,
            name: "Starter Crate".to_string(),
            price: 0,
            image_ref: "cases/starter.png".to_string(),
            is_free: true,
            entries: vec![
                coins(101, 700, "Pocket Change", 25),
                skin(102, 250, "P250 | Sand Dune", "skins/p250_sand_dune.png", 40),
                skin(103, 50, "Glock-18 | Candy Apple", "skins/glock_candy.png", 180),
            ],
        },
        Case {
            id: 2,
            name: "Breakout Case".to_string(),
            price: 250,
            image_ref: "cases/breakout.png".to_string(),
            is_free: false,
            entries: vec![
                skin(201, 600, "MP7 | Urban Hazard", "skins/mp7_urban.png", 90),
                skin(202, 300, "USP-S | Cyrex", "skins/usp_cyrex.png", 320),
                skin(203, 90, "M4A1-S | Guardian", "skins/m4a1_guardian.png", 900),
                skin(204, 10, "Butterfly Knife | Fade", "skins/butterfly_fade.png", 12_000),
            ],
        },
        Case {
            id: 3,
            name: "Phoenix Case".to_string(),
            price: 600,
            image_ref: "cases/phoenix.png".to_string(),
            is_free: false,
            entries: vec![
                skin(301, 550, "UMP-45 | Corporal", "skins/ump_corporal.png", 200),
                coins(302, 250, "Coin Stash", 450),
                skin(303, 170, "AK-47 | Redline", "skins/ak47_redline.png", 1_500),
                skin(304, 30, "AWP | Asiimov", "skins/awp_asiimov.png", 6_500),
            ],
        },
    ]
}

pub struct Api {
    storefront: Arc<Storefront>,
}

impl Api {
    pub fn new(storefront: Arc<Storefront>) -> Self {
        Self { storefront }
    }

    pub fn router(&self) -> Router {
        // Configure CORS
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        // Configure rate limiting
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_millisecond(10)
                .burst_size(1_000)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .unwrap(),
        );

        Router::new()
            .route("/submit", post(submit))
            .route("/player/:public", get(query_player))
            .route("/case/:id", get(query_case))
            .route("/session/:id", get(query_session))
            .route("/catalog", get(query_catalog))
            .route("/updates/:filter", get(updates_ws))
            .route("/mempool", get(mempool_ws))
            .layer(cors)
            .layer(GovernorLayer {
                config: governor_conf,
            })
            .with_state(self.storefront.clone())
    }
}

async fn submit(
    AxumState(storefront): AxumState<Arc<Storefront>>,
    body: Bytes,
) -> impl IntoResponse {
    let submission = match Submission::decode(&mut body.as_ref()) {
        Ok(submission) => submission,
        Err(_) => return StatusCode::BAD_REQUEST,
    };

    match submission {
        Submission::Transactions(txs) => {
            storefront.submit_transactions(txs).await;
            StatusCode::OK
        }
    }
}

async fn query_player(
    AxumState(storefront): AxumState<Arc<Storefront>>,
    axum::extract::Path(public): axum::extract::Path<String>,
) -> impl IntoResponse {
    let raw = match from_hex(&public) {
        Some(raw) => raw,
        None => return StatusCode::BAD_REQUEST.into_response(),
    };
    let public = match PublicKey::decode(&mut raw.as_slice()) {
        Ok(public) => public,
        Err(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    match storefront.query_player(&public).await {
        Some(player) => (StatusCode::OK, player.encode().to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, vec![]).into_response(),
    }
}

async fn query_case(
    AxumState(storefront): AxumState<Arc<Storefront>>,
    axum::extract::Path(id): axum::extract::Path<u64>,
) -> impl IntoResponse {
    match storefront.query_case(id).await {
        Some(case) => (StatusCode::OK, case.encode().to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, vec![]).into_response(),
    }
}

async fn query_session(
    AxumState(storefront): AxumState<Arc<Storefront>>,
    axum::extract::Path(id): axum::extract::Path<u64>,
) -> impl IntoResponse {
    match storefront.query_session(id).await {
        Some(session) => (StatusCode::OK, session.encode().to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, vec![]).into_response(),
    }
}

async fn query_catalog(AxumState(storefront): AxumState<Arc<Storefront>>) -> impl IntoResponse {
    let snapshot = storefront.query_catalog().await;
    (StatusCode::OK, snapshot.encode().to_vec()).into_response()
}

async fn updates_ws(
    AxumState(storefront): AxumState<Arc<Storefront>>,
    axum::extract::Path(filter): axum::extract::Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_updates_ws(socket, storefront, filter))
}

async fn mempool_ws(
    AxumState(storefront): AxumState<Arc<Storefront>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_mempool_ws(socket, storefront))
}

async fn handle_updates_ws(
    socket: axum::extract::ws::WebSocket,
    storefront: Arc<Storefront>,
    filter: String,
) {
    tracing::info!("Updates WebSocket connected, filter: {}", filter);
    let (mut sender, mut receiver) = socket.split();
    let mut updates = storefront.update_subscriber();

    // Parse filter from URL path using UpdatesFilter
    let filter = match from_hex(&filter) {
        Some(filter) => filter,
        None => {
            tracing::warn!("Failed to parse filter hex");
            let _ = sender.close().await;
            return;
        }
    };
    let subscription = match UpdatesFilter::decode(&mut filter.as_slice()) {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::warn!("Failed to decode UpdatesFilter: {:?}", e);
            let _ = sender.close().await;
            return;
        }
    };
    tracing::debug!("UpdatesFilter parsed successfully: {:?}", subscription);

    loop {
        tokio::select! {
            // Handle incoming WebSocket messages (ping/pong/close)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(axum::extract::ws::Message::Close(_))) => {
                        tracing::info!("Client closed WebSocket connection");
                        break;
                    }
                    Some(Ok(axum::extract::ws::Message::Ping(data))) => {
                        if sender.send(axum::extract::ws::Message::Pong(data)).await.is_err() {
                            tracing::warn!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket error: {:?}", e);
                        break;
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        break;
                    }
                    _ => {} // Ignore other message types
                }
            }
            // Handle broadcast updates
            update_result = updates.recv() => {
                match update_result {
                    Ok(events) => {
                        let relevant: Vec<Event> = events
                            .into_iter()
                            .filter(|event| subscription.matches(event))
                            .collect();
                        if relevant.is_empty() {
                            continue;
                        }

                        let update = Update::Events(relevant);
                        if sender
                            .send(axum::extract::ws::Message::Binary(update.encode().to_vec()))
                            .await
                            .is_err()
                        {
                            tracing::warn!("Failed to send update, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "WebSocket client lagged behind, skipped {} messages. Consider increasing buffer size.",
                            skipped
                        );
                        // Continue receiving - client may catch up
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Broadcast channel closed");
                        break;
                    }
                }
            }
        }
    }
    tracing::info!("Updates WebSocket handler exiting");
    let _ = sender.close().await;
}

async fn handle_mempool_ws(socket: axum::extract::ws::WebSocket, storefront: Arc<Storefront>) {
    tracing::info!("Mempool WebSocket connected");
    let (mut sender, mut receiver) = socket.split();
    let mut txs = storefront.mempool_subscriber();

    loop {
        tokio::select! {
            // Handle incoming WebSocket messages (ping/pong/close)
            msg = receiver.next() => {
                match msg {
                    Some(Ok(axum::extract::ws::Message::Close(_))) => {
                        tracing::info!("Client closed mempool WebSocket connection");
                        break;
                    }
                    Some(Ok(axum::extract::ws::Message::Ping(data))) => {
                        if sender.send(axum::extract::ws::Message::Pong(data)).await.is_err() {
                            tracing::warn!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Mempool WebSocket error: {:?}", e);
                        break;
                    }
                    None => {
                        tracing::info!("Mempool WebSocket stream ended");
                        break;
                    }
                    _ => {} // Ignore other message types
                }
            }
            // Handle broadcast transactions
            tx_result = txs.recv() => {
                match tx_result {
                    Ok(tx) => {
                        if sender
                            .send(axum::extract::ws::Message::Binary(tx.encode().to_vec()))
                            .await
                            .is_err()
                        {
                            tracing::warn!("Failed to send mempool update, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "Mempool WebSocket client lagged behind, skipped {} messages. Consider increasing buffer size.",
                            skipped
                        );
                        // Continue receiving - client may catch up
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Mempool broadcast channel closed");
                        break;
                    }
                }
            }
        }
    }
    tracing::info!("Mempool WebSocket handler exiting");
    let _ = sender.close().await;
}
