use std::num::NonZeroUsize;
use std::sync::Arc;

use actix_web::{web, App, HttpServer, middleware};
use chrono::{DateTime, Utc};
use log::info;
use lru::LruCache;
use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::web::handlers;
use crate::web::model::{Prediction, SpamModel};

/// Shared application state for web handlers
pub struct AppState {
    pub model: Arc<SpamModel>,
    /// Recent predictions by message; `None` when caching is off
    pub cache: Option<Mutex<LruCache<String, Prediction>>>,
    pub cache_capacity: usize,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(model: Arc<SpamModel>, cache_capacity: usize) -> Self {
        Self {
            model,
            cache: NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            cache_capacity,
            started_at: Utc::now(),
        }
    }
}

/// Route table, shared by the server and the handler tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::predict::predict))
        .route("/status", web::get().to(handlers::system::get_status));
}

/// Train the model, then serve predictions until shut down
pub async fn start_web_server(config: ServerConfig) -> std::io::Result<()> {
    let model = SpamModel::train(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let app_state = web::Data::new(AppState::new(Arc::new(model), config.cache_capacity));

    let address = config.bind_address();
    info!("Starting web server on http://{}", address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure)
    })
    .bind(address)?
    .run()
    .await
}
