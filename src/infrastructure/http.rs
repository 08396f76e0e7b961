use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use gloo::net::http::{Request, Response};
use serde::de::DeserializeOwned;
use wasm_bindgen_futures::spawn_local;

use crate::domain::drawing::{Drawing, DrawingPersistence};
use crate::domain::errors::{AppError, AppResult};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::{DrawingRepository, MarketDataRepository, StockPayload, Symbol, TimeInterval};

/// Remote API location
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    /// History depth requested with every price fetch.
    pub period: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8000/api".to_string(), period: "max".to_string() }
    }
}

impl ApiConfig {
    pub fn stock_url(&self, symbol: &Symbol) -> String {
        format!("{}/stock/{}", self.base_url.trim_end_matches('/'), symbol.value())
    }

    pub fn drawings_url(&self, symbol: &Symbol) -> String {
        format!("{}/drawings/{}", self.base_url.trim_end_matches('/'), symbol.value())
    }
}

/// HTTP клиент дашборда на основе gloo
#[derive(Debug, Clone, Default)]
pub struct ApiClient {
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        if !response.ok() {
            return Err(AppError::NetworkError(format!(
                "HTTP error: {} - {}",
                response.status(),
                response.status_text()
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::ParseError(format!("Failed to parse JSON: {:?}", e)))
    }
}

impl MarketDataRepository for ApiClient {
    fn fetch_stock(&self, symbol: &Symbol, interval: TimeInterval) -> LocalBoxFuture<'static, AppResult<StockPayload>> {
        let url = self.config.stock_url(symbol);
        let period = self.config.period.clone();
        async move {
            get_logger().info(LogComponent::Infrastructure("ApiClient"), &format!("📡 GET {} ({})", url, interval));
            let response = Request::get(&url)
                .query([("period", period.as_str()), ("interval", interval.as_query())])
                .send()
                .await
                .map_err(|e| AppError::NetworkError(format!("Failed to send request: {:?}", e)))?;
            Self::read_json::<StockPayload>(response).await
        }
        .boxed_local()
    }
}

impl DrawingRepository for ApiClient {
    fn load_drawings(&self, symbol: &Symbol) -> LocalBoxFuture<'static, AppResult<Vec<Drawing>>> {
        let url = self.config.drawings_url(symbol);
        async move {
            let response = Request::get(&url)
                .send()
                .await
                .map_err(|e| AppError::NetworkError(format!("Failed to send request: {:?}", e)))?;
            Self::read_json::<Vec<Drawing>>(response).await
        }
        .boxed_local()
    }

    fn save_drawings(&self, symbol: &Symbol, drawings: Vec<Drawing>) -> LocalBoxFuture<'static, AppResult<()>> {
        let url = self.config.drawings_url(symbol);
        async move {
            let response = Request::post(&url)
                .json(&drawings)
                .map_err(|e| AppError::PersistenceError(format!("Failed to encode drawings: {:?}", e)))?
                .send()
                .await
                .map_err(|e| AppError::NetworkError(format!("Failed to send request: {:?}", e)))?;
            if !response.ok() {
                return Err(AppError::PersistenceError(format!("HTTP error: {}", response.status())));
            }
            Ok(())
        }
        .boxed_local()
    }
}

/// Uploads the overlay's list in the background; failures are logged and
/// the in-memory list is kept.
pub struct RemoteDrawingStore {
    repository: Rc<dyn DrawingRepository>,
}

impl RemoteDrawingStore {
    pub fn new(repository: Rc<dyn DrawingRepository>) -> Self {
        Self { repository }
    }
}

impl DrawingPersistence for RemoteDrawingStore {
    fn persist(&self, symbol: &Symbol, drawings: Vec<Drawing>) {
        let count = drawings.len();
        let label = symbol.value().to_string();
        let request = self.repository.save_drawings(symbol, drawings);
        spawn_local(async move {
            match request.await {
                Ok(()) => get_logger().debug(
                    LogComponent::Infrastructure("RemoteDrawingStore"),
                    &format!("💾 Saved {} drawings for {}", count, label),
                ),
                Err(e) => get_logger().warn(
                    LogComponent::Infrastructure("RemoteDrawingStore"),
                    &format!("⚠️ Drawings for {} not saved: {}", label, e),
                ),
            }
        });
    }
}
