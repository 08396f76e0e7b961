use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{AbortHandle, AbortRegistration, Abortable, LocalBoxFuture};

use crate::domain::drawing::AnnotationOverlay;
use crate::domain::errors::AppResult;
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::{
    DrawingRepository, MarketDataIngestionService, MarketDataRepository, MarketSnapshot, Symbol, TimeInterval,
};

/// Slot for the in-flight request of one kind. Starting a request aborts the
/// previous one, so a late response can never land after a newer request.
#[derive(Default)]
pub struct LatestRequest {
    handle: RefCell<Option<AbortHandle>>,
    started: Cell<u64>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the previous request and register a new one.
    pub fn begin(&self) -> AbortRegistration {
        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.handle.replace(Some(handle)) {
            previous.abort();
        }
        self.started.set(self.started.get() + 1);
        registration
    }

    /// Wrap `request` so it resolves to `AppError::Aborted` once superseded.
    pub fn run<T, F>(&self, request: F) -> LocalBoxFuture<'static, AppResult<T>>
    where
        F: Future<Output = AppResult<T>> + 'static,
        T: 'static,
    {
        let registration = self.begin();
        async move {
            match Abortable::new(request, registration).await {
                Ok(result) => result,
                Err(aborted) => Err(aborted.into()),
            }
        }
        .boxed_local()
    }

    pub fn cancel(&self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Number of requests started through this slot.
    pub fn started(&self) -> u64 {
        self.started.get()
    }
}

impl Drop for LatestRequest {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Use Case: загрузка котировок и индикаторов для инструмента
pub struct LoadMarketDataUseCase {
    repository: Rc<dyn MarketDataRepository>,
    latest: LatestRequest,
}

impl LoadMarketDataUseCase {
    pub fn new(repository: Rc<dyn MarketDataRepository>) -> Self {
        Self { repository, latest: LatestRequest::new() }
    }

    /// Fetch and normalise. A newer call aborts this one.
    pub fn execute(&self, symbol: &Symbol, interval: TimeInterval) -> LocalBoxFuture<'static, AppResult<MarketSnapshot>> {
        let symbol = symbol.normalized();
        get_logger().info(
            LogComponent::Application("LoadMarketData"),
            &format!("📡 Loading {} {}", symbol.value(), interval),
        );
        let request = self.latest.run(self.repository.fetch_stock(&symbol, interval));
        async move {
            let payload = request.await?;
            let snapshot = MarketDataIngestionService::new(interval).ingest(payload);
            get_logger().info(
                LogComponent::Application("LoadMarketData"),
                &format!("✅ {} candles for {}", snapshot.candles.len(), symbol.value()),
            );
            Ok(snapshot)
        }
        .boxed_local()
    }

    pub fn cancel(&self) {
        self.latest.cancel();
    }
}

/// Use Case: replace the overlay's drawings with the stored list of a symbol
pub struct LoadDrawingsUseCase {
    repository: Rc<dyn DrawingRepository>,
}

impl LoadDrawingsUseCase {
    pub fn new(repository: Rc<dyn DrawingRepository>) -> Self {
        Self { repository }
    }

    /// Clears the overlay right away; the future installs the loaded list
    /// unless another load started meanwhile. Resolves to whether it did.
    pub fn execute(&self, overlay: &Rc<RefCell<AnnotationOverlay>>, symbol: &Symbol) -> LocalBoxFuture<'static, bool> {
        let ticket = overlay.borrow_mut().begin_load(symbol.clone());
        let request = self.repository.load_drawings(symbol);
        let overlay = Rc::clone(overlay);
        async move {
            let result = request.await;
            overlay.borrow_mut().finish_load(ticket, result)
        }
        .boxed_local()
    }
}
