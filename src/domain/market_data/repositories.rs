use crate::domain::drawing::Drawing;
use crate::domain::errors::AppResult;
use crate::domain::market_data::{StockPayload, Symbol, TimeInterval};
use futures::future::LocalBoxFuture;

/// Интерфейс для получения рыночных данных
pub trait MarketDataRepository {
    /// Price rows with precomputed indicators for one instrument.
    fn fetch_stock(&self, symbol: &Symbol, interval: TimeInterval) -> LocalBoxFuture<'static, AppResult<StockPayload>>;
}

/// Интерфейс для хранения пользовательских рисунков.
/// Saves replace the whole list for the symbol.
pub trait DrawingRepository {
    fn load_drawings(&self, symbol: &Symbol) -> LocalBoxFuture<'static, AppResult<Vec<Drawing>>>;

    fn save_drawings(&self, symbol: &Symbol, drawings: Vec<Drawing>) -> LocalBoxFuture<'static, AppResult<()>>;
}
