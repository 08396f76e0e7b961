//! Market data aggregate containing entities, services and value objects.

pub mod entities;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use repositories::{DrawingRepository, MarketDataRepository};
pub use services::{MarketDataIngestionService, StockPayload};
pub use value_objects::*;
