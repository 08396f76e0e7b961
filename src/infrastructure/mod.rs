//! Browser-side adapters: console logging, HTTP, local storage, animation
//! frames and the charting library.

pub mod http;
pub mod lightweight_charts;
pub mod scheduler;
pub mod services;
pub mod storage;

pub use http::{ApiClient, ApiConfig, RemoteDrawingStore};
pub use lightweight_charts::{LightweightPane, LightweightPaneFactory};
pub use scheduler::AnimationFrameScheduler;
pub use services::{BrowserTimeProvider, ConsoleLogger};
pub use storage::LocalSettingsStore;
