//! Pure chart and annotation logic. Nothing here touches the DOM, so every
//! module runs under native tests.

pub mod chart;
pub mod drawing;
pub mod errors;
pub mod events;
pub mod logging;
pub mod market_data;
