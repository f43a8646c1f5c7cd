//! Balance aggregation and the derived wallet view.

mod aggregator;
mod display;

pub use aggregator::{
    BalanceAggregator, RefreshOutcome, WatchSummary, MIN_WATCH_INTERVAL, REFRESH_SUCCESS_MESSAGE,
};
pub use display::{compute_display_model, AssetValue, DisplayModel};
