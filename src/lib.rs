//! Wallet balance aggregation: NEO, GAS and token balances valued in a
//! display currency.

pub mod chain;
pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod format;
pub mod models;
pub mod notifications;
pub mod prices;
pub mod settings;
pub mod state;
pub mod wallet;
