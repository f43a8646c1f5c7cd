pub mod coinmarketcap;
pub mod frankfurter;

pub use coinmarketcap::{CoinMarketCapTicker, COINMARKETCAP_BASE_URL};
pub use frankfurter::{FrankfurterRateSource, FRANKFURTER_BASE_URL};
