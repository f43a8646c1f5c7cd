mod address;
mod asset;
mod balance;
mod network;
mod transaction;

pub use address::{Address, AddressError};
pub use asset::{Asset, TokenInfo, DEFAULT_DECIMALS, GAS_SYMBOL, NEO_SYMBOL};
pub use balance::{AssetBalance, BalanceSheet};
pub use network::Network;
pub use transaction::TransactionRecord;
