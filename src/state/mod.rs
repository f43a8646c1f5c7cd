//! Wallet state: a closed set of actions, a pure reducer and a store that
//! publishes each applied action to subscribers.

mod action;
mod reducer;
mod store;

pub use action::{Action, LoadedBalances};
pub use reducer::{reduce, RefreshState, WalletState};
pub use store::WalletStore;
