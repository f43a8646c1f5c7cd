use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry of an address's transaction history.
///
/// Deltas are signed: negative when the asset left the address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub txid: String,
    pub block_index: u64,
    pub neo_delta: Decimal,
    pub gas_delta: Decimal,
}

impl TransactionRecord {
    /// True when the transaction moved NEO (as opposed to a GAS-only transfer
    /// or claim).
    pub fn moves_neo(&self) -> bool {
        !self.neo_delta.is_zero()
    }
}
