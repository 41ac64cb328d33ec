//! Outbound transfer requests.

use serde::{Deserialize, Serialize};

use crate::{Account, Coin};

/// One drip: `amount` of the grant denom sent from the funding account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub recipient: Account,
    /// Micro-denominated amount.
    pub amount: u64,
    pub fee: Vec<Coin>,
}
