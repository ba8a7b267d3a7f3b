//! Error types for the reserve pool and its collaborators

use amm_model::AmmError;
use thiserror::Error;

use crate::ledger::AccountId;

/// Rejection raised by a token or share ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Account balance is short
    #[error("account {account} holds {available}, needs {needed}")]
    InsufficientBalance {
        account: AccountId,
        needed: u128,
        available: u128,
    },

    /// Spender has not been authorized for enough
    #[error("{spender} may move {available} from {owner}, needs {needed}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        needed: u128,
        available: u128,
    },

    /// A balance or supply would exceed u128
    #[error("ledger arithmetic overflow")]
    Overflow,
}

/// Errors surfaced by [`ReservePool`](crate::ReservePool) operations
///
/// Every variant is returned with no partial effect left behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Zero where a positive amount is required
    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),

    /// Liquidity deposit underfunds the quote side
    #[error("insufficient quote amount: required {required}, offered {offered}")]
    InsufficientQuoteAmount { required: u128, offered: u128 },

    /// Withdrawal exceeds the caller's share balance
    #[error("insufficient shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u128, available: u128 },

    /// Swap priced against a zero reserve
    #[error("pool reserve is empty")]
    EmptyReserve,

    /// Operation needs outstanding shares or a funded reserve
    #[error("pool has no liquidity")]
    EmptyPool,

    /// Swap output fell below the caller's minimum
    #[error("slippage exceeded: minimum {minimum}, actual {actual}")]
    SlippageExceeded { minimum: u128, actual: u128 },

    /// A collaborator rejected a transfer
    #[error("transfer failed: {0}")]
    TransferFailed(#[source] LedgerError),

    /// Arithmetic overflow
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),

    /// The pool's own custody account named as caller or recipient
    #[error("custody account {0} cannot act as caller or recipient")]
    CustodyAccount(AccountId),

    /// An operation failed and some of its effects could not be reversed
    #[error("{cause} (rollback incomplete: {failed_steps} step(s) not reversed)")]
    UnwindIncomplete {
        #[source]
        cause: Box<PoolError>,
        failed_steps: usize,
    },
}

impl From<AmmError> for PoolError {
    fn from(err: AmmError) -> Self {
        match err {
            AmmError::EmptyReserve => PoolError::EmptyReserve,
            AmmError::DivisionByZero => PoolError::EmptyPool,
            AmmError::Overflow => PoolError::Overflow("pricing math"),
        }
    }
}

impl From<LedgerError> for PoolError {
    fn from(err: LedgerError) -> Self {
        PoolError::TransferFailed(err)
    }
}

pub type Result<T> = core::result::Result<T, PoolError>;
