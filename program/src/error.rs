// Fair Raffle Program - Errors
use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction")]
    InvalidInstruction,

    #[error("Account already initialized")]
    AlreadyInitialized,

    #[error("Account not initialized")]
    NotInitialized,

    /// Configuration rejected at initialization
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// Entry amount below the entrance fee
    #[error("Amount is below the entrance fee")]
    InsufficientFee,

    /// Entry attempted while a draw is being calculated
    #[error("Raffle is not open")]
    NotOpen,

    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment for a request id that is not the pending one
    #[error("Unknown randomness request")]
    UnknownRequest,

    #[error("No entries to select a winner from")]
    EmptyEntryList,

    /// The winner could not receive the pool
    #[error("Prize transfer failed")]
    TransferFailed,

    #[error("Only the coordinator's oracle can fulfill requests")]
    OnlyCoordinatorCanFulfill,

    #[error("Subscription does not match the raffle")]
    InvalidSubscription,

    #[error("Subscription balance does not cover the request fee")]
    InsufficientSubscriptionBalance,

    /// Winner account supplied does not hold the selected entry
    #[error("Winner account does not match the selected entry")]
    WinnerAccountMismatch,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
