// Fair Raffle Program - Events
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, program_error::ProgramError, pubkey::Pubkey};

/// Observations published for indexers and tests
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    Entered {
        participant: Pubkey,
        amount: u64,
        entry_index: u64,
    },
    DrawRequested {
        request_id: u64,
        epoch: u64,
    },
    WinnerPicked {
        winner: Pubkey,
        request_id: u64,
        prize: u64,
        epoch: u64,
    },
}

impl RaffleEvent {
    /// Logs the event readably and as borsh-encoded program data
    pub fn emit(&self) -> Result<(), ProgramError> {
        match self {
            RaffleEvent::Entered {
                participant,
                amount,
                entry_index,
            } => msg!("Entered: {} deposited {} as entry #{}", participant, amount, entry_index),
            RaffleEvent::DrawRequested { request_id, epoch } => {
                msg!("DrawRequested: request {} for epoch {}", request_id, epoch)
            }
            RaffleEvent::WinnerPicked {
                winner,
                request_id,
                prize,
                epoch,
            } => msg!(
                "WinnerPicked: {} won {} lamports (request {}, epoch {})",
                winner,
                prize,
                request_id,
                epoch
            ),
        }
        let data = self
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        sol_log_data(&[&data]);
        Ok(())
    }
}
