// Fair Raffle Program - Utility Functions
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::invoke_signed,
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    config::{COORDINATOR_SEED, RAFFLE_SEED, SUBSCRIPTION_SEED},
    error::RaffleError,
    state::PrizeTransfer,
};

/// Find the program derived address of the coordinator
pub fn find_coordinator_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COORDINATOR_SEED], program_id)
}

/// Find the program derived address of a subscription
pub fn find_subscription_address(program_id: &Pubkey, subscription_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[SUBSCRIPTION_SEED, &subscription_id.to_le_bytes()],
        program_id,
    )
}

/// Find the program derived address of the raffle created by `authority`
pub fn find_raffle_address(program_id: &Pubkey, authority: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED, authority.as_ref()], program_id)
}

/// Creates a rent-exempt PDA owned by this program, funded by `payer`
pub fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    new_account: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    program_id: &Pubkey,
    space: usize,
    signer_seeds: &[&[u8]],
) -> ProgramResult {
    let rent = Rent::get()?;
    invoke_signed(
        &system_instruction::create_account(
            payer.key,
            new_account.key,
            rent.minimum_balance(space),
            space as u64,
            program_id,
        ),
        &[payer.clone(), new_account.clone(), system_program.clone()],
        &[signer_seeds],
    )
}

/// Moves lamports out of a program-owned account
pub fn transfer_lamports(from: &AccountInfo, to: &AccountInfo, amount: u64) -> ProgramResult {
    let from_balance = from
        .lamports()
        .checked_sub(amount)
        .ok_or(ProgramError::InsufficientFunds)?;
    let to_balance = to
        .lamports()
        .checked_add(amount)
        .ok_or(RaffleError::ArithmeticOverflow)?;

    **from.try_borrow_mut_lamports()? = from_balance;
    **to.try_borrow_mut_lamports()? = to_balance;
    Ok(())
}

/// Pays the pool out of the raffle account into the winner's account
pub struct LamportPayout<'a, 'b> {
    pub raffle_info: &'a AccountInfo<'b>,
    pub winner_info: &'a AccountInfo<'b>,
}

impl<'a, 'b> PrizeTransfer for LamportPayout<'a, 'b> {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        if self.winner_info.key != winner {
            msg!(
                "Winner account {} does not match selected entrant {}",
                self.winner_info.key,
                winner
            );
            return Err(RaffleError::WinnerAccountMismatch.into());
        }
        if !self.winner_info.is_writable {
            msg!("Winner account {} cannot receive lamports", winner);
            return Err(RaffleError::TransferFailed.into());
        }

        transfer_lamports(self.raffle_info, self.winner_info, amount).map_err(|err| {
            msg!("Prize transfer of {} lamports failed: {:?}", amount, err);
            ProgramError::from(RaffleError::TransferFailed)
        })
    }
}
