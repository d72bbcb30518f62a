// Fair Raffle
// A verifiable lottery on Solana, drawn with oracle-delivered randomness

// Core modules
pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod utils;

// Raffle engine
pub mod config;
pub mod coordinator;
pub mod events;
pub mod ledger;
pub mod selector;
pub mod upkeep;

// Randomness coordinator and subscriptions
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
