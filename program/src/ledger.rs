// Fair Raffle Program - Entry ledger
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::RaffleError;

/// Participants of the current epoch and the pool they funded.
///
/// A participant may appear several times; each entry is one chance.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryLedger {
    entries: Vec<Pubkey>,
    pool: u64,
}

impl EntryLedger {
    /// Appends an entry and returns its index
    pub fn append(&mut self, participant: Pubkey, amount: u64) -> Result<usize, RaffleError> {
        let pool = self
            .pool
            .checked_add(amount)
            .ok_or(RaffleError::ArithmeticOverflow)?;
        self.entries.push(participant);
        self.pool = pool;
        Ok(self.entries.len() - 1)
    }

    /// Empties the ledger, returning the pool it held
    pub fn reset(&mut self) -> u64 {
        self.entries.clear();
        std::mem::take(&mut self.pool)
    }

    pub fn entries(&self) -> &[Pubkey] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Pubkey> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pool(&self) -> u64 {
        self.pool
    }
}
