// Fair Raffle Program - Winner selection
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::RaffleError;

/// 256-bit random value delivered by the oracle, big-endian
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RandomWord(pub [u8; 32]);

impl RandomWord {
    /// Remainder of the full 256-bit value divided by `modulus`, `None`
    /// when `modulus` is zero
    pub fn reduce(&self, modulus: u64) -> Option<u64> {
        if modulus == 0 {
            return None;
        }
        let modulus = modulus as u128;
        let remainder = self
            .0
            .iter()
            .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus);
        Some(remainder as u64)
    }
}

impl From<u64> for RandomWord {
    fn from(value: u64) -> Self {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&value.to_be_bytes());
        RandomWord(word)
    }
}

/// Picks `entries[random mod len]`, returning the index and the entrant
pub fn select_winner(
    random: &RandomWord,
    entries: &[Pubkey],
) -> Result<(usize, Pubkey), RaffleError> {
    let index = random
        .reduce(entries.len() as u64)
        .ok_or(RaffleError::EmptyEntryList)? as usize;
    Ok((index, entries[index]))
}
