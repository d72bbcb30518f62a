// Fair Raffle Program - Configuration
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

use crate::error::RaffleError;

/// Seed of the coordinator PDA
pub const COORDINATOR_SEED: &[u8] = b"coordinator";
/// Seed prefix of subscription PDAs
pub const SUBSCRIPTION_SEED: &[u8] = b"subscription";
/// Seed prefix of raffle PDAs
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;
/// Bounds the coordinator accepts for request confirmations
pub const MIN_REQUEST_CONFIRMATIONS: u16 = 3;
pub const MAX_REQUEST_CONFIRMATIONS: u16 = 200;

/// Immutable parameters of one raffle instance
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum deposit in lamports for one entry
    pub entrance_fee: u64,
    /// Seconds that must elapse between draws
    pub interval: i64,
    /// Coordinator account that serves draw requests
    pub coordinator: Pubkey,
    /// Oracle key hash (gas lane) selecting the proving key
    pub key_hash: [u8; 32],
    /// Subscription paying for draw requests
    pub subscription_id: u64,
    pub request_confirmations: u16,
    /// Compute units the oracle must budget for the fulfillment transaction
    pub callback_compute_limit: u32,
}

impl RaffleConfig {
    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entrance_fee == 0 {
            msg!("Entrance fee must be greater than zero");
            return Err(RaffleError::InvalidConfig);
        }
        if self.interval <= 0 {
            msg!("Interval must be positive, got {}", self.interval);
            return Err(RaffleError::InvalidConfig);
        }
        if !(MIN_REQUEST_CONFIRMATIONS..=MAX_REQUEST_CONFIRMATIONS)
            .contains(&self.request_confirmations)
        {
            msg!(
                "Request confirmations must be within {}..={}",
                MIN_REQUEST_CONFIRMATIONS,
                MAX_REQUEST_CONFIRMATIONS
            );
            return Err(RaffleError::InvalidConfig);
        }
        if self.callback_compute_limit == 0 {
            msg!("Callback compute limit must be greater than zero");
            return Err(RaffleError::InvalidConfig);
        }
        Ok(())
    }

    /// Parameters sent to the oracle with every draw request
    pub fn draw_request_params(&self) -> DrawRequestParams {
        DrawRequestParams {
            key_hash: self.key_hash,
            subscription_id: self.subscription_id,
            request_confirmations: self.request_confirmations,
            callback_compute_limit: self.callback_compute_limit,
            num_words: NUM_WORDS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRequestParams {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_compute_limit: u32,
    pub num_words: u32,
}

#[cfg(test)]
pub(crate) fn test_config(entrance_fee: u64, interval: i64) -> RaffleConfig {
    RaffleConfig {
        entrance_fee,
        interval,
        coordinator: Pubkey::new_unique(),
        key_hash: [7; 32],
        subscription_id: 1,
        request_confirmations: 3,
        callback_compute_limit: 500_000,
    }
}
