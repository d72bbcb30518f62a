// Fair Raffle Program - Instructions
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;

use crate::{
    config::RaffleConfig,
    error::RaffleError,
    selector::RandomWord,
    utils::{find_coordinator_address, find_raffle_address, find_subscription_address},
};

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the coordinator that serves draw requests
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The admin, pays for the account
    /// 1. `[writable]` The coordinator account (PDA)
    /// 2. `[]` The oracle authority allowed to deliver random words
    /// 3. `[]` The system program
    CreateCoordinator {
        /// Lamports charged to a subscription per request
        fee_per_request: u64,
    },

    /// Create a subscription with the next free id
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The subscription owner, pays for the account
    /// 1. `[writable]` The coordinator account
    /// 2. `[writable]` The subscription account (PDA for the next id)
    /// 3. `[]` The system program
    CreateSubscription,

    /// Add lamports to a subscription
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The funder
    /// 1. `[writable]` The subscription account
    /// 2. `[]` The system program
    FundSubscription { amount: u64 },

    /// Initialize a raffle owned by the signing authority
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The raffle authority, pays for the account
    /// 1. `[writable]` The raffle account (PDA)
    /// 2. `[]` The coordinator account
    /// 3. `[]` The subscription account paying for draws
    /// 4. `[]` The system program
    InitializeRaffle {
        entrance_fee: u64,
        /// Seconds between draws
        interval: i64,
        key_hash: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_compute_limit: u32,
    },

    /// Deposit into the pool for one entry
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The participant
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle { amount: u64 },

    /// Evaluate whether a draw may be requested; sets return data to 1 or 0
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep,

    /// Request a random word for the current epoch
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller (automation service)
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The coordinator account
    /// 3. `[writable]` The subscription account
    RequestDraw,

    /// Deliver the random word for a pending request
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator's oracle authority
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The coordinator account
    /// 3. `[writable]` The winner (entries[random mod len])
    FulfillRandomWords {
        request_id: u64,
        random_word: RandomWord,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstruction)?;

        Ok(match tag {
            0 => {
                let (fee_per_request, _) = Self::unpack_u64(rest)?;
                Self::CreateCoordinator { fee_per_request }
            }
            1 => Self::CreateSubscription,
            2 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::FundSubscription { amount }
            }
            3 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_i64(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (request_confirmations, rest) = Self::unpack_u16(rest)?;
                let (callback_compute_limit, _) = Self::unpack_u32(rest)?;
                Self::InitializeRaffle {
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    request_confirmations,
                    callback_compute_limit,
                }
            }
            4 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            5 => Self::CheckUpkeep,
            6 => Self::RequestDraw,
            7 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (word, _) = Self::unpack_fixed_bytes::<32>(rest)?;
                Self::FulfillRandomWords {
                    request_id,
                    random_word: RandomWord(word),
                }
            }
            _ => return Err(RaffleError::InvalidInstruction.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::CreateCoordinator { fee_per_request } => {
                buf.push(0);
                buf.extend_from_slice(&fee_per_request.to_le_bytes());
            }
            Self::CreateSubscription => buf.push(1),
            Self::FundSubscription { amount } => {
                buf.push(2);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::InitializeRaffle {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                request_confirmations,
                callback_compute_limit,
            } => {
                buf.push(3);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&request_confirmations.to_le_bytes());
                buf.extend_from_slice(&callback_compute_limit.to_le_bytes());
            }
            Self::EnterRaffle { amount } => {
                buf.push(4);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(5),
            Self::RequestDraw => buf.push(6),
            Self::FulfillRandomWords {
                request_id,
                random_word,
            } => {
                buf.push(7);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&random_word.0);
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_i64(input: &[u8]) -> Result<(i64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((i64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_u16(input: &[u8]) -> Result<(u16, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<2>(input)?;
        Ok((u16::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstruction.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes: [u8; N] = bytes
            .try_into()
            .map_err(|_| ProgramError::from(RaffleError::InvalidInstruction))?;
        Ok((bytes, rest))
    }
}

/// Create create_coordinator instruction
pub fn create_coordinator(
    program_id: &Pubkey,
    admin: &Pubkey,
    oracle: &Pubkey,
    fee_per_request: u64,
) -> Instruction {
    let (coordinator, _) = find_coordinator_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(coordinator, false),
            AccountMeta::new_readonly(*oracle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::CreateCoordinator { fee_per_request }.pack(),
    }
}

/// Create create_subscription instruction; `subscription_id` must be the
/// coordinator's next id
pub fn create_subscription(program_id: &Pubkey, owner: &Pubkey, subscription_id: u64) -> Instruction {
    let (coordinator, _) = find_coordinator_address(program_id);
    let (subscription, _) = find_subscription_address(program_id, subscription_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(coordinator, false),
            AccountMeta::new(subscription, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::CreateSubscription.pack(),
    }
}

/// Create fund_subscription instruction
pub fn fund_subscription(
    program_id: &Pubkey,
    funder: &Pubkey,
    subscription_id: u64,
    amount: u64,
) -> Instruction {
    let (subscription, _) = find_subscription_address(program_id, subscription_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*funder, true),
            AccountMeta::new(subscription, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::FundSubscription { amount }.pack(),
    }
}

/// Create initialize_raffle instruction. `config.coordinator` is ignored in
/// favour of the program's coordinator PDA.
pub fn initialize_raffle(program_id: &Pubkey, authority: &Pubkey, config: &RaffleConfig) -> Instruction {
    let (raffle, _) = find_raffle_address(program_id, authority);
    let (coordinator, _) = find_coordinator_address(program_id);
    let (subscription, _) = find_subscription_address(program_id, config.subscription_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(coordinator, false),
            AccountMeta::new_readonly(subscription, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::InitializeRaffle {
            entrance_fee: config.entrance_fee,
            interval: config.interval,
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: config.request_confirmations,
            callback_compute_limit: config.callback_compute_limit,
        }
        .pack(),
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(program_id: &Pubkey, participant: &Pubkey, raffle: &Pubkey, amount: u64) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*participant, true),
            AccountMeta::new(*raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: RaffleInstruction::EnterRaffle { amount }.pack(),
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle, false)],
        data: RaffleInstruction::CheckUpkeep.pack(),
    }
}

/// Create request_draw instruction
pub fn request_draw(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle: &Pubkey,
    subscription_id: u64,
) -> Instruction {
    let (coordinator, _) = find_coordinator_address(program_id);
    let (subscription, _) = find_subscription_address(program_id, subscription_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*caller, true),
            AccountMeta::new(*raffle, false),
            AccountMeta::new(coordinator, false),
            AccountMeta::new(subscription, false),
        ],
        data: RaffleInstruction::RequestDraw.pack(),
    }
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle: &Pubkey,
    raffle: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_word: RandomWord,
) -> Instruction {
    let (coordinator, _) = find_coordinator_address(program_id);
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*oracle, true),
            AccountMeta::new(*raffle, false),
            AccountMeta::new_readonly(coordinator, false),
            AccountMeta::new(*winner, false),
        ],
        data: RaffleInstruction::FulfillRandomWords {
            request_id,
            random_word,
        }
        .pack(),
    }
}
