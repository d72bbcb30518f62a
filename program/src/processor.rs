// Fair Raffle Program - Instruction Processor
use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    config::{RaffleConfig, COORDINATOR_SEED, RAFFLE_SEED, SUBSCRIPTION_SEED},
    error::RaffleError,
    instruction::RaffleInstruction,
    selector::RandomWord,
    state::Raffle,
    utils::{
        create_pda_account, find_coordinator_address, find_raffle_address,
        find_subscription_address, LamportPayout,
    },
    vrf::{Coordinator, Subscription, SubscriptionOracle},
};

/// Program state handler.
pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::CreateCoordinator { fee_per_request } => {
                msg!("Instruction: Create Coordinator");
                Self::process_create_coordinator(accounts, fee_per_request, program_id)
            }
            RaffleInstruction::CreateSubscription => {
                msg!("Instruction: Create Subscription");
                Self::process_create_subscription(accounts, program_id)
            }
            RaffleInstruction::FundSubscription { amount } => {
                msg!("Instruction: Fund Subscription");
                Self::process_fund_subscription(accounts, amount, program_id)
            }
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                request_confirmations,
                callback_compute_limit,
            } => {
                msg!("Instruction: Initialize Raffle");
                let config = RaffleConfig {
                    entrance_fee,
                    interval,
                    coordinator: Pubkey::default(),
                    key_hash,
                    subscription_id,
                    request_confirmations,
                    callback_compute_limit,
                };
                Self::process_initialize_raffle(accounts, config, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::RequestDraw => {
                msg!("Instruction: Request Draw");
                Self::process_request_draw(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_word,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, random_word, program_id)
            }
        }
    }

    fn process_create_coordinator(
        accounts: &[AccountInfo],
        fee_per_request: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let oracle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !admin_info.is_signer {
            msg!("Admin must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_coordinator, bump) = find_coordinator_address(program_id);
        if *coordinator_info.key != expected_coordinator {
            msg!("Invalid coordinator account address");
            return Err(ProgramError::InvalidArgument);
        }
        if coordinator_info.owner == program_id {
            msg!("Coordinator is already initialized");
            return Err(RaffleError::AlreadyInitialized.into());
        }

        create_pda_account(
            admin_info,
            coordinator_info,
            system_program_info,
            program_id,
            Coordinator::LEN,
            &[COORDINATOR_SEED, &[bump]],
        )?;

        let coordinator = Coordinator {
            is_initialized: true,
            admin: *admin_info.key,
            oracle: *oracle_info.key,
            fee_per_request,
            request_counter: 0,
            subscription_counter: 0,
            bump,
        };
        Coordinator::pack(coordinator, &mut coordinator_info.data.borrow_mut())?;

        msg!(
            "Coordinator initialized: Admin={}, Oracle={}, FeePerRequest={}",
            admin_info.key,
            oracle_info.key,
            fee_per_request
        );
        Ok(())
    }

    fn process_create_subscription(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Subscription owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if coordinator_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut coordinator = Coordinator::unpack(&coordinator_info.data.borrow())?;
        let subscription_id = coordinator
            .subscription_counter
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        let (expected_subscription, bump) = find_subscription_address(program_id, subscription_id);
        if *subscription_info.key != expected_subscription {
            msg!("Subscription account must be the PDA for id {}", subscription_id);
            return Err(ProgramError::InvalidArgument);
        }

        create_pda_account(
            owner_info,
            subscription_info,
            system_program_info,
            program_id,
            Subscription::LEN,
            &[SUBSCRIPTION_SEED, &subscription_id.to_le_bytes(), &[bump]],
        )?;

        let subscription = Subscription {
            is_initialized: true,
            id: subscription_id,
            owner: *owner_info.key,
            balance: 0,
            request_count: 0,
            bump,
        };
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        coordinator.subscription_counter = subscription_id;
        Coordinator::pack(coordinator, &mut coordinator_info.data.borrow_mut())?;

        msg!("Subscription {} created for {}", subscription_id, owner_info.key);
        Ok(())
    }

    fn process_fund_subscription(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let funder_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !funder_info.is_signer {
            msg!("Funder must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if subscription_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut subscription = Subscription::unpack(&subscription_info.data.borrow())?;

        invoke(
            &system_instruction::transfer(funder_info.key, subscription_info.key, amount),
            &[
                funder_info.clone(),
                subscription_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        subscription.balance = subscription
            .balance
            .checked_add(amount)
            .ok_or(RaffleError::ArithmeticOverflow)?;
        Subscription::pack(subscription, &mut subscription_info.data.borrow_mut())?;

        msg!(
            "Subscription {} funded with {} lamports, balance {}",
            subscription.id,
            amount,
            subscription.balance
        );
        Ok(())
    }

    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        mut config: RaffleConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        Self::check_coordinator(coordinator_info, program_id)?;
        Self::check_subscription(subscription_info, config.subscription_id, program_id)?;
        Subscription::unpack(&subscription_info.data.borrow())?.authorize(authority_info.key)?;

        config.coordinator = *coordinator_info.key;
        config.validate()?;

        let (expected_raffle, bump) = find_raffle_address(program_id, authority_info.key);
        if *raffle_info.key != expected_raffle {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidArgument);
        }
        if raffle_info.owner == program_id {
            msg!("Raffle is already initialized");
            return Err(RaffleError::AlreadyInitialized.into());
        }

        let now = Clock::get()?.unix_timestamp;
        let raffle = Raffle::new(*authority_info.key, bump, config, now);
        let data = Self::serialize_raffle(&raffle)?;

        create_pda_account(
            authority_info,
            raffle_info,
            system_program_info,
            program_id,
            data.len(),
            &[RAFFLE_SEED, authority_info.key.as_ref(), &[bump]],
        )?;
        raffle_info.try_borrow_mut_data()?.copy_from_slice(&data);

        msg!(
            "Raffle initialized: EntranceFee={}, Interval={}s, Subscription={}, Start={}",
            config.entrance_fee,
            config.interval,
            config.subscription_id,
            now
        );
        Ok(())
    }

    fn process_enter_raffle(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let participant_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !participant_info.is_signer {
            msg!("Participant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::load(&raffle_info.data.borrow())?;
        let event = raffle.enter(*participant_info.key, amount)?;

        invoke(
            &system_instruction::transfer(participant_info.key, raffle_info.key, amount),
            &[
                participant_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        let data = Self::serialize_raffle(&raffle)?;
        if data.len() > raffle_info.data_len() {
            Self::grow_raffle_account(raffle_info, participant_info, system_program_info, data.len())?;
        }
        raffle_info.try_borrow_mut_data()?[..data.len()].copy_from_slice(&data);

        event.emit()
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = Raffle::load(&raffle_info.data.borrow())?;
        let upkeep = raffle.check_upkeep(Clock::get()?.unix_timestamp);

        msg!(
            "Upkeep needed={} (time_passed={}, has_balance={}, has_players={}, is_open={})",
            upkeep.is_needed(),
            upkeep.time_passed,
            upkeep.has_balance,
            upkeep.has_players,
            upkeep.is_open
        );
        set_return_data(&[upkeep.is_needed() as u8]);
        Ok(())
    }

    fn process_request_draw(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::load(&raffle_info.data.borrow())?;
        if *coordinator_info.key != raffle.config.coordinator {
            msg!("Coordinator does not serve this raffle");
            return Err(ProgramError::InvalidArgument);
        }
        Self::check_coordinator(coordinator_info, program_id)?;
        Self::check_subscription(subscription_info, raffle.config.subscription_id, program_id)?;

        let mut oracle = SubscriptionOracle {
            coordinator_info,
            subscription_info,
            consumer: *raffle_info.key,
            consumer_authority: raffle.authority,
        };
        let event = raffle.request_draw(Clock::get()?.unix_timestamp, &mut oracle)?;

        Self::store_raffle(&raffle, raffle_info)?;
        event.emit()
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_word: RandomWord,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !oracle_info.is_signer {
            msg!("Oracle must sign the fulfillment");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if raffle_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Raffle::load(&raffle_info.data.borrow())?;
        if *coordinator_info.key != raffle.config.coordinator {
            msg!("Coordinator does not serve this raffle");
            return Err(ProgramError::InvalidArgument);
        }
        Self::check_coordinator(coordinator_info, program_id)?;

        let coordinator = Coordinator::unpack(&coordinator_info.data.borrow())?;
        if coordinator.oracle != *oracle_info.key {
            msg!("{} is not the coordinator's oracle", oracle_info.key);
            return Err(RaffleError::OnlyCoordinatorCanFulfill.into());
        }

        let mut payout = LamportPayout {
            raffle_info,
            winner_info,
        };
        let event = raffle.fulfill(
            request_id,
            &random_word,
            Clock::get()?.unix_timestamp,
            &mut payout,
        )?;

        Self::store_raffle(&raffle, raffle_info)?;
        event.emit()
    }

    fn check_coordinator(coordinator_info: &AccountInfo, program_id: &Pubkey) -> ProgramResult {
        if coordinator_info.owner != program_id {
            msg!("Coordinator account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let (expected_coordinator, _) = find_coordinator_address(program_id);
        if *coordinator_info.key != expected_coordinator {
            msg!("Invalid coordinator account address");
            return Err(ProgramError::InvalidArgument);
        }
        Ok(())
    }

    fn check_subscription(
        subscription_info: &AccountInfo,
        subscription_id: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        if subscription_info.owner != program_id {
            msg!("Subscription account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let (expected_subscription, _) = find_subscription_address(program_id, subscription_id);
        if *subscription_info.key != expected_subscription {
            msg!("Subscription account is not the PDA for id {}", subscription_id);
            return Err(RaffleError::InvalidSubscription.into());
        }
        Ok(())
    }

    fn serialize_raffle(raffle: &Raffle) -> Result<Vec<u8>, ProgramError> {
        raffle
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }

    /// Writes the raffle into its account; the account never shrinks
    fn store_raffle(raffle: &Raffle, raffle_info: &AccountInfo) -> ProgramResult {
        let data = Self::serialize_raffle(raffle)?;
        if data.len() > raffle_info.data_len() {
            msg!("Raffle account holds {} bytes, needs {}", raffle_info.data_len(), data.len());
            return Err(ProgramError::AccountDataTooSmall);
        }
        raffle_info.try_borrow_mut_data()?[..data.len()].copy_from_slice(&data);
        Ok(())
    }

    /// Reallocates the raffle account, charging `payer` the extra rent
    fn grow_raffle_account<'a>(
        raffle_info: &AccountInfo<'a>,
        payer_info: &AccountInfo<'a>,
        system_program_info: &AccountInfo<'a>,
        new_len: usize,
    ) -> ProgramResult {
        let rent = Rent::get()?;
        let top_up = rent
            .minimum_balance(new_len)
            .saturating_sub(rent.minimum_balance(raffle_info.data_len()));
        if top_up > 0 {
            invoke(
                &system_instruction::transfer(payer_info.key, raffle_info.key, top_up),
                &[
                    payer_info.clone(),
                    raffle_info.clone(),
                    system_program_info.clone(),
                ],
            )?;
        }
        raffle_info.realloc(new_len, false)
    }
}
