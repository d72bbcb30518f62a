// Fair Raffle Program - State
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    borsh::try_from_slice_unchecked,
    clock::UnixTimestamp,
    msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::{
    config::RaffleConfig,
    coordinator::{PendingRequest, RandomnessOracle, RequestCoordinator},
    error::RaffleError,
    events::RaffleEvent,
    ledger::EntryLedger,
    selector::{select_winner, RandomWord},
    upkeep::{check_upkeep, UpkeepCheck},
};

/// Status of a raffle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Waiting for the oracle to deliver a random word
    Calculating,
}

/// Moves the pool to the winner. An error aborts the fulfillment.
pub trait PrizeTransfer {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError>;
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    pub is_initialized: bool,
    /// Creator of the raffle, part of the PDA seeds
    pub authority: Pubkey,
    pub bump: u8,
    pub config: RaffleConfig,
    ledger: EntryLedger,
    draws: RequestCoordinator,
    last_draw_time: UnixTimestamp,
    /// Completed draws so far
    epoch: u64,
    recent_winner: Option<Pubkey>,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    pub fn new(authority: Pubkey, bump: u8, config: RaffleConfig, now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            authority,
            bump,
            config,
            ledger: EntryLedger::default(),
            draws: RequestCoordinator::default(),
            last_draw_time: now,
            epoch: 0,
            recent_winner: None,
        }
    }

    /// Deserializes account data, ignoring unused trailing capacity
    pub fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let raffle: Raffle =
            try_from_slice_unchecked(data).map_err(|_| ProgramError::InvalidAccountData)?;
        if !raffle.is_initialized {
            return Err(RaffleError::NotInitialized.into());
        }
        Ok(raffle)
    }

    pub fn state(&self) -> RaffleState {
        if self.draws.is_pending() {
            RaffleState::Calculating
        } else {
            RaffleState::Open
        }
    }

    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck {
        check_upkeep(
            self.state(),
            self.ledger.len(),
            self.ledger.pool(),
            now,
            self.last_draw_time,
            self.config.interval,
        )
    }

    pub fn enter(&mut self, participant: Pubkey, amount: u64) -> Result<RaffleEvent, ProgramError> {
        if amount < self.config.entrance_fee {
            msg!(
                "Deposit of {} is below the entrance fee of {}",
                amount,
                self.config.entrance_fee
            );
            return Err(RaffleError::InsufficientFee.into());
        }
        if self.state() != RaffleState::Open {
            return Err(RaffleError::NotOpen.into());
        }

        let entry_index = self.ledger.append(participant, amount)?;
        Ok(RaffleEvent::Entered {
            participant,
            amount,
            entry_index: entry_index as u64,
        })
    }

    /// Requests a random word for the current epoch, freezing entries
    pub fn request_draw<O: RandomnessOracle + ?Sized>(
        &mut self,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<RaffleEvent, ProgramError> {
        let upkeep = self.check_upkeep(now);
        if !upkeep.is_needed() {
            msg!(
                "Upkeep not needed: pool={} entries={} open={} time_passed={}",
                self.ledger.pool(),
                self.ledger.len(),
                upkeep.is_open,
                upkeep.time_passed
            );
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        let pending = self.draws.request(
            oracle,
            &self.config.draw_request_params(),
            self.epoch,
            self.ledger.len() as u64,
            now,
        )?;
        Ok(RaffleEvent::DrawRequested {
            request_id: pending.request_id,
            epoch: pending.epoch,
        })
    }

    /// Consumes the random word for `request_id`: pays the pool to the
    /// selected entrant, then reopens the raffle for a new epoch.
    /// Nothing changes unless the payout succeeds.
    pub fn fulfill<P: PrizeTransfer + ?Sized>(
        &mut self,
        request_id: u64,
        random: &RandomWord,
        now: UnixTimestamp,
        payout: &mut P,
    ) -> Result<RaffleEvent, ProgramError> {
        let ledger = &self.ledger;
        let (pending, (winner, prize)) = self.draws.deliver(request_id, |_| {
            let (index, winner) = select_winner(random, ledger.entries())?;
            msg!("Winner index {} of {} entries", index, ledger.len());
            let prize = ledger.pool();
            payout.transfer(&winner, prize)?;
            Ok((winner, prize))
        })?;

        self.ledger.reset();
        self.last_draw_time = now;
        self.epoch = self
            .epoch
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;
        self.recent_winner = Some(winner);

        Ok(RaffleEvent::WinnerPicked {
            winner,
            request_id: pending.request_id,
            prize,
            epoch: pending.epoch,
        })
    }

    pub fn entrance_fee(&self) -> u64 {
        self.config.entrance_fee
    }

    pub fn interval(&self) -> i64 {
        self.config.interval
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.ledger.get(index)
    }

    pub fn players(&self) -> &[Pubkey] {
        self.ledger.entries()
    }

    pub fn number_of_players(&self) -> usize {
        self.ledger.len()
    }

    pub fn pool(&self) -> u64 {
        self.ledger.pool()
    }

    pub fn recent_winner(&self) -> Option<&Pubkey> {
        self.recent_winner.as_ref()
    }

    pub fn last_draw_time(&self) -> UnixTimestamp {
        self.last_draw_time
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pending_request(&self) -> Option<&PendingRequest> {
        self.draws.pending()
    }
}
