// Fair Raffle Program - Randomness request correlation
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg, program_error::ProgramError};

use crate::{config::DrawRequestParams, error::RaffleError};

/// Request endpoint of a randomness oracle.
///
/// Returns an id unique among every request the oracle has served. An error
/// means no request was issued.
pub trait RandomnessOracle {
    fn request_random_words(&mut self, params: &DrawRequestParams) -> Result<u64, ProgramError>;
}

/// The draw awaiting its random word
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: u64,
    /// Epoch the request was issued in
    pub epoch: u64,
    /// Entries frozen at request time
    pub entry_count: u64,
    pub requested_at: UnixTimestamp,
}

/// Tracks at most one outstanding request and resolves it exactly once
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestCoordinator {
    pending: Option<PendingRequest>,
}

impl RequestCoordinator {
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Issues a request through `oracle` and records it as pending.
    /// Nothing is recorded when the oracle fails.
    pub fn request<O: RandomnessOracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        params: &DrawRequestParams,
        epoch: u64,
        entry_count: u64,
        now: UnixTimestamp,
    ) -> Result<PendingRequest, ProgramError> {
        if let Some(pending) = &self.pending {
            msg!("Request {} is still outstanding", pending.request_id);
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        let request_id = oracle.request_random_words(params)?;
        let pending = PendingRequest {
            request_id,
            epoch,
            entry_count,
            requested_at: now,
        };
        self.pending = Some(pending);
        Ok(pending)
    }

    /// Correlates a delivery with the pending request and hands it to
    /// `consume`. The pending request is cleared only if `consume` succeeds,
    /// so a failed consumption can be retried with the same id.
    pub fn deliver<T, F>(&mut self, request_id: u64, consume: F) -> Result<(PendingRequest, T), ProgramError>
    where
        F: FnOnce(&PendingRequest) -> Result<T, ProgramError>,
    {
        let pending = match self.pending {
            Some(pending) if pending.request_id == request_id => pending,
            _ => return Err(RaffleError::UnknownRequest.into()),
        };

        let output = consume(&pending)?;
        self.pending = None;
        Ok((pending, output))
    }
}
