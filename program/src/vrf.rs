// Randomness coordinator and subscriptions serving draw requests
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    account_info::AccountInfo,
    msg,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

use crate::{
    config::DrawRequestParams, coordinator::RandomnessOracle, error::RaffleError,
    utils::transfer_lamports,
};

/// Coordinator account: the oracle's request endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinator {
    pub is_initialized: bool,
    /// Creator of the coordinator
    pub admin: Pubkey,
    /// Only key allowed to deliver random words
    pub oracle: Pubkey,
    /// Lamports charged to a subscription per request
    pub fee_per_request: u64,
    /// Id of the last request issued; ids start at 1
    pub request_counter: u64,
    /// Id of the last subscription created
    pub subscription_counter: u64,
    pub bump: u8,
}

/// Prepaid balance that draw requests are charged against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub is_initialized: bool,
    pub id: u64,
    pub owner: Pubkey,
    /// Lamports available for request fees
    pub balance: u64,
    pub request_count: u64,
    pub bump: u8,
}

impl Sealed for Coordinator {}
impl Sealed for Subscription {}

impl IsInitialized for Coordinator {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for Subscription {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Coordinator {
    const LEN: usize = 1 + 32 + 32 + 8 + 8 + 8 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Coordinator::LEN];
        let (
            is_initialized,
            admin,
            oracle,
            fee_per_request,
            request_counter,
            subscription_counter,
            bump,
        ) = array_refs![src, 1, 32, 32, 8, 8, 8, 1];

        Ok(Coordinator {
            is_initialized: is_initialized[0] != 0,
            admin: Pubkey::new_from_array(*admin),
            oracle: Pubkey::new_from_array(*oracle),
            fee_per_request: u64::from_le_bytes(*fee_per_request),
            request_counter: u64::from_le_bytes(*request_counter),
            subscription_counter: u64::from_le_bytes(*subscription_counter),
            bump: bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Coordinator::LEN];
        let (
            is_initialized_dst,
            admin_dst,
            oracle_dst,
            fee_per_request_dst,
            request_counter_dst,
            subscription_counter_dst,
            bump_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 8, 8, 8, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        admin_dst.copy_from_slice(self.admin.as_ref());
        oracle_dst.copy_from_slice(self.oracle.as_ref());
        *fee_per_request_dst = self.fee_per_request.to_le_bytes();
        *request_counter_dst = self.request_counter.to_le_bytes();
        *subscription_counter_dst = self.subscription_counter.to_le_bytes();
        bump_dst[0] = self.bump;
    }
}

impl Pack for Subscription {
    const LEN: usize = 1 + 8 + 32 + 8 + 8 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Subscription::LEN];
        let (is_initialized, id, owner, balance, request_count, bump) =
            array_refs![src, 1, 8, 32, 8, 8, 1];

        Ok(Subscription {
            is_initialized: is_initialized[0] != 0,
            id: u64::from_le_bytes(*id),
            owner: Pubkey::new_from_array(*owner),
            balance: u64::from_le_bytes(*balance),
            request_count: u64::from_le_bytes(*request_count),
            bump: bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Subscription::LEN];
        let (is_initialized_dst, id_dst, owner_dst, balance_dst, request_count_dst, bump_dst) =
            mut_array_refs![dst, 1, 8, 32, 8, 8, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        *id_dst = self.id.to_le_bytes();
        owner_dst.copy_from_slice(self.owner.as_ref());
        *balance_dst = self.balance.to_le_bytes();
        *request_count_dst = self.request_count.to_le_bytes();
        bump_dst[0] = self.bump;
    }
}

impl Subscription {
    /// Only raffles created by the subscription owner may draw from it
    pub fn authorize(&self, raffle_authority: &Pubkey) -> Result<(), RaffleError> {
        if self.owner != *raffle_authority {
            msg!(
                "Subscription {} is owned by {}, not {}",
                self.id,
                self.owner,
                raffle_authority
            );
            return Err(RaffleError::InvalidSubscription);
        }
        Ok(())
    }
}

impl Coordinator {
    /// Charges `subscription` for one request and returns the new request id
    pub fn charge_request(
        &mut self,
        subscription: &mut Subscription,
        params: &DrawRequestParams,
    ) -> Result<u64, RaffleError> {
        if subscription.id != params.subscription_id {
            msg!(
                "Subscription {} does not match requested {}",
                subscription.id,
                params.subscription_id
            );
            return Err(RaffleError::InvalidSubscription);
        }
        if subscription.balance < self.fee_per_request {
            msg!(
                "Subscription {} balance {} is below the request fee {}",
                subscription.id,
                subscription.balance,
                self.fee_per_request
            );
            return Err(RaffleError::InsufficientSubscriptionBalance);
        }

        let request_id = self
            .request_counter
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;
        subscription.request_count = subscription
            .request_count
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;
        subscription.balance -= self.fee_per_request;
        self.request_counter = request_id;
        Ok(request_id)
    }
}

/// Issues draw requests against a subscription held by the coordinator
pub struct SubscriptionOracle<'a, 'b> {
    pub coordinator_info: &'a AccountInfo<'b>,
    pub subscription_info: &'a AccountInfo<'b>,
    /// Raffle account the random word will be delivered to
    pub consumer: Pubkey,
    /// Authority of the consuming raffle, must own the subscription
    pub consumer_authority: Pubkey,
}

impl<'a, 'b> RandomnessOracle for SubscriptionOracle<'a, 'b> {
    fn request_random_words(&mut self, params: &DrawRequestParams) -> Result<u64, ProgramError> {
        let mut coordinator = Coordinator::unpack(&self.coordinator_info.data.borrow())?;
        let mut subscription = Subscription::unpack(&self.subscription_info.data.borrow())?;
        subscription.authorize(&self.consumer_authority)?;

        let request_id = coordinator.charge_request(&mut subscription, params)?;
        transfer_lamports(
            self.subscription_info,
            self.coordinator_info,
            coordinator.fee_per_request,
        )?;

        Coordinator::pack(coordinator, &mut self.coordinator_info.data.borrow_mut())?;
        Subscription::pack(subscription, &mut self.subscription_info.data.borrow_mut())?;

        msg!(
            "RandomWordsRequested: id={} consumer={} sub={} confirmations={} compute_limit={} words={} key_hash={:?}",
            request_id,
            self.consumer,
            params.subscription_id,
            params.request_confirmations,
            params.callback_compute_limit,
            params.num_words,
            params.key_hash
        );
        Ok(request_id)
    }
}
