use solana_program::program_pack::Pack;
use solana_program_test::*;
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    sysvar::clock::Clock,
    transaction::{Transaction, TransactionError},
};

use fair_raffle::{
    config::RaffleConfig,
    error::RaffleError,
    instruction,
    process_instruction,
    selector::RandomWord,
    state::{Raffle, RaffleState},
    utils::{find_coordinator_address, find_raffle_address, find_subscription_address},
    vrf::{Coordinator, Subscription},
};

const ENTRANCE_FEE: u64 = 10_000_000; // 0.01 SOL
const INTERVAL: i64 = 30;
const REQUEST_FEE: u64 = 1_000_000;
const SUBSCRIPTION_ID: u64 = 1;

struct TestRaffle {
    context: ProgramTestContext,
    program_id: Pubkey,
    oracle: Keypair,
    raffle: Pubkey,
}

fn raffle_config() -> RaffleConfig {
    RaffleConfig {
        entrance_fee: ENTRANCE_FEE,
        interval: INTERVAL,
        coordinator: Pubkey::default(),
        key_hash: [0xd8; 32],
        subscription_id: SUBSCRIPTION_ID,
        request_confirmations: 3,
        callback_compute_limit: 500_000,
    }
}

// Coordinator, subscription and raffle all created by the test payer
async fn setup(subscription_funding: u64) -> TestRaffle {
    let program_id = Pubkey::new_unique();
    let program_test = ProgramTest::new("fair_raffle", program_id, processor!(process_instruction));
    let mut context = program_test.start_with_context().await;

    let oracle = Keypair::new();
    let payer = context.payer.pubkey();

    let mut instructions = vec![
        instruction::create_coordinator(&program_id, &payer, &oracle.pubkey(), REQUEST_FEE),
        instruction::create_subscription(&program_id, &payer, SUBSCRIPTION_ID),
    ];
    if subscription_funding > 0 {
        instructions.push(instruction::fund_subscription(
            &program_id,
            &payer,
            SUBSCRIPTION_ID,
            subscription_funding,
        ));
    }
    instructions.push(instruction::initialize_raffle(&program_id, &payer, &raffle_config()));

    let transaction = Transaction::new_signed_with_payer(
        &instructions,
        Some(&payer),
        &[&context.payer],
        context.last_blockhash,
    );
    context.banks_client.process_transaction(transaction).await.unwrap();

    let (raffle, _) = find_raffle_address(&program_id, &payer);
    TestRaffle {
        context,
        program_id,
        oracle,
        raffle,
    }
}

impl TestRaffle {
    async fn send(&mut self, instruction: Instruction, signers: &[&Keypair]) -> Result<(), BanksClientError> {
        let mut all_signers = vec![&self.context.payer];
        all_signers.extend_from_slice(signers);
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.context.payer.pubkey()),
            &all_signers,
            self.context.last_blockhash,
        );
        self.context.banks_client.process_transaction(transaction).await
    }

    async fn funded_player(&mut self) -> Keypair {
        let player = Keypair::new();
        let fund = system_instruction::transfer(
            &self.context.payer.pubkey(),
            &player.pubkey(),
            1_000_000_000,
        );
        self.send(fund, &[]).await.unwrap();
        player
    }

    async fn enter(&mut self, player: &Keypair, amount: u64) -> Result<(), BanksClientError> {
        let ix = instruction::enter_raffle(&self.program_id, &player.pubkey(), &self.raffle, amount);
        self.send(ix, &[player]).await
    }

    async fn request_draw(&mut self) -> Result<(), BanksClientError> {
        let ix = instruction::request_draw(
            &self.program_id,
            &self.context.payer.pubkey(),
            &self.raffle,
            SUBSCRIPTION_ID,
        );
        self.send(ix, &[]).await
    }

    async fn fulfill(
        &mut self,
        oracle: &Keypair,
        request_id: u64,
        word: u64,
        winner: &Pubkey,
    ) -> Result<(), BanksClientError> {
        let ix = instruction::fulfill_random_words(
            &self.program_id,
            &oracle.pubkey(),
            &self.raffle,
            winner,
            request_id,
            RandomWord::from(word),
        );
        self.send(ix, &[oracle]).await
    }

    // CheckUpkeep reports through return data; zero bytes are trimmed by the runtime
    async fn upkeep_needed(&mut self) -> bool {
        let ix = instruction::check_upkeep(&self.program_id, &self.raffle);
        let transaction = Transaction::new_signed_with_payer(
            &[ix],
            Some(&self.context.payer.pubkey()),
            &[&self.context.payer],
            self.context.last_blockhash,
        );
        let simulation = self
            .context
            .banks_client
            .simulate_transaction(transaction)
            .await
            .unwrap();
        assert!(matches!(simulation.result, Some(Ok(()))));
        let data = simulation
            .simulation_details
            .and_then(|details| details.return_data)
            .map(|return_data| return_data.data)
            .unwrap_or_default();
        data.first() == Some(&1)
    }

    async fn advance_clock(&mut self, seconds: i64) {
        let mut clock: Clock = self.context.banks_client.get_sysvar().await.unwrap();
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }

    async fn raffle_state(&mut self) -> Raffle {
        let account = self
            .context
            .banks_client
            .get_account(self.raffle)
            .await
            .unwrap()
            .expect("raffle account missing");
        Raffle::load(&account.data).unwrap()
    }

    async fn balance(&mut self, key: &Pubkey) -> u64 {
        self.context.banks_client.get_balance(*key).await.unwrap()
    }
}

fn assert_raffle_error(result: Result<(), BanksClientError>, error: RaffleError) {
    assert_eq!(
        result.unwrap_err().unwrap(),
        TransactionError::InstructionError(0, InstructionError::Custom(error as u32))
    );
}

#[tokio::test]
async fn test_initialize_raffle() {
    let mut test = setup(10 * REQUEST_FEE).await;

    let raffle = test.raffle_state().await;
    let (coordinator, _) = find_coordinator_address(&test.program_id);
    assert_eq!(raffle.state(), RaffleState::Open);
    assert_eq!(raffle.entrance_fee(), ENTRANCE_FEE);
    assert_eq!(raffle.interval(), INTERVAL);
    assert_eq!(raffle.config.coordinator, coordinator);
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.recent_winner(), None);

    let account = test
        .context
        .banks_client
        .get_account(coordinator)
        .await
        .unwrap()
        .unwrap();
    let coordinator = Coordinator::unpack(&account.data).unwrap();
    assert_eq!(coordinator.oracle, test.oracle.pubkey());
    assert_eq!(coordinator.subscription_counter, SUBSCRIPTION_ID);
}

#[tokio::test]
async fn test_enter_records_player_and_pool() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let player = test.funded_player().await;

    test.enter(&player, ENTRANCE_FEE).await.unwrap();

    let raffle = test.raffle_state().await;
    assert_eq!(raffle.number_of_players(), 1);
    assert_eq!(raffle.player(0), Some(&player.pubkey()));
    assert_eq!(raffle.pool(), ENTRANCE_FEE);
}

#[tokio::test]
async fn test_enter_below_fee_fails() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let player = test.funded_player().await;

    assert_raffle_error(
        test.enter(&player, ENTRANCE_FEE - 1).await,
        RaffleError::InsufficientFee,
    );
    assert_eq!(test.raffle_state().await.number_of_players(), 0);
}

#[tokio::test]
async fn test_request_draw_before_interval_fails() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let player = test.funded_player().await;
    test.enter(&player, ENTRANCE_FEE).await.unwrap();

    assert_raffle_error(test.request_draw().await, RaffleError::UpkeepNotNeeded);
}

#[tokio::test]
async fn test_request_draw_without_players_fails() {
    let mut test = setup(10 * REQUEST_FEE).await;
    test.advance_clock(INTERVAL + 1).await;

    assert_raffle_error(test.request_draw().await, RaffleError::UpkeepNotNeeded);
}

#[tokio::test]
async fn test_check_upkeep_reports_readiness() {
    let mut test = setup(10 * REQUEST_FEE).await;
    assert!(!test.upkeep_needed().await);

    let player = test.funded_player().await;
    test.enter(&player, ENTRANCE_FEE).await.unwrap();
    assert!(!test.upkeep_needed().await);

    test.advance_clock(INTERVAL + 1).await;
    assert!(test.upkeep_needed().await);

    test.request_draw().await.unwrap();
    assert!(!test.upkeep_needed().await);
}

#[tokio::test]
async fn test_raffle_cannot_use_foreign_subscription() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let outsider = test.funded_player().await;

    let ix = instruction::initialize_raffle(&test.program_id, &outsider.pubkey(), &raffle_config());
    assert_raffle_error(test.send(ix, &[&outsider]).await, RaffleError::InvalidSubscription);

    let (outsider_raffle, _) = find_raffle_address(&test.program_id, &outsider.pubkey());
    assert!(test
        .context
        .banks_client
        .get_account(outsider_raffle)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unfunded_subscription_cannot_request() {
    let mut test = setup(0).await;
    let player = test.funded_player().await;
    test.enter(&player, ENTRANCE_FEE).await.unwrap();
    test.advance_clock(INTERVAL + 1).await;

    assert_raffle_error(
        test.request_draw().await,
        RaffleError::InsufficientSubscriptionBalance,
    );
    let raffle = test.raffle_state().await;
    assert_eq!(raffle.state(), RaffleState::Open);
    assert!(raffle.pending_request().is_none());
}

#[tokio::test]
async fn test_single_entrant_wins_pool() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let player = test.funded_player().await;
    test.enter(&player, ENTRANCE_FEE).await.unwrap();
    test.advance_clock(INTERVAL + 1).await;

    test.request_draw().await.unwrap();

    let raffle = test.raffle_state().await;
    assert_eq!(raffle.state(), RaffleState::Calculating);
    let pending = *raffle.pending_request().unwrap();
    assert_eq!(pending.request_id, 1);
    assert_eq!(pending.epoch, 0);

    let (subscription_key, _) = find_subscription_address(&test.program_id, SUBSCRIPTION_ID);
    let account = test
        .context
        .banks_client
        .get_account(subscription_key)
        .await
        .unwrap()
        .unwrap();
    let subscription = Subscription::unpack(&account.data).unwrap();
    assert_eq!(subscription.balance, 9 * REQUEST_FEE);
    assert_eq!(subscription.request_count, 1);

    let balance_before = test.balance(&player.pubkey()).await;
    let oracle = Keypair::from_bytes(&test.oracle.to_bytes()).unwrap();
    test.fulfill(&oracle, 1, 7, &player.pubkey()).await.unwrap();

    assert_eq!(
        test.balance(&player.pubkey()).await,
        balance_before + ENTRANCE_FEE
    );
    let raffle = test.raffle_state().await;
    assert_eq!(raffle.state(), RaffleState::Open);
    assert_eq!(raffle.number_of_players(), 0);
    assert_eq!(raffle.pool(), 0);
    assert_eq!(raffle.recent_winner(), Some(&player.pubkey()));
    assert_eq!(raffle.epoch(), 1);
}

#[tokio::test]
async fn test_winner_selected_by_random_word() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let mut players = Vec::new();
    for _ in 0..4 {
        let player = test.funded_player().await;
        test.enter(&player, ENTRANCE_FEE).await.unwrap();
        players.push(player);
    }
    test.advance_clock(INTERVAL + 1).await;
    test.request_draw().await.unwrap();

    // 9 mod 4 selects the second entrant
    let winner = players[1].pubkey();
    let balance_before = test.balance(&winner).await;
    let oracle = Keypair::from_bytes(&test.oracle.to_bytes()).unwrap();

    assert_raffle_error(
        test.fulfill(&oracle, 1, 9, &players[0].pubkey()).await,
        RaffleError::WinnerAccountMismatch,
    );
    assert_eq!(test.raffle_state().await.state(), RaffleState::Calculating);

    test.fulfill(&oracle, 1, 9, &winner).await.unwrap();

    assert_eq!(test.balance(&winner).await, balance_before + 4 * ENTRANCE_FEE);
    let raffle = test.raffle_state().await;
    assert_eq!(raffle.recent_winner(), Some(&winner));
    assert_eq!(raffle.number_of_players(), 0);
}

#[tokio::test]
async fn test_enter_while_calculating_fails() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let first = test.funded_player().await;
    let late = test.funded_player().await;
    test.enter(&first, ENTRANCE_FEE).await.unwrap();
    test.advance_clock(INTERVAL + 1).await;
    test.request_draw().await.unwrap();

    assert_raffle_error(test.enter(&late, ENTRANCE_FEE).await, RaffleError::NotOpen);
    assert_eq!(test.raffle_state().await.number_of_players(), 1);
}

#[tokio::test]
async fn test_second_request_while_pending_fails() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let player = test.funded_player().await;
    test.enter(&player, ENTRANCE_FEE).await.unwrap();
    test.advance_clock(INTERVAL + 1).await;
    test.request_draw().await.unwrap();

    test.advance_clock(1).await;
    let other_caller = Keypair::new();
    let ix = instruction::request_draw(
        &test.program_id,
        &other_caller.pubkey(),
        &test.raffle,
        SUBSCRIPTION_ID,
    );
    assert_raffle_error(test.send(ix, &[&other_caller]).await, RaffleError::UpkeepNotNeeded);
}

#[tokio::test]
async fn test_fulfill_unknown_request_fails() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let oracle = Keypair::from_bytes(&test.oracle.to_bytes()).unwrap();
    let nobody = Pubkey::new_unique();

    assert_raffle_error(
        test.fulfill(&oracle, 0, 7, &nobody).await,
        RaffleError::UnknownRequest,
    );
}

#[tokio::test]
async fn test_fulfill_by_foreign_oracle_fails() {
    let mut test = setup(10 * REQUEST_FEE).await;
    let player = test.funded_player().await;
    test.enter(&player, ENTRANCE_FEE).await.unwrap();
    test.advance_clock(INTERVAL + 1).await;
    test.request_draw().await.unwrap();

    let impostor = Keypair::new();
    assert_raffle_error(
        test.fulfill(&impostor, 1, 7, &player.pubkey()).await,
        RaffleError::OnlyCoordinatorCanFulfill,
    );
    assert_eq!(test.raffle_state().await.state(), RaffleState::Calculating);
}
