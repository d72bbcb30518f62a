// Fair Raffle Program - Upkeep evaluation
use solana_program::clock::UnixTimestamp;

use crate::state::RaffleState;

/// Outcome of an upkeep evaluation, one flag per condition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub time_passed: bool,
    pub has_balance: bool,
    pub has_players: bool,
    pub is_open: bool,
}

impl UpkeepCheck {
    pub fn is_needed(&self) -> bool {
        self.time_passed && self.has_balance && self.has_players && self.is_open
    }
}

/// Decides whether a draw may be requested. Pure; never mutates anything.
pub fn check_upkeep(
    state: RaffleState,
    entry_count: usize,
    pool: u64,
    now: UnixTimestamp,
    last_draw_time: UnixTimestamp,
    interval: i64,
) -> UpkeepCheck {
    UpkeepCheck {
        time_passed: now.saturating_sub(last_draw_time) >= interval,
        has_balance: pool > 0,
        has_players: entry_count > 0,
        is_open: state == RaffleState::Open,
    }
}
