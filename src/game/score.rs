//! Score and coin bookkeeping, persisted through the preference store.

use serde::{Serialize, Deserialize};

use crate::game::services::PreferenceStore;

/// Preference key of the best score.
pub const HIGH_SCORE_KEY: &str = "HIGH_SCORE";
/// Preference key of the coin balance.
pub const COINS_KEY: &str = "COINS";

/// Per-run score plus the persisted high score and coin balance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    score: u32,
    high_score: u32,
    run_start_high_score: u32,
    coins: u32,
}

impl Scoreboard {
    /// Load persisted values and start a run at zero.
    pub fn load(prefs: &dyn PreferenceStore) -> Self {
        let read = |key: &str| {
            prefs
                .get_int(key)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0)
        };
        let high_score = read(HIGH_SCORE_KEY);
        Self {
            score: 0,
            high_score,
            run_start_high_score: high_score,
            coins: read(COINS_KEY),
        }
    }

    /// Score of the current run.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Best score so far, including this run.
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// High score when the run started.
    pub fn run_start_high_score(&self) -> u32 {
        self.run_start_high_score
    }

    /// Coin balance.
    pub fn coins(&self) -> u32 {
        self.coins
    }

    /// This run beat the high score it started with.
    pub fn has_new_high_score(&self) -> bool {
        self.high_score > self.run_start_high_score
    }

    /// Add to the run score, raising and persisting the high score.
    pub fn add_score(&mut self, amount: u32, prefs: &mut dyn PreferenceStore) -> u32 {
        self.score += amount;
        if self.score > self.high_score {
            self.high_score = self.score;
            prefs.set_int(HIGH_SCORE_KEY, i64::from(self.high_score));
        }
        self.score
    }

    /// Add to the coin balance and persist it.
    pub fn add_coins(&mut self, amount: u32, prefs: &mut dyn PreferenceStore) -> u32 {
        self.coins += amount;
        prefs.set_int(COINS_KEY, i64::from(self.coins));
        self.coins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::services::MemoryPreferences;

    #[test]
    fn test_high_score_persists() {
        let mut prefs = MemoryPreferences::default();
        let mut board = Scoreboard::load(&prefs);

        board.add_score(1, &mut prefs);
        board.add_score(1, &mut prefs);
        assert_eq!(board.score(), 2);
        assert!(board.has_new_high_score());
        assert_eq!(prefs.get_int(HIGH_SCORE_KEY), Some(2));

        let next = Scoreboard::load(&prefs);
        assert_eq!(next.score(), 0);
        assert_eq!(next.run_start_high_score(), 2);
        assert!(!next.has_new_high_score());
    }

    #[test]
    fn test_no_new_high_score_below_record() {
        let mut prefs = MemoryPreferences::default();
        prefs.set_int(HIGH_SCORE_KEY, 5);
        let mut board = Scoreboard::load(&prefs);

        for _ in 0..5 {
            board.add_score(1, &mut prefs);
        }
        assert!(!board.has_new_high_score());
        assert_eq!(prefs.get_int(HIGH_SCORE_KEY), Some(5));
    }

    #[test]
    fn test_coins_accumulate() {
        let mut prefs = MemoryPreferences::default();
        prefs.set_int(COINS_KEY, 10);
        let mut board = Scoreboard::load(&prefs);
        assert_eq!(board.add_coins(1, &mut prefs), 11);
        assert_eq!(prefs.get_int(COINS_KEY), Some(11));
    }
}
