/// Default cap on the height of the ordered index.
pub const DEFAULT_MAX_LEVEL: usize = 16;
/// Default probability that a node is promoted one level up.
pub const DEFAULT_LEVEL_PROBABILITY: f64 = 0.5;
/// Default seed for level generation.
pub const DEFAULT_SEED: u64 = 1337;

/// Tuning knobs for a [`LeaderBoard`](crate::LeaderBoard) and its
/// [`OrderedIndex`](crate::OrderedIndex).
///
/// ```
/// use leaderboard::{LeaderBoard, LeaderBoardConfig, Scored};
///
/// let config = LeaderBoardConfig::new()
///     .with_max_level(8)
///     .with_capacity(1_024);
/// let board: LeaderBoard<Scored<u64, u32>> = LeaderBoard::with_config(&config);
/// assert_eq!(board.size(), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderBoardConfig {
    max_level: usize,
    level_probability: f64,
    seed: u64,
    capacity: usize,
}

impl LeaderBoardConfig {
    /// Create a configuration with the default values.
    pub fn new() -> LeaderBoardConfig {
        LeaderBoardConfig {
            max_level: DEFAULT_MAX_LEVEL,
            level_probability: DEFAULT_LEVEL_PROBABILITY,
            seed: DEFAULT_SEED,
            capacity: 0,
        }
    }

    /// Set the maximum skip-list level. Values below one are raised to one.
    pub fn with_max_level(mut self, max_level: usize) -> LeaderBoardConfig {
        self.max_level = max_level.max(1);
        self
    }

    /// Set the level promotion probability.
    ///
    /// Values outside the open interval `(0, 1)` are ignored.
    pub fn with_level_probability(mut self, probability: f64) -> LeaderBoardConfig {
        if probability > 0.0 && probability < 1.0 {
            self.level_probability = probability;
        }
        self
    }

    /// Set the seed of the level generator.
    pub fn with_seed(mut self, seed: u64) -> LeaderBoardConfig {
        self.seed = seed;
        self
    }

    /// Set the initial capacity of the identity index.
    pub fn with_capacity(mut self, capacity: usize) -> LeaderBoardConfig {
        self.capacity = capacity;
        self
    }

    /// Maximum skip-list level.
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Level promotion probability.
    pub fn level_probability(&self) -> f64 {
        self.level_probability
    }

    /// Seed of the level generator.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Initial capacity of the identity index.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LeaderBoardConfig {
    fn default() -> Self {
        Self::new()
    }
}
