/// Outcome of a buzz submitted to the race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuzzOutcome {
    /// This buzz was the first since the last reset.
    Won { team: String, round: u64 },
    /// The race was already locked; the reported winner is unchanged.
    AlreadyLocked { winner: String, round: u64 },
}

/// First-arrival arbitration between buzzer stations.
///
/// Arrival order is the order in which callers reach [`BuzzerRace::buzz`]
/// through the lock held by the application state; client clocks play no part.
#[derive(Debug, Clone, Default)]
pub struct BuzzerRace {
    winner: Option<String>,
    locked: bool,
    round: u64,
}

impl BuzzerRace {
    /// Open race, round 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buzz from `team`.
    pub fn buzz(&mut self, team: &str) -> BuzzOutcome {
        if self.locked {
            if let Some(winner) = &self.winner {
                return BuzzOutcome::AlreadyLocked {
                    winner: winner.clone(),
                    round: self.round,
                };
            }
        }

        self.winner = Some(team.to_owned());
        self.locked = true;
        BuzzOutcome::Won {
            team: team.to_owned(),
            round: self.round,
        }
    }

    /// Clear the winner and reopen the race for a new round.
    pub fn reset(&mut self) -> u64 {
        self.winner = None;
        self.locked = false;
        self.round += 1;
        self.round
    }

    /// Team that won the current round, if any.
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Whether later buzzes are ignored.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Rounds opened since startup.
    pub fn round(&self) -> u64 {
        self.round
    }
}
