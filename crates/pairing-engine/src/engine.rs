//! Core Pairing Engine
//!
//! Greedy least-history pairing over an ordered pool.
//!
//! PROPERTIES:
//! 1. Participants with the least accumulated history choose first
//! 2. Each chooser takes the candidate it has met least often
//! 3. With availability modelling on, exclusive participants are never
//!    paired without a shared day
//! 4. With the ordered tie-break, same inputs give the same pairs

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Reverse;
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::domain::RunContext;
use crate::error::PairingError;
use crate::participant::Participant;
use crate::result::{PairingMap, PairingOutcome};

/// How to choose among equally ranked candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// First candidate in queue order
    #[default]
    Ordered,
    /// Uniformly at random among the tied candidates
    Random,
}

impl TieBreak {
    /// Parse tie-break mode from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ordered" | "deterministic" => Some(TieBreak::Ordered),
            "random" => Some(TieBreak::Random),
            _ => None,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub tie_break: TieBreak,
    /// Seed for the random tie-break; entropy when `None`
    pub seed: Option<u64>,
    /// Prefer more shared days among candidates with equal history
    pub availability: bool,
}

impl EngineConfig {
    /// Build engine settings from the `matching` config section
    pub fn from_config(config: &config::MatchingConfig) -> Self {
        Self {
            tie_break: TieBreak::from_str(&config.tie_break).unwrap_or_default(),
            seed: config.seed,
            availability: config.availability,
        }
    }
}

/// Keep only participants whose periodic gate admits this run
pub fn eligible_pool(participants: Vec<Participant>, context: &RunContext) -> Vec<Participant> {
    participants
        .into_iter()
        .filter(|p| {
            let eligible = p.is_eligible_this_run(context);
            if !eligible {
                debug!(participant = %p.identity(), week = context.week, "Skipped this week");
            }
            eligible
        })
        .collect()
}

/// Pairing Engine
pub struct PairingEngine {
    config: EngineConfig,
    rng: ChaCha8Rng,
}

impl PairingEngine {
    /// Create an engine with the ordered tie-break
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let rng = match (config.tie_break, config.seed) {
            (_, Some(seed)) => ChaCha8Rng::seed_from_u64(seed),
            (TieBreak::Random, None) => ChaCha8Rng::from_entropy(),
            (TieBreak::Ordered, None) => ChaCha8Rng::seed_from_u64(0),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Partition the pool into pairs and leftovers
    ///
    /// 1. Order the pool by total historical load (stable, ascending)
    /// 2. Pop the next participant; skip it if already paired
    /// 3. With availability modelling on, filter candidates by mutual acceptance
    /// 4. Rank by past pairings ascending, then shared days descending
    /// 5. Break exact ties per the configured tie-break
    /// 6. Pair both ways and drop the partner from the queue
    pub fn pair(&mut self, pool: &[Participant]) -> Result<PairingOutcome, PairingError> {
        let mut ordered: Vec<&Participant> = pool.iter().collect();
        ordered.sort_by_key(|p| p.total_historical_load());
        let mut queue: VecDeque<&Participant> = ordered.into();

        let mut pairings = PairingMap::new();
        let mut unmatched = Vec::new();

        info!(pool = pool.len(), tie_break = ?self.config.tie_break, "Pairing pool");

        while queue.len() > 1 {
            let Some(current) = queue.pop_front() else {
                break;
            };
            if pairings.is_paired(current.identity()) {
                continue;
            }

            let availability = self.config.availability;
            let candidates: Vec<usize> = queue
                .iter()
                .enumerate()
                .filter(|(_, c)| !pairings.is_paired(c.identity()))
                .filter(|(_, c)| !availability || (current.accepts(c) && c.accepts(current)))
                .map(|(i, _)| i)
                .collect();

            let Some(pick) = self.select(current, &queue, &candidates) else {
                debug!(participant = %current.identity(), "No acceptable candidate");
                unmatched.push(current.identity().clone());
                continue;
            };

            let Some(partner) = queue.remove(pick) else {
                unmatched.push(current.identity().clone());
                continue;
            };
            pairings.pair(current.identity(), partner.identity())?;

            debug!(
                participant = %current.identity(),
                partner = %partner.identity(),
                past_pairings = current.past_pairing_score(partner),
                "Paired"
            );
        }

        unmatched.extend(
            queue
                .into_iter()
                .filter(|p| !pairings.is_paired(p.identity()))
                .map(|p| p.identity().clone()),
        );

        info!(
            pairs = pairings.len(),
            unmatched = unmatched.len(),
            "Pairing complete"
        );

        Ok(PairingOutcome {
            pairings,
            unmatched,
        })
    }

    /// Lower ranks are better
    fn rank(&self, current: &Participant, candidate: &Participant) -> (u32, Reverse<usize>) {
        let overlap = if self.config.availability {
            current.availability_overlap(candidate)
        } else {
            0
        };
        (current.past_pairing_score(candidate), Reverse(overlap))
    }

    /// Pick a queue index among `candidates`, or `None` when there are none
    fn select(
        &mut self,
        current: &Participant,
        queue: &VecDeque<&Participant>,
        candidates: &[usize],
    ) -> Option<usize> {
        let best = candidates
            .iter()
            .map(|&i| self.rank(current, queue[i]))
            .min()?;

        let tied: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| self.rank(current, queue[i]) == best)
            .collect();

        match self.config.tie_break {
            TieBreak::Ordered => tied.first().copied(),
            TieBreak::Random => {
                let n = self.rng.gen_range(0..tied.len());
                tied.get(n).copied()
            }
        }
    }
}

impl Default for PairingEngine {
    fn default() -> Self {
        Self::new()
    }
}
