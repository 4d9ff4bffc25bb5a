//! Scoring strategies for tiebreaks. Each strategy scores the current working
//! list independently; the chain runner in `tiebreaker` does the sorting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::warn;

use crate::domain::context::EvaluationContext;
use crate::domain::evaluation::{AssigneeType, Candidate};
use crate::domain::rule::OrderStrategy;
use crate::routing::ports::{GeoQuery, LoadQuery, PortError, RoundRobinCursor};

/// Distance assigned to vendors and to teams whose distance is unknown.
pub const FAR_AWAY: f64 = f64::MAX;

#[async_trait]
pub trait CandidateScorer: Send + Sync {
    /// One score per candidate, in input order. Lower scores rank first.
    async fn score(&self, ctx: &EvaluationContext, candidates: &[Candidate]) -> Vec<f64>;
}

/// Keeps the listed order: each candidate scores its index.
pub struct AsListedScorer;

#[async_trait]
impl CandidateScorer for AsListedScorer {
    async fn score(&self, _ctx: &EvaluationContext, candidates: &[Candidate]) -> Vec<f64> {
        index_scores(candidates.len())
    }
}

pub struct LeastLoadScorer {
    load: Arc<dyn LoadQuery>,
}

impl LeastLoadScorer {
    pub fn new(load: Arc<dyn LoadQuery>) -> Self {
        Self { load }
    }
}

#[async_trait]
impl CandidateScorer for LeastLoadScorer {
    async fn score(&self, ctx: &EvaluationContext, candidates: &[Candidate]) -> Vec<f64> {
        let mut scores = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let score = match candidate.kind {
                AssigneeType::Vendor => 0.0,
                AssigneeType::Team => match self.load.current_open_load(&candidate.id).await {
                    Ok(load) => load,
                    Err(error) => {
                        warn!(
                            event_name = "routing.tiebreak.load_unavailable",
                            contract_version_id = %ctx.contract_version_id,
                            team_id = %candidate.id,
                            error = %error,
                            "open load query failed, scoring team as idle"
                        );
                        0.0
                    }
                },
            };
            scores.push(score);
        }
        scores
    }
}

pub struct NearestScorer {
    geo: Arc<dyn GeoQuery>,
}

impl NearestScorer {
    pub fn new(geo: Arc<dyn GeoQuery>) -> Self {
        Self { geo }
    }
}

#[async_trait]
impl CandidateScorer for NearestScorer {
    async fn score(&self, ctx: &EvaluationContext, candidates: &[Candidate]) -> Vec<f64> {
        let Some(location_id) = ctx.location_id.as_deref() else {
            return vec![FAR_AWAY; candidates.len()];
        };

        let mut scores = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let score = match candidate.kind {
                AssigneeType::Vendor => FAR_AWAY,
                AssigneeType::Team => {
                    match self.geo.distance(&candidate.id, Some(location_id)).await {
                        Ok(distance) => distance,
                        Err(error) => {
                            warn!(
                                event_name = "routing.tiebreak.distance_unavailable",
                                contract_version_id = %ctx.contract_version_id,
                                team_id = %candidate.id,
                                error = %error,
                                "distance query failed, deprioritizing team"
                            );
                            FAR_AWAY
                        }
                    }
                }
            };
            scores.push(score);
        }
        scores
    }
}

pub struct RoundRobinScorer {
    cursor: Arc<dyn RoundRobinCursor>,
}

impl RoundRobinScorer {
    pub fn new(cursor: Arc<dyn RoundRobinCursor>) -> Self {
        Self { cursor }
    }
}

#[async_trait]
impl CandidateScorer for RoundRobinScorer {
    /// Scores are positions after rotating the list left by the cursor.
    async fn score(&self, ctx: &EvaluationContext, candidates: &[Candidate]) -> Vec<f64> {
        let len = candidates.len();
        if len == 0 {
            return Vec::new();
        }

        let key = ctx.round_robin_key();
        let offset = match self.cursor.advance(&key, len).await {
            Ok(offset) => offset % len,
            Err(error) => {
                warn!(
                    event_name = "routing.tiebreak.cursor_unavailable",
                    cursor_key = %key,
                    error = %error,
                    "round-robin cursor unavailable, keeping current order"
                );
                0
            }
        };

        (0..len).map(|index| ((index + len - offset) % len) as f64).collect()
    }
}

/// Process-local round-robin cursor. State is lost on restart and not shared
/// between instances; use the database-backed cursor for either.
#[derive(Debug, Default)]
pub struct InMemoryRoundRobinCursor {
    positions: Mutex<HashMap<String, usize>>,
}

#[async_trait]
impl RoundRobinCursor for InMemoryRoundRobinCursor {
    async fn advance(&self, key: &str, len: usize) -> Result<usize, PortError> {
        if len == 0 {
            return Ok(0);
        }

        let mut positions = self
            .positions
            .lock()
            .map_err(|_| PortError::Backend("round-robin cursor lock is poisoned".to_string()))?;
        let cursor = positions.entry(key.to_owned()).or_insert(0);
        let offset = *cursor % len;
        *cursor = (*cursor + 1) % len;
        Ok(offset)
    }
}

/// Maps each ordering strategy to its scorer.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    scorers: HashMap<OrderStrategy, Arc<dyn CandidateScorer>>,
}

impl StrategyRegistry {
    pub fn standard(
        load: Arc<dyn LoadQuery>,
        geo: Arc<dyn GeoQuery>,
        cursor: Arc<dyn RoundRobinCursor>,
    ) -> Self {
        Self::default()
            .with_scorer(OrderStrategy::AsListed, Arc::new(AsListedScorer))
            .with_scorer(OrderStrategy::LeastLoad, Arc::new(LeastLoadScorer::new(load)))
            .with_scorer(OrderStrategy::Nearest, Arc::new(NearestScorer::new(geo)))
            .with_scorer(OrderStrategy::RoundRobin, Arc::new(RoundRobinScorer::new(cursor)))
    }

    pub fn with_scorer(mut self, strategy: OrderStrategy, scorer: Arc<dyn CandidateScorer>) -> Self {
        self.scorers.insert(strategy, scorer);
        self
    }

    pub fn get(&self, strategy: OrderStrategy) -> Option<&Arc<dyn CandidateScorer>> {
        self.scorers.get(&strategy)
    }
}

pub(crate) fn index_scores(len: usize) -> Vec<f64> {
    (0..len).map(|index| index as f64).collect()
}
