use tracing::{debug, warn};

use crate::domain::context::EvaluationContext;
use crate::domain::evaluation::{Candidate, CandidateScore, TraceEntry};
use crate::domain::rule::OrderStrategy;
use crate::errors::DomainError;
use crate::routing::strategies::{index_scores, StrategyRegistry};

pub const DEFAULT_CHAIN: [OrderStrategy; 3] =
    [OrderStrategy::LeastLoad, OrderStrategy::Nearest, OrderStrategy::RoundRobin];

#[derive(Clone, Debug, PartialEq)]
pub struct TiebreakOutcome {
    pub winner: Candidate,
    pub trace: Vec<TraceEntry>,
}

/// Narrows several eligible candidates to one by running a chain of scoring
/// strategies. An explicit order runs alone; no order runs the default chain.
/// Each step re-sorts the previous step's output by `(score, id)` ascending;
/// the head of the final list wins.
#[derive(Clone)]
pub struct TiebreakerEngine {
    registry: StrategyRegistry,
}

impl TiebreakerEngine {
    pub fn new(registry: StrategyRegistry) -> Self {
        Self { registry }
    }

    pub async fn pick(
        &self,
        ctx: &EvaluationContext,
        candidates: Vec<Candidate>,
        strategy: Option<OrderStrategy>,
    ) -> Result<TiebreakOutcome, DomainError> {
        if let [only] = candidates.as_slice() {
            return Ok(TiebreakOutcome { winner: only.clone(), trace: Vec::new() });
        }

        // An explicit order, `as_listed` included, runs alone.
        let (chain, mut trace) = match strategy {
            Some(explicit) => (vec![explicit], Vec::new()),
            None => (DEFAULT_CHAIN.to_vec(), vec![TraceEntry::default_chain_marker()]),
        };

        let mut working = candidates;
        for step in chain {
            let scores = self.score(step, ctx, &working).await;
            let mut ranked: Vec<(Candidate, f64)> = working.into_iter().zip(scores).collect();
            ranked.sort_by(|(left, left_score), (right, right_score)| {
                left_score.total_cmp(right_score).then_with(|| left.id.cmp(&right.id))
            });

            let winner_id = ranked.first().map(|(candidate, _)| candidate.id.clone());
            debug!(
                event_name = "routing.tiebreak.step",
                strategy = step.as_str(),
                winner_id = winner_id.as_deref().unwrap_or("none"),
                candidates = ranked.len(),
                "tiebreak step ranked candidates"
            );
            trace.push(TraceEntry {
                strategy: step.into(),
                scores: Some(
                    ranked
                        .iter()
                        .map(|(candidate, score)| CandidateScore {
                            candidate_id: candidate.id.clone(),
                            score: *score,
                        })
                        .collect(),
                ),
                winner_id,
            });
            working = ranked.into_iter().map(|(candidate, _)| candidate).collect();
        }

        let winner = working.into_iter().next().ok_or_else(|| {
            DomainError::InvariantViolation("tiebreak requires at least one candidate".to_string())
        })?;
        Ok(TiebreakOutcome { winner, trace })
    }

    async fn score(
        &self,
        strategy: OrderStrategy,
        ctx: &EvaluationContext,
        candidates: &[Candidate],
    ) -> Vec<f64> {
        let Some(scorer) = self.registry.get(strategy) else {
            warn!(
                event_name = "routing.tiebreak.strategy_unregistered",
                strategy = strategy.as_str(),
                "no scorer registered, keeping current order"
            );
            return index_scores(candidates.len());
        };

        let scores = scorer.score(ctx, candidates).await;
        if scores.len() != candidates.len() {
            warn!(
                event_name = "routing.tiebreak.score_mismatch",
                strategy = strategy.as_str(),
                expected = candidates.len(),
                actual = scores.len(),
                "scorer returned wrong number of scores, keeping current order"
            );
            return index_scores(candidates.len());
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::TiebreakerEngine;
    use crate::domain::evaluation::{Candidate, TraceStrategy};
    use crate::domain::rule::OrderStrategy;
    use crate::errors::DomainError;
    use crate::routing::strategies::{InMemoryRoundRobinCursor, StrategyRegistry, FAR_AWAY};
    use crate::routing::testing::{context, FakeGeo, FakeLoad};

    fn engine(load: FakeLoad, geo: FakeGeo) -> TiebreakerEngine {
        TiebreakerEngine::new(StrategyRegistry::standard(
            Arc::new(load),
            Arc::new(geo),
            Arc::new(InMemoryRoundRobinCursor::default()),
        ))
    }

    #[tokio::test]
    async fn least_load_picks_lowest_load() {
        let engine = engine(FakeLoad::default().with("A", 3.0).with("B", 1.0), FakeGeo::default());

        let outcome = engine
            .pick(
                &context(),
                vec![Candidate::team("A"), Candidate::team("B")],
                Some(OrderStrategy::LeastLoad),
            )
            .await
            .expect("pick");

        assert_eq!(outcome.winner, Candidate::team("B"));
        assert_eq!(outcome.trace.len(), 1);
        assert_eq!(outcome.trace[0].strategy, TraceStrategy::LeastLoad);
        assert_eq!(outcome.trace[0].winner_id.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn least_load_falls_back_to_smallest_id_when_queries_fail() {
        let engine =
            engine(FakeLoad::default().failing("B").failing("A"), FakeGeo::default());

        let outcome = engine
            .pick(
                &context(),
                vec![Candidate::team("B"), Candidate::team("A")],
                Some(OrderStrategy::LeastLoad),
            )
            .await
            .expect("pick");

        assert_eq!(outcome.winner, Candidate::team("A"));
    }

    #[tokio::test]
    async fn nearest_prefers_team_with_known_distance_over_vendor() {
        let engine = engine(FakeLoad::default(), FakeGeo::default().with("team-z", 900.0));

        let outcome = engine
            .pick(
                &context(),
                vec![Candidate::vendor("v-1"), Candidate::team("team-z")],
                Some(OrderStrategy::Nearest),
            )
            .await
            .expect("pick");

        assert_eq!(outcome.winner, Candidate::team("team-z"));
        let scores = outcome.trace[0].scores.as_ref().expect("scores recorded");
        assert_eq!(scores[1].candidate_id, "v-1");
        assert_eq!(scores[1].score, FAR_AWAY);
    }

    #[tokio::test]
    async fn round_robin_rotates_through_candidates_and_wraps() {
        let engine = engine(FakeLoad::default(), FakeGeo::default());
        let candidates = vec![Candidate::team("t1"), Candidate::team("t2"), Candidate::team("t3")];

        let mut winners = Vec::new();
        for _ in 0..4 {
            let outcome = engine
                .pick(&context(), candidates.clone(), Some(OrderStrategy::RoundRobin))
                .await
                .expect("pick");
            winners.push(outcome.winner.id);
        }

        assert_eq!(winners, vec!["t1", "t2", "t3", "t1"]);
    }

    #[tokio::test]
    async fn omitted_strategy_runs_default_chain_with_marker() {
        let engine = engine(
            FakeLoad::default().with("t1", 5.0).with("t2", 5.0),
            FakeGeo::default().with("t1", 2.0).with("t2", 1.0),
        );

        let outcome = engine
            .pick(&context(), vec![Candidate::team("t1"), Candidate::team("t2")], None)
            .await
            .expect("pick");

        let steps: Vec<TraceStrategy> = outcome.trace.iter().map(|entry| entry.strategy).collect();
        assert_eq!(
            steps,
            vec![
                TraceStrategy::DefaultChain,
                TraceStrategy::LeastLoad,
                TraceStrategy::Nearest,
                TraceStrategy::RoundRobin,
            ]
        );
        assert!(outcome.trace[0].scores.is_none());
        assert!(outcome.trace[0].winner_id.is_none());
        assert_eq!(outcome.trace[2].winner_id.as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn as_listed_keeps_listed_order_in_one_pass() {
        let engine = engine(FakeLoad::default().with("b", 9.0).with("a", 1.0), FakeGeo::default());
        let candidates = vec![Candidate::team("b"), Candidate::team("a")];

        for _ in 0..3 {
            let outcome = engine
                .pick(&context(), candidates.clone(), Some(OrderStrategy::AsListed))
                .await
                .expect("pick");

            assert_eq!(outcome.winner, Candidate::team("b"));
            assert_eq!(outcome.trace.len(), 1);
            assert_eq!(outcome.trace[0].strategy, TraceStrategy::AsListed);
            let scores = outcome.trace[0].scores.as_ref().expect("scores recorded");
            assert_eq!(scores[0].candidate_id, "b");
            assert_eq!(scores[0].score, 0.0);
            assert_eq!(scores[1].score, 1.0);
        }
    }

    #[tokio::test]
    async fn default_chain_winner_is_head_after_round_robin_step() {
        let engine = engine(FakeLoad::default(), FakeGeo::default().with("b", 1.0).with("a", 2.0));

        let first = engine
            .pick(&context(), vec![Candidate::team("a"), Candidate::team("b")], None)
            .await
            .expect("pick");
        let second = engine
            .pick(&context(), vec![Candidate::team("a"), Candidate::team("b")], None)
            .await
            .expect("pick");

        // nearest orders [b, a]; round robin then rotates by 0, then by 1
        assert_eq!(first.winner.id, "b");
        assert_eq!(second.winner.id, "a");
    }

    #[tokio::test]
    async fn explicit_strategy_is_idempotent_across_calls() {
        let engine = engine(FakeLoad::default().with("x", 2.0).with("y", 7.0), FakeGeo::default());
        let candidates = vec![Candidate::team("y"), Candidate::team("x")];

        let first = engine
            .pick(&context(), candidates.clone(), Some(OrderStrategy::LeastLoad))
            .await
            .expect("pick");
        let second =
            engine.pick(&context(), candidates, Some(OrderStrategy::LeastLoad)).await.expect("pick");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn singleton_wins_without_trace_and_empty_list_is_rejected() {
        let engine = engine(FakeLoad::default(), FakeGeo::default());

        let outcome = engine
            .pick(&context(), vec![Candidate::vendor("v-1")], Some(OrderStrategy::RoundRobin))
            .await
            .expect("pick");
        assert_eq!(outcome.winner, Candidate::vendor("v-1"));
        assert!(outcome.trace.is_empty());

        let error = engine.pick(&context(), Vec::new(), None).await.expect_err("empty list");
        assert!(matches!(error, DomainError::InvariantViolation(_)));
    }
}
