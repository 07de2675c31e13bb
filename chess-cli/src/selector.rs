//! Picks the engine's move, sometimes deliberately weaker than its best.

use chess::Game;
use cozy_chess::Move;
use engine::{Engine, EngineError, SearchLimits};
use rand::Rng;

/// How many ranked candidates are requested when a weaker move is wanted.
pub const CANDIDATE_COUNT: u8 = 10;

/// How often the engine plays its best move, as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Accuracy(u8);

impl Accuracy {
    pub const PERFECT: Accuracy = Accuracy(100);

    /// `None` above 100.
    pub fn new(percent: u8) -> Option<Self> {
        (percent <= 100).then_some(Self(percent))
    }

    /// Probability of trying a weaker move: `1 - accuracy / 100`.
    pub fn weaker_move_probability(self) -> f64 {
        1.0 - f64::from(self.0) / 100.0
    }
}

impl Default for Accuracy {
    fn default() -> Self {
        Self::PERFECT
    }
}

impl std::fmt::Display for Accuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Choose the engine's next move for `game`.
///
/// The best move is always computed first. With probability
/// [`Accuracy::weaker_move_probability`] the engine is then asked for its top
/// [`CANDIDATE_COUNT`] moves and one from the weaker half is played instead.
#[tracing::instrument(level = "debug", skip(engine, game, rng))]
pub async fn choose_move<E, R>(
    engine: &mut E,
    game: &Game,
    limits: SearchLimits,
    accuracy: Accuracy,
    rng: &mut R,
) -> Result<Move, EngineError>
where
    E: Engine + ?Sized,
    R: Rng + ?Sized,
{
    let best = engine.best_move(game, limits).await?;

    let roll: f64 = rng.random();
    if roll >= accuracy.weaker_move_probability() {
        return Ok(best);
    }

    let candidates = engine
        .ranked_candidates(game, limits, CANDIDATE_COUNT)
        .await?;
    match pick_weaker(&candidates, rng) {
        Some(mv) => {
            tracing::debug!(
                best = %game.format_move(best),
                chosen = %game.format_move(mv),
                candidates = candidates.len(),
                "Playing a weaker candidate"
            );
            Ok(mv)
        }
        None => Ok(best),
    }
}

/// Uniform pick from the weaker half `[len / 2, len)` of a best-first list.
/// `None` with fewer than two candidates.
pub fn pick_weaker<R: Rng + ?Sized>(candidates: &[Move], rng: &mut R) -> Option<Move> {
    if candidates.len() < 2 {
        return None;
    }
    let index = rng.random_range(candidates.len() / 2..candidates.len());
    candidates.get(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{MockCall, MockEngine};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    fn limits() -> SearchLimits {
        SearchLimits::new(Duration::from_millis(50), 5)
    }

    fn accuracy(percent: u8) -> Accuracy {
        Accuracy::new(percent).unwrap()
    }

    const RANKED: [&str; 10] = [
        "e2e4", "d2d4", "g1f3", "c2c4", "e2e3", "b1c3", "g2g3", "d2d3", "c2c3", "a2a3",
    ];

    #[test]
    fn test_accuracy_bounds() {
        assert_eq!(Accuracy::new(101), None);
        assert_eq!(Accuracy::default(), Accuracy::PERFECT);
        assert_eq!(accuracy(100).weaker_move_probability(), 0.0);
        assert_eq!(accuracy(0).weaker_move_probability(), 1.0);
        assert_eq!(accuracy(75).to_string(), "75%");
    }

    #[test]
    fn test_pick_weaker_needs_two_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        let game = Game::new();
        let one = game.resolve_move("e2e4").unwrap();
        assert_eq!(pick_weaker(&[], &mut rng), None);
        assert_eq!(pick_weaker(&[one], &mut rng), None);
    }

    #[test]
    fn test_pick_weaker_stays_in_lower_half() {
        let game = Game::new();
        let moves: Vec<Move> = RANKED.iter().map(|m| game.resolve_move(m).unwrap()).collect();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_weaker(&moves, &mut rng).unwrap();
            let index = moves.iter().position(|&m| m == picked).unwrap();
            assert!((5..10).contains(&index), "seed {seed} picked index {index}");
        }

        let pair: Vec<Move> = moves[..2].to_vec();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_weaker(&pair, &mut rng), Some(moves[1]));
    }

    #[tokio::test]
    async fn test_perfect_accuracy_never_asks_for_candidates() {
        let game = Game::new();
        let mut engine = MockEngine::new();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mv = choose_move(&mut engine, &game, limits(), Accuracy::PERFECT, &mut rng)
                .await
                .unwrap();
            assert!(game.is_legal(mv));
        }
        assert!(engine
            .get_calls()
            .iter()
            .all(|call| matches!(call, MockCall::BestMove { .. })));
    }

    #[tokio::test]
    async fn test_zero_accuracy_plays_weaker_half() {
        let game = Game::new();
        for seed in 0..50 {
            let mut engine = MockEngine::new()
                .with_best_moves(["e2e4"])
                .with_candidates(RANKED);
            let mut rng = StdRng::seed_from_u64(seed);
            let mv = choose_move(&mut engine, &game, limits(), accuracy(0), &mut rng)
                .await
                .unwrap();

            let text = game.format_move(mv);
            assert!(RANKED[5..].contains(&text.as_str()), "seed {seed} chose {text}");
            assert_eq!(
                engine.get_calls(),
                vec![
                    MockCall::BestMove { moves: vec![] },
                    MockCall::RankedCandidates {
                        moves: vec![],
                        count: CANDIDATE_COUNT
                    },
                ]
            );
        }
    }

    #[tokio::test]
    async fn test_single_candidate_falls_back_to_best() {
        let game = Game::new();
        let mut engine = MockEngine::new()
            .with_best_moves(["d2d4"])
            .with_candidates(["e2e4"]);
        let mut rng = StdRng::seed_from_u64(3);
        let mv = choose_move(&mut engine, &game, limits(), accuracy(0), &mut rng)
            .await
            .unwrap();
        assert_eq!(game.format_move(mv), "d2d4");
    }

    #[tokio::test]
    async fn test_engine_errors_propagate() {
        let game = Game::new();
        let mut engine = MockEngine::new();
        engine.shutdown().await.unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let result = choose_move(&mut engine, &game, limits(), accuracy(50), &mut rng).await;
        assert!(matches!(result, Err(EngineError::ShutDown)));
    }
}
