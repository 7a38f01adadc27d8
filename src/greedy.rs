use log::{info, trace};
use serde::{Deserialize, Serialize};

use crate::brush::BrushCatalog;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::problem::{Problem, Solution};
use crate::render::StrokeRenderer;
use crate::rng::SearchRng;
use crate::stroke::Stroke;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyConfig {
    /// strokes in the finished solution
    pub stroke_count: usize,
    /// random candidates scored per stroke slot
    pub candidates_per_stroke: usize,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            stroke_count: 300,
            candidates_per_stroke: 50,
        }
    }
}

impl GreedyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stroke_count == 0 {
            return Err(Error::InvalidConfig("greedy stroke_count must be positive".into()));
        }
        if self.candidates_per_stroke == 0 {
            return Err(Error::InvalidConfig("greedy candidates_per_stroke must be positive".into()));
        }
        Ok(())
    }
}

/// build a solution one stroke at a time. each slot draws `candidates_per_stroke`
/// fresh strokes, scores the whole sequence with each as the tail, and keeps the
/// first candidate reaching the lowest error. earlier strokes are never revisited.
pub fn build_greedy<R: StrokeRenderer>(
    problem: &Problem,
    evaluator: &mut Evaluator<'_, R>,
    rng: &mut SearchRng,
    brushes: &BrushCatalog,
    cfg: &GreedyConfig,
) -> Result<Solution> {
    profiling::scope!("build_greedy");
    cfg.validate()?;
    if brushes.is_empty() {
        return Err(Error::EmptyCatalog);
    }
    if !problem.is_valid() {
        return Err(Error::InvalidProblem { width: problem.width(), height: problem.height() });
    }

    // working buffer: committed strokes plus one trial slot at the end
    let mut strokes: Vec<Stroke> = Vec::with_capacity(cfg.stroke_count);
    let mut error = f64::INFINITY;

    for slot in 0..cfg.stroke_count {
        profiling::scope!("greedy_slot");
        strokes.push(Stroke::default());
        let mut best: Option<(Stroke, f64)> = None;

        for _ in 0..cfg.candidates_per_stroke {
            let candidate = Stroke::sample_random(rng, brushes)?;
            if let Some(tail) = strokes.last_mut() {
                *tail = candidate;
            }
            let e = evaluator.evaluate(&strokes)?;
            // strict: ties keep the earlier candidate
            if best.map_or(true, |(_, b)| e < b) {
                best = Some((candidate, e));
            }
        }

        let (chosen, chosen_error) = best.ok_or_else(|| Error::InvalidConfig("greedy produced no candidate".into()))?;
        if let Some(tail) = strokes.last_mut() {
            *tail = chosen;
        }
        // renderer is deterministic, so the winning score is the committed sequence's score
        error = chosen_error;
        trace!("greedy slot {slot}: mse {error:.3}");
    }

    info!("greedy built {} strokes, mse {:.4}", strokes.len(), error);
    Ok(Solution { strokes, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::evaluator::tests::{brush_renderer, DarkenRenderer};

    fn cfg(stroke_count: usize, candidates_per_stroke: usize) -> GreedyConfig {
        GreedyConfig { stroke_count, candidates_per_stroke }
    }

    #[test]
    fn test_rejects_non_positive_counts() {
        let problem = Problem::new(Canvas::new(4, 4)).unwrap();
        let brushes = BrushCatalog::procedural();
        let mut ev = Evaluator::new(&problem, brush_renderer()).unwrap();
        let mut rng = SearchRng::new(1);
        for bad in [cfg(0, 5), cfg(5, 0)] {
            let err = build_greedy(&problem, &mut ev, &mut rng, &brushes, &bad).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)));
        }
    }

    #[test]
    fn test_rejects_empty_catalog() {
        let problem = Problem::new(Canvas::new(4, 4)).unwrap();
        let mut ev = Evaluator::new(&problem, brush_renderer()).unwrap();
        let mut rng = SearchRng::new(1);
        let err = build_greedy(&problem, &mut ev, &mut rng, &BrushCatalog::default(), &cfg(2, 2)).unwrap_err();
        assert!(matches!(err, Error::EmptyCatalog));
    }

    #[test]
    fn test_cached_error_matches_fresh_evaluation() {
        let problem = Problem::new(Canvas::filled(16, 12, [40, 90, 160])).unwrap();
        let brushes = BrushCatalog::procedural();
        let mut ev = Evaluator::new(&problem, brush_renderer()).unwrap();
        let mut rng = SearchRng::new(12345);
        let sol = build_greedy(&problem, &mut ev, &mut rng, &brushes, &cfg(6, 4)).unwrap();
        assert_eq!(sol.len(), 6);
        assert_eq!(ev.evaluate(&sol.strokes).unwrap(), sol.error);
        // one evaluation per candidate, plus the check above
        assert_eq!(ev.evaluations(), 6 * 4 + 1);
    }

    #[test]
    fn test_same_seed_same_solution() {
        let problem = Problem::new(Canvas::filled(12, 12, [200, 30, 30])).unwrap();
        let brushes = BrushCatalog::procedural();
        let run = |seed| {
            let mut ev = Evaluator::new(&problem, brush_renderer()).unwrap();
            let mut rng = SearchRng::new(seed);
            build_greedy(&problem, &mut ev, &mut rng, &brushes, &cfg(5, 3)).unwrap()
        };
        let a = run(77);
        let b = run(77);
        assert_eq!(a.strokes, b.strokes);
        assert_eq!(a.error.to_bits(), b.error.to_bits());
    }

    #[test]
    fn test_prefix_is_shared_across_lengths() {
        // the same seed draws the same candidates, so a longer build extends a shorter one
        let problem = Problem::new(Canvas::filled(10, 10, [10, 10, 10])).unwrap();
        let brushes = BrushCatalog::procedural();
        let build = |n| {
            let mut ev = Evaluator::new(&problem, brush_renderer()).unwrap();
            let mut rng = SearchRng::new(5);
            build_greedy(&problem, &mut ev, &mut rng, &brushes, &cfg(n, 3)).unwrap()
        };
        let short = build(3);
        let long = build(5);
        assert_eq!(&long.strokes[..3], &short.strokes[..]);
    }

    #[test]
    fn test_error_is_monotone_under_darkening_compositor() {
        let problem = Problem::new(Canvas::filled(6, 6, [0, 0, 0])).unwrap();
        let brushes = BrushCatalog::procedural();
        let mut previous = f64::INFINITY;
        for k in 1..=8 {
            let mut ev = Evaluator::new(&problem, DarkenRenderer).unwrap();
            let mut rng = SearchRng::new(12345);
            let sol = build_greedy(&problem, &mut ev, &mut rng, &brushes, &cfg(k, 3)).unwrap();
            assert!(sol.error <= previous, "k={k}: {} > {previous}", sol.error);
            previous = sol.error;
        }
    }

    #[test]
    fn test_best_candidate_is_kept() {
        // with one candidate per slot the result is exactly the sampled sequence
        let problem = Problem::new(Canvas::new(8, 8)).unwrap();
        let brushes = BrushCatalog::procedural();
        let mut ev = Evaluator::new(&problem, brush_renderer()).unwrap();
        let mut rng = SearchRng::new(9);
        let sol = build_greedy(&problem, &mut ev, &mut rng, &brushes, &cfg(3, 1)).unwrap();

        let mut replay = SearchRng::new(9);
        let expected: Vec<Stroke> = (0..3).map(|_| Stroke::sample_random(&mut replay, &brushes).unwrap()).collect();
        assert_eq!(sol.strokes, expected);
    }

    #[test]
    fn test_one_by_one_target() {
        let problem = Problem::new(Canvas::filled(1, 1, [128, 64, 32])).unwrap();
        let brushes = BrushCatalog::procedural();
        let mut ev = Evaluator::new(&problem, brush_renderer()).unwrap();
        let mut rng = SearchRng::new(12345);
        let sol = build_greedy(&problem, &mut ev, &mut rng, &brushes, &cfg(1, 5)).unwrap();
        assert!(sol.error.is_finite() && sol.error >= 0.0);
    }
}
