//! Tabu search refinement over a fixed-length stroke list.
//!
//! Each iteration perturbs one attribute of one stroke per neighbour, scores the
//! whole neighbourhood, and moves to the best admissible neighbour even when it
//! is worse than the current solution.
//!
//! # Mechanisms
//!
//! 1.  **Tabu memory:** a FIFO of `(stroke index, attribute)` pairs with an
//!     expiry iteration. A pair changed at iteration `t` is tabu for
//!     `t+1 ..= t+tenure`.
//! 2.  **Aspiration:** a tabu move is still admissible when its error is
//!     strictly below the best error found so far.
//! 3.  **Adaptive step scale:** perturbation amplitude grows ×1.1 on every new
//!     best and shrinks ×0.8 after `iterations_to_reduce_step` iterations
//!     without one, always within [0.1, 2.0].
//!
//! Stroke indices are the stroke identity here. Refinement never inserts,
//! removes or reorders strokes, which keeps the memory's keys valid.

use std::collections::VecDeque;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::brush::BrushCatalog;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::mutate::{perturb, select_attribute};
use crate::problem::{Problem, Solution};
use crate::render::StrokeRenderer;
use crate::rng::SearchRng;
use crate::stroke::{Attribute, Stroke};

pub const STEP_SCALE_INITIAL: f32 = 1.0;
pub const STEP_SCALE_MIN: f32 = 0.1;
pub const STEP_SCALE_MAX: f32 = 2.0;
pub const STEP_SCALE_GROW: f32 = 1.1;
pub const STEP_SCALE_SHRINK: f32 = 0.8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabuConfig {
    /// iteration budget; 0 returns the input unchanged
    pub max_iterations: usize,
    /// iterations a changed (stroke, attribute) pair stays tabu
    pub tenure: usize,
    /// neighbours generated and scored per iteration
    pub neighborhood_size: usize,
    /// stop after this many consecutive iterations without a new best
    pub max_no_improve: usize,
    /// shrink the step scale after this many iterations without a new best
    pub iterations_to_reduce_step: usize,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tenure: 20,
            neighborhood_size: 30,
            max_no_improve: 200,
            iterations_to_reduce_step: 25,
        }
    }
}

impl TabuConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("tenure", self.tenure),
            ("neighborhood_size", self.neighborhood_size),
            ("max_no_improve", self.max_no_improve),
            ("iterations_to_reduce_step", self.iterations_to_reduce_step),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("tabu {name} must be positive")));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TabuEntry {
    pub stroke: usize,
    pub attribute: Attribute,
    /// last iteration at which the pair is still tabu
    pub expires: usize,
}

/// short-term memory of recently changed (stroke, attribute) pairs.
/// tenure is constant, so entries arrive in expiry order and expire from the front.
#[derive(Clone, Debug, Default)]
pub struct TabuMemory {
    entries: VecDeque<TabuEntry>,
}

impl TabuMemory {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_tabu(&self, stroke: usize, attribute: Attribute, iteration: usize) -> bool {
        self.entries
            .iter()
            .any(|e| e.stroke == stroke && e.attribute == attribute && e.expires >= iteration)
    }

    /// record a pair changed at `iteration` and drop entries that have expired by then
    pub fn insert(&mut self, stroke: usize, attribute: Attribute, iteration: usize, tenure: usize) {
        self.entries.push_back(TabuEntry {
            stroke,
            attribute,
            expires: iteration + tenure,
        });
        self.prune(iteration);
    }

    pub fn prune(&mut self, iteration: usize) {
        while self.entries.front().is_some_and(|e| e.expires < iteration) {
            self.entries.pop_front();
        }
    }

    /// admissibility with aspiration: tabu pairs pass only when they beat the best known error
    #[inline]
    pub fn admits(&self, stroke: usize, attribute: Attribute, iteration: usize, error: f64, best_error: f64) -> bool {
        !self.is_tabu(stroke, attribute, iteration) || error < best_error
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// perturbation amplitude multiplier, kept within [STEP_SCALE_MIN, STEP_SCALE_MAX]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepScale(f32);

impl Default for StepScale {
    fn default() -> Self {
        StepScale(STEP_SCALE_INITIAL)
    }
}

impl StepScale {
    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }

    pub fn grow(&mut self) {
        self.0 = (self.0 * STEP_SCALE_GROW).min(STEP_SCALE_MAX);
    }

    pub fn shrink(&mut self) {
        self.0 = (self.0 * STEP_SCALE_SHRINK).max(STEP_SCALE_MIN);
    }
}

/// one scored single-attribute move
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub stroke: usize,
    pub attribute: Attribute,
    pub replacement: Stroke,
    pub error: f64,
}

/// lowest-error admissible neighbour; the first one wins ties
pub fn select_move<'a>(
    neighbors: &'a [Neighbor],
    memory: &TabuMemory,
    iteration: usize,
    best_error: f64,
) -> Option<&'a Neighbor> {
    let mut chosen: Option<&Neighbor> = None;
    for n in neighbors {
        if !memory.admits(n.stroke, n.attribute, iteration, n.error, best_error) {
            continue;
        }
        if chosen.map_or(true, |c| n.error < c.error) {
            chosen = Some(n);
        }
    }
    chosen
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    IterationBudget,
    NoImprovementLimit,
    NoAdmissibleMove,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabuStats {
    pub iterations: usize,
    pub improvements: usize,
    pub evaluations: u64,
    pub final_step_scale: f32,
    pub min_step_scale: f32,
    pub max_step_scale: f32,
    pub stop: StopReason,
}

#[derive(Clone, Debug)]
pub struct TabuOutcome {
    pub best: Solution,
    pub stats: TabuStats,
}

/// refine `initial` and return the best solution seen, never worse than the input.
/// the input's cached error is not trusted; it is re-evaluated before searching.
pub fn run_tabu_search<R: StrokeRenderer>(
    problem: &Problem,
    evaluator: &mut Evaluator<'_, R>,
    rng: &mut SearchRng,
    brushes: &BrushCatalog,
    initial: &Solution,
    cfg: &TabuConfig,
) -> Result<TabuOutcome> {
    profiling::scope!("run_tabu_search");
    if !problem.is_valid() {
        return Err(Error::InvalidProblem { width: problem.width(), height: problem.height() });
    }
    if initial.is_empty() {
        return Err(Error::EmptySolution);
    }
    cfg.validate()?;

    let evaluations_before = evaluator.evaluations();
    let mut current = initial.clone();
    evaluator.evaluate_solution(&mut current)?;
    let mut best = current.clone();

    let mut memory = TabuMemory::new();
    let mut scale = StepScale::default();
    let mut min_scale = scale.get();
    let mut max_scale = scale.get();
    let mut since_last_improvement = 0usize;
    let mut without_improvement = 0usize;
    let mut improvements = 0usize;
    let mut iterations = 0usize;
    let mut stop = StopReason::IterationBudget;

    // scratch copy of the current strokes; each neighbour swaps one slot in and back out
    let mut work = current.strokes.clone();
    let mut neighbors: Vec<Neighbor> = Vec::with_capacity(cfg.neighborhood_size);

    for iteration in 0..cfg.max_iterations {
        profiling::scope!("tabu_iteration");
        neighbors.clear();

        for _ in 0..cfg.neighborhood_size {
            let stroke = rng.index(current.strokes.len());
            let attribute = select_attribute(rng);
            let replacement = perturb(&current.strokes[stroke], attribute, rng, scale.get(), brushes.len());

            let original = std::mem::replace(&mut work[stroke], replacement);
            let scored = evaluator.evaluate(&work);
            work[stroke] = original;

            neighbors.push(Neighbor { stroke, attribute, replacement, error: scored? });
        }

        let Some(&mv) = select_move(&neighbors, &memory, iteration, best.error) else {
            stop = StopReason::NoAdmissibleMove;
            break;
        };

        current.strokes[mv.stroke] = mv.replacement;
        work[mv.stroke] = mv.replacement;
        current.error = mv.error;
        memory.insert(mv.stroke, mv.attribute, iteration, cfg.tenure);
        // counts committed moves only
        iterations = iteration + 1;

        if current.error < best.error {
            best = current.clone();
            improvements += 1;
            since_last_improvement = 0;
            without_improvement = 0;
            scale.grow();
            debug!(
                "tabu iter {iteration}: new best {:.4} ({:?} of stroke {}), step scale {:.3}",
                best.error,
                mv.attribute,
                mv.stroke,
                scale.get()
            );
        } else {
            since_last_improvement += 1;
            without_improvement += 1;
            if since_last_improvement >= cfg.iterations_to_reduce_step {
                scale.shrink();
                since_last_improvement = 0;
                debug!("tabu iter {iteration}: stalled, step scale {:.3}", scale.get());
            }
        }
        min_scale = min_scale.min(scale.get());
        max_scale = max_scale.max(scale.get());

        if without_improvement >= cfg.max_no_improve {
            stop = StopReason::NoImprovementLimit;
            break;
        }
    }

    let stats = TabuStats {
        iterations,
        improvements,
        evaluations: evaluator.evaluations() - evaluations_before,
        final_step_scale: scale.get(),
        min_step_scale: min_scale,
        max_step_scale: max_scale,
        stop,
    };
    info!(
        "tabu finished after {} iterations ({:?}): mse {:.4}, {} improvements",
        stats.iterations, stats.stop, best.error, stats.improvements
    );
    Ok(TabuOutcome { best, stats })
}
