//! Approximate a target image with an ordered list of brush strokes.
//!
//! A greedy constructor lays strokes down one at a time, then a tabu search
//! refiner perturbs single stroke attributes to lower the mean squared error
//! against the target. Both phases share one seeded random source, so a run
//! is reproducible from its seed.

pub mod brush;
pub mod canvas;
pub mod error;
pub mod evaluator;
pub mod fitness;
pub mod greedy;
pub mod mutate;
pub mod pipeline;
pub mod problem;
pub mod render;
pub mod rng;
pub mod settings;
pub mod stroke;
pub mod tabu;

pub use brush::{BrushCatalog, BrushMask, SharedCatalog};
pub use canvas::Canvas;
pub use error::{Error, Result, Stage};
pub use evaluator::Evaluator;
pub use greedy::{build_greedy, GreedyConfig};
pub use pipeline::{render_solution, run, RunReport};
pub use problem::{Problem, Solution};
pub use render::{BrushRenderer, StrokeRenderer};
pub use rng::SearchRng;
pub use settings::RunSettings;
pub use stroke::{Attribute, Stroke};
pub use tabu::{run_tabu_search, TabuConfig, TabuOutcome, TabuStats};
