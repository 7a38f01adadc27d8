use std::sync::Arc;
use std::time::Instant;

use log::info;
use serde::Serialize;

use crate::brush::BrushCatalog;
use crate::canvas::Canvas;
use crate::error::{Result, Stage, StageExt};
use crate::evaluator::Evaluator;
use crate::fitness::{improvement_percent, psnr_from_mse};
use crate::greedy::build_greedy;
use crate::problem::{Problem, Solution};
use crate::render::{BrushRenderer, StrokeRenderer};
use crate::rng::SearchRng;
use crate::settings::RunSettings;
use crate::tabu::{run_tabu_search, TabuStats};

/// everything a finished run produced
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub greedy: Solution,
    pub best: Solution,
    pub tabu: Option<TabuStats>,
    pub greedy_secs: f64,
    pub tabu_secs: f64,
    pub total_secs: f64,
}

impl RunReport {
    /// how much refinement lowered the greedy error, in percent
    pub fn improvement_percent(&self) -> f64 {
        improvement_percent(self.greedy.error, self.best.error)
    }

    pub fn psnr(&self) -> f64 {
        psnr_from_mse(self.best.error)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// greedy construction followed by tabu refinement, sharing one evaluator and one
/// random source. any failure aborts the run and carries the stage that raised it.
pub fn run(problem: &Problem, brushes: Arc<BrushCatalog>, settings: &RunSettings) -> Result<RunReport> {
    profiling::scope!("pipeline::run");
    settings.greedy.validate().stage(Stage::Greedy)?;
    if settings.tabu_enabled {
        settings.tabu.validate().stage(Stage::Tabu)?;
    }

    let renderer = BrushRenderer::new(Arc::clone(&brushes)).stage(Stage::Load)?;
    let mut evaluator = Evaluator::new(problem, renderer).stage(Stage::Load)?;
    run_with(problem, &mut evaluator, &brushes, settings)
}

/// same as [`run`] with a caller-supplied evaluator
pub fn run_with<R: StrokeRenderer>(
    problem: &Problem,
    evaluator: &mut Evaluator<'_, R>,
    brushes: &BrushCatalog,
    settings: &RunSettings,
) -> Result<RunReport> {
    let mut rng = SearchRng::new(settings.seed);
    let started = Instant::now();

    let greedy = build_greedy(problem, evaluator, &mut rng, brushes, &settings.greedy).stage(Stage::Greedy)?;
    let greedy_secs = started.elapsed().as_secs_f64();
    info!("greedy phase: mse {:.4} in {:.3}s", greedy.error, greedy_secs);

    let tabu_started = Instant::now();
    let (best, tabu) = if settings.tabu_enabled {
        let outcome = run_tabu_search(problem, evaluator, &mut rng, brushes, &greedy, &settings.tabu).stage(Stage::Tabu)?;
        (outcome.best, Some(outcome.stats))
    } else {
        (greedy.clone(), None)
    };
    let tabu_secs = tabu_started.elapsed().as_secs_f64();

    Ok(RunReport {
        seed: settings.seed,
        greedy,
        best,
        tabu,
        greedy_secs,
        tabu_secs,
        total_secs: started.elapsed().as_secs_f64(),
    })
}

/// paint a solution onto a fresh canvas the size of the problem
pub fn render_solution(problem: &Problem, brushes: Arc<BrushCatalog>, solution: &Solution) -> Result<Canvas> {
    let mut renderer = BrushRenderer::new(brushes).stage(Stage::Save)?;
    let mut canvas = Canvas::new(problem.width(), problem.height());
    renderer.render(&solution.strokes, &mut canvas).stage(Stage::Save)?;
    Ok(canvas)
}
