use crate::canvas::Canvas;
use crate::error::{Error, Result};
use crate::fitness::mse;
use crate::problem::{Problem, Solution};
use crate::render::StrokeRenderer;
use crate::stroke::Stroke;

/// scores stroke lists against a problem's target.
/// owns a scratch canvas reused across calls, so a single instance is not meant
/// to be shared between threads. every call re-renders the whole list.
pub struct Evaluator<'p, R> {
    problem: &'p Problem,
    renderer: R,
    scratch: Canvas,
    evaluations: u64,
}

impl<'p, R: StrokeRenderer> Evaluator<'p, R> {
    pub fn new(problem: &'p Problem, renderer: R) -> Result<Self> {
        if !problem.is_valid() {
            return Err(Error::InvalidProblem { width: problem.width(), height: problem.height() });
        }
        Ok(Self {
            problem,
            renderer,
            scratch: Canvas::new(problem.width(), problem.height()),
            evaluations: 0,
        })
    }

    /// render `strokes` in order onto the scratch canvas and return its MSE against the target
    pub fn evaluate(&mut self, strokes: &[Stroke]) -> Result<f64> {
        profiling::scope!("Evaluator::evaluate");
        self.evaluations += 1;
        self.renderer.render(strokes, &mut self.scratch)?;
        mse(&self.scratch, self.problem.target())
    }

    /// evaluate and store the result as the solution's cached error
    pub fn evaluate_solution(&mut self, solution: &mut Solution) -> Result<f64> {
        solution.error = self.evaluate(&solution.strokes)?;
        Ok(solution.error)
    }

    /// canvas produced by the most recent evaluation
    pub fn rendered(&self) -> &Canvas {
        &self.scratch
    }

    /// number of evaluate calls made so far
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }
}
