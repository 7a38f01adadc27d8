use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use brushtrace::error::{Stage, StageExt};
use brushtrace::{pipeline, BrushCatalog, Problem, RunSettings, SharedCatalog};
use clap::Parser;
use log::info;

// loaded at most once per process, read-only afterwards
static BRUSHES: SharedCatalog = SharedCatalog::new();

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Approximate an image with brush strokes (greedy + tabu search)", long_about = None)]
struct Args {
    /// Target image to approximate
    #[arg(short, long)]
    instance: PathBuf,

    /// Where the rendered result PNG is written
    #[arg(long, default_value = "output.png")]
    output: PathBuf,

    /// JSON settings file used as the base; flags below override it
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings (file plus flags) as JSON
    #[arg(long)]
    save_settings: Option<PathBuf>,

    /// Number of strokes in the solution
    #[arg(short = 'n', long)]
    strokes: Option<usize>,

    /// Seed for the shared random source
    #[arg(long)]
    seed: Option<u64>,

    /// Random candidates scored per greedy stroke
    #[arg(long)]
    greedy_candidates: Option<usize>,

    /// Tabu iteration budget
    #[arg(long)]
    tabu_iters: Option<usize>,

    /// Iterations a (stroke, attribute) pair stays tabu
    #[arg(long)]
    tabu_tenure: Option<usize>,

    /// Neighbours sampled per tabu iteration
    #[arg(long)]
    tabu_neigh: Option<usize>,

    /// Stop after this many iterations without a new best
    #[arg(long)]
    tabu_max_no_improve: Option<usize>,

    /// Shrink the step scale after this many iterations without a new best
    #[arg(long)]
    tabu_reduce_step: Option<usize>,

    /// Skip tabu refinement and keep the greedy result
    #[arg(long)]
    no_tabu: bool,

    /// Directory holding the brush masks 1.jpg..4.jpg
    #[arg(long, default_value = "brushes")]
    brushes: PathBuf,

    /// Use the built-in masks instead of loading brush files
    #[arg(long)]
    procedural_brushes: bool,

    /// Export the final strokes as JSON
    #[arg(long)]
    strokes_out: Option<PathBuf>,

    /// Export the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn run_settings(&self) -> RunSettings {
        let mut s = match &self.settings {
            Some(path) => RunSettings::load_or_default(path),
            None => RunSettings::default(),
        };
        if let Some(v) = self.seed {
            s.seed = v;
        }
        if let Some(v) = self.strokes {
            s.greedy.stroke_count = v;
        }
        if let Some(v) = self.greedy_candidates {
            s.greedy.candidates_per_stroke = v;
        }
        if let Some(v) = self.tabu_iters {
            s.tabu.max_iterations = v;
        }
        if let Some(v) = self.tabu_tenure {
            s.tabu.tenure = v;
        }
        if let Some(v) = self.tabu_neigh {
            s.tabu.neighborhood_size = v;
        }
        if let Some(v) = self.tabu_max_no_improve {
            s.tabu.max_no_improve = v;
        }
        if let Some(v) = self.tabu_reduce_step {
            s.tabu.iterations_to_reduce_step = v;
        }
        if self.no_tabu {
            s.tabu_enabled = false;
        }
        s
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let settings = args.run_settings();
    if let Some(path) = &args.save_settings {
        settings
            .save(path)
            .with_context(|| format!("writing settings {}", path.display()))?;
    }

    let brushes: Arc<BrushCatalog> = BRUSHES
        .ensure_loaded(|| {
            if args.procedural_brushes {
                Ok(BrushCatalog::procedural())
            } else {
                BrushCatalog::load_dir(&args.brushes)
            }
        })
        .stage(Stage::Load)
        .with_context(|| format!("loading brushes from {}", args.brushes.display()))?;

    let problem = Problem::load(&args.instance)
        .stage(Stage::Load)
        .with_context(|| format!("loading target {}", args.instance.display()))?;
    info!("target {}x{}, seed {}", problem.width(), problem.height(), settings.seed);

    let report = pipeline::run(&problem, Arc::clone(&brushes), &settings)?;

    println!("MSE Greedy: {:.4}", report.greedy.error);
    if report.tabu.is_some() {
        println!("MSE Tabu final: {:.4}", report.best.error);
        println!("Improvement (%): {:.2}", report.improvement_percent());
    }
    println!("PSNR (dB): {:.2}", report.psnr());
    println!("Greedy time (s): {:.3}", report.greedy_secs);
    println!("Tabu time (s): {:.3}", report.tabu_secs);
    println!("Total time (s): {:.3}", report.total_secs);

    let canvas = pipeline::render_solution(&problem, brushes, &report.best)?;
    canvas
        .save(&args.output)
        .stage(Stage::Save)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("Saved result to: {}", args.output.display());

    if let Some(path) = &args.strokes_out {
        report
            .best
            .save_json(path)
            .stage(Stage::Save)
            .with_context(|| format!("writing strokes {}", path.display()))?;
    }
    if let Some(path) = &args.report {
        let json = report.to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    }
    Ok(())
}
