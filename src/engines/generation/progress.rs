/// Hooks invoked by the engines while a run progresses.
pub trait ProgressCallback: Send {
    fn on_generation_complete(&mut self, generation: usize, evals: usize, pursued_best: f64, pursuer_best: Option<f64>);
    fn on_evaluation(&mut self, evals: usize, budget: usize);
    fn on_run_complete(&mut self, _run: usize, _evals: usize) {}
}

/// Reports progress through the `log` facade.
#[derive(Debug, Default)]
pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_complete(&mut self, generation: usize, evals: usize, pursued_best: f64, pursuer_best: Option<f64>) {
        match pursuer_best {
            Some(pursuer) => log::info!(
                "Generation {} complete after {} evals. Best pursued fitness: {:.4}, best pursuer fitness: {:.4}",
                generation, evals, pursued_best, pursuer
            ),
            None => log::info!(
                "Generation {} complete after {} evals. Best fitness: {:.4}",
                generation, evals, pursued_best
            ),
        }
    }

    fn on_evaluation(&mut self, evals: usize, budget: usize) {
        if evals % 10 == 0 {
            log::debug!("  {}/{} evals", evals, budget);
        }
    }

    fn on_run_complete(&mut self, run: usize, evals: usize) {
        log::info!("Run {} finished after {} evals", run, evals);
    }
}

/// Discards every notification.
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_generation_complete(&mut self, _generation: usize, _evals: usize, _pursued_best: f64, _pursuer_best: Option<f64>) {}

    fn on_evaluation(&mut self, _evals: usize, _budget: usize) {}
}
