use super::match_runner::MatchOutcome;
use crate::config::Parsimony;
use crate::engines::generation::genome::Tree;

/// Penalized fitness alongside the raw score it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchFitness {
    pub fitness: f64,
    pub score: f64,
}

/// The pursued agent is rewarded with the game score.
pub fn pursued_fitness(outcome: &MatchOutcome, tree: &Tree, parsimony: &Parsimony) -> MatchFitness {
    MatchFitness {
        fitness: outcome.score - parsimony.penalty(tree),
        score: outcome.score,
    }
}

/// Pursuers gain what the pursued agent lost, plus the time left on a capture.
pub fn pursuer_fitness(outcome: &MatchOutcome, tree: &Tree, parsimony: &Parsimony) -> MatchFitness {
    let mut raw = -outcome.score;
    if outcome.pursuer_won {
        raw += outcome.time_bonus();
    }
    MatchFitness {
        fitness: raw - parsimony.penalty(tree),
        score: raw,
    }
}
