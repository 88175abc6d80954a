use crate::config::Parsimony;
use crate::engines::evaluation::{pursued_fitness, MatchRunner};
use crate::engines::generation::genome::Tree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::fmt;

/// Generation bests played against each other, normalized to `[0, 1]`.
///
/// Row `g - i - 1` holds pursued generation `i`; column `j` holds pursuer
/// generation `j`. Only pairings with `i >= j` are played; the remaining
/// cells are set to 1 after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossPlayMatrix {
    generations: usize,
    values: Vec<f64>,
}

impl CrossPlayMatrix {
    pub fn compute<R: Rng + ?Sized>(
        pursued_bests: &[Tree],
        pursuer_bests: &[Tree],
        runner: &MatchRunner,
        parsimony: &Parsimony,
        rng: &mut R,
    ) -> Self {
        let g = pursued_bests.len().min(pursuer_bests.len());
        let cells: Vec<(usize, usize)> = (0..g)
            .flat_map(|j| (j..g).map(move |i| (i, j)))
            .collect();
        let seeds: Vec<u64> = cells.iter().map(|_| rng.gen()).collect();

        log::info!("Cross-play: {} matches over {} generations", cells.len(), g);

        let results: Vec<f64> = cells
            .par_iter()
            .zip(seeds.par_iter())
            .map(|(&(i, j), &seed)| {
                let mut match_rng = StdRng::seed_from_u64(seed);
                let outcome = runner.play_trees(&pursued_bests[i], &pursuer_bests[j], &mut match_rng);
                pursued_fitness(&outcome, &pursued_bests[i], parsimony).fitness
            })
            .collect();

        let mut raw = vec![0.0; g * g];
        for (&(i, j), fitness) in cells.iter().zip(results) {
            raw[(g - i - 1) * g + j] = fitness;
        }
        Self::from_raw(g, raw)
    }

    /// Normalizes a row-major `generations x generations` matrix of raw fitnesses.
    pub fn from_raw(generations: usize, mut values: Vec<f64>) -> Self {
        let g = generations;
        if let Some(min) = values.iter().copied().reduce(f64::min) {
            if min < 0.0 {
                values.iter_mut().for_each(|v| *v += min.abs());
            } else {
                values.iter_mut().for_each(|v| *v -= min);
            }
        }
        if let Some(max) = values.iter().copied().reduce(f64::max) {
            if max != 0.0 {
                values.iter_mut().for_each(|v| *v /= max);
            }
        }
        for i in 1..g {
            for j in i..g {
                values[(g - i) * g + j] = 1.0;
            }
        }
        Self {
            generations,
            values,
        }
    }

    pub fn generations(&self) -> usize {
        self.generations
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.generations + col]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.generations.max(1))
    }
}

impl fmt::Display for CrossPlayMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, PopulationConfig};
    use crate::data::maps::{GameMap, MapPool};
    use std::sync::Arc;

    #[test]
    fn test_normalization_and_mask() {
        let matrix = CrossPlayMatrix::from_raw(2, vec![-2.0, 4.0, 6.0, 0.0]);
        assert_eq!(matrix.get(0, 0), 0.0);
        assert_eq!(matrix.get(0, 1), 0.75);
        assert_eq!(matrix.get(1, 0), 1.0);
        assert_eq!(matrix.get(1, 1), 1.0);
        assert_eq!(matrix.to_string(), "0 0.75\n1 1\n");
    }

    #[test]
    fn test_non_negative_values_are_shifted_to_zero() {
        let matrix = CrossPlayMatrix::from_raw(1, vec![7.0]);
        assert_eq!(matrix.get(0, 0), 0.0);
    }

    #[test]
    fn test_compute_shape() {
        let pool = Arc::new(MapPool::new(vec![GameMap::open(4, 4)]).unwrap());
        let runner = MatchRunner::new(GameConfig::default(), pool);
        let trees: Vec<Tree> = (0..3).map(|i| Tree::constant(f64::from(i))).collect();
        let parsimony = PopulationConfig::default().parsimony;
        let mut rng = StdRng::seed_from_u64(4);
        let matrix = CrossPlayMatrix::compute(&trees, &trees, &runner, &parsimony, &mut rng);

        assert_eq!(matrix.generations(), 3);
        assert_eq!(matrix.rows().count(), 3);
        assert!(matrix.rows().flatten().all(|v| (0.0..=1.0).contains(v)));
        // Unplayed pairings.
        assert_eq!(matrix.get(2, 1), 1.0);
        assert_eq!(matrix.get(2, 2), 1.0);
        assert_eq!(matrix.get(1, 2), 1.0);
    }
}
