//! Parent and survivor selection over a slice of fitness values.
//!
//! Every function returns indices into `fitnesses`, so callers can clone or
//! move individuals as they see fit.
use crate::config::{ParentSelection, SurvivalSelection};
use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;

/// Probability of drawing from the top slice in overselection.
const OVERSELECTION_TOP_SHARE: f64 = 0.8;

fn descending(fitnesses: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitnesses.len()).collect();
    order.sort_by(|&a, &b| {
        fitnesses[b]
            .partial_cmp(&fitnesses[a])
            .unwrap_or(Ordering::Equal)
    });
    order
}

fn warn_over_request(method: &str, available: usize, requested: usize) {
    log::warn!(
        "{}: {} individuals insufficient to choose {}, selection will contain duplicates",
        method,
        available,
        requested
    );
}

/// Shuffled indices, cycling through fresh shuffles if more are requested than exist.
pub fn random_without_replacement<R: Rng + ?Sized>(
    len: usize,
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    if count > len {
        warn_over_request("Random selection without replacement", len, count);
    }

    let mut selection = Vec::with_capacity(count);
    while selection.len() < count {
        let mut pool: Vec<usize> = (0..len).collect();
        pool.shuffle(rng);
        let take = (count - selection.len()).min(len);
        selection.extend_from_slice(&pool[..take]);
    }
    selection
}

/// Roulette wheel over fitnesses shifted to be non-negative.
pub fn fitness_proportional<R: Rng + ?Sized>(
    fitnesses: &[f64],
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    if fitnesses.is_empty() {
        return Vec::new();
    }

    let min = fitnesses.iter().copied().fold(f64::INFINITY, f64::min);
    let offset = if min < 0.0 { min.abs() } else { 0.0 };
    let total: f64 = fitnesses.iter().map(|f| f + offset).sum();

    if total == 0.0 || !total.is_finite() {
        return random_without_replacement(fitnesses.len(), count, rng);
    }

    let mut accumulation = 0.0;
    let cumulative: Vec<f64> = fitnesses
        .iter()
        .map(|f| {
            accumulation += (f + offset) / total;
            accumulation
        })
        .collect();

    let last = fitnesses.len() - 1;
    (0..count)
        .map(|_| {
            let draw = rng.gen::<f64>();
            // Rounding can leave the final cumulative value just under 1.
            cumulative.partition_point(|&c| c <= draw).min(last)
        })
        .collect()
}

/// 80% of draws from the best `top` fraction, the rest from the remainder.
pub fn overselection<R: Rng + ?Sized>(
    fitnesses: &[f64],
    count: usize,
    top: f64,
    rng: &mut R,
) -> Vec<usize> {
    if fitnesses.is_empty() {
        return Vec::new();
    }

    let order = descending(fitnesses);
    let split = ((fitnesses.len() as f64) * top).floor() as usize;
    let (upper, lower) = order.split_at(split.min(order.len()));

    (0..count)
        .map(|_| {
            let from_top = rng.gen::<f64>() < OVERSELECTION_TOP_SHARE;
            let slice = match (from_top, upper.is_empty(), lower.is_empty()) {
                (true, false, _) | (false, _, true) => upper,
                _ => lower,
            };
            slice[rng.gen_range(0..slice.len())]
        })
        .collect()
}

/// The `count` best, ties kept in their original order.
pub fn truncation(fitnesses: &[f64], count: usize) -> Vec<usize> {
    if fitnesses.is_empty() {
        return Vec::new();
    }
    if count > fitnesses.len() {
        warn_over_request("Truncation", fitnesses.len(), count);
    }
    descending(fitnesses).into_iter().cycle().take(count).collect()
}

/// Best of each `k`-sized tournament drawn from individuals not yet chosen.
pub fn k_tournament_without_replacement<R: Rng + ?Sized>(
    fitnesses: &[f64],
    count: usize,
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    if fitnesses.is_empty() {
        return Vec::new();
    }
    if count > fitnesses.len() {
        warn_over_request("K-tournament selection without replacement", fitnesses.len(), count);
    }

    let mut eligible: Vec<usize> = Vec::new();
    let mut selection = Vec::with_capacity(count);
    while selection.len() < count {
        if eligible.is_empty() {
            eligible = (0..fitnesses.len()).collect();
        }

        let size = k.clamp(1, eligible.len());
        let contestants: Vec<usize> = eligible.choose_multiple(rng, size).copied().collect();
        let mut winner = contestants[0];
        for &c in &contestants[1..] {
            if fitnesses[c] > fitnesses[winner] {
                winner = c;
            }
        }

        eligible.retain(|&i| i != winner);
        selection.push(winner);
    }
    selection
}

impl ParentSelection {
    pub fn select<R: Rng + ?Sized>(&self, fitnesses: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
        match *self {
            ParentSelection::FitnessProportional => fitness_proportional(fitnesses, count, rng),
            ParentSelection::Overselection { top } => overselection(fitnesses, count, top, rng),
        }
    }
}

impl SurvivalSelection {
    pub fn select<R: Rng + ?Sized>(&self, fitnesses: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
        match *self {
            SurvivalSelection::Truncation => truncation(fitnesses, count),
            SurvivalSelection::KTournamentWithoutReplacement { tournament_size } => {
                k_tournament_without_replacement(fitnesses, count, tournament_size, rng)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_truncation_keeps_best_in_stable_order() {
        let fitnesses = [3.0, 9.0, 3.0, 1.0, 9.0, 5.0, 3.0];
        assert_eq!(truncation(&fitnesses, 3), vec![1, 4, 5]);
        assert_eq!(truncation(&fitnesses, 5), vec![1, 4, 5, 0, 2]);
    }

    #[test]
    fn test_truncation_over_request_duplicates() {
        let selection = truncation(&[1.0, 2.0], 3);
        assert_eq!(selection, vec![1, 0, 1]);
    }

    #[test]
    fn test_roulette_single_mass() {
        let fitnesses = [0.0, 0.0, 5.0, 0.0];
        let mut rng = StdRng::seed_from_u64(3);
        let selection = fitness_proportional(&fitnesses, 200, &mut rng);
        assert!(selection.iter().all(|&i| i == 2));
    }

    #[test]
    fn test_roulette_shifts_negative_fitness() {
        let fitnesses = [-4.0, -4.0, 6.0];
        let mut rng = StdRng::seed_from_u64(8);
        let selection = fitness_proportional(&fitnesses, 100, &mut rng);
        assert!(selection.iter().all(|&i| i == 2));
    }

    #[test]
    fn test_roulette_equal_fitness_is_roughly_uniform() {
        let fitnesses = [2.0; 4];
        let mut rng = StdRng::seed_from_u64(21);
        let mut counts = [0usize; 4];
        for i in fitness_proportional(&fitnesses, 8000, &mut rng) {
            counts[i] += 1;
        }
        for c in counts {
            assert!((1700..2300).contains(&c), "counts {:?}", counts);
        }
    }

    #[test]
    fn test_roulette_zero_total_is_without_replacement() {
        let fitnesses = [0.0; 5];
        let mut rng = StdRng::seed_from_u64(2);
        let selection = fitness_proportional(&fitnesses, 5, &mut rng);
        let unique: HashSet<_> = selection.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_overselection_favors_top_slice() {
        let fitnesses: Vec<f64> = (0..10).map(f64::from).collect();
        let mut rng = StdRng::seed_from_u64(13);
        let selection = overselection(&fitnesses, 5000, 0.2, &mut rng);
        let top = selection.iter().filter(|&&i| i >= 8).count();
        let share = top as f64 / selection.len() as f64;
        assert!((0.75..0.85).contains(&share), "top share {}", share);
    }

    #[test]
    fn test_overselection_includes_the_worst() {
        let fitnesses = [1.0, 2.0, 3.0, 4.0];
        let mut rng = StdRng::seed_from_u64(4);
        let selection = overselection(&fitnesses, 2000, 0.5, &mut rng);
        assert!(selection.contains(&0));
    }

    #[test]
    fn test_overselection_empty_top_defers() {
        let fitnesses = [1.0, 2.0, 3.0];
        let mut rng = StdRng::seed_from_u64(5);
        let selection = overselection(&fitnesses, 50, 0.1, &mut rng);
        assert_eq!(selection.len(), 50);
    }

    #[test]
    fn test_k_tournament_selects_unique() {
        let fitnesses = [5.0, 1.0, 7.0, 3.0, 2.0, 8.0];
        let mut rng = StdRng::seed_from_u64(17);
        let selection = k_tournament_without_replacement(&fitnesses, 4, 3, &mut rng);
        let unique: HashSet<_> = selection.iter().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_k_tournament_full_size_is_truncation() {
        let fitnesses = [5.0, 1.0, 7.0, 3.0];
        let mut rng = StdRng::seed_from_u64(0);
        let selection = k_tournament_without_replacement(&fitnesses, 3, 4, &mut rng);
        assert_eq!(selection, vec![2, 0, 3]);
    }

    #[test]
    fn test_k_tournament_over_request() {
        let fitnesses = [1.0, 2.0];
        let mut rng = StdRng::seed_from_u64(0);
        let selection = k_tournament_without_replacement(&fitnesses, 3, 2, &mut rng);
        assert_eq!(selection.len(), 3);
    }
}
