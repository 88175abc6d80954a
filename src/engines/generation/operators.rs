use crate::config::PopulationConfig;
use crate::engines::generation::genome::{GrowthMethod, Tree};
use crate::types::Role;
use rand::Rng;

/// Ramped half-and-half: each tree is "full" or "grow" with equal chance.
pub fn ramped_half_and_half<R: Rng + ?Sized>(
    count: usize,
    role: Role,
    dmax_init: usize,
    rng: &mut R,
) -> Vec<Tree> {
    (0..count)
        .map(|_| {
            let method = if rng.gen::<f64>() < 0.5 {
                GrowthMethod::Full
            } else {
                GrowthMethod::Grow
            };
            Tree::generate(rng, method, role.terminals(), 0, dmax_init)
        })
        .collect()
}

/// Random node in BFS numbering; falls back to the root.
fn random_node<R: Rng + ?Sized>(tree: &Tree, rng: &mut R) -> usize {
    let n = rng.gen_range(1..=tree.size());
    tree.find_nth_node(n).unwrap_or(0)
}

/// Subtree mutation: regrow a random node with "grow", bounded by `dmax_overall`.
pub fn mutate<R: Rng + ?Sized>(parent: &Tree, role: Role, dmax_overall: usize, rng: &mut R) -> Tree {
    let index = random_node(parent, rng);
    let depth = parent.node(index).depth;
    let fresh = Tree::generate(rng, GrowthMethod::Grow, role.terminals(), depth, dmax_overall);
    parent.replace_subtree(index, &fresh)
}

/// Subtree crossover. Resamples crossover points until both children fit in `dmax_overall`.
pub fn recombine<R: Rng + ?Sized>(
    parent1: &Tree,
    parent2: &Tree,
    dmax_overall: usize,
    rng: &mut R,
) -> (Tree, Tree) {
    loop {
        let i1 = random_node(parent1, rng);
        let i2 = random_node(parent2, rng);
        let (n1, n2) = (parent1.node(i1), parent2.node(i2));

        if n1.depth + n2.height > dmax_overall || n2.depth + n1.height > dmax_overall {
            continue;
        }

        let child1 = parent1.replace_subtree(i1, &parent2.subtree(i2));
        let child2 = parent2.replace_subtree(i2, &parent1.subtree(i1));
        return (child1, child2);
    }
}

/// One offspring per parent: mutation with probability `p_m` (always for a
/// trailing parent), otherwise recombination of the next two parents.
pub fn recombine_mutate<R: Rng + ?Sized>(
    parents: &[Tree],
    config: &PopulationConfig,
    role: Role,
    rng: &mut R,
) -> Vec<Tree> {
    let mut offspring = Vec::with_capacity(parents.len());
    let mut i = 0;
    while i < parents.len() {
        let roll = rng.gen::<f64>();
        if roll < config.mutation_rate || i == parents.len() - 1 {
            offspring.push(mutate(&parents[i], role, config.dmax_overall, rng));
            i += 1;
        } else {
            let (a, b) = recombine(&parents[i], &parents[i + 1], config.dmax_overall, rng);
            offspring.push(a);
            offspring.push(b);
            i += 2;
        }
    }
    offspring
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_initial_trees_respect_dmax_init() {
        let mut rng = StdRng::seed_from_u64(42);
        let trees = ramped_half_and_half(50, Role::Pursuer, 3, &mut rng);
        assert_eq!(trees.len(), 50);
        assert!(trees.iter().all(|t| t.height() <= 3 && t.is_consistent()));
    }

    #[test]
    fn test_offspring_count_matches_parents() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = PopulationConfig::default();
        for n in 1..8 {
            let parents = ramped_half_and_half(n, Role::Pursued, 4, &mut rng);
            let offspring = recombine_mutate(&parents, &config, Role::Pursued, &mut rng);
            assert_eq!(offspring.len(), n);
        }
    }

    #[test]
    fn test_mutation_keeps_parent_intact() {
        let mut rng = StdRng::seed_from_u64(1);
        let parent = ramped_half_and_half(1, Role::Pursued, 4, &mut rng).remove(0);
        let snapshot = parent.clone();
        let child = mutate(&parent, Role::Pursued, 5, &mut rng);
        assert_eq!(parent, snapshot);
        assert!(child.is_consistent());
        assert!(child.height() <= 5);
    }

    proptest! {
        #[test]
        fn prop_recombination_respects_depth_cap(seed in any::<u64>(), dmax in 1usize..7) {
            let mut rng = StdRng::seed_from_u64(seed);
            let trees = ramped_half_and_half(2, Role::Pursuer, dmax, &mut rng);
            let (a, b) = (trees[0].clone(), trees[1].clone());
            let (c1, c2) = recombine(&trees[0], &trees[1], dmax, &mut rng);

            prop_assert!(c1.height() <= dmax);
            prop_assert!(c2.height() <= dmax);
            prop_assert!(c1.is_consistent() && c2.is_consistent());
            prop_assert_eq!(c1.size() + c2.size(), a.size() + b.size());
            prop_assert_eq!(&trees[0], &a);
            prop_assert_eq!(&trees[1], &b);
        }

        #[test]
        fn prop_mutation_respects_depth_cap(seed in any::<u64>(), dmax in 0usize..7) {
            let mut rng = StdRng::seed_from_u64(seed);
            let tree = ramped_half_and_half(1, Role::Pursued, dmax, &mut rng).remove(0);
            let child = mutate(&tree, Role::Pursued, dmax, &mut rng);
            prop_assert!(child.height() <= dmax);
            prop_assert!(child.is_consistent());
        }
    }
}
