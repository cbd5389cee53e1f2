//! Random member sampling for sets.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

/// Population to request ratio above which rejection sampling is used
/// instead of a full shuffle.
pub const REJECTION_SAMPLING_FACTOR: usize = 10;

/// Picks `count` distinct members uniformly at random.
///
/// Returns every member when `count` covers the whole population. For a
/// population much larger than the request, indices are drawn until `count`
/// distinct ones are found; otherwise the members are shuffled and the
/// first `count` taken.
pub fn sample_members<R: Rng + ?Sized>(
    mut members: Vec<String>,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let length = members.len();
    if length <= count {
        return members;
    }

    if length > count.saturating_mul(REJECTION_SAMPLING_FACTOR) {
        let mut picked = HashSet::with_capacity(count);
        let mut sample = Vec::with_capacity(count);
        while sample.len() < count {
            let index = rng.gen_range(0..length);
            if picked.insert(index) {
                sample.push(members[index].clone());
            }
        }
        return sample;
    }

    members.shuffle(rng);
    members.truncate(count);
    members
}

/// Picks a single member, or None from an empty population.
pub fn sample_one<R: Rng + ?Sized>(members: &[String], rng: &mut R) -> Option<String> {
    members.choose(rng).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn population(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("m{}", i)).collect()
    }

    fn assert_distinct_subset(sample: &[String], source: &[String]) {
        let unique: HashSet<&String> = sample.iter().collect();
        assert_eq!(unique.len(), sample.len(), "sample has duplicates");
        assert!(sample.iter().all(|m| source.contains(m)));
    }

    #[test]
    fn test_count_covers_population() {
        let mut rng = StdRng::seed_from_u64(7);
        let members = population(5);

        let mut sample = sample_members(members.clone(), 5, &mut rng);
        sample.sort();
        let mut expected = members.clone();
        expected.sort();
        assert_eq!(sample, expected);

        assert_eq!(sample_members(members, 50, &mut rng).len(), 5);
    }

    #[test]
    fn test_rejection_sampling_regime() {
        let mut rng = StdRng::seed_from_u64(7);
        let members = population(1_000);

        let sample = sample_members(members.clone(), 3, &mut rng);
        assert_eq!(sample.len(), 3);
        assert_distinct_subset(&sample, &members);
    }

    #[test]
    fn test_shuffle_regime() {
        let mut rng = StdRng::seed_from_u64(7);
        let members = population(20);

        let sample = sample_members(members.clone(), 15, &mut rng);
        assert_eq!(sample.len(), 15);
        assert_distinct_subset(&sample, &members);
    }

    #[test]
    fn test_zero_count() {
        let mut rng = StdRng::seed_from_u64(1);

        assert!(sample_members(population(4), 0, &mut rng).is_empty());
    }

    #[test]
    fn test_same_seed_same_sample() {
        let members = population(100);

        let first = sample_members(members.clone(), 4, &mut StdRng::seed_from_u64(99));
        let second = sample_members(members, 4, &mut StdRng::seed_from_u64(99));
        assert_eq!(first, second);
    }

    #[test]
    fn test_sample_one() {
        let mut rng = StdRng::seed_from_u64(3);

        assert!(sample_one(&[], &mut rng).is_none());
        let members = population(3);
        let picked = sample_one(&members, &mut rng).unwrap();
        assert!(members.contains(&picked));
    }
}
