use rand::Rng;

/// Draws one candidate using category-weighted buckets. Each candidate is
/// placed in the first bucket whose predicate matches it; candidates matching
/// no predicate form an implicit weight-1 remainder bucket. A bucket is then
/// drawn with probability proportional to its weight among the non-empty
/// buckets, and a candidate is drawn uniformly within that bucket.
///
/// Panics if `candidates` is empty; callers check for an empty pool first
/// since that is a distinct, reportable failure.
pub fn weighted_choice<T: Copy, R: Rng>(
    rng: &mut R,
    candidates: &[T],
    buckets: &[(u32, &dyn Fn(T) -> bool)],
) -> T {
    assert!(!candidates.is_empty());
    let mut bucketed: Vec<(u32, Vec<T>)> = buckets.iter().map(|&(w, _)| (w, vec![])).collect();
    let mut remainder: Vec<T> = vec![];
    for &candidate in candidates {
        match buckets.iter().position(|(_, pred)| pred(candidate)) {
            Some(i) => bucketed[i].1.push(candidate),
            None => remainder.push(candidate),
        }
    }
    if !remainder.is_empty() {
        bucketed.push((1, remainder));
    }

    let total_weight: u32 = bucketed
        .iter()
        .filter(|(_, members)| !members.is_empty())
        .map(|&(w, _)| w)
        .sum();
    let mut roll = rng.gen_range(0..total_weight);
    for (weight, members) in &bucketed {
        if members.is_empty() {
            continue;
        }
        if roll < *weight {
            return members[rng.gen_range(0..members.len())];
        }
        roll -= weight;
    }
    unreachable!("roll exceeded total bucket weight");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_weighted_choice_ratio() {
        // 7:3 bucket weights should hold regardless of bucket sizes.
        let candidates: Vec<usize> = (0..10).collect();
        let is_low = |x: usize| x < 4;
        let is_high = |x: usize| x >= 4;
        let mut rng = StdRng::seed_from_u64(1234);
        let mut low_count = 0usize;
        let num_draws = 10_000;
        for _ in 0..num_draws {
            let x = weighted_choice(&mut rng, &candidates, &[(7, &is_low), (3, &is_high)]);
            if x < 4 {
                low_count += 1;
            }
        }
        let fraction = low_count as f64 / num_draws as f64;
        assert!((0.65..=0.75).contains(&fraction), "low fraction was {fraction}");
    }

    #[test]
    fn test_weighted_choice_skips_empty_buckets() {
        let candidates = vec![5, 6, 7];
        let never = |_: i32| false;
        let always = |_: i32| true;
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let x = weighted_choice(&mut rng, &candidates, &[(7, &never), (3, &always)]);
            assert!(candidates.contains(&x));
        }
    }

    #[test]
    fn test_weighted_choice_remainder_bucket() {
        // Candidates matching no predicate must still be drawable.
        let candidates = vec![1];
        let never = |_: i32| false;
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(weighted_choice(&mut rng, &candidates, &[(7, &never)]), 1);
    }
}
