use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Three-way set intersection
// ---------------------------------------------------------------------------

/// Genes present in all three sets, by exact string equality.
pub fn intersect3<'a>(
    a: &BTreeSet<&'a str>,
    b: &BTreeSet<&'a str>,
    c: &BTreeSet<&'a str>,
) -> BTreeSet<&'a str> {
    a.iter()
        .filter(|g| b.contains(*g) && c.contains(*g))
        .copied()
        .collect()
}

// ---------------------------------------------------------------------------
// Venn region sizes
// ---------------------------------------------------------------------------

/// Sizes of the seven exclusive regions of a three-set Venn diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlapCounts {
    pub only_a: usize,
    pub only_b: usize,
    pub only_c: usize,
    pub ab: usize,
    pub ac: usize,
    pub bc: usize,
    pub abc: usize,
}

impl OverlapCounts {
    pub fn from_sets(a: &BTreeSet<&str>, b: &BTreeSet<&str>, c: &BTreeSet<&str>) -> Self {
        let mut counts = OverlapCounts::default();
        for gene in a.union(b).copied().chain(c.iter().copied()).collect::<BTreeSet<_>>() {
            match (a.contains(gene), b.contains(gene), c.contains(gene)) {
                (true, false, false) => counts.only_a += 1,
                (false, true, false) => counts.only_b += 1,
                (false, false, true) => counts.only_c += 1,
                (true, true, false) => counts.ab += 1,
                (true, false, true) => counts.ac += 1,
                (false, true, true) => counts.bc += 1,
                (true, true, true) => counts.abc += 1,
                (false, false, false) => {}
            }
        }
        counts
    }

    /// Number of distinct genes across the three sets.
    pub fn union(&self) -> usize {
        self.only_a + self.only_b + self.only_c + self.ab + self.ac + self.bc + self.abc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<'a>(genes: &[&'a str]) -> BTreeSet<&'a str> {
        genes.iter().copied().collect()
    }

    #[test]
    fn test_intersection_example() {
        let dbt = set(&["A", "B", "C"]);
        let drug5a = set(&["B", "C", "D"]);
        let r234 = set(&["B", "C", "E"]);

        assert_eq!(intersect3(&dbt, &drug5a, &r234), set(&["B", "C"]));
    }

    #[test]
    fn test_intersection_is_order_independent() {
        let a = set(&["A", "B", "C", "X"]);
        let b = set(&["B", "C", "D", "X"]);
        let c = set(&["C", "E", "X", "B"]);
        let expected = intersect3(&a, &b, &c);

        assert_eq!(intersect3(&b, &a, &c), expected);
        assert_eq!(intersect3(&c, &b, &a), expected);
        assert_eq!(intersect3(&a, &c, &b), expected);

        // (a ∩ b) ∩ c == a ∩ (b ∩ c)
        let ab: BTreeSet<&str> = a.intersection(&b).copied().collect();
        let bc: BTreeSet<&str> = b.intersection(&c).copied().collect();
        assert_eq!(intersect3(&ab, &c, &c), intersect3(&a, &bc, &bc));
        assert_eq!(intersect3(&ab, &c, &c), expected);
    }

    #[test]
    fn test_intersection_with_empty_set() {
        let a = set(&["A"]);
        assert!(intersect3(&a, &a, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let a = set(&["tp53"]);
        let b = set(&["TP53"]);
        assert!(intersect3(&a, &b, &b).is_empty());
    }

    #[test]
    fn test_region_counts() {
        let a = set(&["A", "B", "C", "F"]);
        let b = set(&["B", "C", "D", "G"]);
        let c = set(&["B", "C", "E", "F", "G"]);

        let counts = OverlapCounts::from_sets(&a, &b, &c);

        assert_eq!(
            counts,
            OverlapCounts {
                only_a: 1,
                only_b: 1,
                only_c: 1,
                ab: 0,
                ac: 1,
                bc: 1,
                abc: 2,
            }
        );
        assert_eq!(counts.union(), 7);
        assert_eq!(counts.abc, intersect3(&a, &b, &c).len());
    }
}
