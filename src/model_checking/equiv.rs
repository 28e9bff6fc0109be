use std::collections::{BTreeSet, HashMap};

/// Partition of the state index space into disjoint equivalence classes,
/// each with the smallest member as representative. States outside every
/// supplied class count as their own singleton class (the queries answer
/// for them as if a singleton had been supplied).
#[derive(Debug, Clone)]
pub struct EquivalencePartition {
    classes: Vec<BTreeSet<usize>>,
    representatives: Vec<usize>,
    class_of: HashMap<usize, usize>,
}

impl EquivalencePartition {
    /// Build from a list of nonempty, pairwise disjoint classes.
    pub fn new(classes: Vec<BTreeSet<usize>>) -> EquivalencePartition {
        let mut representatives: Vec<usize> = Vec::with_capacity(classes.len());
        let mut class_of: HashMap<usize, usize> = HashMap::new();
        for (i, class) in classes.iter().enumerate() {
            debug_assert!(!class.is_empty());
            // BTreeSet iterates ascending, the first member is the smallest
            representatives.push(*class.iter().next().unwrap());
            for &s in class.iter() {
                let prev = class_of.insert(s, i);
                debug_assert!(prev.is_none(), "classes must be disjoint");
            }
        }
        EquivalencePartition {
            classes,
            representatives,
            class_of,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn class_at(&self, i: usize) -> &BTreeSet<usize> {
        &self.classes[i]
    }

    pub fn representative_at(&self, i: usize) -> usize {
        self.representatives[i]
    }

    /// Index of the supplied class containing `s`, if any.
    pub fn class_of(&self, s: usize) -> Option<usize> {
        self.class_of.get(&s).copied()
    }

    pub fn same_class(&self, s: usize, t: usize) -> bool {
        if s == t {
            return true;
        }
        match (self.class_of(s), self.class_of(t)) {
            (Some(i), Some(j)) => i == j,
            _ => false,
        }
    }

    /// The representative of the class of `s`; `s` itself when outside
    /// every supplied class.
    pub fn map_to_representative(&self, s: usize) -> usize {
        match self.class_of(s) {
            Some(i) => self.representatives[i],
            None => s,
        }
    }
}
