use scopelog_types::{FilterState, Severity, SeverityMask};

/// How many namespaces have each level enabled
///
/// Always rebuilt from a [`FilterState`], never patched in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionCounts {
    /// Indexed by [`Severity::index`]
    per_level: [usize; 4],

    /// Namespaces whose mask equals ALL
    all: usize,
}

impl SelectionCounts {
    /// Count enabled levels across every namespace mask
    pub fn recompute(state: &FilterState) -> Self {
        let mut counts = Self::default();

        for (_, mask) in state.iter() {
            if mask.has_flag(SeverityMask::ALL) {
                counts.all += 1;
            }
            for level in Severity::ALL_LEVELS {
                if mask.contains(level) {
                    counts.per_level[level.index()] += 1;
                }
            }
        }

        counts
    }

    /// Namespaces with `level` enabled
    pub fn count(&self, level: Severity) -> usize {
        self.per_level[level.index()]
    }

    /// Namespaces with every level enabled
    pub fn all_count(&self) -> usize {
        self.all
    }

    /// Every one of `total` namespaces has `level` enabled
    pub fn is_level_selected(&self, level: Severity, total: usize) -> bool {
        self.count(level) == total
    }

    /// Every one of `total` namespaces has a full mask
    pub fn is_all_selected(&self, total: usize) -> bool {
        self.all == total
    }
}
