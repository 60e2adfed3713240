//! Turn restrictions
//!
//! A restriction is an ordered edge sequence `from, via…, to` with a polarity:
//! `only = false` forbids completing the sequence, `only = true` forces a state
//! that entered the sequence to follow it to the end. Search states track their
//! position inside restrictions as a map `restriction index → edges consumed`
//! (1 = the entry edge has been traversed). On reverse searches the sequence is
//! walked back-to-front.

use std::collections::HashMap;

/// Per-state traversal progress through active restrictions.
pub type RestrictionProgress = HashMap<i32, u32>;

#[derive(Debug, Clone)]
pub struct TurnRestriction {
    pub from_edge: i32,
    pub via_edges: Vec<i32>,
    pub to_edge: i32,
    /// `true`: the sequence is mandatory once entered. `false`: completing the
    /// sequence is forbidden.
    pub only: bool,
}

impl TurnRestriction {
    pub fn no_turn(from_edge: i32, via_edges: Vec<i32>, to_edge: i32) -> Self {
        Self {
            from_edge,
            via_edges,
            to_edge,
            only: false,
        }
    }

    pub fn only_turn(from_edge: i32, via_edges: Vec<i32>, to_edge: i32) -> Self {
        Self {
            from_edge,
            via_edges,
            to_edge,
            only: true,
        }
    }

    /// Edge that activates this restriction for the given search polarity.
    #[inline]
    pub fn entry_edge(&self, reverse: bool) -> i32 {
        if reverse {
            self.to_edge
        } else {
            self.from_edge
        }
    }

    /// Edge that completes this restriction for the given search polarity.
    #[inline]
    pub fn final_edge(&self, reverse: bool) -> i32 {
        if reverse {
            self.from_edge
        } else {
            self.to_edge
        }
    }

    /// The edge expected after `consumed` edges of the sequence have been
    /// traversed (consumed ≥ 1 because the entry edge counts).
    pub fn expected_edge(&self, consumed: u32, reverse: bool) -> i32 {
        let vias_consumed = (consumed - 1) as usize;
        if vias_consumed < self.via_edges.len() {
            if reverse {
                self.via_edges[self.via_edges.len() - 1 - vias_consumed]
            } else {
                self.via_edges[vias_consumed]
            }
        } else {
            self.final_edge(reverse)
        }
    }

    /// Whether every via edge has been traversed after `consumed` edges.
    #[inline]
    pub fn vias_complete(&self, consumed: u32) -> bool {
        (consumed - 1) as usize >= self.via_edges.len()
    }
}

/// All restrictions of a street layer plus entry-edge indexes for both search
/// polarities.
#[derive(Debug, Default)]
pub struct TurnRestrictionTable {
    restrictions: Vec<TurnRestriction>,
    by_from_edge: HashMap<i32, Vec<i32>>,
    by_to_edge: HashMap<i32, Vec<i32>>,
}

impl TurnRestrictionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.restrictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restrictions.is_empty()
    }

    pub fn add(&mut self, restriction: TurnRestriction) -> i32 {
        let index = self.restrictions.len() as i32;
        self.by_from_edge
            .entry(restriction.from_edge)
            .or_default()
            .push(index);
        self.by_to_edge
            .entry(restriction.to_edge)
            .or_default()
            .push(index);
        self.restrictions.push(restriction);
        index
    }

    #[inline]
    pub fn get(&self, index: i32) -> &TurnRestriction {
        &self.restrictions[index as usize]
    }

    /// Restrictions whose sequence begins at `edge` under the given polarity.
    pub fn starting_at(&self, edge: i32, reverse: bool) -> &[i32] {
        let map = if reverse {
            &self.by_to_edge
        } else {
            &self.by_from_edge
        };
        map.get(&edge).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a state carrying `progress` may continue onto `candidate_edge`.
    ///
    /// A forbidden sequence blocks the move that would complete it; a mandatory
    /// sequence blocks every move except the one it prescribes.
    pub fn permits_turn(
        &self,
        progress: Option<&RestrictionProgress>,
        candidate_edge: i32,
        reverse: bool,
    ) -> bool {
        let Some(progress) = progress else {
            return true;
        };
        for (&ridx, &consumed) in progress {
            let restriction = self.get(ridx);
            let expected = restriction.expected_edge(consumed, reverse);
            if restriction.only {
                if candidate_edge != expected {
                    return false;
                }
            } else if restriction.vias_complete(consumed) && candidate_edge == expected {
                // All vias behind us and the candidate is the closing edge.
                return false;
            }
        }
        true
    }

    /// Progress map for a state that continued onto `candidate_edge`, assuming
    /// `permits_turn` approved the move. Sequences that diverged are dropped,
    /// sequences that completed are dropped, restrictions beginning on
    /// `candidate_edge` are activated. `None` when nothing is in progress.
    pub fn advance_progress(
        &self,
        progress: Option<&RestrictionProgress>,
        candidate_edge: i32,
        reverse: bool,
    ) -> Option<RestrictionProgress> {
        let mut next: RestrictionProgress = HashMap::new();
        if let Some(progress) = progress {
            for (&ridx, &consumed) in progress {
                let restriction = self.get(ridx);
                if !restriction.vias_complete(consumed)
                    && candidate_edge == restriction.expected_edge(consumed, reverse)
                {
                    next.insert(ridx, consumed + 1);
                }
                // Otherwise the sequence either completed (mandatory, final
                // edge taken) or diverged (forbidden, now harmless).
            }
        }
        self.begin_restrictions(&mut next, candidate_edge, reverse);
        if next.is_empty() {
            None
        } else {
            Some(next)
        }
    }

    /// Activate restrictions whose sequence begins at `edge`.
    pub fn begin_restrictions(
        &self,
        progress: &mut RestrictionProgress,
        edge: i32,
        reverse: bool,
    ) {
        for &ridx in self.starting_at(edge, reverse) {
            progress.entry(ridx).or_insert(1);
        }
    }
}
