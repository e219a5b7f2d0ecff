use crate::types::{ActionId, Direction};
use bitvec::prelude::*;

/// Per-direction compatibility matrices over actions.
///
/// Stores the six matrices in one flat bitset for fast lookup.
/// Indexing: `direction * num_actions * num_actions + a * num_actions + b`.
///
/// A set bit means a cell holding `a` is supported by a neighbour holding `b`
/// on the source side of `direction`: for `+x` that neighbour sits at `x - 1`,
/// for `+y` at `y + 1`, for `+z` at `z + 1`, and the negative directions take
/// the opposite side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyRules {
    num_actions: usize,
    allowed: BitVec,
}

impl AdjacencyRules {
    /// Number of axis directions.
pub const NUM_DIRECTIONS: usize = 6;

    /// Creates rules with every pair disallowed.
    pub fn empty(num_actions: usize) -> Self {
        Self {
            num_actions,
            allowed: bitvec![0; Self::NUM_DIRECTIONS * num_actions * num_actions],
        }
    }

    /// Builds rules from explicit `(direction, a, b)` triples.
    ///
    /// No symmetry or transpose closure is applied.
    pub fn from_allowed_tuples(
        num_actions: usize,
        allowed: impl IntoIterator<Item = (Direction, usize, usize)>,
    ) -> Self {
        let mut rules = Self::empty(num_actions);
        for (direction, a, b) in allowed {
            rules.allow(direction, ActionId(a), ActionId(b));
        }
        rules
    }

    /// Number of actions the matrix was built for.
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    #[inline]
    fn index(&self, direction: Direction, a: ActionId, b: ActionId) -> usize {
        direction.index() * self.num_actions * self.num_actions + a.0 * self.num_actions + b.0
    }

    /// Marks `b` as allowed next to `a` along `direction`.
    ///
    /// # Panics
    ///
    /// Panics if either action is out of range.
    pub fn allow(&mut self, direction: Direction, a: ActionId, b: ActionId) {
        assert!(
            a.0 < self.num_actions && b.0 < self.num_actions,
            "action out of range: ({a}, {b}) with {} actions",
            self.num_actions
        );
        let index = self.index(direction, a, b);
        self.allowed.set(index, true);
    }

    /// Checks whether `b` may sit next to `a` along `direction`.
    ///
    /// Out-of-range actions are treated as disallowed.
    #[inline]
    pub fn check(&self, direction: Direction, a: ActionId, b: ActionId) -> bool {
        if a.0 >= self.num_actions || b.0 >= self.num_actions {
            return false;
        }
        self.allowed[self.index(direction, a, b)]
    }

    /// The row of `a` in the matrix for `direction`, one bit per candidate `b`.
    pub fn row(&self, direction: Direction, a: ActionId) -> &BitSlice {
        let start = self.index(direction, a, ActionId(0));
        &self.allowed[start..start + self.num_actions]
    }

    /// Overwrites `target` with the transpose of `source`.
    pub fn transpose_into(&mut self, source: Direction, target: Direction) {
        for a in 0..self.num_actions {
            for b in 0..self.num_actions {
                let value = self.check(source, ActionId(b), ActionId(a));
                let index = self.index(target, ActionId(a), ActionId(b));
                self.allowed.set(index, value);
            }
        }
    }

    /// Whether `second` is exactly the transpose of `first`.
    pub fn is_transpose(&self, first: Direction, second: Direction) -> bool {
        (0..self.num_actions).all(|a| {
            (0..self.num_actions).all(|b| {
                self.check(first, ActionId(a), ActionId(b))
                    == self.check(second, ActionId(b), ActionId(a))
            })
        })
    }

    /// Number of allowed pairs along `direction`.
    pub fn count_allowed(&self, direction: Direction) -> usize {
        let size = self.num_actions * self.num_actions;
        let start = direction.index() * size;
        self.allowed[start..start + size].count_ones()
    }

    /// Raw access to the flattened bitset.
    pub fn allowed(&self) -> &BitSlice {
        &self.allowed
    }
}
