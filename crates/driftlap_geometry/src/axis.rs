/// A subset of the `N` coordinate axes, stored as a bitfield.
///
/// Each subset names one child of a cell refined by a factor of two: the
/// child is offset by one along every axis in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AxisMask<const N: usize>(usize);

impl<const N: usize> AxisMask<N> {
    /// Number of distinct subsets.
    pub const COUNT: usize = 1 << N;

    /// All subsets, from the empty set to the full set.
    pub fn enumerate() -> impl ExactSizeIterator<Item = Self> {
        (0..Self::COUNT).map(Self)
    }

    pub fn contains(self, axis: usize) -> bool {
        self.0 & (1 << axis) != 0
    }

    /// Offset (0 or 1 along each axis) of this child within its parent.
    pub fn offset(self) -> [isize; N] {
        std::array::from_fn(|axis| self.contains(axis) as isize)
    }

    /// Index of this child of the coarse cell `parent`.
    pub fn child_of(self, parent: [isize; N]) -> [isize; N] {
        let offset = self.offset();
        std::array::from_fn(|axis| 2 * parent[axis] + offset[axis])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_of_a_cell() {
        let offsets: Vec<_> = AxisMask::<2>::enumerate().map(|m| m.offset()).collect();
        assert_eq!(offsets, vec![[0, 0], [1, 0], [0, 1], [1, 1]]);
        assert_eq!(AxisMask::<3>::enumerate().len(), 8);

        let children: Vec<_> = AxisMask::<2>::enumerate()
            .map(|m| m.child_of([-1, 3]))
            .collect();
        assert_eq!(children, vec![[-2, 6], [-1, 6], [-2, 7], [-1, 7]]);

        let last = AxisMask::<3>::enumerate().last().unwrap();
        assert!((0..3).all(|axis| last.contains(axis)));
    }
}
