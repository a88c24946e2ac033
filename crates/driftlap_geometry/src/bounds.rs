use std::array;

use crate::Face;

/// An axis-aligned box of integer indices with inclusive lower and upper
/// bounds. Bounds are signed so that halo cells (at negative offsets) can be
/// addressed directly.
///
/// A box describes cells when used as a kernel region, and faces when it is
/// the result of `face_box()`: face `f` along `axis` separates cell
/// `f - e_axis` from cell `f`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBox<const N: usize> {
    pub lo: [isize; N],
    pub hi: [isize; N],
}

impl<const N: usize> IndexBox<N> {
    pub const fn new(lo: [isize; N], hi: [isize; N]) -> Self {
        Self { lo, hi }
    }

    /// Box of `size` cells with the given origin.
    pub fn from_size(origin: [isize; N], size: [usize; N]) -> Self {
        Self {
            lo: origin,
            hi: array::from_fn(|axis| origin[axis] + size[axis] as isize - 1),
        }
    }

    /// Number of indices along each axis (zero for empty axes).
    pub fn size(&self) -> [usize; N] {
        array::from_fn(|axis| (self.hi[axis] - self.lo[axis] + 1).max(0) as usize)
    }

    pub fn len(&self) -> usize {
        self.size().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        (0..N).any(|axis| self.hi[axis] < self.lo[axis])
    }

    pub fn contains(&self, index: [isize; N]) -> bool {
        (0..N).all(|axis| index[axis] >= self.lo[axis] && index[axis] <= self.hi[axis])
    }

    pub fn contains_box(&self, other: &IndexBox<N>) -> bool {
        other.is_empty() || (self.contains(other.lo) && self.contains(other.hi))
    }

    /// Linear offset of `index` within this box, axis 0 fastest.
    pub fn linear_from_index(&self, index: [isize; N]) -> usize {
        debug_assert!(
            self.contains(index),
            "index {index:?} outside of box {self:?}"
        );

        let size = self.size();
        let mut result = 0;
        let mut stride = 1;

        for axis in 0..N {
            result += stride * (index[axis] - self.lo[axis]) as usize;
            stride *= size[axis];
        }

        result
    }

    /// Expands the box by `width` layers on every face.
    pub fn grow(&self, width: usize) -> Self {
        let width = width as isize;
        Self {
            lo: array::from_fn(|axis| self.lo[axis] - width),
            hi: array::from_fn(|axis| self.hi[axis] + width),
        }
    }

    /// The faces of `axis` bounding the cells of this box: one extra index
    /// along `axis`.
    pub fn face_box(&self, axis: usize) -> Self {
        let mut hi = self.hi;
        hi[axis] += 1;
        Self { lo: self.lo, hi }
    }

    /// The single layer of indices lying on the given face of this box.
    pub fn face_layer(&self, face: Face<N>) -> Self {
        let mut result = *self;
        if face.side {
            result.lo[face.axis] = self.hi[face.axis];
        } else {
            result.hi[face.axis] = self.lo[face.axis];
        }
        result
    }

    /// Is `index` a cell of this box lying on the given face?
    pub fn is_on_face(&self, index: [isize; N], face: Face<N>) -> bool {
        self.face_layer(face).contains(index)
    }

    /// Coarsens the box by `ratio`, rounding towards negative infinity.
    pub fn coarsen(&self, ratio: usize) -> Self {
        let ratio = ratio as isize;
        Self {
            lo: array::from_fn(|axis| self.lo[axis].div_euclid(ratio)),
            hi: array::from_fn(|axis| self.hi[axis].div_euclid(ratio)),
        }
    }

    /// Refines the box by `ratio`; each cell becomes `ratio^N` cells.
    pub fn refine(&self, ratio: usize) -> Self {
        let ratio = ratio as isize;
        Self {
            lo: array::from_fn(|axis| self.lo[axis] * ratio),
            hi: array::from_fn(|axis| (self.hi[axis] + 1) * ratio - 1),
        }
    }

    /// Number of lines of the box running along axis 0.
    pub fn line_count(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.size()[1..].iter().product()
    }

    /// First index of the `line`th line along axis 0, lines ordered with
    /// axis 1 fastest.
    pub fn line_origin(&self, line: usize) -> [isize; N] {
        debug_assert!(line < self.line_count());

        let size = self.size();
        let mut rest = line;
        let mut result = self.lo;

        for axis in 1..N {
            result[axis] += (rest % size[axis]) as isize;
            rest /= size[axis];
        }

        result
    }

    /// Iterates every index of the box, axis 0 fastest.
    pub fn iter(&self) -> IndexBoxIter<N> {
        IndexBoxIter {
            bounds: *self,
            cursor: (!self.is_empty()).then_some(self.lo),
        }
    }
}

impl<const N: usize> IntoIterator for IndexBox<N> {
    type IntoIter = IndexBoxIter<N>;
    type Item = [isize; N];

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct IndexBoxIter<const N: usize> {
    bounds: IndexBox<N>,
    cursor: Option<[isize; N]>,
}

impl<const N: usize> Iterator for IndexBoxIter<N> {
    type Item = [isize; N];

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.cursor?;

        // Odometer increment, axis 0 fastest.
        let mut next = current;
        self.cursor = None;
        for axis in 0..N {
            if next[axis] < self.bounds.hi[axis] {
                next[axis] += 1;
                self.cursor = Some(next);
                break;
            }
            next[axis] = self.bounds.lo[axis];
        }

        Some(current)
    }
}

/// Returns `index` moved by `delta` along `axis`.
#[inline]
pub fn shifted<const N: usize>(index: [isize; N], axis: usize, delta: isize) -> [isize; N] {
    let mut result = index;
    result[axis] += delta;
    result
}
