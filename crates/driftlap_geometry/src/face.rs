use std::array;
use std::ops::{Index, IndexMut};

/// One of the `2 N` faces of a box of cells, identified by the axis it is
/// normal to and the side (`true` for the positive side) it lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Face<const N: usize> {
    pub axis: usize,
    pub side: bool,
}

impl<const N: usize> Face<N> {
    pub fn negative(axis: usize) -> Self {
        Self::new(axis, false)
    }

    pub fn positive(axis: usize) -> Self {
        Self::new(axis, true)
    }

    /// Face normal to `axis`, on the upper side if `side` is set.
    pub fn new(axis: usize, side: bool) -> Self {
        debug_assert!(axis < N, "axis {axis} out of range for {N} dimensions");
        Self { axis, side }
    }

    /// Unit step (-1 or +1) taken along `axis` when crossing this face outwards.
    pub fn sign(self) -> isize {
        if self.side { 1 } else { -1 }
    }

    /// Position of this face in `faces()` order.
    pub fn to_linear(self) -> usize {
        2 * self.axis + self.side as usize
    }

    pub fn from_linear(linear: usize) -> Self {
        Self::new(linear >> 1, linear & 1 != 0)
    }

    /// The cell across this face from `cell`.
    pub fn exterior(self, cell: [isize; N]) -> [isize; N] {
        let mut result = cell;
        result[self.axis] += self.sign();
        result
    }
}

/// Every face in `N` dimensions: negative then positive side of axis 0, then
/// axis 1, and so on.
pub fn faces<const N: usize>() -> impl ExactSizeIterator<Item = Face<N>> + Clone {
    (0..2 * N).map(Face::from_linear)
}

/// A small fixed-size collection holding one value per face, keyed by axis and side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceArray<const N: usize, T>([[T; 2]; N]);

impl<const N: usize, T> FaceArray<N, T> {
    /// Builds the array by calling `f` once for every face, in `faces()` order.
    pub fn from_fn<F: FnMut(Face<N>) -> T>(mut f: F) -> Self {
        Self(array::from_fn(|axis| {
            [f(Face::negative(axis)), f(Face::positive(axis))]
        }))
    }
}

impl<const N: usize, T: Default> Default for FaceArray<N, T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<const N: usize, T> Index<Face<N>> for FaceArray<N, T> {
    type Output = T;

    fn index(&self, face: Face<N>) -> &T {
        &self.0[face.axis][face.side as usize]
    }
}

impl<const N: usize, T> IndexMut<Face<N>> for FaceArray<N, T> {
    fn index_mut(&mut self, face: Face<N>) -> &mut T {
        &mut self.0[face.axis][face.side as usize]
    }
}
