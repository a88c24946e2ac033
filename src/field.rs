//! Dense, multi-component arrays addressed by cell index.

use std::ops::Range;

use driftlap_geometry::IndexBox;

use crate::shared::SharedSlice;

/// A dense array over an index box, with `num_components` values per index.
///
/// Storage is component-major: all values of component 0 (axis 0 fastest),
/// followed by component 1, and so on. The allocated box includes whatever
/// halo the caller needs; kernels only ever read one layer beyond the region
/// they are given.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<const N: usize, T = f64> {
    bounds: IndexBox<N>,
    num_components: usize,
    data: Vec<T>,
}

/// Integer cell flags: 1 marks an active cell, 0 an inactive (covered) one.
pub type Mask<const N: usize> = Field<N, i32>;

impl<const N: usize, T: Copy + Default> Field<N, T> {
    /// Allocates a zeroed field over `valid` grown by `ghost` halo layers.
    pub fn new(valid: IndexBox<N>, ghost: usize, num_components: usize) -> Self {
        Self::with_bounds(valid.grow(ghost), num_components)
    }

    /// Allocates a zeroed field over exactly `bounds`.
    pub fn with_bounds(bounds: IndexBox<N>, num_components: usize) -> Self {
        Self {
            bounds,
            num_components,
            data: vec![T::default(); bounds.len() * num_components],
        }
    }

    /// Allocates a face-centred field for faces of `axis` bounding `valid`,
    /// grown by `ghost` layers.
    pub fn faces(valid: IndexBox<N>, axis: usize, ghost: usize, num_components: usize) -> Self {
        Self::with_bounds(valid.face_box(axis).grow(ghost), num_components)
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Sets every component at every index of `region` from `f`.
    pub fn fill_with<F: FnMut([isize; N], usize) -> T>(&mut self, region: IndexBox<N>, mut f: F) {
        assert!(self.bounds.contains_box(&region));
        for component in 0..self.num_components {
            for index in region.iter() {
                let linear = self.index(index, component);
                self.data[linear] = f(index, component);
            }
        }
    }
}

impl<const N: usize, T: Copy> Field<N, T> {
    pub fn bounds(&self) -> IndexBox<N> {
        self.bounds
    }

    pub fn num_components(&self) -> usize {
        self.num_components
    }

    pub fn components(&self) -> Range<usize> {
        0..self.num_components
    }

    /// Linear position of `(index, component)` in storage.
    #[inline]
    pub fn index(&self, index: [isize; N], component: usize) -> usize {
        debug_assert!(component < self.num_components);
        component * self.bounds.len() + self.bounds.linear_from_index(index)
    }

    #[inline]
    pub fn get(&self, index: [isize; N], component: usize) -> T {
        self.data[self.index(index, component)]
    }

    #[inline]
    pub fn set(&mut self, index: [isize; N], component: usize, value: T) {
        let linear = self.index(index, component);
        self.data[linear] = value;
    }

    pub fn component(&self, component: usize) -> &[T] {
        let stride = self.bounds.len();
        &self.data[stride * component..stride * (component + 1)]
    }

    pub fn storage(&self) -> &[T] {
        &self.data
    }

    /// Does this field hold values for every index of `region`?
    pub fn covers(&self, region: &IndexBox<N>) -> bool {
        self.bounds.contains_box(region)
    }
}

impl<const N: usize, T: Copy + Send + Sync> Field<N, T> {
    /// A view of this field that can be written from several threads at once,
    /// provided no two threads touch the same entry.
    pub fn shared(&mut self) -> SharedField<'_, N, T> {
        SharedField {
            bounds: self.bounds,
            num_components: self.num_components,
            data: SharedSlice::new(&mut self.data),
        }
    }
}

/// Unsynchronised, shareable view of a mutable `Field`.
#[derive(Clone, Copy)]
pub struct SharedField<'a, const N: usize, T> {
    bounds: IndexBox<N>,
    num_components: usize,
    data: SharedSlice<'a, T>,
}

impl<const N: usize, T: Copy> SharedField<'_, N, T> {
    pub fn bounds(&self) -> IndexBox<N> {
        self.bounds
    }

    #[inline]
    fn index(&self, index: [isize; N], component: usize) -> usize {
        debug_assert!(component < self.num_components);
        component * self.bounds.len() + self.bounds.linear_from_index(index)
    }

    /// # Safety
    /// No other thread may be writing this entry concurrently.
    #[inline]
    pub unsafe fn get(&self, index: [isize; N], component: usize) -> T {
        unsafe { self.data.read(self.index(index, component)) }
    }

    /// # Safety
    /// No other thread may be reading or writing this entry concurrently.
    #[inline]
    pub unsafe fn set(&self, index: [isize; N], component: usize, value: T) {
        unsafe { self.data.write(self.index(index, component), value) }
    }
}

impl<const N: usize> Field<N, f64> {
    /// Maximum absolute value over `region` and all components.
    pub fn norm_inf(&self, region: IndexBox<N>) -> f64 {
        let mut result: f64 = 0.0;
        for component in self.components() {
            for index in region.iter() {
                result = result.max(self.get(index, component).abs());
            }
        }
        result
    }
}
