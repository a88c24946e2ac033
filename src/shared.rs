use std::cell::UnsafeCell;

/// A mutable slice that many `rayon` tasks may write at once.
///
/// Every kernel partitions its output so that each entry is written by exactly
/// one task, and an entry being written is never read by another task during
/// the same pass. The red-black smoother relies on the second half of that
/// rule: a half sweep writes cells of one colour and reads only the other.
#[derive(Clone, Copy)]
pub struct SharedSlice<'a, T>(&'a [Cell<T>]);

#[repr(transparent)]
struct Cell<T>(UnsafeCell<T>);

// Access is only through `read`/`write`, whose callers guarantee that no
// entry is touched concurrently by a writer and any other task.
unsafe impl<T: Send + Sync> Sync for Cell<T> {}

impl<'a, T: Copy> SharedSlice<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        let len = data.len();
        let ptr = data.as_mut_ptr() as *const Cell<T>;
        // `Cell<T>` has the same layout as `T`, and the exclusive borrow of
        // `data` is held for `'a`.
        Self(unsafe { std::slice::from_raw_parts(ptr, len) })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads entry `index`.
    ///
    /// # Safety
    /// No other task may be writing this entry concurrently.
    #[inline]
    pub unsafe fn read(&self, index: usize) -> T {
        unsafe { *self.0[index].0.get() }
    }

    /// Overwrites entry `index`.
    ///
    /// # Safety
    /// No other task may be reading or writing this entry concurrently.
    #[inline]
    pub unsafe fn write(&self, index: usize, value: T) {
        unsafe { *self.0[index].0.get() = value }
    }
}

#[cfg(test)]
mod tests {
    use super::SharedSlice;
    use rayon::prelude::*;

    #[test]
    fn disjoint_parallel_writes() {
        let mut data = vec![0usize; 64];
        let shared = SharedSlice::new(&mut data);
        assert_eq!(shared.len(), 64);

        (0..64usize).into_par_iter().for_each(|i| unsafe {
            shared.write(i, 2 * i + shared.read(i));
        });

        assert!(data.iter().enumerate().all(|(i, &v)| v == 2 * i));
    }
}
