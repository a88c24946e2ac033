//! Level-construction helpers for overset (covered) cells: coarsening the
//! active-cell mask and adjusting diffusion coefficients on faces that
//! separate active from covered cells.

use driftlap_geometry::{AxisMask, IndexBox, shifted};
use rayon::prelude::*;

use crate::field::{Field, Mask};
use crate::operator::par_for_each_cell;

/// Weight applied to a face coefficient on an active/covered interface after
/// coarsening by `ratio`: `2 r / (r + 1)`.
pub fn overset_face_factor(ratio: usize) -> f64 {
    let ratio = ratio as f64;
    2.0 * ratio / (ratio + 1.0)
}

/// Coarsens an overset mask by a factor of two.
///
/// A coarse cell becomes active when all `2^N` of its children are active and
/// inactive when none are. Any other child sum is a coverage violation: the
/// raw sum is left in the coarse cell and counted in the return value.
pub fn coarsen_overset_mask<const N: usize>(
    region: IndexBox<N>,
    coarse: &mut Mask<N>,
    fine: &Mask<N>,
) -> usize {
    assert!(coarse.covers(&region));
    assert!(fine.covers(&region.refine(2)));

    let full = AxisMask::<N>::COUNT as i32;
    let length = region.size()[0];
    let dest = coarse.shared();

    let violations: usize = (0..region.line_count())
        .into_par_iter()
        .map(|line| {
            let mut cell = region.line_origin(line);
            let mut violations = 0;

            for _ in 0..length {
                let sum: i32 = AxisMask::<N>::enumerate()
                    .map(|child| fine.get(child.child_of(cell), 0))
                    .sum();

                let value = if sum == full {
                    1
                } else if sum == 0 {
                    0
                } else {
                    violations += 1;
                    sum
                };

                unsafe { dest.set(cell, 0, value) };
                cell[0] += 1;
            }

            violations
        })
        .sum();

    if violations > 0 {
        log::warn!(
            "overset mask is not consistent with coarsening: {violations} partially covered cells in {region:?}"
        );
    }

    violations
}

/// Multiplies `b` by `factor` (every component) on each face of `axis`
/// bounding `region` whose two adjacent cells have a mask sum of one.
pub fn rescale_overset_face_coefficients<const N: usize>(
    region: IndexBox<N>,
    axis: usize,
    b: &mut Field<N>,
    mask: &Mask<N>,
    factor: f64,
) {
    let faces = region.face_box(axis);
    assert!(b.covers(&faces));

    let mut cells = faces;
    cells.lo[axis] -= 1;
    assert!(mask.covers(&cells));

    let num_components = b.num_components();
    let dest = b.shared();

    for n in 0..num_components {
        par_for_each_cell(faces, |face| {
            let lower = shifted(face, axis, -1);
            if mask.get(lower, 0) + mask.get(face, 0) == 1 {
                unsafe { dest.set(face, n, dest.get(face, n) * factor) };
            }
        });
    }
}
