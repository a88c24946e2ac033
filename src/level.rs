use driftlap_geometry::IndexBox;

use crate::config::Overset;
use crate::field::{Field, Mask};
use crate::overset::{coarsen_overset_mask, rescale_overset_face_coefficients};

/// Builds the overset data of a coarse level from the level above it.
///
/// The whole allocated box of `coarse_mask` (valid cells and halo) is
/// coarsened from `fine_mask`, then the diffusion coefficients `b[axis]` on
/// every face of `region` separating an active from a covered cell are
/// scaled by `overset.face_factor()`. Returns the number of partially covered
/// coarse cells.
pub fn prepare_overset_level<const N: usize>(
    region: IndexBox<N>,
    fine_mask: &Mask<N>,
    coarse_mask: &mut Mask<N>,
    b: [&mut Field<N>; N],
    overset: &Overset,
) -> usize {
    let violations = coarsen_overset_mask(coarse_mask.bounds(), coarse_mask, fine_mask);

    let factor = overset.face_factor();
    log::debug!("rescaling overset interface faces of {region:?} by {factor}");

    for (axis, b) in b.into_iter().enumerate() {
        rescale_overset_face_coefficients(region, axis, b, coarse_mask, factor);
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covered_corner() {
        let region = IndexBox::new([0, 0], [3, 3]);
        let coarse_bounds = region.grow(1);

        // Cells with both indices >= 2 on the coarse level are covered.
        let mut fine_mask: Mask<2> = Mask::with_bounds(coarse_bounds.refine(2), 1);
        fine_mask.fill_with(fine_mask.bounds(), |cell, _| {
            !(cell[0] >= 4 && cell[1] >= 4) as i32
        });

        let mut coarse_mask: Mask<2> = Mask::with_bounds(coarse_bounds, 1);
        let mut bx: Field<2> = Field::faces(region, 0, 0, 1);
        let mut by: Field<2> = Field::faces(region, 1, 0, 1);
        bx.fill(1.0);
        by.fill(1.0);

        let overset = Overset {
            ratio: 2,
            factor: None,
        };
        let violations =
            prepare_overset_level(region, &fine_mask, &mut coarse_mask, [&mut bx, &mut by], &overset);
        assert_eq!(violations, 0);

        assert_eq!(coarse_mask.get([1, 1], 0), 1);
        assert_eq!(coarse_mask.get([2, 2], 0), 0);

        // Face between (1, 3) and (2, 3) separates active from covered.
        assert_eq!(bx.get([2, 3], 0), 4.0 / 3.0);
        assert_eq!(bx.get([2, 1], 0), 1.0);
        assert_eq!(bx.get([3, 3], 0), 1.0);
        assert_eq!(by.get([3, 2], 0), 4.0 / 3.0);
        assert_eq!(by.get([1, 2], 0), 1.0);
    }
}
