//! Red-black Gauss-Seidel relaxation of `A phi = rhs`.
//!
//! Cells are coloured by the parity of the sum of their indices. Cells of one
//! colour only couple to cells of the other, so a half sweep updates every
//! cell of its colour concurrently.

use driftlap_geometry::{Face, FaceArray, IndexBox, shifted};
use serde::{Deserialize, Serialize};

use crate::field::{Field, Mask};
use crate::operator::{Operator, is_active, par_for_each_cell};
use crate::upwind::{left_cell_upwind_coeff, right_cell_upwind_coeff};

/// Coupling of a patch to the coarse/fine interface on one of its faces.
///
/// `mask` flags exterior cells (one layer outside the valid box) whose ghost
/// values are interpolated from the boundary cell. `coeff` holds, at each
/// boundary cell, the weight of that cell in the interpolated ghost value.
#[derive(Clone, Copy, Debug)]
pub struct CouplingFace<'a, const N: usize> {
    pub mask: &'a Mask<N>,
    pub coeff: &'a Field<N>,
}

/// Boundary coupling for every face of a patch. Faces set to `None` do not
/// couple.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundaryCoupling<'a, const N: usize>(pub FaceArray<N, Option<CouplingFace<'a, N>>>);

impl<'a, const N: usize> BoundaryCoupling<'a, N> {
    /// No coupling on any face.
    pub fn none() -> Self {
        Self(FaceArray::from_fn(|_| None))
    }

    pub fn with_face(mut self, face: Face<N>, coupling: CouplingFace<'a, N>) -> Self {
        self.0[face] = Some(coupling);
        self
    }

    /// The coupling factor `cf` of `cell` through `face` for component `n`.
    #[inline]
    fn factor(&self, valid: &IndexBox<N>, cell: [isize; N], face: Face<N>, n: usize) -> f64 {
        let Some(coupling) = self.0[face] else {
            return 0.0;
        };

        if !valid.is_on_face(cell, face) {
            return 0.0;
        }

        if coupling.mask.get(face.exterior(cell), 0) > 0 {
            coupling.coeff.get(cell, n)
        } else {
            0.0
        }
    }
}

/// Parameters of a smoothing pass.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relaxation {
    /// Over-relaxation factor. `1.0` is plain Gauss-Seidel.
    pub omega: f64,
    /// Number of full (red then black) sweeps.
    pub sweeps: usize,
}

impl Default for Relaxation {
    fn default() -> Self {
        Self {
            omega: 1.0,
            sweeps: 4,
        }
    }
}

impl<const N: usize> Operator<'_, N> {
    /// Updates every cell of `region` with `(sum of indices + color) % 2 == 0`.
    ///
    /// `valid` is the valid box of the patch. Cells on its boundary use
    /// `coupling` to fold the interpolated ghost value into the diagonal.
    /// `region` may extend past `valid` into the halo.
    pub fn relax(
        &self,
        region: IndexBox<N>,
        valid: IndexBox<N>,
        phi: &mut Field<N>,
        rhs: &Field<N>,
        coupling: &BoundaryCoupling<'_, N>,
        omega: f64,
        color: usize,
    ) {
        self.relax_inner(region, valid, phi, rhs, coupling, omega, color, None);
    }

    /// Masked form of `relax`. Inactive cells of the current colour are set
    /// to zero.
    pub fn relax_masked(
        &self,
        region: IndexBox<N>,
        valid: IndexBox<N>,
        phi: &mut Field<N>,
        rhs: &Field<N>,
        coupling: &BoundaryCoupling<'_, N>,
        omega: f64,
        color: usize,
        mask: &Mask<N>,
    ) {
        self.relax_inner(region, valid, phi, rhs, coupling, omega, color, Some(mask));
    }

    fn relax_inner(
        &self,
        region: IndexBox<N>,
        valid: IndexBox<N>,
        phi: &mut Field<N>,
        rhs: &Field<N>,
        coupling: &BoundaryCoupling<'_, N>,
        omega: f64,
        color: usize,
        mask: Option<&Mask<N>>,
    ) {
        self.check_coverage(&region);
        assert!(phi.covers(&region.grow(1)));
        assert!(rhs.covers(&region));

        let color = (color % 2) as isize;
        let phi = phi.shared();

        for n in 0..self.num_components() {
            par_for_each_cell(region, |cell| {
                if (cell.iter().sum::<isize>() + color).rem_euclid(2) != 0 {
                    return;
                }

                // Cells of one colour only read cells of the other, which no
                // task writes during this pass.
                unsafe {
                    if !is_active(mask, cell) {
                        phi.set(cell, n, 0.0);
                        return;
                    }

                    let gamma = self.gamma(cell, n);
                    let mut coupled = 0.0;
                    let mut rho = 0.0;

                    for axis in 0..N {
                        let lower = shifted(cell, axis, -1);
                        let upper = shifted(cell, axis, 1);
                        let (b, c) = (self.coefs.b[axis], self.coefs.c[axis]);

                        let (b_lo, b_hi) = (b.get(cell, n), b.get(upper, n));
                        let (c_lo, c_hi) = (c.get(cell, n), c.get(upper, n));
                        let (phi_lo, phi_hi) = (phi.get(lower, n), phi.get(upper, n));

                        let cf_lo = coupling.factor(&valid, cell, Face::negative(axis), n);
                        let cf_hi = coupling.factor(&valid, cell, Face::positive(axis), n);

                        coupled += self.dhsq[axis] * (b_lo * cf_lo + b_hi * cf_hi);
                        rho += self.dhsq[axis] * (b_lo * phi_lo + b_hi * phi_hi);
                        rho += self.dh[axis]
                            * (left_cell_upwind_coeff(c_lo, c_hi) * phi_lo
                                + right_cell_upwind_coeff(c_lo, c_hi) * phi_hi);
                    }

                    let center = phi.get(cell, n);
                    let res = rhs.get(cell, n) - (gamma * center - rho);
                    phi.set(cell, n, center + omega / (gamma - coupled) * res);
                }
            });
        }
    }

    /// Runs `relaxation.sweeps` full sweeps (colour 0 then colour 1) over
    /// `region` and returns the max-norm residual before the first sweep and
    /// after each one.
    pub fn smooth(
        &self,
        region: IndexBox<N>,
        valid: IndexBox<N>,
        phi: &mut Field<N>,
        rhs: &Field<N>,
        coupling: &BoundaryCoupling<'_, N>,
        mask: Option<&Mask<N>>,
        relaxation: Relaxation,
    ) -> Vec<f64> {
        let mut history = Vec::with_capacity(relaxation.sweeps + 1);
        history.push(self.residual_norm(region, rhs, phi, mask));

        for sweep in 0..relaxation.sweeps {
            for color in 0..2 {
                self.relax_inner(region, valid, phi, rhs, coupling, relaxation.omega, color, mask);
            }

            let norm = self.residual_norm(region, rhs, phi, mask);
            log::trace!("sweep {sweep}: residual {norm:e}");
            history.push(norm);
        }

        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{Coefficients, Scalars};

    fn constant(bounds: IndexBox<1>, value: f64) -> Field<1> {
        let mut field: Field<1> = Field::with_bounds(bounds, 1);
        field.fill(value);
        field
    }

    #[test]
    fn colors_partition_cells() {
        let region = IndexBox::new([0], [5]);
        let a = constant(region.grow(1), 1.0);
        let b = [constant(region.face_box(0), 0.0)];
        let c = [constant(region.face_box(0), 0.0)];

        let op = Operator::new(
            Coefficients {
                a: &a,
                b: [&b[0]],
                c: [&c[0]],
            },
            Scalars {
                alpha: 1.0,
                beta: 0.0,
                eta: 0.0,
            },
            [1.0],
        );

        // Pure reaction: one relaxation with omega = 1 solves a cell exactly.
        let rhs = constant(region, 3.0);
        let mut phi: Field<1> = Field::new(region, 1, 1);
        op.relax(region, region, &mut phi, &rhs, &BoundaryCoupling::none(), 1.0, 0);

        for cell in region {
            let expected = if cell[0] % 2 == 0 { 3.0 } else { 0.0 };
            assert_eq!(phi.get(cell, 0), expected);
        }

        op.relax(region, region, &mut phi, &rhs, &BoundaryCoupling::none(), 1.0, 1);
        assert!(region.iter().all(|cell| phi.get(cell, 0) == 3.0));
    }

    #[test]
    fn masked_cells_are_cleared() {
        let region = IndexBox::new([0], [3]);
        let a = constant(region.grow(1), 1.0);
        let b = [constant(region.face_box(0), 1.0)];
        let c = [constant(region.face_box(0), 0.0)];

        let op = Operator::new(
            Coefficients {
                a: &a,
                b: [&b[0]],
                c: [&c[0]],
            },
            Scalars::default(),
            [1.0],
        );

        let mut mask: Mask<1> = Mask::new(region, 0, 1);
        mask.fill_with(region, |cell, _| (cell[0] != 2) as i32);

        let rhs = constant(region, 1.0);
        let mut phi: Field<1> = Field::new(region, 1, 1);
        phi.fill(5.0);

        op.relax_masked(region, region, &mut phi, &rhs, &BoundaryCoupling::none(), 1.0, 0, &mask);
        assert_eq!(phi.get([2], 0), 0.0);
        // Other colour untouched.
        assert_eq!(phi.get([1], 0), 5.0);
        assert_eq!(phi.get([3], 0), 5.0);
    }

    #[test]
    fn coupling_enters_the_diagonal() {
        let region = IndexBox::new([0], [3]);
        let a = constant(region.grow(1), 0.0);
        let b = [constant(region.face_box(0), 1.0)];
        let c = [constant(region.face_box(0), 0.0)];

        let op = Operator::new(
            Coefficients {
                a: &a,
                b: [&b[0]],
                c: [&c[0]],
            },
            Scalars::default(),
            [1.0],
        );

        let mut exterior: Mask<1> = Mask::new(region, 1, 1);
        exterior.set([-1], 0, 1);
        let weight = constant(region, 0.5);

        let coupling = BoundaryCoupling::none().with_face(
            Face::negative(0),
            CouplingFace {
                mask: &exterior,
                coeff: &weight,
            },
        );

        let rhs = constant(region, 1.0);
        let mut phi: Field<1> = Field::new(region, 1, 1);
        op.relax(region, region, &mut phi, &rhs, &coupling, 1.0, 0);

        // gamma = 2, g_m_d = 2 - 0.5 on the boundary cell, 2 elsewhere.
        assert_eq!(phi.get([0], 0), 1.0 / 1.5);
        assert_eq!(phi.get([2], 0), 0.5);

        // An inactive exterior cell switches the coupling off.
        exterior.set([-1], 0, 0);
        let coupling = BoundaryCoupling::none().with_face(
            Face::negative(0),
            CouplingFace {
                mask: &exterior,
                coeff: &weight,
            },
        );
        let mut phi: Field<1> = Field::new(region, 1, 1);
        op.relax(region, region, &mut phi, &rhs, &coupling, 1.0, 0);
        assert_eq!(phi.get([0], 0), 0.5);
    }

    #[test]
    fn region_may_extend_into_the_halo() {
        let valid = IndexBox::new([0], [3]);
        let region = valid.grow(1);
        let a = constant(region.grow(1), 0.0);
        let b = [constant(region.face_box(0), 1.0)];
        let c = [constant(region.face_box(0), 0.0)];

        let op = Operator::new(
            Coefficients {
                a: &a,
                b: [&b[0]],
                c: [&c[0]],
            },
            Scalars::default(),
            [1.0],
        );

        let mut exterior: Mask<1> = Mask::new(valid, 1, 1);
        exterior.set([-1], 0, 1);
        exterior.set([4], 0, 1);
        let weight = constant(valid, 0.5);
        let coupling = BoundaryCoupling::none()
            .with_face(
                Face::negative(0),
                CouplingFace {
                    mask: &exterior,
                    coeff: &weight,
                },
            )
            .with_face(
                Face::positive(0),
                CouplingFace {
                    mask: &exterior,
                    coeff: &weight,
                },
            );

        let rhs = constant(region, 1.0);
        let mut phi: Field<1> = Field::new(valid, 2, 1);
        op.relax(region, valid, &mut phi, &rhs, &coupling, 1.0, 0);

        // Only the boundary cell of `valid` couples; the halo cell does not.
        assert_eq!(phi.get([0], 0), 1.0 / 1.5);
        assert_eq!(phi.get([2], 0), 0.5);
        assert_eq!(phi.get([4], 0), 0.5);

        op.relax(region, valid, &mut phi, &rhs, &coupling, 1.0, 1);
        assert!((phi.get([-1], 0) - 5.0 / 6.0).abs() < 1e-14);
        assert!((phi.get([1], 0) - 13.0 / 12.0).abs() < 1e-14);
        assert!((phi.get([3], 0) - 4.0 / 3.0).abs() < 1e-14);

        // The outer halo is read but never written.
        assert_eq!(phi.get([-2], 0), 0.0);
        assert_eq!(phi.get([5], 0), 0.0);
    }

    #[test]
    fn halo_cells_beside_a_face_do_not_couple() {
        let valid = IndexBox::new([0, 0], [1, 1]);
        let region = valid.grow(1);
        let a: Field<2> = Field::with_bounds(region.grow(1), 1);
        let mut b: [Field<2>; 2] = [
            Field::with_bounds(region.face_box(0), 1),
            Field::with_bounds(region.face_box(1), 1),
        ];
        b.iter_mut().for_each(|b| b.fill(1.0));
        let c: [Field<2>; 2] = [
            Field::with_bounds(region.face_box(0), 1),
            Field::with_bounds(region.face_box(1), 1),
        ];

        let op = Operator::new(
            Coefficients {
                a: &a,
                b: [&b[0], &b[1]],
                c: [&c[0], &c[1]],
            },
            Scalars::default(),
            [1.0, 1.0],
        );

        let mut exterior: Mask<2> = Mask::new(valid, 1, 1);
        exterior.fill(1);
        // Weights exist on the valid box only.
        let mut weight: Field<2> = Field::new(valid, 0, 1);
        weight.fill(0.5);
        let coupling = BoundaryCoupling::none().with_face(
            Face::negative(0),
            CouplingFace {
                mask: &exterior,
                coeff: &weight,
            },
        );

        let mut rhs: Field<2> = Field::with_bounds(region, 1);
        rhs.fill(1.0);
        let mut phi: Field<2> = Field::new(valid, 2, 1);
        op.relax(region, valid, &mut phi, &rhs, &coupling, 1.0, 1);

        assert_eq!(phi.get([0, 1], 0), 1.0 / 3.5);
        assert_eq!(phi.get([0, -1], 0), 0.25);
        assert_eq!(phi.get([0, 2], 0), 0.0);
        assert_eq!(phi.get([-1, 0], 0), 0.25);
    }
}
