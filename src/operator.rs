//! The drift-diffusion-reaction operator
//!
//! `A x = alpha a x - beta div(b grad x) - eta div(c upwind(x))`
//!
//! discretised on cell centres with face-centred `b` and `c`.

use driftlap_geometry::{IndexBox, shifted};
use rayon::prelude::*;

use crate::field::{Field, Mask};
use crate::upwind::{cell_upwind_coeff, face_state};

/// Scalars multiplying the reaction, diffusion and advection terms.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scalars {
    pub alpha: f64,
    pub beta: f64,
    pub eta: f64,
}

impl Default for Scalars {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            beta: 1.0,
            eta: 0.0,
        }
    }
}

/// Coefficient fields of the operator. `a` is cell centred with a single
/// component. `b[axis]` and `c[axis]` are face centred along `axis` and carry
/// one component per solution component.
#[derive(Clone, Copy, Debug)]
pub struct Coefficients<'a, const N: usize> {
    pub a: &'a Field<N>,
    pub b: [&'a Field<N>; N],
    pub c: [&'a Field<N>; N],
}

/// A borrowed, immutable description of the operator on one patch. Kernels
/// read the coefficients and write only the output they are handed.
#[derive(Clone, Copy, Debug)]
pub struct Operator<'a, const N: usize> {
    pub(crate) coefs: Coefficients<'a, N>,
    pub(crate) scalars: Scalars,
    /// `beta / dx^2` per axis.
    pub(crate) dhsq: [f64; N],
    /// `eta / dx` per axis.
    pub(crate) dh: [f64; N],
    dxinv: [f64; N],
}

impl<'a, const N: usize> Operator<'a, N> {
    pub fn new(coefs: Coefficients<'a, N>, scalars: Scalars, dxinv: [f64; N]) -> Self {
        let num_components = coefs.b[0].num_components();
        for axis in 0..N {
            assert_eq!(coefs.b[axis].num_components(), num_components);
            assert_eq!(coefs.c[axis].num_components(), num_components);
        }

        Self {
            coefs,
            scalars,
            dhsq: std::array::from_fn(|axis| scalars.beta * dxinv[axis] * dxinv[axis]),
            dh: std::array::from_fn(|axis| scalars.eta * dxinv[axis]),
            dxinv,
        }
    }

    pub fn dxinv(&self) -> [f64; N] {
        self.dxinv
    }

    /// Number of solution components the coefficients describe.
    pub fn num_components(&self) -> usize {
        self.coefs.b[0].num_components()
    }

    /// Diagonal entry of the stencil at `cell` for component `n`.
    #[inline]
    pub(crate) fn gamma(&self, cell: [isize; N], n: usize) -> f64 {
        let mut gamma = self.scalars.alpha * self.coefs.a.get(cell, 0);

        for axis in 0..N {
            let upper = shifted(cell, axis, 1);
            let (b, c) = (self.coefs.b[axis], self.coefs.c[axis]);

            gamma += self.dhsq[axis] * (b.get(cell, n) + b.get(upper, n));
            gamma -= self.dh[axis] * cell_upwind_coeff(c.get(cell, n), c.get(upper, n));
        }

        gamma
    }

    /// `(A x)(cell)` for component `n`.
    #[inline]
    pub(crate) fn apply_cell(&self, x: &Field<N>, cell: [isize; N], n: usize) -> f64 {
        let center = x.get(cell, n);
        let mut result = self.scalars.alpha * self.coefs.a.get(cell, 0) * center;

        for axis in 0..N {
            let lower = shifted(cell, axis, -1);
            let upper = shifted(cell, axis, 1);
            let (b, c) = (self.coefs.b[axis], self.coefs.c[axis]);

            let (x_lo, x_hi) = (x.get(lower, n), x.get(upper, n));
            let (b_lo, b_hi) = (b.get(cell, n), b.get(upper, n));
            let (c_lo, c_hi) = (c.get(cell, n), c.get(upper, n));

            result -= self.dhsq[axis] * (b_hi * (x_hi - center) - b_lo * (center - x_lo));
            result -= self.dh[axis]
                * (c_hi * face_state(c_hi, center, x_hi) - c_lo * face_state(c_lo, x_lo, center));
        }

        result
    }

    pub(crate) fn check_coverage(&self, region: &IndexBox<N>) {
        assert!(
            self.coefs.a.covers(region),
            "reaction coefficient does not cover {region:?}"
        );
        for axis in 0..N {
            let faces = region.face_box(axis);
            assert!(self.coefs.b[axis].covers(&faces));
            assert!(self.coefs.c[axis].covers(&faces));
        }
    }

    /// Writes `y = A x` on every cell of `region`.
    pub fn apply(&self, region: IndexBox<N>, x: &Field<N>, y: &mut Field<N>) {
        self.apply_inner(region, x, y, None);
    }

    /// Writes `y = A x` on active cells of `region` and `y = 0` on cells
    /// whose mask is zero.
    pub fn apply_masked(&self, region: IndexBox<N>, x: &Field<N>, y: &mut Field<N>, mask: &Mask<N>) {
        self.apply_inner(region, x, y, Some(mask));
    }

    fn apply_inner(
        &self,
        region: IndexBox<N>,
        x: &Field<N>,
        y: &mut Field<N>,
        mask: Option<&Mask<N>>,
    ) {
        self.check_coverage(&region);
        assert!(x.covers(&region.grow(1)));
        assert!(y.covers(&region));

        let dest = y.shared();

        for n in 0..self.num_components() {
            par_for_each_cell(region, |cell| {
                let value = if is_active(mask, cell) {
                    self.apply_cell(x, cell, n)
                } else {
                    0.0
                };
                // Each cell is written by exactly one task.
                unsafe { dest.set(cell, n, value) };
            });
        }
    }

    /// Writes `out = rhs - A x` on `region`, zero on masked cells.
    pub fn residual(
        &self,
        region: IndexBox<N>,
        rhs: &Field<N>,
        x: &Field<N>,
        out: &mut Field<N>,
        mask: Option<&Mask<N>>,
    ) {
        self.check_coverage(&region);
        assert!(x.covers(&region.grow(1)));
        assert!(rhs.covers(&region) && out.covers(&region));

        let dest = out.shared();

        for n in 0..self.num_components() {
            par_for_each_cell(region, |cell| {
                let value = if is_active(mask, cell) {
                    rhs.get(cell, n) - self.apply_cell(x, cell, n)
                } else {
                    0.0
                };
                unsafe { dest.set(cell, n, value) };
            });
        }
    }

    /// Max norm of `rhs - A x` over the active cells of `region`.
    pub fn residual_norm(
        &self,
        region: IndexBox<N>,
        rhs: &Field<N>,
        x: &Field<N>,
        mask: Option<&Mask<N>>,
    ) -> f64 {
        self.check_coverage(&region);
        assert!(x.covers(&region.grow(1)));
        assert!(rhs.covers(&region));

        let length = region.size()[0];

        (0..region.line_count())
            .into_par_iter()
            .map(|line| {
                let origin = region.line_origin(line);
                let mut result: f64 = 0.0;

                for n in 0..self.num_components() {
                    let mut cell = origin;
                    for _ in 0..length {
                        if is_active(mask, cell) {
                            let res = rhs.get(cell, n) - self.apply_cell(x, cell, n);
                            result = result.max(res.abs());
                        }
                        cell[0] += 1;
                    }
                }

                result
            })
            .reduce(|| 0.0, f64::max)
    }
}

#[inline]
pub(crate) fn is_active<const N: usize>(mask: Option<&Mask<N>>, cell: [isize; N]) -> bool {
    mask.is_none_or(|mask| mask.get(cell, 0) != 0)
}

/// Runs `f` on every cell of `region`, one `rayon` task per line along axis 0.
pub(crate) fn par_for_each_cell<const N: usize, F>(region: IndexBox<N>, f: F)
where
    F: Fn([isize; N]) + Sync + Send,
{
    let length = region.size()[0] as isize;

    (0..region.line_count()).into_par_iter().for_each(|line| {
        let mut cell = region.line_origin(line);
        for _ in 0..length {
            f(cell);
            cell[0] += 1;
        }
    });
}

/// Sequential counterpart of `par_for_each_cell` for kernels that accumulate.
pub(crate) fn for_each_cell<const N: usize, F>(region: IndexBox<N>, mut f: F)
where
    F: FnMut([isize; N]),
{
    for cell in region.iter() {
        f(cell);
    }
}
