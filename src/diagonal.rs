//! Services built on the diagonal of the stencil: Jacobi-style normalisation,
//! diagonal extraction, a diagonal-dominance diagnostic and the net
//! off-diagonal coefficient of each face.

use driftlap_geometry::{IndexBox, shifted};
use serde::{Deserialize, Serialize};

use crate::error::OperatorError;
use crate::field::Field;
use crate::operator::{Operator, for_each_cell, par_for_each_cell};
use crate::upwind::{left_cell_upwind_coeff, right_cell_upwind_coeff};

/// What `check_diagonal_dominance` does when it finds a violating cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DominancePolicy {
    /// Log every violation and keep going.
    #[default]
    Warn,
    /// Stop at the first violation and return an error.
    Abort,
}

/// Summary of a diagonal-dominance check.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DominanceReport {
    /// Number of (cell, component) pairs examined.
    pub checked: usize,
    /// Number of pairs with `|offdiag| > |diag|`.
    pub violations: usize,
    /// Largest `|offdiag| / |diag|` seen.
    pub worst_ratio: f64,
}

impl DominanceReport {
    pub fn is_dominant(&self) -> bool {
        self.violations == 0
    }
}

impl<const N: usize> Operator<'_, N> {
    /// Divides `x` by the diagonal of the operator on every cell of `region`.
    pub fn normalize(&self, region: IndexBox<N>, x: &mut Field<N>) {
        self.check_coverage(&region);
        assert!(x.covers(&region));

        let x = x.shared();

        for n in 0..self.num_components() {
            par_for_each_cell(region, |cell| {
                let gamma = self.gamma(cell, n);
                unsafe { x.set(cell, n, x.get(cell, n) / gamma) };
            });
        }
    }

    /// Writes the diagonal of the operator on every cell of `region`.
    pub fn diagonal(&self, region: IndexBox<N>, out: &mut Field<N>) {
        self.check_coverage(&region);
        assert!(out.covers(&region));
        assert!(out.num_components() >= self.num_components());

        let out = out.shared();

        for n in 0..self.num_components() {
            par_for_each_cell(region, |cell| unsafe {
                out.set(cell, n, self.gamma(cell, n))
            });
        }
    }

    /// Sum of the off-diagonal stencil weights at `cell`.
    fn offdiag(&self, cell: [isize; N], n: usize) -> f64 {
        let mut offdiff = 0.0;
        let mut offadv = 0.0;

        for axis in 0..N {
            let upper = shifted(cell, axis, 1);
            let (b, c) = (self.coefs.b[axis], self.coefs.c[axis]);
            let (c_lo, c_hi) = (c.get(cell, n), c.get(upper, n));

            offdiff -= self.dhsq[axis] * (b.get(cell, n) + b.get(upper, n));
            offadv -= self.dh[axis]
                * (left_cell_upwind_coeff(c_lo, c_hi) + right_cell_upwind_coeff(c_lo, c_hi));
        }

        offdiff + offadv
    }

    /// Compares the diagonal against the summed off-diagonal weights on every
    /// cell of `region`.
    pub fn check_diagonal_dominance(
        &self,
        region: IndexBox<N>,
        policy: DominancePolicy,
    ) -> Result<DominanceReport, OperatorError> {
        self.check_coverage(&region);

        let mut report = DominanceReport::default();
        let mut failure = None;

        for n in 0..self.num_components() {
            for_each_cell(region, |cell| {
                if failure.is_some() {
                    return;
                }

                let diag = self.gamma(cell, n);
                let offdiag = self.offdiag(cell, n);

                report.checked += 1;
                if diag != 0.0 {
                    report.worst_ratio = report.worst_ratio.max(offdiag.abs() / diag.abs());
                }

                if offdiag.abs() > diag.abs() {
                    report.violations += 1;
                    log::debug!(
                        "not diagonally dominant at {cell:?}, component {n}: diag {diag:e}, offdiag {offdiag:e}"
                    );

                    if policy == DominancePolicy::Abort {
                        failure = Some(OperatorError::NotDiagonallyDominant {
                            cell: cell.to_vec(),
                            component: n,
                            diag,
                            offdiag,
                        });
                    }
                }
            });
        }

        if let Some(err) = failure {
            return Err(err);
        }

        if report.violations > 0 {
            log::warn!(
                "operator is not diagonally dominant on {} of {} cells (worst ratio {:.3})",
                report.violations,
                report.checked,
                report.worst_ratio
            );
        }

        Ok(report)
    }

    /// Writes `-dhsq * b - dh * c` on every face of `axis` bounding `region`.
    pub fn net_face_coefficient(&self, region: IndexBox<N>, axis: usize, out: &mut Field<N>) {
        let faces = region.face_box(axis);
        let (b, c) = (self.coefs.b[axis], self.coefs.c[axis]);
        assert!(b.covers(&faces) && c.covers(&faces) && out.covers(&faces));

        let (dhsq, dh) = (self.dhsq[axis], self.dh[axis]);
        let out = out.shared();

        for n in 0..self.num_components() {
            par_for_each_cell(faces, |face| unsafe {
                out.set(face, n, -dhsq * b.get(face, n) - dh * c.get(face, n))
            });
        }
    }
}
