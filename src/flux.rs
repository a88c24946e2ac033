//! Face fluxes `-fac * b * grad(sol) - facc * c * upwind(sol)`, used by the
//! multigrid driver for reflux and for reporting face currents.

use driftlap_geometry::{IndexBox, shifted};

use crate::field::Field;
use crate::operator::{Operator, par_for_each_cell};
use crate::upwind::face_flux;

/// Scale factors applied to the diffusive (`fac`) and advective (`facc`)
/// parts of a face flux.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluxScale {
    pub fac: f64,
    pub facc: f64,
}

impl<const N: usize> Operator<'_, N> {
    /// Physical flux scale along `axis`: `beta / dx` for diffusion and `eta`
    /// for advection.
    pub fn flux_scale(&self, axis: usize) -> FluxScale {
        FluxScale {
            fac: self.scalars.beta * self.dxinv()[axis],
            facc: self.scalars.eta,
        }
    }

    #[inline]
    fn face_flux_at(
        &self,
        axis: usize,
        face: [isize; N],
        n: usize,
        sol: &Field<N>,
        scale: FluxScale,
    ) -> f64 {
        let lower = shifted(face, axis, -1);
        let (left, right) = (sol.get(lower, n), sol.get(face, n));
        let b = self.coefs.b[axis].get(face, n);
        let c = self.coefs.c[axis].get(face, n);

        -scale.fac * b * (right - left) - scale.facc * face_flux(c, left, right)
    }

    /// Writes the flux through every face of `axis` bounding the cells of
    /// `region`.
    pub fn flux(
        &self,
        region: IndexBox<N>,
        axis: usize,
        sol: &Field<N>,
        out: &mut Field<N>,
        scale: FluxScale,
    ) {
        let faces = region.face_box(axis);
        self.check_flux_inputs(region, axis, sol, out);

        let dest = out.shared();

        for n in 0..self.num_components() {
            par_for_each_cell(faces, |face| {
                let value = self.face_flux_at(axis, face, n, sol, scale);
                unsafe { dest.set(face, n, value) };
            });
        }
    }

    /// Like `flux`, but only for the first and last face of each line along
    /// `axis`. Interior faces of `out` are left untouched.
    pub fn flux_end_faces(
        &self,
        region: IndexBox<N>,
        axis: usize,
        sol: &Field<N>,
        out: &mut Field<N>,
        scale: FluxScale,
    ) {
        self.check_flux_inputs(region, axis, sol, out);

        let mut lower = region.face_box(axis);
        lower.hi[axis] = region.lo[axis];
        let mut upper = region.face_box(axis);
        upper.lo[axis] = region.hi[axis] + 1;

        for n in 0..self.num_components() {
            for ends in [lower, upper] {
                for face in ends {
                    let value = self.face_flux_at(axis, face, n, sol, scale);
                    out.set(face, n, value);
                }
            }
        }
    }

    fn check_flux_inputs(&self, region: IndexBox<N>, axis: usize, sol: &Field<N>, out: &Field<N>) {
        let faces = region.face_box(axis);
        assert!(self.coefs.b[axis].covers(&faces));
        assert!(self.coefs.c[axis].covers(&faces));
        assert!(out.covers(&faces));

        let mut cells = faces;
        cells.lo[axis] -= 1;
        assert!(sol.covers(&cells));
    }
}
