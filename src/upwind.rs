//! Upwind selection of face states and fluxes, and the per-cell upwind
//! coefficients used to assemble the advective part of the stencil.
//!
//! Every routine treats a velocity with `|v| <= EPS` as zero and falls back
//! to centred averaging in that band.

/// Threshold below which a face velocity is treated as zero.
pub const EPS: f64 = 1.0e-10;

/// State transported through a face with velocity `v`, given the cell values
/// on the left (lower index) and right (higher index) of the face.
#[inline]
pub fn face_state(v: f64, left: f64, right: f64) -> f64 {
    if v > EPS {
        left
    } else if v < -EPS {
        right
    } else {
        0.5 * (left + right)
    }
}

/// Upwinded flux `v * face_state(v, left, right)`.
#[inline]
pub fn face_flux(v: f64, left: f64, right: f64) -> f64 {
    if v > EPS {
        v * left
    } else if v < -EPS {
        v * right
    } else {
        v * 0.5 * (left + right)
    }
}

/// Contribution of advection to a cell's own diagonal, given the velocities
/// on its lower (`vl`) and upper (`vr`) faces along one axis.
///
/// When the velocities change sign inside the cell this is a centred
/// difference plus artificial viscosity `max(|vl|, |vr|)`.
#[inline]
pub fn cell_upwind_coeff(vl: f64, vr: f64) -> f64 {
    let mut coeff = 0.0;

    if vl * vr < 0.0 {
        let maxvel = vl.abs().max(vr.abs());
        coeff += 0.5 * (vr - vl);
        coeff += maxvel;
    } else {
        if vl < -EPS {
            coeff -= vl;
        } else if vl.abs() <= EPS {
            coeff -= 0.5 * vl;
        }

        if vr > EPS {
            coeff += vr;
        } else if vr.abs() <= EPS {
            coeff += 0.5 * vr;
        }
    }

    coeff
}

/// Off-diagonal advective coefficient multiplying the lower neighbour.
#[inline]
pub fn left_cell_upwind_coeff(vl: f64, vr: f64) -> f64 {
    let mut coeff = 0.0;

    if vl * vr < 0.0 {
        let maxvel = vl.abs().max(vr.abs());
        coeff -= 0.5 * vl;
        coeff -= 0.5 * maxvel;
    } else if vl > EPS {
        coeff -= vl;
    } else if vl.abs() < EPS {
        coeff -= 0.5 * vl;
    }

    coeff
}

/// Off-diagonal advective coefficient multiplying the upper neighbour.
#[inline]
pub fn right_cell_upwind_coeff(vl: f64, vr: f64) -> f64 {
    let mut coeff = 0.0;

    if vl * vr < 0.0 {
        let maxvel = vl.abs().max(vr.abs());
        coeff += 0.5 * vr;
        coeff += 0.5 * maxvel;
    } else if vr < -EPS {
        coeff += vr;
    } else if vr.abs() < EPS {
        coeff += 0.5 * vr;
    }

    coeff
}

/// Damped form of [`cell_upwind_coeff`]: each face velocity is scaled by a
/// relaxation multiplier. Threshold tests use the undamped velocities.
#[inline]
pub fn relaxed_cell_upwind_coeff(vl: f64, vr: f64, relax_l: f64, relax_r: f64) -> f64 {
    let ul = vl * relax_l;
    let ur = vr * relax_r;
    let mut coeff = 0.0;

    if ul * ur < 0.0 {
        let maxvel = ul.abs().max(ur.abs());
        coeff += 0.5 * (ur - ul);
        coeff += maxvel;
    } else {
        if vl < -EPS {
            coeff -= ul;
        } else if vl.abs() < EPS {
            coeff -= 0.5 * ul;
        }

        if vr > EPS {
            coeff += ur;
        } else if vr.abs() < EPS {
            coeff += 0.5 * ur;
        }
    }

    coeff
}
