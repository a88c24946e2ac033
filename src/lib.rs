#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

//! Cell-centred finite-volume discretisation of
//! `alpha a x - beta div(b grad x) - eta div(c upwind(x))` on block-structured
//! grids with covered (overset) cells, together with the red-black smoother
//! consumed by a geometric multigrid solver.

pub mod config;
pub mod diagonal;
pub mod error;
pub mod field;
pub mod flux;
pub mod level;
pub mod operator;
pub mod overset;
pub mod relax;
pub mod shared;
pub mod upwind;

pub use driftlap_geometry as geometry;

/// Provides common types used by most `driftlap` applications.
pub mod prelude {
    pub use crate::config::{Logging, Overset, SolverConfig};
    pub use crate::diagonal::{DominancePolicy, DominanceReport};
    pub use crate::error::{ConfigError, OperatorError};
    pub use crate::field::{Field, Mask};
    pub use crate::flux::FluxScale;
    pub use crate::level::prepare_overset_level;
    pub use crate::operator::{Coefficients, Operator, Scalars};
    pub use crate::overset::{
        coarsen_overset_mask, overset_face_factor, rescale_overset_face_coefficients,
    };
    pub use crate::relax::{BoundaryCoupling, CouplingFace, Relaxation};
    pub use driftlap_geometry::{Face, FaceArray, IndexBox};
}
