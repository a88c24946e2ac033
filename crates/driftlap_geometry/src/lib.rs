//! Geometric primitives for block-structured cartesian grids: faces and
//! index boxes in `N` dimensions.

#![allow(clippy::needless_range_loop)]

mod axis;
mod bounds;
mod face;

pub use axis::AxisMask;
pub use bounds::{IndexBox, IndexBoxIter, shifted};
pub use face::{Face, FaceArray, faces};
