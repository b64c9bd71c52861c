//! Concrete detector implementations.
use crate::core::detector::BinRange;
use crate::core::mc::{Float, consts::PI};

pub mod total;
pub use total::*;
pub mod radial;
pub use radial::*;
pub mod angle;
pub use angle::*;
pub mod time;
pub use time::*;
pub mod planar;
pub use planar::*;
pub mod frequency;
pub use frequency::*;
pub mod volume;
pub use volume::*;
pub mod derivative;
pub use derivative::*;

/// Area of the annulus covered by radial bin `i`.
#[inline]
pub fn annulus_area(rho: &BinRange, i: usize) -> Float {
    2.0 * PI * rho.midpoint(i) * rho.delta()
}
