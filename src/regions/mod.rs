pub mod layer;
pub use layer::*;
pub mod ellipsoid;
pub use ellipsoid::*;
pub mod cylinder;
pub use cylinder::*;
pub mod infinite_cylinder;
pub use infinite_cylinder::*;
pub mod voxel;
pub use voxel::*;
