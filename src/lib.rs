#[macro_use]
extern crate log;

extern crate rayon;

#[macro_use]
pub mod core;
pub mod regions;
pub mod sources;
pub mod detectors;
