//! Piecewise homogeneous tissue geometry.

use super::mc::{Float, consts::BOUNDARY_EPSILON};
use super::error::{Error, Result};
use super::geometry::{Point3f, Vector3f};
use super::optical_properties::OpticalProperties;
use super::phase_function::{ArcPhaseFunction, PhaseFunctionKind};
use super::region::RegionShape;
use super::virtual_boundary::VirtualBoundaryType;
use crate::regions::LayerRegion;
use std::sync::Arc;
use std::fmt;

/// Step used to look past a surface when deciding which region lies beyond it.
pub const LOOKAHEAD_DISTANCE: Float = 1e-9;

/// A homogeneous region of the tissue.
#[derive(Clone)]
pub struct TissueRegion {
    pub shape: Arc<dyn RegionShape>,
    pub optical_properties: OpticalProperties,
    pub phase_function_kind: PhaseFunctionKind,
    /// Entering an ambient region ends the random walk.
    pub ambient: bool,
    phase_function: ArcPhaseFunction
}

impl TissueRegion {
    pub fn new(shape: Arc<dyn RegionShape>, optical_properties: OpticalProperties) -> TissueRegion {
        TissueRegion::with_phase_function(shape, optical_properties, PhaseFunctionKind::default())
    }

    pub fn with_phase_function(
        shape: Arc<dyn RegionShape>,
        optical_properties: OpticalProperties,
        phase_function_kind: PhaseFunctionKind
    ) -> TissueRegion {
        TissueRegion {
            phase_function: phase_function_kind.create(optical_properties.g),
            shape,
            optical_properties,
            phase_function_kind,
            ambient: false
        }
    }

    pub fn ambient(shape: Arc<dyn RegionShape>, n: Float) -> TissueRegion {
        let mut region = TissueRegion::new(shape, OpticalProperties::ambient(n));
        region.ambient = true;
        region
    }

    #[inline]
    pub fn phase_function(&self) -> &ArcPhaseFunction {
        &self.phase_function
    }

    pub fn contains(&self, p: &Point3f) -> bool {
        self.shape.contains(p)
    }
}

impl fmt::Debug for TissueRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TissueRegion")
            .field("shape", &self.shape)
            .field("optical_properties", &self.optical_properties)
            .field("phase_function_kind", &self.phase_function_kind)
            .field("ambient", &self.ambient)
            .finish()
    }
}

/// The nearest surface ahead of a photon.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundaryHit {
    pub distance: Float,
    /// Region whose surface is hit.
    pub surface_region: usize
}

/// Partition of space into regions. Regions are searched in priority
/// order, inclusions before the layers they sit in.
#[derive(Debug, Clone)]
pub struct TissueModel {
    regions: Vec<TissueRegion>,
    search_order: Vec<usize>,
    inclusion_count: usize,
    /// z of the top tissue surface.
    pub top_z: Float,
    /// z of the bottom tissue surface, infinite for a semi-infinite medium.
    pub bottom_z: Float
}

impl TissueModel {
    /// Stack of layers below `z = 0`, bounded above by an ambient medium of
    /// index `top_n` and, when the last layer is finite, below by an ambient
    /// medium of index `bottom_n`. Each layer is `(properties, thickness)`;
    /// only the last may be infinitely thick.
    pub fn multi_layer(
        top_n: Float,
        layers: &[(OpticalProperties, Float)],
        bottom_n: Float
    ) -> Result<TissueModel> {
        if layers.is_empty() {
            return Err(Error::Config(String::from("a layered tissue needs at least one layer")));
        }
        let mut regions = Vec::with_capacity(layers.len() + 2);
        regions.push(TissueRegion::ambient(Arc::new(LayerRegion::new(std::f64::NEG_INFINITY, 0.0)), top_n));
        let mut z = 0.0;
        for (i, (ops, thickness)) in layers.iter().enumerate() {
            if !ops.is_valid() {
                return Err(Error::Config(format!("layer {} has invalid optical properties {}", i, ops)));
            }
            if !(*thickness > 0.0) || (thickness.is_infinite() && i + 1 != layers.len()) {
                return Err(Error::Config(format!("layer {} has invalid thickness {}", i, thickness)));
            }
            regions.push(TissueRegion::new(Arc::new(LayerRegion::new(z, z + thickness)), *ops));
            z += thickness;
        }
        if z.is_finite() {
            regions.push(TissueRegion::ambient(Arc::new(LayerRegion::new(z, std::f64::INFINITY)), bottom_n));
        }
        let search_order = (0..regions.len()).collect();
        Ok(TissueModel {
            regions,
            search_order,
            inclusion_count: 0,
            top_z: 0.0,
            bottom_z: z
        })
    }

    /// Homogeneous half space `z >= 0` under an ambient medium of index `ambient_n`.
    pub fn semi_infinite(ambient_n: Float, ops: OpticalProperties) -> Result<TissueModel> {
        TissueModel::multi_layer(ambient_n, &[(ops, std::f64::INFINITY)], ambient_n)
    }

    /// Embed an inclusion. Inclusions take priority over layers and over
    /// inclusions added after them. Returns the new region index.
    pub fn add_inclusion(&mut self, region: TissueRegion) -> Result<usize> {
        if !region.optical_properties.is_valid() {
            return Err(Error::Config(format!("inclusion has invalid optical properties {}", region.optical_properties)));
        }
        let index = self.regions.len();
        self.regions.push(region);
        self.search_order.insert(self.inclusion_count, index);
        self.inclusion_count += 1;
        Ok(index)
    }

    /// Builder form of [add_inclusion](TissueModel::add_inclusion).
    pub fn with_inclusion(mut self, region: TissueRegion) -> Result<TissueModel> {
        self.add_inclusion(region)?;
        Ok(self)
    }

    /// Replace the phase function of a region.
    pub fn set_phase_function(&mut self, region_index: usize, kind: PhaseFunctionKind) {
        let region = &mut self.regions[region_index];
        region.phase_function = kind.create(region.optical_properties.g);
        region.phase_function_kind = kind;
    }

    pub fn regions(&self) -> &[TissueRegion] {
        &self.regions
    }

    #[inline]
    pub fn region(&self, index: usize) -> &TissueRegion {
        &self.regions[index]
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn optical_properties(&self) -> Vec<OpticalProperties> {
        self.regions.iter().map(|r| r.optical_properties).collect()
    }

    /// Index of the first region in priority order containing `p`.
    pub fn get_region_index(&self, p: &Point3f) -> Result<usize> {
        self.search_order.iter()
            .cloned()
            .find(|i| self.regions[*i].contains(p))
            .ok_or_else(|| {
                error!("No region contains position {}", p);
                Error::Geometry { position: *p }
            })
    }

    /// Nearest surface along `d` at which the photon could leave `current`:
    /// the exit from `current` itself or the entry into a region with higher
    /// priority.
    pub fn distance_to_boundary(&self, p: &Point3f, d: &Vector3f, current: usize) -> BoundaryHit {
        let mut hit = BoundaryHit {
            distance: self.regions[current].shape.distance_to_exit(p, d),
            surface_region: current
        };
        for i in self.search_order.iter().cloned().take_while(|i| *i != current) {
            if let Some(t) = self.regions[i].shape.distance_to_entry(p, d) {
                if t < hit.distance {
                    hit = BoundaryHit { distance: t, surface_region: i };
                }
            }
        }
        hit
    }

    /// Region on the far side of the surface a photon sits on.
    pub fn region_beyond(&self, p: &Point3f, d: &Vector3f) -> Result<usize> {
        self.get_region_index(&(*p + *d * LOOKAHEAD_DISTANCE))
    }

    /// Test if `p` is on the top tissue surface.
    pub fn on_top_surface(&self, p: &Point3f) -> bool {
        (p.z - self.top_z).abs() < BOUNDARY_EPSILON
    }

    /// Classify where a photon entering an ambient region left the tissue.
    pub fn exit_boundary(&self, p: &Point3f) -> VirtualBoundaryType {
        if p.z <= self.top_z + BOUNDARY_EPSILON {
            VirtualBoundaryType::DiffuseReflectance
        } else if self.bottom_z.is_finite() && p.z >= self.bottom_z - BOUNDARY_EPSILON {
            VirtualBoundaryType::DiffuseTransmittance
        } else {
            VirtualBoundaryType::BoundingVolume
        }
    }

    /// Refractive index of the ambient medium above the tissue.
    pub fn top_ambient_n(&self) -> Float {
        self.regions[0].optical_properties.n
    }
}
