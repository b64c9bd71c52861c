//! Per-walk photon state and the immutable records it leaves behind.
use super::mc::Float;
use super::geometry::{Point3f, Vector3f};
use super::virtual_boundary::VirtualBoundaryType;
use smallvec::SmallVec;
use std::fmt;

/// Region counts up to this size keep their history inline.
pub const INLINE_REGIONS: usize = 8;

/// Where a photon is in its random walk.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PhotonState {
    Alive,
    /// Left the tissue through the given boundary.
    Exited(VirtualBoundaryType),
    /// Absorbed in an analog collision.
    Absorbed,
    KilledRussianRoulette,
    KilledOverMaximumCollisions,
    KilledOverMaximumPathLength
}

impl PhotonState {
    #[inline]
    pub fn is_alive(&self) -> bool {
        *self == PhotonState::Alive
    }
}

/// Per-region collision counts and path lengths, only kept when a run
/// records perturbation information.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhotonHistory {
    pub path_lengths: SmallVec<[Float; INLINE_REGIONS]>,
    pub collision_counts: SmallVec<[u64; INLINE_REGIONS]>
}

impl PhotonHistory {
    pub fn new(region_count: usize) -> PhotonHistory {
        PhotonHistory {
            path_lengths: SmallVec::from_elem(0.0, region_count),
            collision_counts: SmallVec::from_elem(0, region_count)
        }
    }

    pub fn region_count(&self) -> usize {
        self.path_lengths.len()
    }
}

/// The mutable state of one photon random walk.
#[derive(Debug, Clone)]
pub struct Photon {
    pub position: Point3f,
    pub direction: Vector3f,
    pub weight: Float,
    pub region_index: usize,
    /// Accumulated time of flight in ns.
    pub total_time: Float,
    pub collisions: u64,
    pub path_length: Float,
    pub state: PhotonState,
    pub history: Option<PhotonHistory>
}

impl Photon {
    pub fn new(position: Point3f, direction: Vector3f, weight: Float, region_index: usize) -> Photon {
        Photon {
            position,
            direction,
            weight,
            region_index,
            total_time: 0.0,
            collisions: 0,
            path_length: 0.0,
            state: PhotonState::Alive,
            history: None
        }
    }

    /// Turn on per-region history tracking.
    pub fn with_history(mut self, region_count: usize) -> Photon {
        self.history = Some(PhotonHistory::new(region_count));
        self
    }

    /// Snapshot of the photon as it crosses a virtual boundary.
    pub fn exit_record(&self) -> PhotonExitRecord {
        PhotonExitRecord {
            position: self.position,
            direction: self.direction,
            weight: self.weight,
            total_time: self.total_time,
            history: self.history.clone()
        }
    }
}

impl fmt::Display for Photon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ Photon p: {} d: {} w: {} region: {} state: {:?} ]",
            self.position, self.direction, self.weight, self.region_index, self.state)
    }
}

/// Immutable snapshot written at a virtual boundary crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotonExitRecord {
    pub position: Point3f,
    pub direction: Vector3f,
    pub weight: Float,
    pub total_time: Float,
    pub history: Option<PhotonHistory>
}
