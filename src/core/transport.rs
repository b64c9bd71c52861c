//! The photon random walk.
//!
//! A walk alternates free flights and collisions. Each free flight samples a
//! dimensionless optical path `-ln(u)` and spends it region by region: when
//! the remaining path reaches a surface the photon is moved onto it and
//! either reflected, refracted into the next region or, if the next region is
//! ambient, leaves the tissue through a virtual boundary. Once the path is
//! spent inside a region the photon collides, is reweighted according to the
//! run's [AbsorptionWeightingType] and scattered by the region's phase
//! function. Low weight photons play Russian roulette.

use super::mc::{Float, consts::SPEED_OF_LIGHT};
use super::absorption::AbsorptionWeightingType;
use super::detector::AbsorptionEvent;
use super::error::Result;
use super::fresnel::{fr_dielectric, reflect, refract};
use super::options::SimulationOptions;
use super::photon::{Photon, PhotonState};
use super::rng::Rng;
use super::stats_accumulator::TransportStats;
use super::tissue::{BoundaryHit, TissueModel, LOOKAHEAD_DISTANCE};
use super::virtual_boundary::VirtualBoundaryType;

/// Receives the events of a walk.
pub trait TransportEventSink {
    /// The photon crossed a virtual boundary. `photon` holds the state at the crossing.
    fn on_exit(&mut self, boundary: VirtualBoundaryType, photon: &Photon) -> Result<()>;

    /// Weight was deposited inside the tissue.
    fn on_absorption(&mut self, _event: &AbsorptionEvent) {}

    /// The walk ended.
    fn on_termination(&mut self, _photon: &Photon) {}
}

/// Variance preserving termination of low weight photons.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RussianRoulette {
    /// Photons below this weight play. Zero disables roulette.
    pub weight_threshold: Float,
    /// A playing photon survives with probability `1 / chance` and has its
    /// weight multiplied by `chance`.
    pub chance: Float
}

impl RussianRoulette {
    pub fn new(weight_threshold: Float, chance: Float) -> RussianRoulette {
        RussianRoulette { weight_threshold, chance }
    }

    pub fn disabled() -> RussianRoulette {
        RussianRoulette::new(0.0, 10.0)
    }

    /// Play for the photon's survival. Returns false when the photon is killed.
    pub fn play(&self, photon: &mut Photon, rng: &mut Rng) -> bool {
        if photon.weight <= 0.0 {
            photon.weight = 0.0;
            photon.state = PhotonState::KilledRussianRoulette;
            return false;
        }
        if photon.weight >= self.weight_threshold {
            return true;
        }
        if rng.uniform_float() * self.chance < 1.0 {
            photon.weight *= self.chance;
            true
        } else {
            photon.weight = 0.0;
            photon.state = PhotonState::KilledRussianRoulette;
            false
        }
    }
}

impl Default for RussianRoulette {
    fn default() -> RussianRoulette {
        RussianRoulette::new(1e-4, 10.0)
    }
}

/// Drives single photons through a tissue under one run's settings.
pub struct PhotonTransportEngine<'a> {
    tissue: &'a TissueModel,
    weighting: AbsorptionWeightingType,
    roulette: RussianRoulette,
    max_collisions: u64,
    max_path_length: Float,
    record_history: bool,
    track_absorption: bool
}

impl<'a> PhotonTransportEngine<'a> {
    pub fn new(tissue: &'a TissueModel, options: &SimulationOptions) -> PhotonTransportEngine<'a> {
        PhotonTransportEngine {
            tissue,
            weighting: options.absorption_weighting,
            roulette: options.russian_roulette,
            max_collisions: options.max_collisions,
            max_path_length: options.max_path_length,
            record_history: options.record_perturbation_info,
            track_absorption: false
        }
    }

    /// Report absorbed weight to the sink. Off unless volume detectors listen.
    pub fn with_absorption_tracking(mut self, track: bool) -> PhotonTransportEngine<'a> {
        self.track_absorption = track;
        self
    }

    pub fn tissue(&self) -> &TissueModel {
        self.tissue
    }

    /// Run one photon from launch to termination.
    pub fn transport<S: TransportEventSink>(
        &self,
        mut photon: Photon,
        rng: &mut Rng,
        sink: &mut S,
        stats: &mut TransportStats
    ) -> Result<Photon> {
        if self.record_history && photon.history.is_none() {
            photon = photon.with_history(self.tissue.region_count());
        }
        stats.report_counter("Photons/Launched", 1);
        self.launch(&mut photon, sink, stats)?;

        while photon.state.is_alive() {
            let optical_path = -rng.uniform_open_float().ln();
            self.fly(&mut photon, optical_path, rng, sink, stats)?;
            if !photon.state.is_alive() {
                break;
            }
            self.collide(&mut photon, rng, sink, stats);
            if !photon.state.is_alive() {
                break;
            }
            if photon.collisions >= self.max_collisions {
                photon.state = PhotonState::KilledOverMaximumCollisions;
                break;
            }
            self.roulette.play(&mut photon, rng);
        }

        match photon.state {
            PhotonState::Exited(b) => stats.report_counter(exit_counter(b), 1),
            PhotonState::Absorbed => stats.report_counter("Photons/Absorbed", 1),
            PhotonState::KilledRussianRoulette => stats.report_counter("Photons/Killed by Russian roulette", 1),
            PhotonState::KilledOverMaximumCollisions => stats.report_counter("Photons/Killed over maximum collisions", 1),
            PhotonState::KilledOverMaximumPathLength => stats.report_counter("Photons/Killed over maximum path length", 1),
            PhotonState::Alive => {}
        }
        stats.report_float_distribution("Transport/Path length", photon.path_length);
        sink.on_termination(&photon);
        Ok(photon)
    }

    /// Remove the specular fraction from a photon entering the tissue from the
    /// top ambient medium.
    fn launch<S: TransportEventSink>(&self, photon: &mut Photon, sink: &mut S, stats: &mut TransportStats) -> Result<()> {
        let region = self.tissue.region(photon.region_index);
        if region.ambient || photon.direction.z <= 0.0 || !self.tissue.on_top_surface(&photon.position) {
            return Ok(());
        }
        let n_outside = self.tissue.top_ambient_n();
        let n_inside = region.optical_properties.n;
        let rsp = fr_dielectric(photon.direction.z, n_outside, n_inside);
        if rsp <= 0.0 {
            return Ok(());
        }
        let mut specular = photon.clone();
        specular.weight = photon.weight * rsp;
        specular.direction.z = -specular.direction.z;
        specular.state = PhotonState::Exited(VirtualBoundaryType::SpecularReflectance);
        sink.on_exit(VirtualBoundaryType::SpecularReflectance, &specular)?;
        stats.report_counter(exit_counter(VirtualBoundaryType::SpecularReflectance), 1);
        photon.weight *= 1.0 - rsp;
        Ok(())
    }

    /// Spend `optical_path` along the current direction, handling every
    /// surface reached on the way.
    fn fly<S: TransportEventSink>(
        &self,
        photon: &mut Photon,
        mut optical_path: Float,
        rng: &mut Rng,
        sink: &mut S,
        stats: &mut TransportStats
    ) -> Result<()> {
        loop {
            let region = self.tissue.region(photon.region_index);
            let mu = self.weighting.step_coefficient(&region.optical_properties);
            let hit = self.tissue.distance_to_boundary(&photon.position, &photon.direction, photon.region_index);
            let step = optical_path / mu;

            if !region.ambient && step < hit.distance {
                self.advance(photon, step, sink);
                self.check_path_length(photon);
                return Ok(());
            }
            if hit.distance.is_infinite() {
                // Nothing ahead in an ambient medium
                let boundary = self.tissue.exit_boundary(&photon.position);
                photon.state = PhotonState::Exited(boundary);
                sink.on_exit(boundary, photon)?;
                return Ok(());
            }

            self.advance(photon, hit.distance, sink);
            optical_path = (optical_path - hit.distance * mu).max(0.0);
            self.check_path_length(photon);
            if !photon.state.is_alive() {
                return Ok(());
            }
            self.cross(photon, &hit, rng, sink, stats)?;
            if !photon.state.is_alive() {
                return Ok(());
            }
        }
    }

    /// Move the photon a straight distance within its current region.
    fn advance<S: TransportEventSink>(&self, photon: &mut Photon, distance: Float, sink: &mut S) {
        let ops = self.tissue.region(photon.region_index).optical_properties;
        photon.position += photon.direction * distance;
        photon.path_length += distance;
        photon.total_time += distance * ops.n / SPEED_OF_LIGHT;
        if let Some(history) = photon.history.as_mut() {
            history.path_lengths[photon.region_index] += distance;
        }
        let absorbed = self.weighting.attenuate(photon, ops.mua, distance);
        if self.track_absorption && absorbed > 0.0 {
            sink.on_absorption(&AbsorptionEvent {
                position: photon.position,
                weight: absorbed,
                region_index: photon.region_index,
                mua: ops.mua
            });
        }
    }

    fn check_path_length(&self, photon: &mut Photon) {
        if photon.path_length > self.max_path_length {
            photon.state = PhotonState::KilledOverMaximumPathLength;
        }
    }

    /// Resolve a photon sitting on a surface: reflect, refract or exit.
    fn cross<S: TransportEventSink>(
        &self,
        photon: &mut Photon,
        hit: &BoundaryHit,
        rng: &mut Rng,
        sink: &mut S,
        stats: &mut TransportStats
    ) -> Result<()> {
        let current = photon.region_index;
        let next = self.tissue.region_beyond(&photon.position, &photon.direction)?;
        if next == current {
            // Grazing hit that does not change region
            warn!("Grazing hit at {} left the photon in region {}", photon.position, current);
            self.advance(photon, LOOKAHEAD_DISTANCE, sink);
            self.check_path_length(photon);
            stats.report_counter("Transport/Grazing nudges", 1);
            return Ok(());
        }

        let n1 = self.tissue.region(current).optical_properties.n;
        let n2 = self.tissue.region(next).optical_properties.n;
        if n1 != n2 {
            let normal = self.tissue.region(hit.surface_region).shape.surface_normal(&photon.position);
            let cos_i = photon.direction.dot(&normal);
            let reflectance = fr_dielectric(cos_i, n1, n2);
            if rng.uniform_float() < reflectance {
                photon.direction = reflect(&photon.direction, &normal).normalize();
                stats.report_percentage("Transport/Reflected at interface", 1, 1);
                return Ok(());
            }
            match refract(&photon.direction, &normal, n1 / n2) {
                Some(d) => photon.direction = d,
                None => {
                    photon.direction = reflect(&photon.direction, &normal).normalize();
                    stats.report_percentage("Transport/Reflected at interface", 1, 1);
                    return Ok(());
                }
            }
        }
        stats.report_percentage("Transport/Reflected at interface", 0, 1);

        photon.region_index = next;
        if self.tissue.region(next).ambient {
            let boundary = self.tissue.exit_boundary(&photon.position);
            photon.state = PhotonState::Exited(boundary);
            sink.on_exit(boundary, photon)?;
        }
        Ok(())
    }

    /// Reweight and scatter at the end of a free flight.
    fn collide<S: TransportEventSink>(&self, photon: &mut Photon, rng: &mut Rng, sink: &mut S, stats: &mut TransportStats) {
        let region = self.tissue.region(photon.region_index);
        let ops = region.optical_properties;
        photon.collisions += 1;
        stats.report_counter("Transport/Collisions", 1);
        if let Some(history) = photon.history.as_mut() {
            history.collision_counts[photon.region_index] += 1;
        }
        let absorbed = self.weighting.collide(photon, &ops, rng);
        if self.track_absorption && absorbed > 0.0 {
            sink.on_absorption(&AbsorptionEvent {
                position: photon.position,
                weight: absorbed,
                region_index: photon.region_index,
                mua: ops.mua
            });
        }
        if photon.state.is_alive() {
            photon.direction = region.phase_function().scatter(&photon.direction, rng);
        }
    }
}

fn exit_counter(boundary: VirtualBoundaryType) -> &'static str {
    match boundary {
        VirtualBoundaryType::DiffuseReflectance => "Photons/Exited through diffuse reflectance",
        VirtualBoundaryType::DiffuseTransmittance => "Photons/Exited through diffuse transmittance",
        VirtualBoundaryType::SpecularReflectance => "Photons/Specularly reflected",
        VirtualBoundaryType::BoundingVolume => "Photons/Exited through bounding volume",
        VirtualBoundaryType::GenericVolume => "Photons/Exited through generic volume"
    }
}
