//! The double-bead assay: a tether stretched between a pedestal bead and the probe bead.
//!
//! The assay turns probe geometry into a single scalar free energy. The tether model
//! supplies the energy as a function of end-to-end extension; the two beads exclude
//! each other as hard spheres, expressed as an infinite energy whenever their centers
//! are closer than the sum of their radii. Forces and torques are forward finite
//! differences of that energy. Any non-finite component (a collision or a tether
//! singularity inside the difference stencil) contributes zero force instead of
//! propagating into the integrator.

use crate::core::environment::Environment;
use crate::core::models::pedestal::Pedestal;
use crate::core::models::probe::ProbeParticle;
use crate::core::tether::TetherModel;
use nalgebra::{Point3, Vector2, Vector3};
use rand::Rng;

#[inline]
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[derive(Debug, Clone)]
pub struct DoubleBeadAssay {
    pedestal: Pedestal,
    tether: TetherModel,
    env: Environment,
    force_step: f64,
    angle_step: f64,
}

impl DoubleBeadAssay {
    /// `force_step` is the spatial step (m) of linear force differences, `angle_step` the
    /// angular step (rad) of torque differences.
    pub fn new(
        pedestal: Pedestal,
        tether: TetherModel,
        env: Environment,
        force_step: f64,
        angle_step: f64,
    ) -> Self {
        Self {
            pedestal,
            tether,
            env,
            force_step,
            angle_step,
        }
    }

    pub fn pedestal(&self) -> &Pedestal {
        &self.pedestal
    }

    pub fn tether(&self) -> &TetherModel {
        &self.tether
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn force_step(&self) -> f64 {
        self.force_step
    }

    pub fn angle_step(&self) -> f64 {
        self.angle_step
    }

    /// Free energy for a probe of radius `probe_radius` centered at `center` with its tether
    /// attached at `anchor`, given one realization of the pedestal center.
    pub fn energy_at(
        &self,
        probe_radius: f64,
        center: &Point3<f64>,
        anchor: &Point3<f64>,
        pedestal_center: &Point3<f64>,
    ) -> f64 {
        let separation = (center - pedestal_center).norm();
        if separation <= self.pedestal.radius() + probe_radius {
            return f64::INFINITY;
        }
        let extension = (anchor - self.pedestal.anchor_point(pedestal_center)).norm();
        self.tether.energy(extension, &self.env)
    }

    /// Free energy of the probe's current configuration.
    pub fn energy(&self, probe: &ProbeParticle, pedestal_center: &Point3<f64>) -> f64 {
        self.energy_at(
            probe.radius(),
            probe.position(),
            &probe.anchor_position(),
            pedestal_center,
        )
    }

    fn energy_spherical(
        &self,
        probe: &ProbeParticle,
        theta: f64,
        phi: f64,
        pedestal_center: &Point3<f64>,
    ) -> f64 {
        let center = probe.position();
        let anchor = probe.surface_point(center, theta, phi);
        self.energy_at(probe.radius(), center, &anchor, pedestal_center)
    }

    /// End-to-end extension of the tether in the probe's current configuration.
    pub fn extension(&self, probe: &ProbeParticle, pedestal_center: &Point3<f64>) -> f64 {
        (probe.anchor_position() - self.pedestal.anchor_point(pedestal_center)).norm()
    }

    /// Forces `(Fx, Fy, Fz)` on the probe center. Probe center and tether anchor are shifted
    /// together since the anchor is rigidly attached to the bead.
    pub fn linear_forces(
        &self,
        probe: &ProbeParticle,
        pedestal_center: &Point3<f64>,
    ) -> Vector3<f64> {
        let dx = self.force_step;
        let center = *probe.position();
        let anchor = probe.anchor_position();
        let reference = self.energy_at(probe.radius(), &center, &anchor, pedestal_center);

        Vector3::from_fn(|i, _| {
            let mut shift = Vector3::zeros();
            shift[i] = dx;
            let shifted = self.energy_at(
                probe.radius(),
                &(center + shift),
                &(anchor + shift),
                pedestal_center,
            );
            finite_or_zero(-(shifted - reference) / dx)
        })
    }

    /// Tangential forces `(Tθ, Tφ)` at the tether anchor from rotating the bead about its center.
    pub fn rotational_torques(
        &self,
        probe: &ProbeParticle,
        pedestal_center: &Point3<f64>,
    ) -> Vector2<f64> {
        let dtheta = self.angle_step;
        let lever = probe.radius() * dtheta;
        let (theta, phi) = probe.anchor_direction();
        let reference = self.energy_spherical(probe, theta, phi, pedestal_center);

        let torque_theta =
            -(self.energy_spherical(probe, theta + dtheta, phi, pedestal_center) - reference)
                / lever;
        let torque_phi =
            -(self.energy_spherical(probe, theta, phi + dtheta, pedestal_center) - reference)
                / lever;

        Vector2::new(finite_or_zero(torque_theta), finite_or_zero(torque_phi))
    }

    /// Tension `dE/dz` along the tether at its current extension; positive when stretched.
    pub fn tether_tension(&self, probe: &ProbeParticle, pedestal_center: &Point3<f64>) -> f64 {
        let z = self.extension(probe, pedestal_center);
        let dz = self.force_step;
        finite_or_zero((self.tether.energy(z + dz, &self.env) - self.tether.energy(z, &self.env)) / dz)
    }

    /// Advances the tether's hidden folding state, if it has one, under `tension`.
    pub fn advance_tether<R: Rng + ?Sized>(&mut self, tension: f64, dt: f64, rng: &mut R) {
        self.tether
            .advance_internal_state(tension, dt, self.force_step, &self.env, rng);
    }
}
