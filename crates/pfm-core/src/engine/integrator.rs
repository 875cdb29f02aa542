use crate::core::models::probe::ProbeParticle;
use nalgebra::{Vector2, Vector3};
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;
use thiserror::Error;
use tracing::{trace, warn};

/// Number of consecutive rejections between "stuck" warnings.
const REJECTION_WARN_INTERVAL: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegreeOfFreedom {
    Translation,
    Rotation,
}

impl fmt::Display for DegreeOfFreedom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Translation => write!(f, "translation"),
            Self::Rotation => write!(f, "rotation"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegratorError {
    #[error(
        "{kind} proposal rejected {attempts} consecutive times; the probe is confined to a forbidden region"
    )]
    RejectionLimitExceeded {
        kind: DegreeOfFreedom,
        attempts: usize,
    },
}

/// Euler-Maruyama integrator for overdamped Langevin motion of the probe.
///
/// Every proposal whose assay energy is `+inf` is discarded and redrawn from the same
/// starting state with fresh Gaussian noise. With a rejection cap set, hitting the cap
/// restores the starting state and returns [`IntegratorError::RejectionLimitExceeded`];
/// without one, the loop retries until a finite-energy state is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LangevinIntegrator {
    max_rejections: Option<usize>,
}

impl LangevinIntegrator {
    pub fn new(max_rejections: Option<usize>) -> Self {
        Self { max_rejections }
    }

    pub fn max_rejections(&self) -> Option<usize> {
        self.max_rejections
    }

    fn note_rejection(&self, kind: DegreeOfFreedom, rejections: usize) -> Result<(), IntegratorError> {
        trace!(%kind, rejections, "Proposal violates hard-sphere exclusion; redrawing.");
        if self.max_rejections.is_some_and(|max| rejections >= max) {
            return Err(IntegratorError::RejectionLimitExceeded {
                kind,
                attempts: rejections,
            });
        }
        if rejections % REJECTION_WARN_INTERVAL == 0 {
            warn!(%kind, rejections, "Proposal rejected many times in a row.");
        }
        Ok(())
    }

    /// Moves the probe center by one step of size `dt` under `forces`.
    ///
    /// `energy` evaluates the assay energy of a candidate probe state. Returns the number of
    /// rejected proposals before acceptance.
    pub fn propagate_position<R, F>(
        &self,
        probe: &mut ProbeParticle,
        dt: f64,
        forces: &Vector3<f64>,
        energy: F,
        rng: &mut R,
    ) -> Result<usize, IntegratorError>
    where
        R: Rng + ?Sized,
        F: Fn(&ProbeParticle) -> f64,
    {
        let start = *probe.position();
        let amplitude = (2.0 * probe.diffusion() * dt).sqrt();
        let drift = forces * (dt / probe.drag());

        let mut rejections = 0;
        loop {
            let noise = Vector3::from_fn(|_, _| rng.sample::<f64, _>(StandardNormal));
            probe.set_position(start + noise * amplitude + drift);
            if energy(probe) != f64::INFINITY {
                return Ok(rejections);
            }
            rejections += 1;
            if let Err(e) = self.note_rejection(DegreeOfFreedom::Translation, rejections) {
                probe.set_position(start);
                return Err(e);
            }
        }
    }

    /// Rotates the probe by one step of size `dt` under tangential `torques` `(Tθ, Tφ)`.
    pub fn propagate_rotation<R, F>(
        &self,
        probe: &mut ProbeParticle,
        dt: f64,
        torques: &Vector2<f64>,
        energy: F,
        rng: &mut R,
    ) -> Result<usize, IntegratorError>
    where
        R: Rng + ?Sized,
        F: Fn(&ProbeParticle) -> f64,
    {
        let (theta, phi) = probe.orientation();
        let amplitude = (2.0 * probe.rotational_diffusion() * dt).sqrt();
        let drift = torques * (dt * probe.radius() / probe.rotational_drag());

        let mut rejections = 0;
        loop {
            let noise_theta: f64 = rng.sample(StandardNormal);
            let noise_phi: f64 = rng.sample(StandardNormal);
            probe.set_orientation(
                theta + amplitude * noise_theta + drift.x,
                phi + amplitude * noise_phi + drift.y,
            );
            if energy(probe) != f64::INFINITY {
                return Ok(rejections);
            }
            rejections += 1;
            if let Err(e) = self.note_rejection(DegreeOfFreedom::Rotation, rejections) {
                probe.set_orientation(theta, phi);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::Environment;
    use nalgebra::Point3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn probe() -> ProbeParticle {
        ProbeParticle::new(500e-9, 1.0, Point3::origin(), &Environment::default())
    }

    #[test]
    fn position_step_stays_within_noise_envelope_around_drift() {
        let mut probe = probe();
        let mut rng = StdRng::seed_from_u64(7);
        let forces = Vector3::new(1e-12, 0.0, -2e-12);
        let dt = 1e-6;
        let start_x = probe.position().x;
        LangevinIntegrator::default()
            .propagate_position(&mut probe, dt, &forces, |_| 0.0, &mut rng)
            .unwrap();
        let noise_scale = (2.0 * probe.diffusion() * dt).sqrt();
        let drift = dt * forces.x / probe.drag();
        assert!((probe.position().x - start_x - drift).abs() < 6.0 * noise_scale);
    }

    #[test]
    fn same_seed_gives_identical_steps() {
        let forces = Vector3::new(1e-13, 1e-13, 0.0);
        let step = |seed| {
            let mut probe = probe();
            let mut rng = StdRng::seed_from_u64(seed);
            let integrator = LangevinIntegrator::default();
            integrator
                .propagate_position(&mut probe, 1e-7, &forces, |_| 0.0, &mut rng)
                .unwrap();
            integrator
                .propagate_rotation(&mut probe, 1e-7, &Vector2::zeros(), |_| 0.0, &mut rng)
                .unwrap();
            probe
        };
        assert_eq!(step(42), step(42));
        assert_ne!(step(42), step(43));
    }

    #[test]
    fn rejected_proposals_are_redrawn_until_energy_is_finite() {
        let mut probe = probe();
        let mut rng = StdRng::seed_from_u64(3);
        let forbidden = |p: &ProbeParticle| {
            if p.position().x < 0.0 { f64::INFINITY } else { 0.0 }
        };
        let mut total_rejections = 0;
        for _ in 0..200 {
            total_rejections += LangevinIntegrator::default()
                .propagate_position(&mut probe, 1e-6, &Vector3::zeros(), forbidden, &mut rng)
                .unwrap();
            assert!(probe.position().x >= 0.0);
        }
        assert!(total_rejections > 0);
    }

    #[test]
    fn rejection_cap_restores_start_and_reports_error() {
        let mut probe = probe();
        let start = probe.clone();
        let mut rng = StdRng::seed_from_u64(11);
        let integrator = LangevinIntegrator::new(Some(25));

        let err = integrator
            .propagate_position(&mut probe, 1e-6, &Vector3::zeros(), |_| f64::INFINITY, &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            IntegratorError::RejectionLimitExceeded {
                kind: DegreeOfFreedom::Translation,
                attempts: 25
            }
        );
        assert_eq!(probe, start);

        let err = integrator
            .propagate_rotation(&mut probe, 1e-6, &Vector2::zeros(), |_| f64::INFINITY, &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            IntegratorError::RejectionLimitExceeded {
                kind: DegreeOfFreedom::Rotation,
                ..
            }
        ));
        assert_eq!(probe, start);
    }

    #[test]
    fn rotation_drift_scales_torque_by_radius() {
        let mut probe = probe();
        let mut rng = StdRng::seed_from_u64(5);
        let torques = Vector2::new(1e-12, 0.0);
        let dt = 1e-3;
        LangevinIntegrator::default()
            .propagate_rotation(&mut probe, dt, &torques, |_| 0.0, &mut rng)
            .unwrap();
        let (theta, _) = probe.orientation();
        let drift = dt * probe.radius() * torques.x / probe.rotational_drag();
        let noise_scale = (2.0 * probe.rotational_diffusion() * dt).sqrt();
        assert!((theta - drift).abs() < 6.0 * noise_scale);
    }
}
