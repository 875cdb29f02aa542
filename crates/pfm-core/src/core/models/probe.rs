use crate::core::environment::Environment;
use nalgebra::Point3;
use std::f64::consts::PI;

pub const DEFAULT_ANCHOR_THETA: f64 = PI / 2.0;
pub const DEFAULT_ANCHOR_PHI: f64 = -PI;

/// The optically trapped probe bead.
///
/// Position and orientation are the only mutable state and are changed exclusively by
/// the Langevin integrator. Drag and diffusion coefficients are derived once from the
/// radius and the [`Environment`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeParticle {
    radius: f64,
    charge: f64,
    position: Point3<f64>,
    theta: f64,
    phi: f64,
    anchor_theta: f64,
    anchor_phi: f64,
    drag: f64,
    rotational_drag: f64,
    diffusion: f64,
    rotational_diffusion: f64,
}

impl ProbeParticle {
    pub fn new(radius: f64, charge: f64, position: Point3<f64>, env: &Environment) -> Self {
        let drag = env.translational_drag(radius);
        let rotational_drag = env.rotational_drag(radius);
        Self {
            radius,
            charge,
            position,
            theta: 0.0,
            phi: 0.0,
            anchor_theta: DEFAULT_ANCHOR_THETA,
            anchor_phi: DEFAULT_ANCHOR_PHI,
            drag,
            rotational_drag,
            diffusion: env.thermal_energy() / drag,
            rotational_diffusion: env.thermal_energy() / rotational_drag,
        }
    }

    /// Places the tether attachment at body-frame angles `(theta, phi)`.
    pub fn with_anchor_angles(mut self, theta: f64, phi: f64) -> Self {
        self.anchor_theta = theta;
        self.anchor_phi = phi;
        self
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn charge(&self) -> f64 {
        self.charge
    }

    #[inline]
    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    /// Orientation `(theta, phi)` of the bead relative to its initial frame.
    #[inline]
    pub fn orientation(&self) -> (f64, f64) {
        (self.theta, self.phi)
    }

    #[inline]
    pub fn anchor_angles(&self) -> (f64, f64) {
        (self.anchor_theta, self.anchor_phi)
    }

    #[inline]
    pub fn drag(&self) -> f64 {
        self.drag
    }

    #[inline]
    pub fn rotational_drag(&self) -> f64 {
        self.rotational_drag
    }

    #[inline]
    pub fn diffusion(&self) -> f64 {
        self.diffusion
    }

    #[inline]
    pub fn rotational_diffusion(&self) -> f64 {
        self.rotational_diffusion
    }

    /// Global-frame angles of the tether attachment, body rotation included.
    #[inline]
    pub fn anchor_direction(&self) -> (f64, f64) {
        (self.theta + self.anchor_theta, self.phi + self.anchor_phi)
    }

    /// Point on a sphere of this bead's radius around `center` at global angles `(theta, phi)`.
    #[inline]
    pub fn surface_point(&self, center: &Point3<f64>, theta: f64, phi: f64) -> Point3<f64> {
        Point3::new(
            center.x + self.radius * theta.sin() * phi.cos(),
            center.y + self.radius * theta.sin() * phi.sin(),
            center.z + self.radius * theta.cos(),
        )
    }

    /// Tether attachment point in the global frame.
    pub fn anchor_position(&self) -> Point3<f64> {
        let (theta, phi) = self.anchor_direction();
        self.surface_point(&self.position, theta, phi)
    }

    pub(crate) fn set_position(&mut self, position: Point3<f64>) {
        self.position = position;
    }

    pub(crate) fn set_orientation(&mut self, theta: f64, phi: f64) {
        self.theta = theta;
        self.phi = phi;
    }
}
