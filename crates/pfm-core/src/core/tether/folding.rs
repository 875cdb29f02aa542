use super::potentials;
use crate::core::environment::Environment;
use rand::Rng;
use rand_distr::StandardNormal;

/// Radius of the reference sphere whose Stokes drag, scaled by
/// [`REFERENCE_DRAG_SCALE`], sets the default internal drag.
const REFERENCE_RADIUS: f64 = 500e-9;
const REFERENCE_DRAG_SCALE: f64 = 1e4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldingParams {
    /// Contour length while folded.
    pub folded_length: f64,
    /// Contour length while unfolded.
    pub unfolded_length: f64,
    pub persistence_length: f64,
    pub folded_minimum: f64,
    pub unfolded_minimum: f64,
    pub folded_stiffness: f64,
    pub unfolded_stiffness: f64,
    /// Internal coordinate at which the landscape switches from the folded to the unfolded well.
    pub breakpoint: f64,
    pub internal_drag: f64,
}

impl FoldingParams {
    pub fn default_internal_drag(env: &Environment) -> f64 {
        env.translational_drag(REFERENCE_RADIUS) * REFERENCE_DRAG_SCALE
    }
}

/// A worm-like chain whose contour length toggles between two values as a hidden
/// folding coordinate diffuses across a two-well landscape.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldingSwitch {
    params: FoldingParams,
    internal_coordinate: f64,
    contour_length: f64,
}

impl FoldingSwitch {
    pub fn new(params: FoldingParams) -> Self {
        Self {
            params,
            internal_coordinate: params.folded_minimum,
            contour_length: params.folded_length,
        }
    }

    pub fn params(&self) -> &FoldingParams {
        &self.params
    }

    pub fn internal_coordinate(&self) -> f64 {
        self.internal_coordinate
    }

    pub fn contour_length(&self) -> f64 {
        self.contour_length
    }

    pub fn is_folded(&self) -> bool {
        self.internal_coordinate <= self.params.breakpoint
    }

    pub fn energy(&self, z: f64, env: &Environment) -> f64 {
        potentials::worm_like_chain(
            z,
            self.contour_length,
            self.params.persistence_length,
            env.thermal_energy(),
        )
    }

    fn internal_energy(&self, q: f64) -> f64 {
        potentials::two_well_harmonic(
            q,
            self.params.breakpoint,
            self.params.folded_minimum,
            self.params.folded_stiffness,
            self.params.unfolded_minimum,
            self.params.unfolded_stiffness,
        )
    }

    /// One Euler-Maruyama step of the internal coordinate under its own landscape plus
    /// the external `force` (positive values favor unfolding).
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        force: f64,
        dt: f64,
        dx: f64,
        env: &Environment,
        rng: &mut R,
    ) {
        let drag = self.params.internal_drag;
        let diffusion = env.thermal_energy() / drag;
        let q = self.internal_coordinate;

        let landscape_force = -(self.internal_energy(q + dx) - self.internal_energy(q)) / dx;
        let total_force = landscape_force + force;
        let noise: f64 = rng.sample(StandardNormal);

        self.internal_coordinate =
            q + (2.0 * diffusion * dt).sqrt() * noise + dt * total_force / drag;

        let was_folded = q <= self.params.breakpoint;
        self.contour_length = if self.is_folded() {
            self.params.folded_length
        } else {
            self.params.unfolded_length
        };
        if was_folded != self.is_folded() {
            tracing::debug!(
                internal_coordinate = self.internal_coordinate,
                contour_length = self.contour_length,
                "Tether folding state switched."
            );
        }
    }
}
