use super::sequence::{StimulusLevel, StimulusSequence};
use nalgebra::{Point3, Vector3};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum TrapError {
    #[error("Invalid stiffness bounds on axis {axis}: low {low} must be non-negative and below high {high}")]
    InvalidBounds { axis: char, low: f64, high: f64 },
    #[error("Low stiffness bound on axis {axis} is {low} but the high-bound ratio requires {expected}")]
    DisproportionateLowBound { axis: char, low: f64, expected: f64 },
    #[error("Invalid stiffness ramp rate: {0}. Rate must be non-negative and finite")]
    InvalidRampRate(f64),
    #[error("Invalid low-pass filter rate: {0}. Rate must be positive and finite")]
    InvalidLowPassRate(f64),
}

/// Relative slack allowed when checking that the low bound follows the high-bound axis ratios.
const RATIO_TOLERANCE: f64 = 1e-9;

/// Per-axis lower and upper stiffness of a driven trap.
///
/// Both bounds share the same `ky / kx` and `kz / kx` ratios, so every commanded
/// stiffness keeps the trap's shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StiffnessBounds {
    pub low: Vector3<f64>,
    pub high: Vector3<f64>,
}

impl StiffnessBounds {
    pub fn new(low: Vector3<f64>, high: Vector3<f64>) -> Self {
        Self { low, high }
    }

    /// Bounds from zero up to `high` on every axis.
    pub fn from_zero(high: Vector3<f64>) -> Self {
        Self {
            low: Vector3::zeros(),
            high,
        }
    }

    fn validate(&self) -> Result<(), TrapError> {
        if !(self.high.x > self.low.x) || self.low.x < 0.0 {
            return Err(TrapError::InvalidBounds {
                axis: 'x',
                low: self.low.x,
                high: self.high.x,
            });
        }
        let expected = self.scaled(self.low.x);
        for (axis, i) in [('y', 1), ('z', 2)] {
            if (self.low[i] - expected[i]).abs() > RATIO_TOLERANCE * self.high[i] {
                return Err(TrapError::DisproportionateLowBound {
                    axis,
                    low: self.low[i],
                    expected: expected[i],
                });
            }
        }
        Ok(())
    }

    /// Stiffness on all axes for an x stiffness of `kx`, keeping `k_i / kx` equal to the
    /// ratio of the high bounds.
    fn scaled(&self, kx: f64) -> Vector3<f64> {
        let scale = kx / self.high.x;
        Vector3::new(kx, self.high.y * scale, self.high.z * scale)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DriveProtocol {
    /// Stiffness stays at its commanded value.
    Off,
    /// Stiffness ramps linearly between the bounds at `rate` N/(m·s).
    Ramp { rate: f64, pulling: bool },
    /// Stiffness switches between the bounds following a binary stimulus.
    Sequence(StimulusSequence),
}

impl DriveProtocol {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Ramp { .. } => "ramp",
            Self::Sequence(_) => "sequence",
        }
    }
}

/// A three-axis harmonic optical trap with a drivable stiffness.
///
/// The trap keeps two stiffness vectors: the commanded one, set by the drive protocol,
/// and the realized one that actually acts on the probe. Without a low-pass filter the
/// realized stiffness snaps to the command every step; with one it relaxes towards it at
/// `d(k)/dt = rate·(k_command − k)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticalTrap {
    stiffness: Vector3<f64>,
    command: Vector3<f64>,
    center: Point3<f64>,
    bounds: StiffnessBounds,
    protocol: DriveProtocol,
    low_pass_rate: Option<f64>,
}

impl OpticalTrap {
    pub fn new(stiffness: Vector3<f64>, center: Point3<f64>) -> Self {
        Self {
            stiffness,
            command: stiffness,
            center,
            bounds: StiffnessBounds::from_zero(stiffness),
            protocol: DriveProtocol::Off,
            low_pass_rate: None,
        }
    }

    /// A trap that exerts no force.
    pub fn disabled(center: Point3<f64>) -> Self {
        Self::new(Vector3::zeros(), center)
    }

    #[inline]
    pub fn stiffness(&self) -> &Vector3<f64> {
        &self.stiffness
    }

    #[inline]
    pub fn command(&self) -> &Vector3<f64> {
        &self.command
    }

    #[inline]
    pub fn center(&self) -> &Point3<f64> {
        &self.center
    }

    #[inline]
    pub fn bounds(&self) -> &StiffnessBounds {
        &self.bounds
    }

    #[inline]
    pub fn protocol(&self) -> &DriveProtocol {
        &self.protocol
    }

    #[inline]
    pub fn low_pass_rate(&self) -> Option<f64> {
        self.low_pass_rate
    }

    /// `Some(true)` while a ramp is pulling, `Some(false)` while it relaxes.
    pub fn is_pulling(&self) -> Option<bool> {
        match self.protocol {
            DriveProtocol::Ramp { pulling, .. } => Some(pulling),
            _ => None,
        }
    }

    /// Zeroes both realized and commanded stiffness.
    pub fn trap_off(&mut self) {
        self.stiffness = Vector3::zeros();
        self.command = Vector3::zeros();
    }

    pub fn low_pass_filter_on(&mut self, rate: f64) -> Result<(), TrapError> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(TrapError::InvalidLowPassRate(rate));
        }
        self.low_pass_rate = Some(rate);
        Ok(())
    }

    pub fn low_pass_filter_off(&mut self) {
        self.low_pass_rate = None;
    }

    /// Prepares a force-ramp run. The trap is switched off so pulling starts from zero force.
    pub fn init_ramp(&mut self, bounds: StiffnessBounds, rate: f64) -> Result<(), TrapError> {
        bounds.validate()?;
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(TrapError::InvalidRampRate(rate));
        }
        self.bounds = bounds;
        self.trap_off();
        self.protocol = DriveProtocol::Ramp {
            rate,
            pulling: true,
        };
        debug!(kx_high = bounds.high.x, rate, "Force ramp initialized.");
        Ok(())
    }

    /// Prepares a stimulus-sequence run. The trap is switched off first; a `low_pass_rate`
    /// enables the filter, `None` disables it.
    pub fn init_sequence(
        &mut self,
        bounds: StiffnessBounds,
        low_pass_rate: Option<f64>,
        sequence: StimulusSequence,
    ) -> Result<(), TrapError> {
        bounds.validate()?;
        match low_pass_rate {
            Some(rate) => self.low_pass_filter_on(rate)?,
            None => self.low_pass_filter_off(),
        }
        self.bounds = bounds;
        self.trap_off();
        debug!(
            samples = sequence.len(),
            period = sequence.period(),
            "Stimulus sequence protocol initialized."
        );
        self.protocol = DriveProtocol::Sequence(sequence);
        Ok(())
    }

    /// Returns to a fixed trap, keeping the current stiffness.
    pub fn init_static(&mut self) {
        self.protocol = DriveProtocol::Off;
    }

    /// Advances the drive protocol and the realized stiffness by `dt`.
    pub fn propagate(&mut self, dt: f64) {
        match &mut self.protocol {
            DriveProtocol::Off => {}
            DriveProtocol::Ramp { rate, pulling } => {
                let step = dt * *rate;
                let mut kx = self.command.x;
                if *pulling {
                    if kx + step > self.bounds.high.x {
                        kx -= step;
                        *pulling = false;
                        debug!(kx, "Force ramp reached upper bound, relaxing.");
                    } else {
                        kx += step;
                    }
                } else if kx - step < self.bounds.low.x {
                    kx += step;
                    *pulling = true;
                    debug!(kx, "Force ramp reached lower bound, pulling.");
                } else {
                    kx -= step;
                }
                self.command = self.bounds.scaled(kx);
            }
            DriveProtocol::Sequence(sequence) => {
                sequence.advance_by(dt);
                self.command = match sequence.value() {
                    StimulusLevel::High => self.bounds.high,
                    StimulusLevel::Low => self.bounds.low,
                };
            }
        }

        match self.low_pass_rate {
            Some(rate) => self.stiffness += (self.command - self.stiffness) * (dt * rate),
            None => self.stiffness = self.command,
        }
    }

    /// Harmonic potential energy of a probe centered at `position`.
    pub fn energy(&self, position: &Point3<f64>) -> f64 {
        let d = *position - self.center;
        0.5 * (self.stiffness.x * d.x * d.x
            + self.stiffness.y * d.y * d.y
            + self.stiffness.z * d.z * d.z)
    }

    /// Forward finite-difference force on a probe centered at `position`.
    pub fn force(&self, position: &Point3<f64>, dx: f64) -> Vector3<f64> {
        let reference = self.energy(position);
        Vector3::from_fn(|i, _| {
            let mut shifted = *position;
            shifted[i] += dx;
            -(self.energy(&shifted) - reference) / dx
        })
    }
}
