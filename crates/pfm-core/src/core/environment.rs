use serde::Deserialize;
use std::f64::consts::PI;

pub const BOLTZMANN_CONSTANT: f64 = 1.38064852e-23; // In J/K
pub const ROOM_TEMPERATURE: f64 = 295.0; // In K
pub const WATER_VISCOSITY: f64 = 8.9e-4; // In Pa·s

/// Physical conditions shared by every component that needs thermal energy or drag.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Environment {
    pub boltzmann: f64,
    pub temperature: f64,
    pub viscosity: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            boltzmann: BOLTZMANN_CONSTANT,
            temperature: ROOM_TEMPERATURE,
            viscosity: WATER_VISCOSITY,
        }
    }
}

impl Environment {
    pub fn new(boltzmann: f64, temperature: f64, viscosity: f64) -> Self {
        Self {
            boltzmann,
            temperature,
            viscosity,
        }
    }

    #[inline]
    pub fn thermal_energy(&self) -> f64 {
        self.boltzmann * self.temperature
    }

    /// Stokes drag `6πηR` of a sphere of radius `radius`.
    #[inline]
    pub fn translational_drag(&self, radius: f64) -> f64 {
        6.0 * PI * self.viscosity * radius
    }

    /// Rotational drag `8πηR³` of a sphere of radius `radius`.
    #[inline]
    pub fn rotational_drag(&self, radius: f64) -> f64 {
        8.0 * PI * self.viscosity * radius.powi(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_approx_equal(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * b.abs().max(f64::MIN_POSITIVE)
    }

    #[test]
    fn default_environment_is_water_at_room_temperature() {
        let env = Environment::default();
        assert_eq!(env.boltzmann, BOLTZMANN_CONSTANT);
        assert_eq!(env.temperature, 295.0);
        assert_eq!(env.viscosity, 8.9e-4);
    }

    #[test]
    fn thermal_energy_is_boltzmann_times_temperature() {
        let env = Environment::new(2.0, 3.0, 1.0);
        assert_eq!(env.thermal_energy(), 6.0);
    }

    #[test]
    fn drag_coefficients_follow_stokes_law() {
        let env = Environment::default();
        let radius = 500e-9;
        assert!(f64_approx_equal(
            env.translational_drag(radius),
            6.0 * PI * 8.9e-4 * 500e-9,
            1e-12
        ));
        assert!(f64_approx_equal(
            env.rotational_drag(radius),
            8.0 * PI * 8.9e-4 * 500e-9_f64.powi(3),
            1e-12
        ));
    }
}
