//! # Tether Module
//!
//! Free-energy models of the molecular linker between the pedestal and the probe bead.
//!
//! Every model answers one question, [`TetherModel::energy`]: what is the free energy of
//! the tether at end-to-end extension `z`? Models with a hidden folding coordinate also
//! expose [`TetherModel::advance_internal_state`], which the driver calls once per
//! integrator step. Stateless models ignore it.
//!
//! ## Available Models
//!
//! - **Free string** - slack until its length, then a linear entropic penalty
//! - **Stick** - stiff harmonic spring around its length
//! - **Worm-like chain** - Marko-Siggia interpolation, singular at the contour length
//! - **Fixed-step unfolder** - two equal wells a fixed step apart plus a constant force bias
//! - **Two-state switch** - two harmonic wells chosen by a breakpoint in `z`
//! - **Folding two-state switch** - worm-like chain whose contour length follows a diffusing
//!   internal coordinate ([`folding`])
//! - **Dimer** - sum of two independent models

pub mod folding;
pub mod potentials;

use crate::core::environment::Environment;
use folding::FoldingSwitch;
use rand::Rng;

/// Stiffness of the stick model: 100 pN stretch it by 2 nm.
pub const DEFAULT_STICK_STIFFNESS: f64 = 0.05;
pub const DEFAULT_UNFOLDER_STIFFNESS: f64 = 14e-3;
pub const DEFAULT_UNFOLDER_STEP: f64 = 3e-9;
pub const DEFAULT_UNFOLDING_FORCE: f64 = 30e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoStateParams {
    pub first_minimum: f64,
    pub first_stiffness: f64,
    pub second_minimum: f64,
    pub second_stiffness: f64,
    pub breakpoint: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TetherModel {
    FreeString {
        length: f64,
    },
    Stick {
        length: f64,
        stiffness: f64,
    },
    WormLikeChain {
        contour_length: f64,
        persistence_length: f64,
    },
    FixedStepUnfolder {
        first_minimum: f64,
        step: f64,
        stiffness: f64,
        unfolding_force: f64,
    },
    TwoState(TwoStateParams),
    FoldingTwoState(FoldingSwitch),
    Dimer(Box<TetherModel>, Box<TetherModel>),
}

impl TetherModel {
    pub fn stick(length: f64) -> Self {
        Self::Stick {
            length,
            stiffness: DEFAULT_STICK_STIFFNESS,
        }
    }

    pub fn fixed_step_unfolder(first_minimum: f64) -> Self {
        Self::FixedStepUnfolder {
            first_minimum,
            step: DEFAULT_UNFOLDER_STEP,
            stiffness: DEFAULT_UNFOLDER_STIFFNESS,
            unfolding_force: DEFAULT_UNFOLDING_FORCE,
        }
    }

    pub fn dimer(first: TetherModel, second: TetherModel) -> Self {
        Self::Dimer(Box::new(first), Box::new(second))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::FreeString { .. } => "free-string",
            Self::Stick { .. } => "stick",
            Self::WormLikeChain { .. } => "worm-like-chain",
            Self::FixedStepUnfolder { .. } => "fixed-step-unfolder",
            Self::TwoState(_) => "two-state",
            Self::FoldingTwoState(_) => "folding-two-state",
            Self::Dimer(..) => "dimer",
        }
    }

    pub fn energy(&self, z: f64, env: &Environment) -> f64 {
        match self {
            Self::FreeString { length } => potentials::free_string(z, *length, env.thermal_energy()),
            Self::Stick { length, stiffness } => potentials::harmonic(z, *length, *stiffness),
            Self::WormLikeChain {
                contour_length,
                persistence_length,
            } => potentials::worm_like_chain(
                z,
                *contour_length,
                *persistence_length,
                env.thermal_energy(),
            ),
            Self::FixedStepUnfolder {
                first_minimum,
                step,
                stiffness,
                unfolding_force,
            } => potentials::fixed_step(z, *first_minimum, *step, *stiffness, *unfolding_force),
            Self::TwoState(p) => potentials::two_well_harmonic(
                z,
                p.breakpoint,
                p.first_minimum,
                p.first_stiffness,
                p.second_minimum,
                p.second_stiffness,
            ),
            Self::FoldingTwoState(switch) => switch.energy(z, env),
            Self::Dimer(first, second) => first.energy(z, env) + second.energy(z, env),
        }
    }

    pub fn has_internal_state(&self) -> bool {
        match self {
            Self::FoldingTwoState(_) => true,
            Self::Dimer(first, second) => first.has_internal_state() || second.has_internal_state(),
            _ => false,
        }
    }

    /// Advances any hidden folding coordinate by `dt` under the tether tension `force`.
    pub fn advance_internal_state<R: Rng + ?Sized>(
        &mut self,
        force: f64,
        dt: f64,
        dx: f64,
        env: &Environment,
        rng: &mut R,
    ) {
        match self {
            Self::FoldingTwoState(switch) => switch.advance(force, dt, dx, env, rng),
            Self::Dimer(first, second) => {
                first.advance_internal_state(force, dt, dx, env, rng);
                second.advance_internal_state(force, dt, dx, env, rng);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folding::FoldingParams;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn two_state() -> TetherModel {
        TetherModel::TwoState(TwoStateParams {
            first_minimum: 40e-9,
            first_stiffness: 160e-5,
            second_minimum: 100e-9,
            second_stiffness: 20e-5,
            breakpoint: 55e-9,
        })
    }

    fn folding() -> TetherModel {
        TetherModel::FoldingTwoState(FoldingSwitch::new(FoldingParams {
            folded_length: 40e-9,
            unfolded_length: 100e-9,
            persistence_length: 1e-9,
            folded_minimum: 0.0,
            unfolded_minimum: 10e-9,
            folded_stiffness: 1e-3,
            unfolded_stiffness: 1e-3,
            breakpoint: 5e-9,
            internal_drag: 1e-4,
        }))
    }

    #[test]
    fn harmonic_variants_vanish_at_their_minimum() {
        let env = Environment::default();
        assert_eq!(TetherModel::stick(50e-9).energy(50e-9, &env), 0.0);
        assert_eq!(two_state().energy(40e-9, &env), 0.0);
        assert_eq!(two_state().energy(100e-9, &env), 0.0);
    }

    #[test]
    fn all_variants_are_non_negative_in_their_physical_domain() {
        let env = Environment::default();
        let models = [
            TetherModel::FreeString { length: 50e-9 },
            TetherModel::stick(50e-9),
            TetherModel::WormLikeChain {
                contour_length: 100e-9,
                persistence_length: 1e-9,
            },
            TetherModel::fixed_step_unfolder(10e-9),
            two_state(),
            folding(),
            TetherModel::dimer(two_state(), two_state()),
        ];
        for model in &models {
            for i in 0..39 {
                let z = i as f64 * 1e-9;
                let energy = model.energy(z, &env);
                assert!(energy.is_finite(), "{} at {z}", model.name());
                assert!(energy >= 0.0, "{} at {z}", model.name());
            }
        }
    }

    #[test]
    fn stick_energy_is_continuous_across_its_length() {
        let env = Environment::default();
        let stick = TetherModel::stick(50e-9);
        let below = stick.energy(50e-9 - 1e-15, &env);
        let above = stick.energy(50e-9 + 1e-15, &env);
        assert!((below - above).abs() < 1e-30);
    }

    #[test]
    fn dimer_energy_is_sum_of_monomers() {
        let env = Environment::default();
        let dimer = TetherModel::dimer(two_state(), TetherModel::stick(50e-9));
        let z = 60e-9;
        let expected = two_state().energy(z, &env) + TetherModel::stick(50e-9).energy(z, &env);
        assert_eq!(dimer.energy(z, &env), expected);
    }

    #[test]
    fn only_folding_models_carry_internal_state() {
        assert!(!TetherModel::stick(50e-9).has_internal_state());
        assert!(!two_state().has_internal_state());
        assert!(folding().has_internal_state());
        assert!(TetherModel::dimer(two_state(), folding()).has_internal_state());
    }

    #[test]
    fn advancing_a_stateless_model_leaves_it_unchanged() {
        let env = Environment::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut model = two_state();
        model.advance_internal_state(1e-9, 1e-6, 1e-11, &env, &mut rng);
        assert_eq!(model, two_state());
    }

    #[test]
    fn advancing_a_dimer_advances_both_monomers() {
        let env = Environment::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut dimer = TetherModel::dimer(folding(), folding());
        dimer.advance_internal_state(0.0, 1e-6, 1e-11, &env, &mut rng);
        let TetherModel::Dimer(first, second) = &dimer else {
            panic!("expected a dimer");
        };
        for monomer in [first, second] {
            let TetherModel::FoldingTwoState(switch) = monomer.as_ref() else {
                panic!("expected a folding monomer");
            };
            assert_ne!(switch.internal_coordinate(), 0.0);
        }
    }
}
