/// Extension scale over which a slack string's entropic penalty rises by `4·k_BT`.
pub const FREE_STRING_PENALTY_LENGTH: f64 = 10e-9;

#[inline]
pub fn harmonic(z: f64, rest: f64, stiffness: f64) -> f64 {
    0.5 * stiffness * (z - rest).powi(2)
}

#[inline]
pub fn free_string(z: f64, length: f64, thermal_energy: f64) -> f64 {
    if z <= length {
        0.0
    } else {
        4.0 * thermal_energy * (z - length) / FREE_STRING_PENALTY_LENGTH
    }
}

/// Integrated Marko-Siggia interpolation; singular at `z == contour_length`.
#[inline]
pub fn worm_like_chain(
    z: f64,
    contour_length: f64,
    persistence_length: f64,
    thermal_energy: f64,
) -> f64 {
    let l = contour_length;
    thermal_energy / (4.0 * persistence_length) * (l * l / (l - z) - z + 2.0 * z * z / l)
}

/// Harmonic well `(first_minimum, first_stiffness)` up to and including `breakpoint`,
/// harmonic well `(second_minimum, second_stiffness)` beyond it.
#[inline]
pub fn two_well_harmonic(
    z: f64,
    breakpoint: f64,
    first_minimum: f64,
    first_stiffness: f64,
    second_minimum: f64,
    second_stiffness: f64,
) -> f64 {
    if z <= breakpoint {
        harmonic(z, first_minimum, first_stiffness)
    } else {
        harmonic(z, second_minimum, second_stiffness)
    }
}

#[inline]
pub fn fixed_step(
    z: f64,
    first_minimum: f64,
    step: f64,
    stiffness: f64,
    bias_force: f64,
) -> f64 {
    let well = if z < first_minimum + step / 2.0 {
        harmonic(z, first_minimum, stiffness)
    } else {
        harmonic(z, first_minimum + step, stiffness)
    };
    well + bias_force * z
}
