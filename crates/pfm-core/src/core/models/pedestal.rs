use nalgebra::{Point3, Unit, Vector3};
use rand::Rng;
use rand_distr::StandardNormal;

/// The bead the tether is anchored to.
///
/// Its center is static up to an independent Gaussian jitter of standard deviation
/// `jitter` per axis, which stands in for positional noise of the anchor rather than
/// real dynamics.
#[derive(Debug, Clone, PartialEq)]
pub struct Pedestal {
    radius: f64,
    jitter: f64,
    mean_center: Point3<f64>,
    anchor_direction: Unit<Vector3<f64>>,
}

impl Pedestal {
    pub fn new(radius: f64, jitter: f64, mean_center: Point3<f64>) -> Self {
        Self {
            radius,
            jitter,
            mean_center,
            anchor_direction: Vector3::x_axis(),
        }
    }

    /// Moves the tether attachment to the surface point along `direction`.
    pub fn with_anchor_direction(mut self, direction: Unit<Vector3<f64>>) -> Self {
        self.anchor_direction = direction;
        self
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    #[inline]
    pub fn mean_center(&self) -> &Point3<f64> {
        &self.mean_center
    }

    #[inline]
    pub fn anchor_direction(&self) -> &Unit<Vector3<f64>> {
        &self.anchor_direction
    }

    /// Draws one realization of the pedestal center.
    pub fn sample_center<R: Rng + ?Sized>(&self, rng: &mut R) -> Point3<f64> {
        if self.jitter == 0.0 {
            return self.mean_center;
        }
        let noise = Vector3::from_fn(|_, _| rng.sample::<f64, _>(StandardNormal));
        self.mean_center + noise * self.jitter
    }

    /// Tether attachment point for a pedestal centered at `center`.
    #[inline]
    pub fn anchor_point(&self, center: &Point3<f64>) -> Point3<f64> {
        center + self.anchor_direction.into_inner() * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn pedestal_without_jitter_always_samples_its_mean() {
        let pedestal = Pedestal::new(1000e-9, 0.0, Point3::new(1e-9, 2e-9, 3e-9));
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(pedestal.sample_center(&mut rng), Point3::new(1e-9, 2e-9, 3e-9));
        }
    }

    #[test]
    fn pedestal_jitter_has_requested_spread() {
        let sigma = 5e-9;
        let pedestal = Pedestal::new(1000e-9, sigma, Point3::origin());
        let mut rng = StdRng::seed_from_u64(2);
        let n = 20_000;
        let mut sum_sq = 0.0;
        for _ in 0..n {
            let c = pedestal.sample_center(&mut rng);
            sum_sq += c.x * c.x;
        }
        let std = (sum_sq / n as f64).sqrt();
        assert!((std - sigma).abs() < 0.05 * sigma);
    }

    #[test]
    fn anchor_point_defaults_to_positive_x_surface() {
        let pedestal = Pedestal::new(1000e-9, 0.0, Point3::origin());
        let anchor = pedestal.anchor_point(&Point3::origin());
        assert_eq!(anchor, Point3::new(1000e-9, 0.0, 0.0));
    }

    #[test]
    fn anchor_point_follows_configured_direction() {
        let pedestal = Pedestal::new(1000e-9, 0.0, Point3::origin())
            .with_anchor_direction(Vector3::z_axis());
        let anchor = pedestal.anchor_point(&Point3::new(1e-9, 0.0, 0.0));
        assert_eq!(anchor, Point3::new(1e-9, 0.0, 1000e-9));
    }
}
