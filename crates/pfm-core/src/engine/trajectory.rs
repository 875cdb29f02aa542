use crate::core::io::trajectory::{TrajectoryWriteError, write_rows, write_rows_to_path};
use crate::core::models::probe::ProbeParticle;
use std::io::Write;
use std::path::Path;

const POSITION_COLUMNS: &[&str] = &["x", "y", "z"];
const DRIVEN_COLUMNS: &[&str] = &["x", "y", "z", "theta", "phi", "trap_kx"];

/// Column set recorded per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectoryLayout {
    /// Probe center only, for runs without a driven trap.
    Position,
    /// Probe center, orientation and the driven trap's x stiffness.
    Driven,
}

impl TrajectoryLayout {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Position => POSITION_COLUMNS,
            Self::Driven => DRIVEN_COLUMNS,
        }
    }

    pub fn width(self) -> usize {
        self.columns().len()
    }
}

/// Dense row-major table of probe samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    layout: TrajectoryLayout,
    data: Vec<f64>,
}

impl Trajectory {
    pub fn with_capacity(layout: TrajectoryLayout, rows: usize) -> Self {
        Self {
            layout,
            data: Vec::with_capacity(rows.saturating_mul(layout.width())),
        }
    }

    pub fn layout(&self) -> TrajectoryLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.layout.width()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends one row for the current probe state. `trap_kx` is ignored for [`TrajectoryLayout::Position`].
    pub fn record(&mut self, probe: &ProbeParticle, trap_kx: f64) {
        let position = probe.position();
        self.data.extend_from_slice(&[position.x, position.y, position.z]);
        if self.layout == TrajectoryLayout::Driven {
            let (theta, phi) = probe.orientation();
            self.data.extend_from_slice(&[theta, phi, trap_kx]);
        }
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows().nth(index)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.layout.width())
    }

    /// Values of one named column across all rows.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.layout.columns().iter().position(|c| *c == name)?;
        Some(self.rows().map(|row| row[index]).collect())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TrajectoryWriteError> {
        write_rows(writer, self.layout.columns(), self.rows())
    }

    pub fn write_csv_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TrajectoryWriteError> {
        write_rows_to_path(path, self.layout.columns(), self.rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::Environment;
    use nalgebra::Point3;

    fn probe() -> ProbeParticle {
        ProbeParticle::new(500e-9, 1.0, Point3::new(1.0, 2.0, 3.0), &Environment::default())
    }

    #[test]
    fn position_layout_records_three_columns() {
        let mut trajectory = Trajectory::with_capacity(TrajectoryLayout::Position, 2);
        trajectory.record(&probe(), 9.0);
        trajectory.record(&probe(), 9.0);
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.row(1), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(trajectory.row(2), None);
        assert_eq!(trajectory.row(usize::MAX), None);
    }

    #[test]
    fn driven_layout_records_orientation_and_trap_stiffness() {
        let mut trajectory = Trajectory::with_capacity(TrajectoryLayout::Driven, 1);
        trajectory.record(&probe(), 4e-5);
        assert_eq!(trajectory.row(0), Some(&[1.0, 2.0, 3.0, 0.0, 0.0, 4e-5][..]));
        assert_eq!(trajectory.column("trap_kx"), Some(vec![4e-5]));
        assert_eq!(trajectory.column("missing"), None);
    }

    #[test]
    fn write_csv_uses_layout_header() {
        let mut trajectory = Trajectory::with_capacity(TrajectoryLayout::Driven, 1);
        trajectory.record(&probe(), 0.5);
        let mut buffer = Vec::new();
        trajectory.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().next(), Some("x,y,z,theta,phi,trap_kx"));
        assert_eq!(text.lines().nth(1), Some("1,2,3,0,0,0.5"));
    }

    #[test]
    fn empty_trajectory_has_no_rows() {
        let trajectory = Trajectory::with_capacity(TrajectoryLayout::Position, 0);
        assert!(trajectory.is_empty());
        assert_eq!(trajectory.rows().count(), 0);
    }
}
