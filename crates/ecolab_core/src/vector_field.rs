//! Phase-plane arrows sampled on a grid around a realized trajectory.

use crate::equilibrium::SystemKind;
use crate::error::{EcoError, Result};
use crate::trajectory::Trajectory;
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GRID_DENSITY: usize = 20;

/// Padding applied to the observed range: arrows reach a little past the
/// trajectory, more on the high side where populations grow into.
const LOW_PAD: f64 = 0.9;
const HIGH_PAD: f64 = 1.4;
/// Half-width of the window around a constant compartment.
const DEGENERATE_HALF_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisWindow {
    pub var_index: usize,
    pub min: f64,
    pub max: f64,
}

impl AxisWindow {
    /// Padded window around one compartment of `trajectory`.
    pub fn around(trajectory: &Trajectory, var_index: usize) -> Result<Self> {
        let (lo, hi) = trajectory
            .states
            .iter()
            .map(|row| row[var_index])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !lo.is_finite() || !hi.is_finite() {
            return Err(EcoError::invalid_input(
                "trajectory",
                "needs at least one finite sample to bound the vector field",
            ));
        }
        let (min, max) = padded(lo, hi);
        Ok(Self {
            var_index,
            min,
            max,
        })
    }

    fn sample(&self, i: usize, samples: usize) -> f64 {
        let span = self.max - self.min;
        self.min + span * i as f64 / (samples - 1) as f64
    }
}

fn padded(lo: f64, hi: f64) -> (f64, f64) {
    if lo == hi {
        return (lo - DEGENERATE_HALF_WIDTH, hi + DEGENERATE_HALF_WIDTH);
    }
    let (min, max) = (lo * LOW_PAD, hi * HIGH_PAD);
    // Negative ranges invert under the multiplicative padding.
    if max > min {
        (min, max)
    } else {
        (lo, hi)
    }
}

/// One arrow: the grid point and where the system sends it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub start: [f64; 2],
    pub end: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorField {
    /// Compartment names of the horizontal and vertical axes.
    pub axes: [String; 2],
    pub x_window: AxisWindow,
    pub y_window: AxisWindow,
    pub density: usize,
    /// Row-major over the grid: `x` varies fastest.
    pub arrows: Vec<Arrow>,
}

/// Samples `system` on a `density x density` grid around `trajectory`.
///
/// `axes` names the plotted compartments; `None` picks the first two. Every
/// other compartment is frozen at the trajectory's final state. For a flow the
/// arrow ends at `start + f(start)`, for a map at `f(start)`.
pub fn sample<S: DynamicalSystem>(
    system: &S,
    kind: SystemKind,
    trajectory: &Trajectory,
    axes: Option<(&str, &str)>,
    density: usize,
) -> Result<VectorField> {
    let dim = system.dimension();
    if dim < 2 {
        return Err(EcoError::invalid_input(
            "model",
            "a vector field needs at least two compartments",
        ));
    }
    if trajectory.dimension() != dim {
        return Err(EcoError::invalid_input(
            "trajectory",
            format!(
                "has {} compartments, the model has {dim}",
                trajectory.dimension()
            ),
        ));
    }
    trajectory.check_shape()?;
    if density < 2 {
        return Err(EcoError::invalid_value("grid_density", "must be at least 2"));
    }
    let frozen = trajectory
        .final_state()
        .ok_or_else(|| EcoError::invalid_input("trajectory", "is empty"))?;

    let (ix, iy) = match axes {
        Some((x, y)) => (trajectory.index_of(x)?, trajectory.index_of(y)?),
        None => (0, 1),
    };
    if ix == iy {
        return Err(EcoError::invalid_input("axes", "must name two different compartments"));
    }
    let x_window = AxisWindow::around(trajectory, ix)?;
    let y_window = AxisWindow::around(trajectory, iy)?;
    let t = trajectory.final_time().unwrap_or(0.0);

    let mut state = frozen.to_vec();
    let mut image = vec![0.0; dim];
    let mut arrows = Vec::with_capacity(density * density);
    for row in 0..density {
        let y = y_window.sample(row, density);
        for col in 0..density {
            let x = x_window.sample(col, density);
            state[ix] = x;
            state[iy] = y;
            system.apply(t, &state, &mut image);
            let end = match kind {
                SystemKind::Flow => [x + image[ix], y + image[iy]],
                SystemKind::Map => [image[ix], image[iy]],
            };
            arrows.push(Arrow { start: [x, y], end });
        }
    }
    log::debug!(
        "sampled {} arrows over [{}, {}] x [{}, {}]",
        arrows.len(),
        x_window.min,
        x_window.max,
        y_window.min,
        y_window.max
    );

    Ok(VectorField {
        axes: [
            trajectory.compartments[ix].clone(),
            trajectory.compartments[iy].clone(),
        ],
        x_window,
        y_window,
        density,
        arrows,
    })
}
