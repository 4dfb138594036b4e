//! Age-structured projection with Leslie matrices.

use crate::error::{EcoError, Result};
use crate::trajectory::Trajectory;
use nalgebra::linalg::SVD;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Relative band around `lambda = 1` reported as stationary.
const STATIONARY_TOLERANCE: f64 = 1e-9;

/// Square non-negative projection matrix, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeslieMatrix {
    size: usize,
    entries: Vec<f64>,
}

impl LeslieMatrix {
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(EcoError::invalid_input("matrix", "needs at least one age class"));
        }
        if let Some(row) = rows.iter().position(|row| row.len() != size) {
            return Err(EcoError::invalid_input(
                "matrix",
                format!(
                    "row {row} has {} entries, expected {size}",
                    rows[row].len()
                ),
            ));
        }
        let entries: Vec<f64> = rows.iter().flatten().copied().collect();
        if entries.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(EcoError::invalid_value(
                "matrix",
                "entries must be finite and non-negative",
            ));
        }
        Ok(Self { size, entries })
    }

    /// Fecundities on the top row, survivals on the sub-diagonal.
    pub fn from_vital_rates(fecundity: &[f64], survival: &[f64]) -> Result<Self> {
        let size = fecundity.len();
        if size == 0 || survival.len() + 1 != size {
            return Err(EcoError::invalid_input(
                "vital rates",
                format!(
                    "{} fecundities need {} survival probabilities, got {}",
                    size,
                    size.saturating_sub(1),
                    survival.len()
                ),
            ));
        }
        let mut rows = vec![vec![0.0; size]; size];
        rows[0].copy_from_slice(fecundity);
        for (i, s) in survival.iter().enumerate() {
            rows[i + 1][i] = *s;
        }
        Self::from_rows(&rows)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.entries[row * self.size + col]
    }

    fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.size, self.size, &self.entries)
    }

    fn check_state(&self, state: &[f64]) -> Result<()> {
        if state.len() != self.size {
            return Err(EcoError::invalid_input(
                "age distribution",
                format!("expected {} classes, got {}", self.size, state.len()),
            ));
        }
        if state.iter().any(|v| !v.is_finite()) {
            return Err(EcoError::invalid_value("age distribution", "must be finite"));
        }
        Ok(())
    }

    /// One time step: `n' = L n`.
    pub fn project(&self, state: &[f64]) -> Result<Vec<f64>> {
        self.check_state(state)?;
        let mut next = vec![0.0; self.size];
        self.project_into(state, &mut next);
        Ok(next)
    }

    fn project_into(&self, state: &[f64], out: &mut [f64]) {
        for (row, slot) in out.iter_mut().enumerate() {
            let coeffs = &self.entries[row * self.size..(row + 1) * self.size];
            *slot = coeffs.iter().zip(state).map(|(l, n)| l * n).sum();
        }
    }

    /// Projects `n_steps` times; compartments are named `age_0`, `age_1`, ...
    pub fn project_n(&self, init: &[f64], n_steps: usize) -> Result<Trajectory> {
        self.check_state(init)?;
        let names = age_class_names(self.size);
        let labels: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut trajectory = Trajectory::new(&labels);
        let mut state = init.to_vec();
        let mut next = vec![0.0; self.size];
        trajectory.push(0.0, &state);
        for step in 1..=n_steps {
            self.project_into(&state, &mut next);
            std::mem::swap(&mut state, &mut next);
            trajectory.push(step as f64, &state);
        }
        Ok(trajectory)
    }

    /// Dominant eigenvalue and the stable age distribution.
    ///
    /// The eigenvalue of largest modulus wins, ties going to the larger real
    /// part; for a non-negative matrix that is the real Perron root. The
    /// eigenvector is the null vector of `L - lambda I` scaled to sum to 1.
    pub fn dominant_eigen(&self) -> Result<DominantEigen> {
        let matrix = self.to_matrix();
        let eigenvalues = matrix.complex_eigenvalues();
        let modulus = eigenvalues.iter().map(|l| l.norm()).fold(0.0, f64::max);
        // Equal moduli up to rounding count as a tie.
        let lambda = eigenvalues
            .iter()
            .copied()
            .filter(|l| l.norm() >= modulus * (1.0 - 1e-9))
            .max_by(|a, b| a.re.total_cmp(&b.re))
            .ok_or_else(|| EcoError::domain("matrix has no eigenvalues"))?;
        if lambda.im.abs() > 1e-9 * lambda.norm().max(1.0) {
            return Err(EcoError::domain(format!(
                "dominant eigenvalue {} + {}i is not real",
                lambda.re, lambda.im
            )));
        }
        let eigenvalue = lambda.re;

        let mut shifted = matrix;
        for i in 0..self.size {
            shifted[(i, i)] -= eigenvalue;
        }
        let svd = SVD::new(shifted, false, true);
        let v_t = svd
            .v_t
            .ok_or_else(|| EcoError::domain("failed to compute the dominant eigenvector"))?;
        let null_index = svd
            .singular_values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let vector: Vec<f64> = v_t.row(null_index).iter().copied().collect();

        let total: f64 = vector.iter().sum();
        if !total.is_finite() || total.abs() < 1e-12 {
            return Err(EcoError::domain(
                "dominant eigenvector sums to zero; no stable age distribution",
            ));
        }
        let stable_distribution = vector.iter().map(|v| v / total).collect();

        Ok(DominantEigen {
            eigenvalue,
            stable_distribution,
            trend: Trend::classify(eigenvalue),
        })
    }

    /// R0 = sum_i f_i l_i, with l_i the cumulative survival to class i.
    pub fn net_reproductive_rate(&self) -> f64 {
        let mut survivorship = 1.0;
        let mut total = 0.0;
        for class in 0..self.size {
            total += self.get(0, class) * survivorship;
            if class + 1 < self.size {
                survivorship *= self.get(class + 1, class);
            }
        }
        total
    }
}

fn age_class_names(size: usize) -> Vec<String> {
    (0..size).map(|i| format!("age_{i}")).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Growing,
    Stationary,
    Declining,
}

impl Trend {
    pub fn classify(lambda: f64) -> Self {
        if (lambda - 1.0).abs() <= STATIONARY_TOLERANCE {
            Trend::Stationary
        } else if lambda > 1.0 {
            Trend::Growing
        } else {
            Trend::Declining
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantEigen {
    pub eigenvalue: f64,
    /// Proportion of the population in each age class; sums to 1.
    pub stable_distribution: Vec<f64>,
    pub trend: Trend,
}
