/// Represents a dynamical system (Flow or Map).
///
/// For flows `apply` writes dx/dt; for maps it writes x_{n+1}. Implementations
/// must be pure: identical inputs give bit-identical outputs.
pub trait DynamicalSystem {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field (flow) or map function.
    /// t: current time
    /// x: current state
    /// out: buffer to write the result
    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]);
}

/// A flow whose right-hand side also reads the solution at a fixed lag.
pub trait DelaySystem {
    fn dimension(&self) -> usize;

    /// The lag τ (non-negative).
    fn delay(&self) -> f64;

    /// x_lagged holds the solution at `t - delay()`.
    fn apply(&self, t: f64, x: &[f64], x_lagged: &[f64], out: &mut [f64]);
}

/// A trait for solvers that can step a system forward.
pub trait Steppable {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    /// dt: step size
    fn step(&mut self, system: &impl DynamicalSystem, t: &mut f64, state: &mut [f64], dt: f64);
}
