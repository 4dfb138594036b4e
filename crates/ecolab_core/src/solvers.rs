use crate::traits::{DynamicalSystem, Steppable};

/// Classic Runge-Kutta 4th Order Solver
pub struct RK4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
}

impl RK4 {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            tmp: vec![0.0; dim],
        }
    }
}

impl Steppable for RK4 {
    fn step(&mut self, system: &impl DynamicalSystem, t: &mut f64, state: &mut [f64], dt: f64) {
        let t0 = *t;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * 0.5;
        }
        system.apply(t0 + dt * 0.5, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * 0.5;
        }
        system.apply(t0 + dt * 0.5, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] += dt / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

/// Outcome of one Dormand-Prince trial step.
#[derive(Debug, Clone, Copy)]
pub struct TrialStep {
    /// Scaled RMS error estimate; the step is acceptable when `<= 1`.
    pub error_norm: f64,
    /// Whether every stage and the proposed state stayed finite.
    pub finite: bool,
}

/// Dormand-Prince 4(5) embedded pair.
///
/// `attempt` computes a trial step into internal buffers without touching the
/// caller's state; `accept` copies it out. The right-hand side is a closure so
/// the same stepper drives plain flows and delay systems.
pub struct DormandPrince {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    k5: Vec<f64>,
    k6: Vec<f64>,
    k7: Vec<f64>,
    tmp: Vec<f64>,
    y_new: Vec<f64>,
}

// Butcher tableau
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights (advancing solution)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// 5th minus embedded 4th-order weights
const E1: f64 = B1 - 5179.0 / 57600.0;
const E3: f64 = B3 - 7571.0 / 16695.0;
const E4: f64 = B4 - 393.0 / 640.0;
const E5: f64 = B5 + 92097.0 / 339200.0;
const E6: f64 = B6 - 187.0 / 2100.0;
const E7: f64 = -1.0 / 40.0;

// Quartic dense-output correction (Hairer, Norsett & Wanner, DOPRI5)
const D1: f64 = -12715105075.0 / 11282082432.0;
const D3: f64 = 87487479700.0 / 32700410799.0;
const D4: f64 = -10690763975.0 / 1880347072.0;
const D5: f64 = 701980252875.0 / 199316789632.0;
const D6: f64 = -1453857185.0 / 822651844.0;
const D7: f64 = 69997945.0 / 29380423.0;

impl DormandPrince {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            k5: vec![0.0; dim],
            k6: vec![0.0; dim],
            k7: vec![0.0; dim],
            tmp: vec![0.0; dim],
            y_new: vec![0.0; dim],
        }
    }

    /// Derivative at the start of the next trial (first-same-as-last).
    pub fn start_derivative(&self) -> &[f64] {
        &self.k1
    }

    /// Proposed state from the last trial.
    pub fn proposal(&self) -> &[f64] {
        &self.y_new
    }

    /// Seeds k1 = f(t, y) before the first trial.
    pub fn prime<F>(&mut self, rhs: &mut F, t: f64, y: &[f64])
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        rhs(t, y, &mut self.k1);
    }

    pub fn attempt<F>(
        &mut self,
        rhs: &mut F,
        t: f64,
        y: &[f64],
        h: f64,
        rtol: f64,
        atol: f64,
    ) -> TrialStep
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        let n = y.len();

        for i in 0..n {
            self.tmp[i] = y[i] + h * A21 * self.k1[i];
        }
        rhs(t + C2 * h, &self.tmp, &mut self.k2);

        for i in 0..n {
            self.tmp[i] = y[i] + h * (A31 * self.k1[i] + A32 * self.k2[i]);
        }
        rhs(t + C3 * h, &self.tmp, &mut self.k3);

        for i in 0..n {
            self.tmp[i] = y[i] + h * (A41 * self.k1[i] + A42 * self.k2[i] + A43 * self.k3[i]);
        }
        rhs(t + C4 * h, &self.tmp, &mut self.k4);

        for i in 0..n {
            self.tmp[i] = y[i]
                + h * (A51 * self.k1[i] + A52 * self.k2[i] + A53 * self.k3[i] + A54 * self.k4[i]);
        }
        rhs(t + C5 * h, &self.tmp, &mut self.k5);

        for i in 0..n {
            self.tmp[i] = y[i]
                + h * (A61 * self.k1[i]
                    + A62 * self.k2[i]
                    + A63 * self.k3[i]
                    + A64 * self.k4[i]
                    + A65 * self.k5[i]);
        }
        rhs(t + h, &self.tmp, &mut self.k6);

        for i in 0..n {
            self.y_new[i] = y[i]
                + h * (B1 * self.k1[i]
                    + B3 * self.k3[i]
                    + B4 * self.k4[i]
                    + B5 * self.k5[i]
                    + B6 * self.k6[i]);
        }
        rhs(t + h, &self.y_new, &mut self.k7);

        let mut finite = true;
        let mut err_sq = 0.0;
        for i in 0..n {
            let err = h
                * (E1 * self.k1[i]
                    + E3 * self.k3[i]
                    + E4 * self.k4[i]
                    + E5 * self.k5[i]
                    + E6 * self.k6[i]
                    + E7 * self.k7[i]);
            let scale = atol + rtol * y[i].abs().max(self.y_new[i].abs());
            err_sq += (err / scale) * (err / scale);
            finite &= self.y_new[i].is_finite() && self.k7[i].is_finite();
        }
        let error_norm = if n == 0 { 0.0 } else { (err_sq / n as f64).sqrt() };
        TrialStep {
            error_norm,
            finite: finite && error_norm.is_finite(),
        }
    }

    /// Writes the quartic term of the continuous extension of the last trial.
    ///
    /// Over a step of size `h` the interpolant is the cubic Hermite through the
    /// endpoints and their slopes plus `s^2 (1 - s)^2 * out`, with `s` the
    /// fraction of the step. Must be called before [`accept`](Self::accept).
    pub fn dense_correction(&self, h: f64, out: &mut [f64]) {
        for i in 0..out.len() {
            out[i] = h
                * (D1 * self.k1[i]
                    + D3 * self.k3[i]
                    + D4 * self.k4[i]
                    + D5 * self.k5[i]
                    + D6 * self.k6[i]
                    + D7 * self.k7[i]);
        }
    }

    /// Commits the last trial into `y` and rolls k7 into k1.
    pub fn accept(&mut self, y: &mut [f64]) {
        y.copy_from_slice(&self.y_new);
        std::mem::swap(&mut self.k1, &mut self.k7);
    }
}

/// Step-size factor from a scaled error norm, bounded to [0.2, 5].
pub fn step_factor(error_norm: f64) -> f64 {
    if error_norm == 0.0 {
        5.0
    } else {
        (0.9 * error_norm.powf(-0.2)).clamp(0.2, 5.0)
    }
}

/// Discrete Map Stepper
/// Just evaluates x_{n+1} = f(x_n).
/// dt is treated as 1 iteration regardless of value, but we track t as t + dt.
pub struct DiscreteMap {
    tmp: Vec<f64>,
}

impl DiscreteMap {
    pub fn new(dim: usize) -> Self {
        Self { tmp: vec![0.0; dim] }
    }
}

impl Steppable for DiscreteMap {
    fn step(&mut self, system: &impl DynamicalSystem, t: &mut f64, state: &mut [f64], dt: f64) {
        system.apply(*t, state, &mut self.tmp);
        state.copy_from_slice(&self.tmp);
        *t += dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Decay {
        rate: f64,
    }

    impl DynamicalSystem for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -self.rate * x[0];
        }
    }

    struct Doubling;

    impl DynamicalSystem for Doubling {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = 2.0 * x[0];
        }
    }

    #[test]
    fn rk4_tracks_exponential_decay() {
        let system = Decay { rate: 0.5 };
        let mut solver = RK4::new(1);
        let mut t = 0.0;
        let mut state = vec![1.0];
        for _ in 0..100 {
            solver.step(&system, &mut t, &mut state, 0.02);
        }
        assert!((t - 2.0).abs() < 1e-12);
        assert!((state[0] - (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn dormand_prince_single_step_is_fifth_order_accurate() {
        let system = Decay { rate: 1.0 };
        let mut rhs = |t: f64, x: &[f64], out: &mut [f64]| system.apply(t, x, out);
        let mut stepper = DormandPrince::new(1);
        let y = vec![1.0];
        stepper.prime(&mut rhs, 0.0, &y);
        let trial = stepper.attempt(&mut rhs, 0.0, &y, 0.1, 1e-6, 1e-9);
        assert!(trial.finite);
        assert!(trial.error_norm < 1.0);
        assert!((stepper.proposal()[0] - (-0.1f64).exp()).abs() < 1e-8);

        let mut committed = y.clone();
        stepper.accept(&mut committed);
        assert_eq!(committed, stepper.proposal());
        assert!((stepper.start_derivative()[0] + committed[0]).abs() < 1e-15);
    }

    #[test]
    fn dense_output_improves_on_hermite_mid_step() {
        // y' = y over one step of 0.5, read back at 0.25.
        let mut rhs = |_t: f64, x: &[f64], out: &mut [f64]| out[0] = x[0];
        let mut stepper = DormandPrince::new(1);
        let h = 0.5;
        let y = vec![1.0];
        stepper.prime(&mut rhs, 0.0, &y);
        stepper.attempt(&mut rhs, 0.0, &y, h, 1e-6, 1e-9);
        let mut correction = [0.0];
        stepper.dense_correction(h, &mut correction);
        let (f0, y1) = (stepper.start_derivative()[0], stepper.proposal()[0]);
        let f1 = y1;

        let s: f64 = 0.5;
        let hermite = 1.0
            + (y1 - 1.0) * s * s * (3.0 - 2.0 * s)
            + h * (s * (1.0 - s) * (1.0 - s) * f0 + s * s * (s - 1.0) * f1);
        let dense = hermite + s * s * (1.0 - s) * (1.0 - s) * correction[0];
        let exact = 0.25f64.exp();
        assert!((hermite - exact).abs() > 1e-4);
        assert!((dense - exact).abs() < 1e-5);
    }

    #[test]
    fn dormand_prince_flags_blow_up() {
        let mut rhs = |_t: f64, x: &[f64], out: &mut [f64]| out[0] = x[0] * x[0] * 1e300;
        let mut stepper = DormandPrince::new(1);
        let y = vec![1e10];
        stepper.prime(&mut rhs, 0.0, &y);
        let trial = stepper.attempt(&mut rhs, 0.0, &y, 1.0, 1e-6, 1e-9);
        assert!(!trial.finite);
    }

    #[test]
    fn step_factor_is_bounded() {
        assert_eq!(step_factor(0.0), 5.0);
        assert_eq!(step_factor(1e12), 0.2);
        assert!(step_factor(1.0) < 1.0);
    }

    #[test]
    fn discrete_map_advances_one_iteration() {
        let mut stepper = DiscreteMap::new(1);
        let mut t = 0.0;
        let mut state = vec![3.0];
        stepper.step(&Doubling, &mut t, &mut state, 1.0);
        stepper.step(&Doubling, &mut t, &mut state, 1.0);
        assert_eq!(state, vec![12.0]);
        assert_eq!(t, 2.0);
    }
}
