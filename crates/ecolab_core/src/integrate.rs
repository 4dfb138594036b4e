//! Drives continuous models through time.
//!
//! Output is reported exactly at the requested times: the stepper never steps
//! past the next output time, so no interpolation touches reported values.
//! Delay systems keep a dense history of accepted steps and read `x(t - tau)`
//! from it, falling back to the initial condition before the start of the run.
//! Their steps also land on the first few multiples of `tau` after the start,
//! where the lagged term makes the solution's derivatives jump.

use crate::error::{EcoError, Result};
use crate::models::continuous::ContinuousModel;
use crate::solvers::{step_factor, DormandPrince, RK4};
use crate::trajectory::Trajectory;
use crate::traits::{DelaySystem, DynamicalSystem, Steppable};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Multiples of `tau` treated as forced step endpoints. Past these the
/// solution is smooth enough for the stepper's own error control.
const TRACKED_LAG_BREAKPOINTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegratorMethod {
    /// Adaptive Dormand-Prince 4(5).
    DormandPrince,
    /// Classic RK4 with a fixed step (clipped at output times).
    Rk4 { dt: f64 },
}

/// Fields missing from a serialized value take their [`Default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorSettings {
    pub method: IntegratorMethod,
    pub rtol: f64,
    pub atol: f64,
    pub h_min: f64,
    pub h_max: Option<f64>,
    /// Step budget for the whole run, shared by every method.
    pub max_steps: usize,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            method: IntegratorMethod::DormandPrince,
            rtol: 1e-6,
            atol: 1e-9,
            h_min: 1e-12,
            h_max: None,
            max_steps: 1_000_000,
        }
    }
}

impl IntegratorSettings {
    fn validate(&self) -> Result<()> {
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return Err(EcoError::invalid_value("rtol", "must be finite and positive"));
        }
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return Err(EcoError::invalid_value("atol", "must be finite and positive"));
        }
        if !self.h_min.is_finite() || self.h_min <= 0.0 {
            return Err(EcoError::invalid_value("h_min", "must be finite and positive"));
        }
        if let Some(h_max) = self.h_max {
            if !(h_max > self.h_min) {
                return Err(EcoError::invalid_value("h_max", "must exceed h_min"));
            }
        }
        if self.max_steps == 0 {
            return Err(EcoError::invalid_value("max_steps", "must be greater than zero"));
        }
        if let IntegratorMethod::Rk4 { dt } = self.method {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(EcoError::invalid_value("dt", "must be finite and positive"));
            }
        }
        Ok(())
    }

    fn step_ceiling(&self) -> f64 {
        self.h_max.unwrap_or(f64::INFINITY)
    }

    /// Smallest step allowed at `t`; below it `t + h` stops resolving `h`.
    fn step_floor(&self, t: f64) -> f64 {
        self.h_min.max(16.0 * f64::EPSILON * t.abs())
    }
}

/// Integrates a continuous model, dispatching to the delay path when it has a lag.
pub fn simulate(
    model: &ContinuousModel,
    y0: &[f64],
    times: &[f64],
    settings: &IntegratorSettings,
) -> Result<Trajectory> {
    if DelaySystem::delay(model) > 0.0 {
        integrate_delay(model, model.compartments(), y0, times, settings)
    } else {
        integrate(model, model.compartments(), y0, times, settings)
    }
}

/// Integrates an ODE, reporting the state at every entry of `times`.
///
/// `y0` is the state at `times[0]`.
pub fn integrate<S: DynamicalSystem>(
    system: &S,
    compartments: &[&str],
    y0: &[f64],
    times: &[f64],
    settings: &IntegratorSettings,
) -> Result<Trajectory> {
    check_inputs(system.dimension(), compartments, y0, times, settings)?;
    let plan = StepPlan::new(times);
    match settings.method {
        IntegratorMethod::DormandPrince => {
            let mut rhs = |t: f64, x: &[f64], out: &mut [f64]| system.apply(t, x, out);
            let mut stepper = DormandPrince::new(y0.len());
            let mut run = AdaptiveRun::start(compartments, y0, plan, settings);
            run.drive(&mut stepper, &mut rhs, |_, _| {})?;
            Ok(run.trajectory)
        }
        IntegratorMethod::Rk4 { dt } => {
            let mut solver = RK4::new(y0.len());
            let fixed = FixedStep {
                dt,
                max_steps: settings.max_steps,
            };
            fixed.run(system, &mut solver, compartments, y0, &plan, |_, _| {})
        }
    }
}

/// Integrates a delay system `dx/dt = f(t, x(t), x(t - tau))`.
pub fn integrate_delay<S: DelaySystem>(
    system: &S,
    compartments: &[&str],
    y0: &[f64],
    times: &[f64],
    settings: &IntegratorSettings,
) -> Result<Trajectory> {
    check_inputs(system.dimension(), compartments, y0, times, settings)?;
    let tau = system.delay();
    if !tau.is_finite() || tau < 0.0 {
        return Err(EcoError::invalid_value("tau", "must be finite and non-negative"));
    }

    let history = RefCell::new(History::new(times[0], y0));
    let lagged = LaggedView {
        system,
        history: &history,
        scratch: RefCell::new(vec![0.0; y0.len()]),
    };
    let plan = StepPlan::with_lag(times, tau);

    // Every stage must read history that is already committed.
    let mut bounded = *settings;
    if tau > 0.0 {
        bounded.h_max = Some(settings.step_ceiling().min(tau));
    }

    match settings.method {
        IntegratorMethod::DormandPrince => {
            let mut rhs = |t: f64, x: &[f64], out: &mut [f64]| lagged.apply(t, x, out);
            let mut stepper = DormandPrince::new(y0.len());
            let mut run = AdaptiveRun::start(compartments, y0, plan, &bounded);
            let record = |t: f64, y: &[f64], f: &[f64], correction: &[f64]| {
                history.borrow_mut().push(t, y, f, correction)
            };
            run.drive_recording(&mut stepper, &mut rhs, record)?;
            Ok(run.trajectory)
        }
        IntegratorMethod::Rk4 { dt } => {
            let fixed = FixedStep {
                dt: if tau > 0.0 { dt.min(tau) } else { dt },
                max_steps: settings.max_steps,
            };
            let mut solver = RK4::new(y0.len());
            let mut derivative = vec![0.0; y0.len()];
            // RK4 steps are short; the cubic Hermite alone is accurate enough.
            let flat = vec![0.0; y0.len()];
            fixed.run(&lagged, &mut solver, compartments, y0, &plan, |t, y| {
                lagged.apply(t, y, &mut derivative);
                history.borrow_mut().push(t, y, &derivative, &flat);
            })
        }
    }
}

fn check_inputs(
    dim: usize,
    compartments: &[&str],
    y0: &[f64],
    times: &[f64],
    settings: &IntegratorSettings,
) -> Result<()> {
    settings.validate()?;
    if y0.len() != dim || compartments.len() != dim {
        return Err(EcoError::invalid_input(
            "initial state",
            format!("expected {dim} compartments, got {}", y0.len()),
        ));
    }
    if y0.iter().any(|v| !v.is_finite()) {
        return Err(EcoError::invalid_value("initial state", "must be finite"));
    }
    if times.is_empty() {
        return Err(EcoError::invalid_input("times", "at least one output time is required"));
    }
    if times.iter().any(|t| !t.is_finite()) || times.windows(2).any(|w| w[1] <= w[0]) {
        return Err(EcoError::invalid_value("times", "must be finite and strictly increasing"));
    }
    Ok(())
}

/// Output times plus interior times that steps must land on.
struct StepPlan<'a> {
    times: &'a [f64],
    breakpoints: Vec<f64>,
}

impl<'a> StepPlan<'a> {
    fn new(times: &'a [f64]) -> Self {
        Self {
            times,
            breakpoints: Vec::new(),
        }
    }

    fn with_lag(times: &'a [f64], tau: f64) -> Self {
        let (start, end) = (times[0], times[times.len() - 1]);
        let breakpoints = if tau > 0.0 {
            (1..=TRACKED_LAG_BREAKPOINTS)
                .map(|k| start + k as f64 * tau)
                .take_while(|b| *b < end)
                .collect()
        } else {
            Vec::new()
        };
        Self { times, breakpoints }
    }

    /// Where a step starting at `t` must stop on its way to `target`.
    fn next_stop(&self, t: f64, target: f64) -> f64 {
        let next = self.breakpoints.partition_point(|b| *b <= t);
        match self.breakpoints.get(next) {
            Some(&b) if b < target => b,
            _ => target,
        }
    }
}

struct AdaptiveRun<'a> {
    trajectory: Trajectory,
    plan: StepPlan<'a>,
    settings: &'a IntegratorSettings,
    t: f64,
    y: Vec<f64>,
    h: f64,
    steps: usize,
    correction: Vec<f64>,
}

impl<'a> AdaptiveRun<'a> {
    fn start(
        compartments: &[&str],
        y0: &[f64],
        plan: StepPlan<'a>,
        settings: &'a IntegratorSettings,
    ) -> Self {
        let times = plan.times;
        let mut trajectory = Trajectory::new(compartments);
        trajectory.push(times[0], y0);
        let span = times[times.len() - 1] - times[0];
        let h = (span * 1e-3)
            .max(settings.h_min)
            .min(settings.step_ceiling());
        Self {
            trajectory,
            plan,
            settings,
            t: times[0],
            y: y0.to_vec(),
            h,
            steps: 0,
            correction: vec![0.0; y0.len()],
        }
    }

    fn drive<F, R>(
        &mut self,
        stepper: &mut DormandPrince,
        rhs: &mut F,
        mut record: R,
    ) -> Result<()>
    where
        F: FnMut(f64, &[f64], &mut [f64]),
        R: FnMut(f64, &[f64]),
    {
        self.drive_recording(stepper, rhs, |t, y, _, _| record(t, y))
    }

    /// Steps to every output time.
    ///
    /// `record` sees each accepted `(t, y, f(t, y))` together with the quartic
    /// dense-output term of the step that ended there.
    fn drive_recording<F, R>(
        &mut self,
        stepper: &mut DormandPrince,
        rhs: &mut F,
        mut record: R,
    ) -> Result<()>
    where
        F: FnMut(f64, &[f64], &mut [f64]),
        R: FnMut(f64, &[f64], &[f64], &[f64]),
    {
        let settings = self.settings;
        stepper.prime(rhs, self.t, &self.y);
        if stepper.start_derivative().iter().any(|v| !v.is_finite()) {
            return Err(self.failure("right-hand side is not finite at the initial state"));
        }
        record(self.t, &self.y, stepper.start_derivative(), &self.correction);

        let times = self.plan.times;
        for &target in &times[1..] {
            while self.t < target {
                if self.steps >= settings.max_steps {
                    log::warn!(
                        "integration hit max_steps = {} at t = {}",
                        settings.max_steps,
                        self.t
                    );
                    return Err(self.failure(format!(
                        "exceeded max_steps = {} before t = {target}",
                        settings.max_steps
                    )));
                }
                self.steps += 1;

                let stop = self.plan.next_stop(self.t, target);
                let remaining = stop - self.t;
                let clipped = self.h >= remaining;
                let h_try = if clipped { remaining } else { self.h };
                let trial =
                    stepper.attempt(rhs, self.t, &self.y, h_try, settings.rtol, settings.atol);

                if !trial.finite {
                    log::trace!("non-finite trial at t = {} with h = {h_try:e}", self.t);
                    self.h = h_try * 0.25;
                } else if trial.error_norm <= 1.0 {
                    stepper.dense_correction(h_try, &mut self.correction);
                    stepper.accept(&mut self.y);
                    self.t = if clipped { stop } else { self.t + h_try };
                    record(self.t, &self.y, stepper.start_derivative(), &self.correction);
                    let proposed =
                        (h_try * step_factor(trial.error_norm)).min(settings.step_ceiling());
                    // A step shortened to land on a stop keeps the longer step.
                    self.h = if clipped { self.h.max(proposed) } else { proposed };
                } else {
                    log::trace!(
                        "rejected h = {h_try:e} at t = {} (error norm {:.3})",
                        self.t,
                        trial.error_norm
                    );
                    self.h = h_try * step_factor(trial.error_norm);
                }

                // Accepted steps count too.
                if self.h < settings.step_floor(self.t) {
                    log::warn!("step size underflow at t = {}", self.t);
                    return Err(self.failure(format!(
                        "step size fell below h_min = {:e}; the solution may be blowing up",
                        settings.h_min
                    )));
                }
            }
            self.trajectory.push(target, &self.y);
        }
        Ok(())
    }

    /// Failure carrying the last accepted `(t, y)`.
    fn failure(&self, reason: impl Into<String>) -> EcoError {
        EcoError::Integration {
            last_time: self.t,
            last_state: self.y.clone(),
            reason: reason.into(),
        }
    }
}

/// Fixed-step RK4 under the same step budget as the adaptive run.
struct FixedStep {
    dt: f64,
    max_steps: usize,
}

impl FixedStep {
    fn run<S, R>(
        &self,
        system: &S,
        solver: &mut RK4,
        compartments: &[&str],
        y0: &[f64],
        plan: &StepPlan<'_>,
        mut record: R,
    ) -> Result<Trajectory>
    where
        S: DynamicalSystem,
        R: FnMut(f64, &[f64]),
    {
        let times = plan.times;
        let mut trajectory = Trajectory::new(compartments);
        trajectory.push(times[0], y0);
        let mut t = times[0];
        let mut y = y0.to_vec();
        let mut steps = 0usize;
        record(t, &y);

        for &target in &times[1..] {
            while t < target {
                if steps >= self.max_steps {
                    log::warn!("fixed-step run hit max_steps = {} at t = {t}", self.max_steps);
                    return Err(EcoError::Integration {
                        last_time: t,
                        last_state: y,
                        reason: format!(
                            "exceeded max_steps = {} before t = {target}",
                            self.max_steps
                        ),
                    });
                }
                steps += 1;

                let stop = plan.next_stop(t, target);
                let remaining = stop - t;
                let clipped = self.dt >= remaining;
                let h = if clipped { remaining } else { self.dt };
                let before = (t, y.clone());
                solver.step(system, &mut t, &mut y, h);
                if y.iter().any(|v| !v.is_finite()) {
                    log::warn!("fixed-step state became non-finite after t = {}", before.0);
                    return Err(EcoError::Integration {
                        last_time: before.0,
                        last_state: before.1,
                        reason: "state became non-finite".into(),
                    });
                }
                if clipped {
                    t = stop;
                }
                record(t, &y);
            }
            trajectory.push(target, &y);
        }
        Ok(trajectory)
    }
}

/// Accepted `(t, y, f)` points of a run, for lagged lookups.
///
/// Between two points the value is the cubic Hermite through them plus an
/// optional quartic term `s^2 (1 - s)^2 * c` supplied with the later point.
struct History {
    t0: f64,
    times: Vec<f64>,
    states: Vec<Vec<f64>>,
    slopes: Vec<Vec<f64>>,
    corrections: Vec<Vec<f64>>,
}

impl History {
    fn new(t0: f64, y0: &[f64]) -> Self {
        Self {
            t0,
            times: Vec::new(),
            states: vec![y0.to_vec()],
            slopes: Vec::new(),
            corrections: Vec::new(),
        }
    }

    /// `correction` belongs to the step that ended at `t`; the seed's is ignored.
    fn push(&mut self, t: f64, y: &[f64], f: &[f64], correction: &[f64]) {
        if self.times.last().map_or(false, |last| t <= *last) {
            return;
        }
        if self.times.is_empty() {
            // The seed state was stored by `new`; this is its slope.
            self.times.push(t);
            self.slopes.push(f.to_vec());
            return;
        }
        self.times.push(t);
        self.states.push(y.to_vec());
        self.slopes.push(f.to_vec());
        self.corrections.push(correction.to_vec());
    }

    /// Writes x(query) into `out`. Queries before the start read the initial state.
    fn at(&self, query: f64, out: &mut [f64]) {
        if query <= self.t0 || self.times.len() < 2 {
            out.copy_from_slice(&self.states[0]);
            return;
        }
        let last = self.times.len() - 1;
        if query >= self.times[last] {
            out.copy_from_slice(&self.states[last]);
            return;
        }
        let upper = self.times.partition_point(|t| *t <= query).min(last);
        let lower = upper - 1;
        let (t0, t1) = (self.times[lower], self.times[upper]);
        hermite(
            t0,
            &self.states[lower],
            &self.slopes[lower],
            t1,
            &self.states[upper],
            &self.slopes[upper],
            query,
            out,
        );
        let s = (query - t0) / (t1 - t0);
        let bump = s * s * (1.0 - s) * (1.0 - s);
        for (value, c) in out.iter_mut().zip(&self.corrections[lower]) {
            *value += bump * c;
        }
    }
}

/// Cubic Hermite interpolation on one step.
#[allow(clippy::too_many_arguments)]
fn hermite(
    t0: f64,
    y0: &[f64],
    f0: &[f64],
    t1: f64,
    y1: &[f64],
    f1: &[f64],
    t: f64,
    out: &mut [f64],
) {
    let h = t1 - t0;
    let s = (t - t0) / h;
    let h01 = s * s * (3.0 - 2.0 * s);
    let h10 = s * (1.0 - s) * (1.0 - s);
    let h11 = s * s * (s - 1.0);
    for i in 0..out.len() {
        out[i] = y0[i] + (y1[i] - y0[i]) * h01 + h * (h10 * f0[i] + h11 * f1[i]);
    }
}

/// Presents a delay system as an ordinary flow by reading lagged states from history.
struct LaggedView<'a, S> {
    system: &'a S,
    history: &'a RefCell<History>,
    scratch: RefCell<Vec<f64>>,
}

impl<S: DelaySystem> DynamicalSystem for LaggedView<'_, S> {
    fn dimension(&self) -> usize {
        self.system.dimension()
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        let tau = self.system.delay();
        if tau == 0.0 {
            self.system.apply(t, x, x, out);
            return;
        }
        let mut lagged = self.scratch.borrow_mut();
        self.history.borrow().at(t - tau, &mut lagged);
        self.system.apply(t, x, &lagged, out);
    }
}
