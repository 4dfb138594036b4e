/// The `ecolab_core` crate is the numerical engine behind the interactive
/// population ecology models.
///
/// Key components:
/// - **Models**: typed parameter records for the continuous, discrete and analytic models.
/// - **Integrate**: adaptive Dormand-Prince (and fixed RK4) integration, with lag support.
/// - **Analysis**: closed-form equilibria, linear stability, Leslie matrices, vector fields.
/// - **Api**: the string-keyed call surface, plus a caller-owned result cache.
pub mod api;
pub mod cache;
pub mod convergence;
pub mod equilibrium;
pub mod error;
pub mod integrate;
pub mod leslie;
pub mod models;
pub mod params;
pub mod solvers;
pub mod traits;
pub mod trajectory;
pub mod vector_field;

pub use error::{ConfigurationKind, EcoError, Result};
pub use models::{AnalyticModelId, ContinuousModelId, DiscreteModelId, ModelId};
pub use params::{ParamSet, StateVector};
pub use trajectory::{TimeSpec, Trajectory};
