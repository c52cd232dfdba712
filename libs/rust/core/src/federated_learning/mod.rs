//! Federated learning round coordination with a fairness gate.

pub mod coordinator;
pub mod gate;
pub use coordinator::{
    Coordinator,
    CoordinatorConfig,
    ClientSource,
    RunSummary,
};
pub use gate::{AcceptancePolicy, GateDecision, DEFAULT_BIAS_THRESHOLD};
