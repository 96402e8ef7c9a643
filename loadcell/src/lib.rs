#![doc = include_str!("../README.md")]

pub mod backend;
pub mod generator;
pub mod orchestrator;
pub mod repeat;
pub mod runner;

mod error;

pub use backend::{Backend, Connector};
pub use error::Error;

pub mod prelude {
    pub use crate::backend::{Backend, Connector};
    pub use crate::orchestrator::{
        run_fan_out, run_isolation, FairnessReport, FairnessVerdict, IsolationReport,
        IsolationVerdict,
    };
    pub use crate::repeat::{run_multiple, MultiRunReport};
    pub use crate::runner::run_workload;

    pub use loadcell_core::{
        BenchParams, ConnConfig, FanOutConfig, IsolationConfig, MultiRunConfig, OperationResult,
        RunStats, SteadyState, TenantRunStats, WorkloadMix,
    };
}
