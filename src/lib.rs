#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod catalog;
mod error;
mod invoke;
mod output;
mod params;
mod registry;
pub mod utils;
mod workspace;

pub use crate::error::*;
pub use crate::invoke::{
    Dispatcher, DryRunDispatcher, FLATTENER, GENERATOR, Invocation, ProcessDispatcher,
};
pub use crate::output::{Artifact, BUILD_DIR, CLIENT_ENV, Scheme};
pub use crate::params::{ParamSet, Value};
pub use crate::registry::{BuildContext, Registry, RunReport, TaskExecution, TaskResult};
pub use crate::workspace::Workspace;
