//! Plan document model and loader
//!
//! This module provides the typed representation of a Terraform/OpenTofu
//! plan JSON document and the loader that constructs it from raw bytes.

mod loader;
mod model;

pub use loader::{
    PlanLoader, SUPPORTED_FORMAT_MAJOR, find_module, local_address, module_call_path, strip_index,
};
pub use model::{
    Action, Change, ChangeAction, ConfigModule, ConfigOutput, ConfigResource, Expression,
    ModuleCall, OutputChange, Plan, PlanVariable, ResourceChange, ResourceMode, join_address,
};
