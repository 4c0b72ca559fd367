//! Runtime module resolution and runtime image assembly.
//!
//! Resolution starts from the requested module names, adds what the main
//! archive implies, expands the [`ALL_MODULE_PATH`] and [`ALL_RUNTIME`]
//! macros and finally drops every name the module path cannot provide.

mod assembler;
mod classify;
mod redistributable;
mod resolver;
mod scanner;

pub use assembler::{JlinkAssembler, RuntimeImageAssembler, RuntimeImageRequest};
pub use classify::{
    MODULE_CLASSIFIER, Module, ModuleClassifier, ModuleKind, classify_path, module_name,
};
pub use redistributable::{
    ALL_MODULE_PATH, ALL_RUNTIME, parse_module_list, redistributable_modules,
};
pub use resolver::{ModulePlan, ModuleResolver, ModuleSelection, plan_from_store, resolve_modules};
pub use scanner::scan_module_path;
