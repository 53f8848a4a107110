#![allow(clippy::cargo_common_metadata)]

pub mod ast;
mod bundle;
mod metadata;

pub use crate::bundle::{
    bundle, bundle_string, generate_bundle, process_module, resolve_module, BundleError,
    BundleIdentifiers, BundleOptions, BundleResult, ExpressionHandler, LuaVersion, Module,
    ModuleFileSystem, ModuleMap, Preprocessor, RequiredModules, ResolvedModule, StdFileSystem,
    PATH_PLACEHOLDER,
};
pub use crate::metadata::{read_metadata, BundleMetadata};
