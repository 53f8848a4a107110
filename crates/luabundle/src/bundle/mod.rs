use std::path::Path;

use tracing::debug;

mod generate;
mod module;
mod options;
mod process;
mod result;

pub use self::generate::generate_bundle;
pub use self::module::{Module, ModuleMap, ResolvedModule};
pub use self::options::{
    BundleIdentifiers, BundleOptions, ExpressionHandler, LuaVersion, ModuleFileSystem,
    Preprocessor, RequiredModules, StdFileSystem,
};
pub use self::process::{process_module, resolve_module, PATH_PLACEHOLDER};
pub use self::result::{BundleError, BundleResult};

/**
    Bundles the given Lua source, and every module it requires, into a single script.

    The source is bundled as the root module, using the root module name from the options.

    If the source does not require any other modules, it is returned
    unchanged, unless forced bundling has been enabled in the options.

    # Errors

    - If the source, or any module it requires, fails to parse.
    - If a required module can not be resolved or read.
*/
pub fn bundle_string(lua: &str, options: &BundleOptions) -> BundleResult<String> {
    let root = Module::new(options.root_module_name.clone(), lua);

    let mut modules = ModuleMap::new();
    process_module(root, options, &mut modules)?;
    debug!(count = modules.len(), "processed all modules");

    if modules.len() == 1 && !options.force {
        debug!("root module has no dependencies, skipping bundle generation");
        return Ok(lua.to_string());
    }

    Ok(generate_bundle(&modules, options))
}

/**
    Bundles the Lua file at the given path, and every module it requires, into a single script.

    Required modules are resolved using the search paths in the options,
    and not relative to the given file.

    # Errors

    - If the file can not be read.
    - Any error that [`bundle_string`] may return.
*/
pub fn bundle(path: impl AsRef<Path>, options: &BundleOptions) -> BundleResult<String> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading entry file");

    let lua = options.file_system.read_to_string(path)?;
    bundle_string(&lua, options)
}
