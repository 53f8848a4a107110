use std::{fmt, fs, io, path::Path, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::ast::Expression;

use super::module::Module;

const DEFAULT_ROOT_MODULE_NAME: &str = "__root";

/**
    Transforms the raw contents of a module before it gets parsed.
*/
pub type Preprocessor = Arc<dyn Fn(&Module, &BundleOptions) -> String + Send + Sync>;

/**
    Resolves the argument of a `require` call that is not a string literal.

    Returning `None` leaves the call as-is, without bundling any module for it.
*/
pub type ExpressionHandler =
    Arc<dyn Fn(&Module, &Expression) -> Option<RequiredModules> + Send + Sync>;

/**
    One or more module names required by a single `require` call.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredModules {
    Single(String),
    Multiple(Vec<String>),
}

impl RequiredModules {
    /**
        Returns all of the required module names, in order.
    */
    #[must_use]
    pub fn names(&self) -> &[String] {
        match self {
            Self::Single(name) => std::slice::from_ref(name),
            Self::Multiple(names) => names,
        }
    }
}

impl From<String> for RequiredModules {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<&str> for RequiredModules {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for RequiredModules {
    fn from(value: Vec<String>) -> Self {
        Self::Multiple(value)
    }
}

/**
    Filesystem access used while bundling.

    This is the only way that the bundler touches the filesystem,
    so it may be replaced to bundle from an in-memory file tree.
*/
pub trait ModuleFileSystem: Send + Sync {
    /**
        Returns `true` if a regular file exists at the given path.

        Directories, symlinks and other special files are not regular files.
    */
    fn is_file(&self, path: &Path) -> bool;

    /**
        Reads the file at the given path as UTF-8 text.

        # Errors

        If the file does not exist, can not be read, or is not valid UTF-8.
    */
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/**
    A [`ModuleFileSystem`] backed by the real filesystem.
*/
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl ModuleFileSystem for StdFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        // NOTE: We use symlink_metadata on purpose, a symlink is
        // never treated as a module file even if it points at one
        fs::symlink_metadata(path).is_ok_and(|meta| meta.is_file())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/**
    The Lua grammar used to parse modules.
*/
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rustfmt::skip]
pub enum LuaVersion {
    #[serde(rename = "5.1")]    Lua51,
    #[serde(rename = "5.2")]    Lua52,
    #[default]
    #[serde(rename = "5.3")]    Lua53,
    #[serde(rename = "5.4")]    Lua54,
    #[serde(rename = "LuaJIT")] LuaJit,
    #[serde(rename = "Luau")]   Luau,
}

impl LuaVersion {
    /**
        All available Lua versions.
    */
    pub const ALL: &'static [Self] = &[
        Self::Lua51,
        Self::Lua52,
        Self::Lua53,
        Self::Lua54,
        Self::LuaJit,
        Self::Luau,
    ];

    /**
        Gets the name of the version, such as `5.3` or `LuaJIT`.
    */
    #[must_use]
    #[rustfmt::skip]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lua51  => "5.1",
            Self::Lua52  => "5.2",
            Self::Lua53  => "5.3",
            Self::Lua54  => "5.4",
            Self::LuaJit => "LuaJIT",
            Self::Luau   => "Luau",
        }
    }

    /**
        Gets the parser configuration for this version.

        LuaJIT is parsed using the Lua 5.2 grammar, which
        is a superset of the syntax that LuaJIT accepts.
    */
    #[must_use]
    #[rustfmt::skip]
    pub fn grammar(&self) -> full_moon::LuaVersion {
        match self {
            Self::Lua51  => full_moon::LuaVersion::lua51(),
            Self::Lua52  => full_moon::LuaVersion::lua52(),
            Self::Lua53  => full_moon::LuaVersion::lua53(),
            Self::Lua54  => full_moon::LuaVersion::lua54(),
            Self::LuaJit => full_moon::LuaVersion::lua52(),
            Self::Luau   => full_moon::LuaVersion::luau(),
        }
    }
}

impl fmt::Display for LuaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LuaVersion {
    type Err = String;
    #[rustfmt::skip]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let low = s.trim().to_ascii_lowercase();
        Ok(match low.as_str() {
            "5.1"           => Self::Lua51,
            "5.2"           => Self::Lua52,
            "5.3"           => Self::Lua53,
            "5.4"           => Self::Lua54,
            "luajit" | "jit" => Self::LuaJit,
            "luau"          => Self::Luau,
            _ => {
                return Err(format!(
                    "Unknown Lua version '{s}'\nValid versions are: {}",
                    Self::ALL
                        .iter()
                        .map(Self::name)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            }
        })
    }
}

/**
    Names of the local variables declared by the loader in a generated bundle.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleIdentifiers {
    pub register: String,
    pub require: String,
    pub loaded: String,
    pub modules: String,
}

impl Default for BundleIdentifiers {
    fn default() -> Self {
        Self {
            register: "__bundle_register".to_string(),
            require: "__bundle_require".to_string(),
            loaded: "__bundle_loaded".to_string(),
            modules: "__bundle_modules".to_string(),
        }
    }
}

/**
    Options for bundling Lua modules.

    # Example usage

    ```rs
    let options = BundleOptions::new()
        .with_paths(["src/?.lua", "src/?/init.lua"])
        .with_lua_version(LuaVersion::Lua54)
        .with_isolate(true);
    ```
*/
#[derive(Clone)]
pub struct BundleOptions {
    pub(crate) paths: Vec<String>,
    pub(crate) lua_version: LuaVersion,
    pub(crate) root_module_name: String,
    pub(crate) identifiers: BundleIdentifiers,
    pub(crate) isolate: bool,
    pub(crate) metadata: bool,
    pub(crate) force: bool,
    pub(crate) preprocess: Option<Preprocessor>,
    pub(crate) expression_handler: Option<ExpressionHandler>,
    pub(crate) file_system: Arc<dyn ModuleFileSystem>,
}

impl BundleOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Sets the search path patterns used to find required modules.

        Each `?` in a pattern is replaced with the required module name.
    */
    #[must_use]
    pub fn with_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_lua_version(mut self, lua_version: LuaVersion) -> Self {
        self.lua_version = lua_version;
        self
    }

    #[must_use]
    pub fn with_root_module_name(mut self, name: impl Into<String>) -> Self {
        self.root_module_name = name.into();
        self
    }

    #[must_use]
    pub fn with_identifiers(mut self, identifiers: BundleIdentifiers) -> Self {
        self.identifiers = identifiers;
        self
    }

    /**
        Sets whether the generated bundle may fall back to the
        `require` of its host environment for unknown modules.
    */
    #[must_use]
    pub fn with_isolate(mut self, isolate: bool) -> Self {
        self.isolate = isolate;
        self
    }

    /**
        Sets whether a generated bundle starts with a metadata comment.
    */
    #[must_use]
    pub fn with_metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }

    /**
        Sets whether a bundle is generated even if the
        root module does not require any other modules.
    */
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn with_preprocess<F>(mut self, preprocess: F) -> Self
    where
        F: Fn(&Module, &BundleOptions) -> String + Send + Sync + 'static,
    {
        self.preprocess = Some(Arc::new(preprocess));
        self
    }

    #[must_use]
    pub fn with_expression_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Module, &Expression) -> Option<RequiredModules> + Send + Sync + 'static,
    {
        self.expression_handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn with_file_system(mut self, file_system: impl ModuleFileSystem + 'static) -> Self {
        self.file_system = Arc::new(file_system);
        self
    }

    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    #[must_use]
    pub fn lua_version(&self) -> LuaVersion {
        self.lua_version
    }

    #[must_use]
    pub fn root_module_name(&self) -> &str {
        &self.root_module_name
    }

    #[must_use]
    pub fn identifiers(&self) -> &BundleIdentifiers {
        &self.identifiers
    }

    #[must_use]
    pub fn isolate(&self) -> bool {
        self.isolate
    }

    #[must_use]
    pub fn metadata(&self) -> bool {
        self.metadata
    }

    #[must_use]
    pub fn force(&self) -> bool {
        self.force
    }

    #[must_use]
    pub fn file_system(&self) -> &dyn ModuleFileSystem {
        self.file_system.as_ref()
    }
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            paths: vec!["?".to_string(), "?.lua".to_string()],
            lua_version: LuaVersion::default(),
            root_module_name: DEFAULT_ROOT_MODULE_NAME.to_string(),
            identifiers: BundleIdentifiers::default(),
            isolate: false,
            metadata: true,
            force: false,
            preprocess: None,
            expression_handler: None,
            file_system: Arc::new(StdFileSystem),
        }
    }
}

impl fmt::Debug for BundleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleOptions")
            .field("paths", &self.paths)
            .field("lua_version", &self.lua_version)
            .field("root_module_name", &self.root_module_name)
            .field("identifiers", &self.identifiers)
            .field("isolate", &self.isolate)
            .field("metadata", &self.metadata)
            .field("force", &self.force)
            .field("preprocess", &self.preprocess.is_some())
            .field("expression_handler", &self.expression_handler.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lua_version_from_str() {
        assert_eq!("5.1".parse(), Ok(LuaVersion::Lua51));
        assert_eq!(" 5.4 ".parse(), Ok(LuaVersion::Lua54));
        assert_eq!("LuaJIT".parse(), Ok(LuaVersion::LuaJit));
        assert_eq!("luau".parse(), Ok(LuaVersion::Luau));
        assert!("6.0".parse::<LuaVersion>().unwrap_err().contains("5.1, 5.2"));
    }

    #[test]
    fn lua_version_roundtrips_through_name() {
        for version in LuaVersion::ALL {
            assert_eq!(version.to_string().parse::<LuaVersion>(), Ok(*version));
        }
    }

    #[test]
    fn lua_version_serde_uses_names() {
        let json = serde_json::to_string(&LuaVersion::LuaJit).unwrap();
        assert_eq!(json, "\"LuaJIT\"");
        let version: LuaVersion = serde_json::from_str("\"5.2\"").unwrap();
        assert_eq!(version, LuaVersion::Lua52);
    }

    #[test]
    fn required_modules_names() {
        assert_eq!(RequiredModules::from("a").names(), &["a".to_string()]);
        let many = RequiredModules::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(many.names().len(), 2);
    }

    #[test]
    fn defaults() {
        let options = BundleOptions::default();
        assert_eq!(options.paths(), &["?", "?.lua"]);
        assert_eq!(options.lua_version(), LuaVersion::Lua53);
        assert_eq!(options.root_module_name(), "__root");
        assert!(options.metadata());
        assert!(!options.isolate());
        assert!(!options.force());
    }
}
