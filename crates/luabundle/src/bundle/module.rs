use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/**
    A single Lua module, identified by the name it is required with.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub content: String,
    /// Path that the module was read from, if it was read from a file.
    pub resolved_path: Option<PathBuf>,
}

impl Module {
    /**
        Creates a new module that was not read from any file,
        such as the root module given directly as a string.
    */
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            resolved_path: None,
        }
    }

    /**
        Sets the path that the module was read from.
    */
    #[must_use]
    pub fn with_resolved_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolved_path = Some(path.into());
        self
    }
}

/**
    A module name that has been resolved to an existing file,
    but whose contents have not yet been read or processed.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub name: String,
    pub resolved_path: PathBuf,
}

impl ResolvedModule {
    /**
        Creates a module with the given contents read from the resolved path.
    */
    pub fn into_module(self, content: impl Into<String>) -> Module {
        Module::new(self.name, content).with_resolved_path(self.resolved_path)
    }

    pub fn path(&self) -> &Path {
        &self.resolved_path
    }
}

/**
    All processed modules, keyed by module name.

    Modules are never removed or replaced once inserted, and iteration
    happens in insertion order, which is also the order in which the
    modules end up in a generated bundle.
*/
#[derive(Debug, Clone, Default)]
pub struct ModuleMap {
    modules: IndexMap<String, Module>,
}

impl ModuleMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /**
        Checks if a module with the given name has been processed.
    */
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /**
        Inserts a processed module, unless a module with
        the same name already exists in the map.

        Returns `true` if the module was inserted.
    */
    pub fn set(&mut self, module: Module) -> bool {
        if self.has(&module.name) {
            return false;
        }
        self.modules.insert(module.name.clone(), module);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }
}

impl<'a> IntoIterator for &'a ModuleMap {
    type Item = &'a Module;
    type IntoIter = indexmap::map::Values<'a, String, Module>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.values()
    }
}
