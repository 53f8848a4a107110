use std::{ops::Range, path::PathBuf};

use tracing::{debug, trace};

use crate::{
    ast::{find_requires, quote_string, RequireArgument},
    metadata::read_metadata,
};

use super::{
    module::{Module, ModuleMap, ResolvedModule},
    options::{BundleOptions, ModuleFileSystem, RequiredModules},
    result::{BundleError, BundleResult},
};

/**
    The placeholder in search path patterns that gets replaced with a module name.
*/
pub const PATH_PLACEHOLDER: char = '?';

/**
    Resolves a module name to a file, using the given search path patterns.

    Patterns are tried in order, each `?` in a pattern is replaced with the
    module name, and the first resulting path that is a regular file is used.

    Returns `None` if no pattern matches an existing file.
*/
pub fn resolve_module(
    name: &str,
    paths: &[String],
    file_system: &dyn ModuleFileSystem,
) -> Option<PathBuf> {
    paths
        .iter()
        .map(|pattern| PathBuf::from(pattern.replace(PATH_PLACEHOLDER, name)))
        .find(|candidate| file_system.is_file(candidate))
}

/**
    Processes a module and, recursively, every module it requires.

    Each `require` call with a string literal argument is rewritten to the
    canonical `require("name")` form, and every processed module is stored
    in `modules` using the name it was required with.

    Modules that already exist in `modules` are never processed again.

    # Errors

    - If the module, or any module it requires, fails to parse.
    - If a required module can not be found using the search paths.
    - If a required module can not be read.
*/
pub fn process_module(
    module: Module,
    options: &BundleOptions,
    modules: &mut ModuleMap,
) -> BundleResult<()> {
    let mut content = match &options.preprocess {
        Some(preprocess) => preprocess(&module, options),
        None => module.content.clone(),
    };

    let mut resolved_modules = Vec::new();

    // Bundles may be bundled again, but the requires inside of them refer to
    // modules that were registered in that bundle and must not be resolved
    if read_metadata(&content).is_some() {
        debug!(module = %module.name, "module is already a bundle, skipping its requires");
    } else {
        let ast = full_moon::parse_fallible(&content, options.lua_version.grammar())
            .into_result()
            .map_err(|errors| BundleError::Parse {
                module: module.name.clone(),
                message: errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            })?;

        let mut edits = Vec::new();
        for call in find_requires(&ast) {
            let required = match &call.argument {
                RequireArgument::Literal(name) => Some(RequiredModules::Single(name.clone())),
                RequireArgument::Expression(expression) => options
                    .expression_handler
                    .as_ref()
                    .and_then(|handler| handler(&module, expression)),
                RequireArgument::Missing => None,
            };
            let Some(required) = required else {
                continue;
            };

            for name in required.names() {
                let resolved_path =
                    resolve_module(name, &options.paths, options.file_system.as_ref())
                        .ok_or_else(|| BundleError::UnresolvedModule {
                            name: name.clone(),
                            required_by: module.name.clone(),
                            line: call.line,
                            column: call.column,
                        })?;
                debug!(
                    module = %module.name,
                    required = %name,
                    path = %resolved_path.display(),
                    "resolved module"
                );
                resolved_modules.push(ResolvedModule {
                    name: name.clone(),
                    resolved_path,
                });
            }

            // Dynamic requires may evaluate to something else at runtime,
            // so only calls with a literal module name are rewritten
            if let Some(name) = call.literal() {
                edits.push((call.arguments_range(), format!("({})", quote_string(name))));
            }
        }

        apply_edits(&mut content, edits);
    }

    let name = module.name.clone();
    modules.set(Module { content, ..module });

    for resolved in resolved_modules {
        if modules.has(&resolved.name) {
            trace!(module = %name, required = %resolved.name, "module was already processed");
            continue;
        }

        let dependency_name = resolved.name.clone();
        options
            .file_system
            .read_to_string(resolved.path())
            .map_err(|source| BundleError::Read {
                name: resolved.name.clone(),
                path: resolved.resolved_path.clone(),
                source,
            })
            .and_then(|content| process_module(resolved.into_module(content), options, modules))
            .map_err(|source| BundleError::Dependency {
                name: dependency_name,
                source: Box::new(source),
            })?;
    }

    Ok(())
}

/**
    Applies text replacements to the given content.

    Edits are applied from the end of the content towards the start,
    so that byte ranges of edits not yet applied are never shifted.
*/
fn apply_edits(content: &mut String, mut edits: Vec<(Range<usize>, String)>) {
    edits.sort_by(|(a, _), (b, _)| b.start.cmp(&a.start));
    for (range, replacement) in edits {
        trace!(?range, %replacement, "rewriting require call");
        content.replace_range(range, &replacement);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        io,
        path::Path,
        sync::{Arc, Mutex},
    };

    use super::*;

    /**
        An in-memory file tree that counts how many times each file is read.
    */
    #[derive(Default, Clone)]
    struct MemoryFileSystem {
        files: HashMap<PathBuf, String>,
        unreadable: Vec<PathBuf>,
        reads: Arc<Mutex<HashMap<PathBuf, usize>>>,
    }

    impl MemoryFileSystem {
        fn with(mut self, path: &str, content: &str) -> Self {
            self.files.insert(PathBuf::from(path), content.to_string());
            self
        }

        fn with_unreadable(mut self, path: &str) -> Self {
            self.unreadable.push(PathBuf::from(path));
            self
        }

        fn reads_of(&self, path: &str) -> usize {
            let reads = self.reads.lock().unwrap();
            reads.get(Path::new(path)).copied().unwrap_or_default()
        }
    }

    impl ModuleFileSystem for MemoryFileSystem {
        fn is_file(&self, path: &Path) -> bool {
            self.files.contains_key(path) || self.unreadable.iter().any(|p| p == path)
        }

        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            *self
                .reads
                .lock()
                .unwrap()
                .entry(path.to_path_buf())
                .or_default() += 1;
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::PermissionDenied, "access denied"))
        }
    }

    fn process(
        root: &str,
        file_system: &MemoryFileSystem,
        options: BundleOptions,
    ) -> BundleResult<ModuleMap> {
        let options = options.with_file_system(file_system.clone());
        let mut modules = ModuleMap::new();
        process_module(Module::new("__root", root), &options, &mut modules)?;
        Ok(modules)
    }

    fn content_of<'a>(modules: &'a ModuleMap, name: &str) -> &'a str {
        &modules.get(name).unwrap().content
    }

    #[test]
    fn edits_apply_back_to_front() {
        let mut content = String::from("require 'a'\nrequire 'b'\n");
        let edits = vec![
            (7..11, String::from("(\"a\")")),
            (19..23, String::from("(\"b\")")),
        ];
        apply_edits(&mut content, edits);

        assert_eq!(content, "require(\"a\")\nrequire(\"b\")\n");
    }

    #[test]
    fn resolves_using_first_matching_pattern() {
        let fs = MemoryFileSystem::default()
            .with("lib/a.lua", "")
            .with("a.lua", "");
        let paths = vec!["?".to_string(), "lib/?.lua".to_string(), "?.lua".to_string()];

        assert_eq!(
            resolve_module("a", &paths, &fs),
            Some(PathBuf::from("lib/a.lua"))
        );
        assert_eq!(resolve_module("b", &paths, &fs), None);
    }

    #[test]
    fn replaces_every_placeholder() {
        let fs = MemoryFileSystem::default().with("a/a.lua", "");
        let paths = vec!["?/?.lua".to_string()];

        assert_eq!(resolve_module("a", &paths, &fs), Some(PathBuf::from("a/a.lua")));
    }

    #[test]
    fn module_without_requires() {
        let fs = MemoryFileSystem::default();
        let modules = process("return 1 + 1\n", &fs, BundleOptions::default()).unwrap();

        assert_eq!(modules.len(), 1);
        assert_eq!(content_of(&modules, "__root"), "return 1 + 1\n");
    }

    #[test]
    fn rewrites_requires_to_canonical_form() {
        let fs = MemoryFileSystem::default()
            .with("a.lua", "return 1")
            .with("b.lua", "return 2")
            .with("c.lua", "return 3");
        let root = "local a = require 'a'\nlocal b = require [[b]]\nlocal c = require(\"c\").value\n";
        let modules = process(root, &fs, BundleOptions::default()).unwrap();

        assert_eq!(
            content_of(&modules, "__root"),
            "local a = require(\"a\")\nlocal b = require(\"b\")\nlocal c = require(\"c\").value\n"
        );
        assert_eq!(modules.names().collect::<Vec<_>>(), vec!["__root", "a", "b", "c"]);
        assert_eq!(
            modules.get("a").unwrap().resolved_path.as_deref(),
            Some(Path::new("a.lua"))
        );
    }

    #[test]
    fn shared_dependency_is_read_once() {
        let fs = MemoryFileSystem::default()
            .with("a.lua", "return require('c')")
            .with("b.lua", "return require('c')")
            .with("c.lua", "return {}");
        let root = "require('a')\nrequire('b')\n";
        let modules = process(root, &fs, BundleOptions::default()).unwrap();

        assert_eq!(modules.names().collect::<Vec<_>>(), vec!["__root", "a", "c", "b"]);
        assert_eq!(fs.reads_of("c.lua"), 1);
        assert_eq!(fs.reads_of("a.lua"), 1);
    }

    #[test]
    fn indexed_requires_are_bundled() {
        let fs = MemoryFileSystem::default()
            .with("b.lua", "return require('d').x")
            .with("c.lua", "local y = require \"d\"[1]\nrequire('d').z = y\n")
            .with("d.lua", "return { x = 1 }");
        let root = "local b = require('b')\nlocal c = require('c')\n";
        let modules = process(root, &fs, BundleOptions::default()).unwrap();

        assert_eq!(modules.names().collect::<Vec<_>>(), vec!["__root", "b", "d", "c"]);
        assert_eq!(fs.reads_of("d.lua"), 1);
        assert_eq!(content_of(&modules, "b"), "return require(\"d\").x");
        assert_eq!(
            content_of(&modules, "c"),
            "local y = require(\"d\")[1]\nrequire(\"d\").z = y\n"
        );
    }

    #[test]
    fn unresolved_module_reports_location() {
        let fs = MemoryFileSystem::default();
        let root = "local x = 1\nlocal m = require(\"missing\")\n";
        let err = process(root, &fs, BundleOptions::default()).unwrap_err();

        match err {
            BundleError::UnresolvedModule {
                name,
                required_by,
                line,
                column,
            } => {
                assert_eq!(name, "missing");
                assert_eq!(required_by, "__root");
                assert_eq!(line, 2);
                assert_eq!(column, 11);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nested_errors_keep_dependency_chain() {
        let fs = MemoryFileSystem::default()
            .with("a.lua", "return require('b')")
            .with("b.lua", "return require('missing')");
        let err = process("require('a')", &fs, BundleOptions::default()).unwrap_err();

        assert_eq!(err.dependency_chain(), vec!["a", "b"]);
        assert!(matches!(
            err.root_cause(),
            BundleError::UnresolvedModule { required_by, .. } if required_by == "b"
        ));
    }

    #[test]
    fn unreadable_module_is_a_read_error() {
        let fs = MemoryFileSystem::default().with_unreadable("a.lua");
        let err = process("require('a')", &fs, BundleOptions::default()).unwrap_err();

        assert_eq!(err.dependency_chain(), vec!["a"]);
        assert!(matches!(
            err.root_cause(),
            BundleError::Read { name, path, .. } if name == "a" && path == Path::new("a.lua")
        ));
    }

    #[test]
    fn parse_failure_names_module() {
        let fs = MemoryFileSystem::default().with("a.lua", "local = ");
        let err = process("require('a')", &fs, BundleOptions::default()).unwrap_err();

        assert!(matches!(
            err.root_cause(),
            BundleError::Parse { module, message } if module == "a" && !message.is_empty()
        ));
    }

    #[test]
    fn nested_bundles_are_not_resolved() {
        let nested = "-- Bundled by luabundle {\"version\":\"1.0.0\"}\nreturn require 'inner'\n";
        let fs = MemoryFileSystem::default().with("a.lua", nested);
        let modules = process("return require('a')", &fs, BundleOptions::default()).unwrap();

        assert_eq!(modules.len(), 2);
        assert_eq!(content_of(&modules, "a"), nested);
    }

    #[test]
    fn circular_requires_terminate() {
        let fs = MemoryFileSystem::default()
            .with("a.lua", "return require('b')")
            .with("b.lua", "return require('a')");
        let modules = process("return require('a')", &fs, BundleOptions::default()).unwrap();

        assert_eq!(modules.names().collect::<Vec<_>>(), vec!["__root", "a", "b"]);
        assert_eq!(fs.reads_of("a.lua"), 1);
        assert_eq!(fs.reads_of("b.lua"), 1);
    }

    #[test]
    fn expression_handler_requires_many_without_rewriting() {
        let fs = MemoryFileSystem::default()
            .with("a.lua", "return 1")
            .with("b.lua", "return 2");
        let options = BundleOptions::default().with_expression_handler(|module, _| {
            assert_eq!(module.name, "__root");
            Some(RequiredModules::from(vec!["a".to_string(), "b".to_string()]))
        });
        let root = "local m = require(prefix .. \"x\")\n";
        let modules = process(root, &fs, options).unwrap();

        assert_eq!(modules.names().collect::<Vec<_>>(), vec!["__root", "a", "b"]);
        assert_eq!(content_of(&modules, "__root"), root);
    }

    #[test]
    fn expression_handler_single_name_is_not_rewritten() {
        let fs = MemoryFileSystem::default().with("a.lua", "return 1");
        let options = BundleOptions::default().with_expression_handler(|_, _| Some("a".into()));
        let root = "local m = require(name)\n";
        let modules = process(root, &fs, options).unwrap();

        assert!(modules.has("a"));
        assert_eq!(content_of(&modules, "__root"), root);
    }

    #[test]
    fn dynamic_requires_without_handler_are_ignored() {
        let fs = MemoryFileSystem::default();
        let root = "local m = require(name)\nlocal n = require()\n";
        let modules = process(root, &fs, BundleOptions::default()).unwrap();

        assert_eq!(modules.len(), 1);
        assert_eq!(content_of(&modules, "__root"), root);
    }

    #[test]
    fn preprocess_runs_before_parsing() {
        let fs = MemoryFileSystem::default().with("a.lua", "return IMPORT 'b'").with("b.lua", "");
        let options = BundleOptions::default()
            .with_preprocess(|module, _| module.content.replace("IMPORT", "require"));
        let modules = process("return IMPORT 'a'", &fs, options).unwrap();

        assert_eq!(content_of(&modules, "__root"), "return require(\"a\")");
        assert_eq!(content_of(&modules, "a"), "return require(\"b\")");
    }

    #[test]
    fn rewritten_names_are_quoted() {
        let fs = MemoryFileSystem::default().with("we\"ird.lua", "");
        let modules = process("require 'we\\\"ird'", &fs, BundleOptions::default()).unwrap();

        assert_eq!(content_of(&modules, "__root"), "require(\"we\\\"ird\")");
    }
}
