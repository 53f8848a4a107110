use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use luabundle::{BundleIdentifiers, BundleOptions, LuaVersion};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}'", .0.display())]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config file '{}'", .0.display())]
    Parse(PathBuf, #[source] serde_json::Error),
}

/**
    Bundle options loaded from a JSON config file.

    Every field is optional, and fields that are not
    present keep their default value when applied.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BundleConfig {
    pub paths: Option<Vec<String>>,
    pub lua_version: Option<LuaVersion>,
    pub root_module_name: Option<String>,
    pub isolate: Option<bool>,
    pub force: Option<bool>,
    pub metadata: Option<bool>,
    pub identifiers: Option<BundleIdentifiers>,
}

impl BundleConfig {
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read(path)
            .await
            .map_err(|err| ConfigError::Read(path.to_path_buf(), err))?;
        Self::from_slice(path, &contents)
    }

    fn from_slice(path: &Path, contents: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(contents).map_err(|err| ConfigError::Parse(path.to_path_buf(), err))
    }

    /**
        Applies all of the values present in this config to the given options.
    */
    pub fn apply(self, mut options: BundleOptions) -> BundleOptions {
        if let Some(paths) = self.paths {
            options = options.with_paths(paths);
        }
        if let Some(lua_version) = self.lua_version {
            options = options.with_lua_version(lua_version);
        }
        if let Some(name) = self.root_module_name {
            options = options.with_root_module_name(name);
        }
        if let Some(isolate) = self.isolate {
            options = options.with_isolate(isolate);
        }
        if let Some(force) = self.force {
            options = options.with_force(force);
        }
        if let Some(metadata) = self.metadata {
            options = options.with_metadata(metadata);
        }
        if let Some(identifiers) = self.identifiers {
            options = options.with_identifiers(identifiers);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<BundleConfig, ConfigError> {
        BundleConfig::from_slice(Path::new("luabundle.json"), json.as_bytes())
    }

    #[test]
    fn empty_config_keeps_defaults() {
        let options = parse("{}").unwrap().apply(BundleOptions::default());

        assert_eq!(options.paths(), BundleOptions::default().paths());
        assert_eq!(options.root_module_name(), "__root");
        assert!(options.metadata());
    }

    #[test]
    fn applies_camel_case_keys() {
        let config = parse(
            r#"{
                "paths": ["src/?.lua"],
                "luaVersion": "LuaJIT",
                "rootModuleName": "main",
                "isolate": true,
                "metadata": false,
                "identifiers": { "register": "reg" }
            }"#,
        )
        .unwrap();
        let options = config.apply(BundleOptions::default());

        assert_eq!(options.paths(), &["src/?.lua"]);
        assert_eq!(options.lua_version(), LuaVersion::LuaJit);
        assert_eq!(options.root_module_name(), "main");
        assert!(options.isolate());
        assert!(!options.metadata());
        assert!(!options.force());
        assert_eq!(options.identifiers().register, "reg");
        assert_eq!(options.identifiers().require, "__bundle_require");
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = parse(r#"{ "luaVerison": "5.1" }"#).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(..)));
    }

    #[tokio::test]
    async fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("luabundle.json");
        std::fs::write(&path, r#"{ "force": true }"#).unwrap();

        let config = BundleConfig::read(&path).await.unwrap();
        assert_eq!(config.force, Some(true));

        let missing = BundleConfig::read(dir.path().join("missing.json")).await;
        assert!(matches!(missing, Err(ConfigError::Read(..))));
    }
}
