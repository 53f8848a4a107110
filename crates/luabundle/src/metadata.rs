use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bundle::{BundleIdentifiers, BundleOptions, LuaVersion};

const HEADER_PREFIX: &str = "-- Bundled by luabundle";

static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^--\s*Bundled by luabundle\s+(\{.*\})\s*$").expect("header pattern is valid")
});

fn default_root_module_name() -> String {
    BundleOptions::default().root_module_name
}

/**
    Metadata for a generated bundle, stored as JSON in a comment on its first line.

    Any Lua source carrying this comment is treated as an already bundled
    script, and the `require` calls inside of it are never resolved again.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadata {
    #[serde(default)]
    pub identifiers: BundleIdentifiers,
    #[serde(default)]
    pub lua_version: LuaVersion,
    #[serde(default = "default_root_module_name")]
    pub root_module_name: String,
    pub version: String,
}

impl BundleMetadata {
    /**
        Creates metadata describing a bundle generated with the given options.
    */
    #[must_use]
    pub fn new(options: &BundleOptions) -> Self {
        Self {
            identifiers: options.identifiers.clone(),
            lua_version: options.lua_version,
            root_module_name: options.root_module_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /**
        Tries to read metadata from a single line of a bundle.
    */
    #[must_use]
    pub fn from_header(line: &str) -> Option<Self> {
        let captures = HEADER_PATTERN.captures(line.trim())?;
        serde_json::from_str(captures.get(1)?.as_str()).ok()
    }

    /**
        Writes the metadata to a single comment line, to later be read using `from_header`.

        The returned line does not end with a newline.
    */
    #[must_use]
    pub fn to_header(&self) -> String {
        let json = serde_json::to_string(self).expect("metadata is always serializable");
        format!("{HEADER_PREFIX} {json}")
    }
}

/**
    Reads bundle metadata from the given Lua source, if it has any.

    The metadata comment does not need to be on the very first line,
    blank lines and other comments (and a shebang) may come before it,
    but the search stops at the first line of actual code.
*/
#[must_use]
pub fn read_metadata(lua: &str) -> Option<BundleMetadata> {
    for (index, line) in lua.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || (index == 0 && line.starts_with("#!")) {
            continue;
        }
        if let Some(metadata) = BundleMetadata::from_header(line) {
            return Some(metadata);
        }
        if !line.starts_with("--") {
            break;
        }
    }
    None
}
