use std::{io, path::PathBuf};

use thiserror::Error;

/**
    Errors that may occur when bundling a tree of Lua modules.

    Every error is fatal, bundling stops at the first one and
    no partial output is ever produced.
*/
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("could not resolve module '{name}' required by '{required_by}' at {line}:{column}")]
    UnresolvedModule {
        name: String,
        required_by: String,
        line: usize,
        column: usize,
    },
    #[error("failed to parse module '{module}'\n{message}")]
    Parse { module: String, message: String },
    #[error("failed to read module '{name}' at '{}'", .path.display())]
    Read {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to bundle resolved module '{name}'")]
    Dependency {
        name: String,
        #[source]
        source: Box<BundleError>,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl BundleError {
    /**
        Returns the innermost error, following any chain of
        dependency errors down to the error that caused them.
    */
    #[must_use]
    pub fn root_cause(&self) -> &BundleError {
        match self {
            Self::Dependency { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /**
        Returns the names of the dependencies that were being bundled
        when this error occurred, outermost dependency first.
    */
    #[must_use]
    pub fn dependency_chain(&self) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self;
        while let Self::Dependency { name, source } = current {
            chain.push(name.as_str());
            current = source.as_ref();
        }
        chain
    }
}

pub type BundleResult<T, E = BundleError> = std::result::Result<T, E>;
