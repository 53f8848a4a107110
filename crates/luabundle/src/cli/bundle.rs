use std::{io::Write as _, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tokio::{fs, task};
use tracing::debug;

use luabundle::{bundle_string, BundleOptions, LuaVersion};
use luabundle_utils::{
    fmt::Label,
    path::{bundled_file_path, display_path},
};

use super::config::BundleConfig;

const STDOUT_PATH: &str = "-";

/// Bundle a Lua script and all of the modules it requires into a single file
#[derive(Debug, Clone, Default, Parser)]
pub struct BundleCommand {
    /// The path to the root script
    pub input: PathBuf,

    /// The path to the output file - defaults to the input file
    /// path with a `.bundle` extension, use `-` to write to stdout
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// A search path pattern for required modules, where `?` is
    /// replaced with the module name - may be given more than once
    #[clap(short = 'p', long = "path")]
    pub paths: Vec<String>,

    /// The Lua version used to parse modules
    #[clap(short, long)]
    pub lua_version: Option<LuaVersion>,

    /// The module name used for the root script
    #[clap(short, long)]
    pub root_module_name: Option<String>,

    /// Never fall back to the host `require` for unknown modules
    #[clap(short, long)]
    pub isolate: bool,

    /// Generate a bundle even if the script requires no modules
    #[clap(short, long)]
    pub force: bool,

    /// Do not write a metadata comment at the top of the bundle
    #[clap(long)]
    pub no_metadata: bool,

    /// The path to a JSON config file with bundle options
    #[clap(short, long)]
    pub config: Option<PathBuf>,
}

impl BundleCommand {
    pub async fn run(self) -> Result<ExitCode> {
        let options = self.options().await?;
        let to_stdout = self
            .output
            .as_ref()
            .is_some_and(|output| output.as_os_str() == STDOUT_PATH);

        let source = fs::read_to_string(&self.input)
            .await
            .with_context(|| format!("failed to read input file '{}'", self.input.display()))?;

        if !to_stdout {
            let input = display_path(&self.input);
            println!("{} {}", Label::Bundle, style(input.display()).underlined());
        }

        // NOTE: Bundling reads every required module from disk using blocking
        // calls, so it must not run on one of the async runtime threads
        debug!(?options, "bundling input file");
        let force = options.force();
        let (source, bundled) = task::spawn_blocking(move || {
            bundle_string(&source, &options).map(|bundled| (source, bundled))
        })
        .await
        .context("bundler panicked")?
        .with_context(|| format!("failed to bundle '{}'", self.input.display()))?;

        if !force && !to_stdout && bundled == source {
            println!(
                "{} script does not require any modules, writing it unchanged (use --force to bundle it anyway)",
                Label::Warn
            );
        }

        if to_stdout {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bundled.as_bytes())?;
            stdout.flush()?;
            return Ok(ExitCode::SUCCESS);
        }

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| bundled_file_path(&self.input));
        let displayed = display_path(&output);
        println!("{} {}", Label::Write, style(displayed.display()).underlined());
        fs::write(&output, bundled)
            .await
            .with_context(|| format!("failed to write output file '{}'", output.display()))?;

        Ok(ExitCode::SUCCESS)
    }

    /**
        Creates bundle options from the config file, if one was given,
        with any options given as command line flags taking priority.
    */
    async fn options(&self) -> Result<BundleOptions> {
        let mut options = match &self.config {
            Some(path) => BundleConfig::read(path).await?.apply(BundleOptions::default()),
            None => BundleOptions::default(),
        };

        if !self.paths.is_empty() {
            options = options.with_paths(self.paths.iter().cloned());
        }
        if let Some(lua_version) = self.lua_version {
            options = options.with_lua_version(lua_version);
        }
        if let Some(name) = &self.root_module_name {
            options = options.with_root_module_name(name.clone());
        }
        if self.isolate {
            options = options.with_isolate(true);
        }
        if self.force {
            options = options.with_force(true);
        }
        if self.no_metadata {
            options = options.with_metadata(false);
        }

        Ok(options)
    }
}
