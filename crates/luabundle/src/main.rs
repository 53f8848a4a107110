#![allow(clippy::cargo_common_metadata)]

use std::{error::Error, process::ExitCode};

use luabundle_utils::fmt::{ErrorComponents, Label};

pub(crate) mod cli;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    match cli::Cli::new().run().await {
        Ok(code) => code,
        Err(err) => {
            let err: &(dyn Error + 'static) = err.as_ref();
            eprint!("{}\n{}", Label::Error, ErrorComponents::from(err));
            ExitCode::FAILURE
        }
    }
}
