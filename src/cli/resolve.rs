//! Resolve and effective command implementations.

use crate::error::{ErrorBody, ResolutionError};
use crate::format::{OutputFormat, render_environment, render_map};
use crate::resolver::EnvironmentSource;
use crate::types::Environment;
use anyhow::Result;
use clap::Args;
use std::process::ExitCode;
use tracing::error;

/// Arguments for the resolve and effective commands.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Application name
    pub name: String,

    /// Comma-delimited profiles, most specific first
    #[arg(default_value = "default")]
    pub profile: String,

    /// Label (version or branch)
    pub label: Option<String>,

    /// Output format: json, yaml, or properties
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

/// What to print for a resolved environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Every property source in priority order.
    Sources,
    /// One merged map where higher priority sources win.
    Effective,
}

/// Resolve the environment named by `args`.
pub fn resolve(
    source: &dyn EnvironmentSource,
    args: &ResolveArgs,
) -> Result<Environment, ResolutionError> {
    source.resolve(&args.name, &args.profile, args.label.as_deref())
}

/// Render a resolved environment for `view`.
pub fn render(env: &Environment, view: View, format: OutputFormat) -> Result<String> {
    match view {
        View::Sources => render_environment(env, format),
        View::Effective => render_map(&env.effective_properties(), format),
    }
}

/// Resolve and print; resolution failures are printed as an error body.
pub fn run_resolve(
    source: &dyn EnvironmentSource,
    args: &ResolveArgs,
    view: View,
) -> Result<ExitCode> {
    match resolve(source, args) {
        Ok(env) => {
            let out = render(&env, view, args.format)?;
            print!("{}", out);
            if !out.ends_with('\n') {
                println!();
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(application = %args.name, error = %err, "Resolution failed");
            let body = ErrorBody::from(&err);
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
