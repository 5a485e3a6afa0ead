use std::path::PathBuf;

use crate::error::RunfigError;
use crate::file::{FsLoader, MappingLoader};
use crate::namespace::Namespace;
use crate::resolve::{self, ResolveInput, Resolved};
use crate::run::{self, RunContext};
use crate::schema::Schema;
use crate::surface::{self, Surface};
use crate::types::UnconsumedPolicy;
use crate::value::Config;

/// Job directory root used by [`RunfigBuilder::change_job_dir`].
pub const DEFAULT_JOB_ROOT: &str = "outputs";

/// Entry point for building a runfig configuration.
pub struct Runfig;

impl Runfig {
    pub fn builder(schema: Schema) -> RunfigBuilder {
        RunfigBuilder::new(schema)
    }
}

/// Builder for parsing, resolving and running with a schema-driven config.
///
/// Controls three things:
///
/// - **Surface**: [`app_name()`](Self::app_name), [`about()`](Self::about)
///   shape the generated command.
/// - **Resolution**: [`strict()`](Self::strict),
///   [`unconsumed()`](Self::unconsumed), [`loader()`](Self::loader) decide how
///   files and leftover arguments are treated.
/// - **Run**: [`job_dir()`](Self::job_dir) makes [`run()`](Self::run) execute
///   inside a fresh per-run directory.
pub struct RunfigBuilder {
    schema: Schema,
    app_name: Option<String>,
    about: Option<String>,
    strict: bool,
    unconsumed: UnconsumedPolicy,
    loader: Box<dyn MappingLoader>,
    job_root: Option<PathBuf>,
}

impl RunfigBuilder {
    fn new(schema: Schema) -> Self {
        Self {
            schema,
            app_name: None,
            about: None,
            strict: true,
            unconsumed: UnconsumedPolicy::default(),
            loader: Box::new(FsLoader),
            job_root: None,
        }
    }

    /// Program name shown in usage and help (default: the schema name,
    /// lowercased).
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    pub fn about(mut self, about: &str) -> Self {
        self.about = Some(about.to_string());
        self
    }

    /// Enable or disable strict mode (default: `true`).
    /// In strict mode, unknown keys in nested-config files produce errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// What to do with arguments no switch claims (default: warn).
    pub fn unconsumed(mut self, policy: UnconsumedPolicy) -> Self {
        self.unconsumed = policy;
        self
    }

    /// Replace the filesystem loader used for nested-config files.
    pub fn loader(mut self, loader: impl MappingLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Run inside `<cwd>/<root>/<run id>`.
    pub fn job_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.job_root = Some(root.into());
        self
    }

    /// Run inside `<cwd>/outputs/<run id>`.
    pub fn change_job_dir(self) -> Self {
        self.job_dir(DEFAULT_JOB_ROOT)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[cfg(feature = "clap")]
    fn effective_app_name(&self) -> String {
        self.app_name
            .clone()
            .unwrap_or_else(|| self.schema.name().to_lowercase())
    }

    pub fn surface(&self) -> Result<Surface, RunfigError> {
        surface::build_surface(&self.schema)
    }

    /// Resolve an already-parsed namespace. No CLI parser involved.
    pub fn resolve_namespace(&self, namespace: Namespace) -> Result<Resolved, RunfigError> {
        let input = ResolveInput {
            namespace,
            strict: self.strict,
        };
        resolve::resolve(&self.schema, input, self.loader.as_ref())
    }

    /// Run `f` with an already-resolved config.
    ///
    /// Captures a [`RunContext`]. With a job directory configured, changes
    /// into it and writes the `run.yaml` snapshot first; the previous working
    /// directory is restored when this returns or unwinds.
    pub fn run_with<F, R>(&self, config: Config, f: F) -> Result<R, RunfigError>
    where
        F: FnOnce(&Config, &RunContext) -> R,
    {
        let mut ctx = RunContext::capture()?;
        let _guard = match &self.job_root {
            Some(root) => {
                let guard = run::enter_job_dir(&mut ctx, root)?;
                if let Some(dir) = ctx.job_dir() {
                    run::write_snapshot(dir, &config)?;
                }
                Some(guard)
            }
            None => None,
        };
        Ok(f(&config, &ctx))
    }
}

#[cfg(feature = "clap")]
impl RunfigBuilder {
    /// The `clap::Command` the surface renders to. Useful for help output
    /// and shell completions.
    pub fn command(&self) -> Result<clap::Command, RunfigError> {
        let surface = self.surface()?;
        Ok(crate::cli::command(
            &self.effective_app_name(),
            self.about.as_deref(),
            &surface,
        ))
    }

    /// Parse `args` (binary name first) and resolve. Unconsumed arguments are
    /// returned, not judged.
    pub fn parse_from<I, T>(&self, args: I) -> Result<Resolved, RunfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let surface = self.surface()?;
        let namespace = crate::cli::parse_from(
            &self.effective_app_name(),
            self.about.as_deref(),
            &surface,
            args,
        )?;
        self.resolve_namespace(namespace)
    }

    /// Parse, resolve, and apply the unconsumed-argument policy.
    pub fn load_from<I, T>(&self, args: I) -> Result<Config, RunfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let Resolved { config, unconsumed } = self.parse_from(args)?;
        self.unconsumed.apply(&unconsumed)?;
        Ok(config)
    }

    /// [`load_from`](Self::load_from) on the process arguments.
    pub fn load(&self) -> Result<Config, RunfigError> {
        self.load_from(std::env::args())
    }

    /// Load from `args`, then [`run_with`](Self::run_with).
    pub fn run_from<I, T, F, R>(&self, args: I, f: F) -> Result<R, RunfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        F: FnOnce(&Config, &RunContext) -> R,
    {
        let config = self.load_from(args)?;
        self.run_with(config, f)
    }

    /// [`run_from`](Self::run_from) on the process arguments.
    pub fn run<F, R>(&self, f: F) -> Result<R, RunfigError>
    where
        F: FnOnce(&Config, &RunContext) -> R,
    {
        self.run_from(std::env::args(), f)
    }
}
