//! Declarative run configuration for command-line programs. Describe a
//! schema once, get a command line, nested config files and a validated
//! config out of it.
//!
//! Runfig turns a statically declared, optionally nested configuration
//! schema into a command-line surface, merges defaults, nested-config files
//! and explicit command-line values with a per-field precedence law, and
//! hands you a validated [`Config`].
//!
//! ```ignore
//! let model = Schema::builder("Model")
//!     .field(Field::int("depth").with_default(18))
//!     .build()?;
//! let schema = Schema::builder("Train")
//!     .field(Field::float("lr").bounded(Some(0.0), Some(1.0)).with_default(0.1))
//!     .field(Field::bool("amp", false))
//!     .field(Field::nested("model", model))
//!     .build()?;
//!
//! let config = Runfig::builder(schema).app_name("train").load()?;
//! ```
//!
//! That single call registers `--lr`, `--amp`, `--model <FILE>` and
//! `--model.depth`, parses the process arguments, loads the model file if one
//! was given, applies overrides on top, checks the bounds, and returns the
//! result.
//!
//! # Why runfig
//!
//! Experiment-style programs grow dozens of knobs. Wiring each one by hand
//! (an argument, a default, a config-file key, a range check) is repetitive,
//! and the three places drift apart. Runfig derives all of them from one
//! [`Schema`]: add a field and it shows up as a switch, is accepted in nested
//! files, is validated, and appears in the snapshot written for the run.
//!
//! # Design: schema as source of truth
//!
//! A [`Schema`] is an ordered list of fields built with [`Field`]
//! declarations:
//!
//! - **Defaults** come from [`with_default()`](Field::with_default),
//!   [`choices()`](Field::choices) (first choice) or
//!   [`sequence()`](Field::sequence).
//! - **Constraints** are [`bounded()`](Field::bounded) numeric ranges,
//!   choice sets, enumerations and fixed-size sequences. They run on every
//!   value, whatever its source.
//! - **Required fields** have no default. [`required()`](Field::required)
//!   makes that explicit; a field that is neither defaulted nor optional is
//!   required too.
//! - **Nesting** is one level deep: a root schema may hold nested schemas,
//!   those may not nest further.
//!
//! Schemas are checked when built. A default outside its own bounds, a
//! boolean without a default, or a nested schema inside a nested schema is a
//! [`RunfigError`] of class [`ErrorClass::Schema`] before any argument is
//! parsed.
//!
//! # Core library, no CLI framework required
//!
//! The core has **no dependency on any CLI framework**. The
//! [`surface`] module describes the switches a schema needs; the
//! [`resolve`] module turns a [`Namespace`] of parsed values into a
//! [`Config`]. Both work through [`RunfigBuilder::resolve_namespace`] without
//! clap.
//!
//! For [clap](https://docs.rs/clap) users, the adapter (the `cli` module,
//! behind the `clap` Cargo feature, on by default) renders the surface into a
//! `clap::Command` and reads provenance back from `ArgMatches`. To use runfig
//! without clap:
//!
//! ```toml
//! runfig = { version = "...", default-features = false }
//! ```
//!
//! # Value precedence
//!
//! ```text
//! Declared default     Field::with_default(...)
//!        ↑ overridden by
//! Nested-config file   --model model.yaml
//!        ↑ overridden by
//! Explicit switch      --model.depth 50
//! ```
//!
//! Precedence is decided **per leaf**. A file that sets `depth` does not
//! shadow `width`; an explicit `--model.depth` wins over the file even when
//! it repeats the declared default. Internally every value is tagged with a
//! [`Provenance`] and a value only replaces one of equal or lower rank.
//!
//! # Booleans
//!
//! A boolean field gets one bare toggle whose effect is the negation of its
//! default: a field defaulting to `false` is switched on by `--flag`, one
//! defaulting to `true` is switched off by it. This is why boolean fields
//! must declare a default.
//!
//! # Nested-config files
//!
//! `.json`, `.yaml` and `.yml` are supported (see [`file`]). Strict mode is
//! **on by default**: a key the nested schema does not declare fails loading.
//!
//! ```text
//! Unknown key 'dpeth' in model.yaml
//! ```
//!
//! Turn it off with [`.strict(false)`](RunfigBuilder::strict) to log and
//! ignore such keys instead.
//!
//! # Unconsumed arguments
//!
//! Arguments no switch claims (unknown switches, stray positionals,
//! everything after `--`) are collected rather than rejected.
//! [`RunfigBuilder::parse_from`] returns them; `load` and `run` apply the
//! [`UnconsumedPolicy`]: warn and continue (default) or fail.
//!
//! # Runs
//!
//! [`RunfigBuilder::run`] wraps a program's main function. It captures a
//! [`RunContext`] (run id, starting directory, git revision) and, with
//! [`job_dir()`](RunfigBuilder::job_dir), runs inside a fresh per-run
//! directory holding a `run.yaml` snapshot of the resolved config. The
//! previous working directory is restored on every exit path.
//!
//! # Error handling
//!
//! All fallible operations return [`RunfigError`]. Each variant maps to an
//! [`ErrorClass`] (schema, parse, file, unconsumed) so callers can decide
//! presentation; [`RunfigError::exit`] prints and exits like clap does. See
//! the [`error`] module for the full set.

pub mod error;
pub mod file;
pub mod merge;
pub mod namespace;
pub mod resolve;
pub mod run;
pub mod schema;
pub mod surface;
pub mod types;
pub mod typing;
pub mod value;

mod builder;
#[cfg(feature = "clap")]
pub mod cli;
mod coerce;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{DEFAULT_JOB_ROOT, Runfig, RunfigBuilder};
pub use error::{ErrorClass, RunfigError};
pub use file::{FsLoader, MappingLoader};
pub use namespace::Namespace;
pub use resolve::{Resolved, from_mapping};
pub use run::RunContext;
pub use schema::{Bounds, Field, FieldDescriptor, Schema};
pub use surface::{Surface, Switch, SwitchShape};
pub use types::{Provenance, UnconsumedPolicy};
pub use typing::{DeclaredType, EnumBinding, PrimitiveKind};
pub use value::{Config, Mapping, Value};
