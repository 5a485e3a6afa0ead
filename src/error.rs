use std::path::PathBuf;
use thiserror::Error;

/// The four failure classes callers present differently.
///
/// Schema errors are programmer mistakes caught when a [`Schema`](crate::Schema)
/// is built. Parse and file errors are user-facing usage failures. Unconsumed
/// arguments are a soft condition whose severity is chosen by
/// [`UnconsumedPolicy`](crate::UnconsumedPolicy).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Schema,
    Parse,
    File,
    Unconsumed,
}

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum RunfigError {
    #[error("Unsupported type for field '{field}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::schema::unsupported_type)))]
    UnsupportedType { field: String, reason: String },

    #[error("Field '{field}' nests a config inside a nested config (at most one level is supported)")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::schema::nesting)))]
    UnsupportedNesting { field: String },

    #[error("Invalid declaration for field '{field}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::schema::declaration)))]
    InvalidDeclaration { field: String, reason: String },

    #[error("Duplicate field '{field}' in schema {schema}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::schema::duplicate)))]
    DuplicateField { schema: String, field: String },

    #[error("Invalid value for '{key}': {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::parse::invalid_value)))]
    InvalidValue { key: String, reason: String },

    #[error("Invalid choice '{value}' for '{key}' (choose from {})", .choices.join(", "))]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::parse::invalid_choice)))]
    InvalidChoice {
        key: String,
        value: String,
        choices: Vec<String>,
    },

    #[error("Value {value} for '{key}' is out of range [{lower}, {upper}]")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::parse::out_of_range)))]
    OutOfRange {
        key: String,
        value: f64,
        lower: f64,
        upper: f64,
    },

    #[error("'{key}' expects exactly {expected} values, got {actual}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::parse::arity)))]
    ArityMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("Missing required value for '{0}'")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(runfig::parse::missing),
            help("pass the switch on the command line or set it in the loaded file")
        )
    )]
    MissingRequiredValue(String),

    #[cfg(feature = "clap")]
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error("File not found: {0}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::file::not_found)))]
    FileNotFound(PathBuf),

    #[error("Unsupported file type for {path} (expected .json, .yaml or .yml)")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::file::unsupported)))]
    UnsupportedFileType { path: PathBuf },

    #[error("Failed to parse {path}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::file::parse)))]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::file::io)))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unknown key '{key}' in {path}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::file::unknown_key)))]
    UnknownKey { key: String, path: PathBuf },

    #[error("Unknown keys in config file")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::file::unknown_keys)))]
    UnknownKeys(#[cfg_attr(feature = "rich-errors", related)] Vec<RunfigError>),

    #[error("Unrecognized arguments: {}", .0.join(" "))]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::unconsumed)))]
    UnconsumedArguments(Vec<String>),

    #[error("Config does not match {type_name}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(runfig::schema::type_mismatch)))]
    TypeMismatch {
        type_name: &'static str,
        reason: String,
    },
}

impl RunfigError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RunfigError::UnsupportedType { .. }
            | RunfigError::UnsupportedNesting { .. }
            | RunfigError::InvalidDeclaration { .. }
            | RunfigError::DuplicateField { .. }
            | RunfigError::TypeMismatch { .. } => ErrorClass::Schema,
            RunfigError::InvalidValue { .. }
            | RunfigError::InvalidChoice { .. }
            | RunfigError::OutOfRange { .. }
            | RunfigError::ArityMismatch { .. }
            | RunfigError::MissingRequiredValue(_) => ErrorClass::Parse,
            #[cfg(feature = "clap")]
            RunfigError::Usage(_) => ErrorClass::Parse,
            RunfigError::FileNotFound(_)
            | RunfigError::UnsupportedFileType { .. }
            | RunfigError::ParseError { .. }
            | RunfigError::IoError { .. }
            | RunfigError::UnknownKey { .. }
            | RunfigError::UnknownKeys(_) => ErrorClass::File,
            RunfigError::UnconsumedArguments(_) => ErrorClass::Unconsumed,
        }
    }

    /// Print the error and terminate the process with a non-zero status.
    ///
    /// Usage errors are handed to clap, which also covers `--help` (exit 0).
    pub fn exit(self) -> ! {
        let err = match self {
            #[cfg(feature = "clap")]
            RunfigError::Usage(err) => err.exit(),
            other => other,
        };
        eprintln!("error: {err}");
        std::process::exit(2)
    }
}
