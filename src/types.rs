use crate::error::RunfigError;

/// Where a leaf value came from during a merge.
///
/// Variants are ordered by precedence: a value is only replaced by one whose
/// provenance is at least as high.
///
/// ```text
/// UntouchedDefault < FromFile < ExplicitlySet
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Provenance {
    /// The surface emitted the value only because the field declares a default.
    UntouchedDefault,
    /// Loaded from a nested-config file.
    FromFile,
    /// The user passed it on the command line.
    ExplicitlySet,
}

/// What to do with command-line tokens no registered switch claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnconsumedPolicy {
    /// Log a warning and keep going.
    #[default]
    Warn,
    /// Fail with [`RunfigError::UnconsumedArguments`].
    Fail,
}

impl UnconsumedPolicy {
    pub fn apply(self, tokens: &[String]) -> Result<(), RunfigError> {
        if tokens.is_empty() {
            return Ok(());
        }
        match self {
            UnconsumedPolicy::Warn => {
                tracing::warn!(
                    arguments = %tokens.join(" "),
                    "some arguments are unknown to the config surface"
                );
                Ok(())
            }
            UnconsumedPolicy::Fail => Err(RunfigError::UnconsumedArguments(tokens.to_vec())),
        }
    }
}
