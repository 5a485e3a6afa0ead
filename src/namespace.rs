//! The flat, prefix-qualified namespace a CLI parser hands to the engine.
//!
//! Keys are qualified names (`field` or `parent.child`). Each entry carries
//! its raw tokens and a [`Provenance`] tag saying whether the user typed it
//! or the surface filled it in from a declared default.

use indexmap::IndexMap;

use crate::schema::Schema;
use crate::types::Provenance;

/// Join a field name onto an optional parent prefix.
pub fn qualify(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}.{name}"),
        _ => name.to_string(),
    }
}

/// Raw tokens for one qualified name.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub tokens: Vec<String>,
    pub provenance: Provenance,
}

/// Parsed command-line values, keyed by qualified name.
///
/// Built by the clap adapter, or by hand for clap-free callers:
///
/// ```ignore
/// let ns = Namespace::new()
///     .explicit("a", ["3.2"])
///     .untouched("b.c", ["1"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    entries: IndexMap<String, RawEntry>,
    unconsumed: Vec<String>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value the user passed.
    pub fn explicit<I, S>(self, name: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_entry(name, tokens, Provenance::ExplicitlySet)
    }

    /// Record a value the surface emitted from a declared default.
    pub fn untouched<I, S>(self, name: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_entry(name, tokens, Provenance::UntouchedDefault)
    }

    fn with_entry<I, S>(mut self, name: &str, tokens: I, provenance: Provenance) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = RawEntry {
            tokens: tokens.into_iter().map(Into::into).collect(),
            provenance,
        };
        self.insert(name, entry);
        self
    }

    pub fn insert(&mut self, name: &str, entry: RawEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    /// Append tokens no switch claimed.
    pub fn with_unconsumed<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unconsumed.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unconsumed(&self) -> &[String] {
        &self.unconsumed
    }
}

/// A namespace split along the schema's shape.
#[derive(Debug, Default)]
pub struct Partitioned {
    /// Root leaf values.
    pub leaves: IndexMap<String, RawEntry>,
    /// File-path values, one per nested field that got one.
    pub files: IndexMap<String, RawEntry>,
    /// `parent -> child -> entry` overrides for nested fields.
    pub children: IndexMap<String, IndexMap<String, RawEntry>>,
    /// Tokens the caller must decide about.
    pub unconsumed: Vec<String>,
}

/// Route every entry to its place in the schema.
///
/// Names the schema does not know are turned back into `--name tokens...`
/// and appended to the unconsumed list rather than rejected.
pub fn partition(schema: &Schema, namespace: Namespace) -> Partitioned {
    let mut out = Partitioned {
        unconsumed: namespace.unconsumed,
        ..Partitioned::default()
    };

    for (name, entry) in namespace.entries {
        if let Some((parent, child)) = name.split_once('.') {
            if let Some(inner) = schema.nested(parent)
                && inner.field(child).is_some()
            {
                out.children
                    .entry(parent.to_string())
                    .or_default()
                    .insert(child.to_string(), entry);
                continue;
            }
        } else if let Some(field) = schema.field(&name) {
            if field.is_nested() {
                out.files.insert(name, entry);
            } else {
                out.leaves.insert(name, entry);
            }
            continue;
        }

        tracing::debug!(name = %name, "namespace entry not declared by schema {}", schema.name());
        out.unconsumed.push(format!("--{name}"));
        out.unconsumed.extend(entry.tokens);
    }

    out
}
