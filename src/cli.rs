//! Clap adapter for runfig.
//!
//! This module is the **optional integration layer** between runfig's
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! It does three things:
//!
//! - [`command()`] renders a [`Surface`] into a `clap::Command`, one
//!   `--<qualified>` arg per switch, with defaults registered as clap default
//!   values. A repeated switch keeps its last value.
//! - [`partition_args()`] splits raw argv into the tokens clap should see and
//!   the tokens no switch claims. Unknown switches never reach clap, so they
//!   come back as unconsumed instead of failing the parse.
//! - [`namespace_from_matches()`] reads `ArgMatches` back into a
//!   [`Namespace`], tagging every entry with its provenance from
//!   [`ArgMatches::value_source`].
//!
//! [`parse_from()`] chains the three. From there, all logic flows through the
//! clap-free [`resolve`](crate::resolve) pipeline. If you use a different CLI
//! parser, skip this module and build a [`Namespace`] directly.

use std::collections::HashSet;

use clap::builder::{PossibleValuesParser, ValueParser};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::coerce;
use crate::error::RunfigError;
use crate::namespace::{Namespace, RawEntry};
use crate::schema::Bounds;
use crate::surface::{Surface, Switch, SwitchShape};
use crate::typing::PrimitiveKind;
use crate::types::Provenance;

/// Build a `clap::Command` exposing every switch of `surface`.
pub fn command(name: &str, about: Option<&str>, surface: &Surface) -> Command {
    let mut cmd = Command::new(name.to_string()).args_override_self(true);
    if let Some(about) = about {
        cmd = cmd.about(about.to_string());
    }
    for switch in surface.switches() {
        cmd = cmd.arg(arg_for(switch));
    }
    cmd
}

fn arg_for(switch: &Switch) -> Arg {
    let mut arg = Arg::new(switch.name.clone())
        .long(switch.name.clone())
        .help(switch.help.clone())
        .hide(switch.hidden);

    arg = match &switch.shape {
        SwitchShape::Toggle { sets: true } => arg.action(ArgAction::SetTrue),
        SwitchShape::Toggle { sets: false } => arg.action(ArgAction::SetFalse),
        SwitchShape::Value { kind, bounds } => arg
            .action(ArgAction::Set)
            .num_args(1)
            .allow_negative_numbers(true)
            .value_parser(token_parser(*kind, *bounds)),
        SwitchShape::Multi { kind, bounds, .. } => arg
            .action(ArgAction::Set)
            .num_args(1..)
            .allow_negative_numbers(true)
            .value_parser(token_parser(*kind, *bounds)),
        SwitchShape::Choice { literals } => arg
            .action(ArgAction::Set)
            .num_args(1)
            .value_parser(PossibleValuesParser::new(literals.clone())),
        SwitchShape::FilePath => arg.action(ArgAction::Set).num_args(1),
    };

    if let Some(value_name) = &switch.value_name {
        arg = arg.value_name(value_name.clone());
    }
    let is_toggle = matches!(switch.shape, SwitchShape::Toggle { .. });
    if !is_toggle && !switch.default_tokens.is_empty() {
        arg = arg.default_values(switch.default_tokens.clone());
    }
    if switch.required {
        arg = arg.required(true);
    }
    arg
}

/// Coerce each token to `kind` and reject it when outside `bounds`, so bad
/// values are usage errors raised by clap itself.
fn token_parser(kind: PrimitiveKind, bounds: Option<Bounds>) -> ValueParser {
    ValueParser::new(move |token: &str| -> Result<String, String> {
        let value = coerce::parse_token(kind, token)?;
        if let (Some(bounds), Some(n)) = (bounds, value.as_f64())
            && !bounds.contains(n)
        {
            return Err(format!("{token} is out of range {bounds}"));
        }
        Ok(token.to_string())
    })
}

/// Argv split against a surface.
#[derive(Debug, Default, PartialEq)]
pub struct Partition {
    /// Binary name followed by every token a registered switch claims.
    pub claimed: Vec<String>,
    /// Unknown switches with their values, stray positionals, and
    /// everything from `--` on.
    pub unconsumed: Vec<String>,
    /// Qualified names of the switches that appeared.
    pub seen: HashSet<String>,
    pub help: bool,
}

fn looks_like_switch(token: &str) -> bool {
    token.starts_with('-') && token.len() > 1 && token.parse::<f64>().is_err()
}

pub fn partition_args<I, T>(surface: &Surface, args: I) -> Partition
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut out = Partition::default();
    out.claimed.push(args.next().unwrap_or_default());
    let tokens: Vec<String> = args.collect();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if token == "--" {
            out.unconsumed.extend(tokens[i - 1..].iter().cloned());
            break;
        }
        if token == "-h" || token == "--help" {
            out.help = true;
            out.claimed.push(token.clone());
            continue;
        }

        let switch = token.strip_prefix("--").and_then(|body| {
            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };
            surface.switch(name).map(|s| (s, inline.is_some()))
        });

        let Some((switch, has_inline_value)) = switch else {
            out.unconsumed.push(token.clone());
            if looks_like_switch(token) {
                while i < tokens.len() && !looks_like_switch(&tokens[i]) {
                    out.unconsumed.push(tokens[i].clone());
                    i += 1;
                }
            }
            continue;
        };

        out.seen.insert(switch.name.clone());
        out.claimed.push(token.clone());
        if has_inline_value {
            continue;
        }
        match switch.shape {
            SwitchShape::Toggle { .. } => {}
            SwitchShape::Multi { .. } => {
                while i < tokens.len() && !looks_like_switch(&tokens[i]) {
                    out.claimed.push(tokens[i].clone());
                    i += 1;
                }
            }
            _ => {
                if i < tokens.len() && !looks_like_switch(&tokens[i]) {
                    out.claimed.push(tokens[i].clone());
                    i += 1;
                }
            }
        }
    }

    out
}

/// Read parsed matches back into a namespace.
///
/// Values clap filled in from a registered default are tagged
/// [`Provenance::UntouchedDefault`]; anything else counts as explicitly set.
/// Switches with neither are left out.
pub fn namespace_from_matches(surface: &Surface, matches: &ArgMatches) -> Namespace {
    let mut namespace = Namespace::new();
    for switch in surface.switches() {
        let provenance = match matches.value_source(&switch.name) {
            Some(ValueSource::DefaultValue) => Provenance::UntouchedDefault,
            Some(_) => Provenance::ExplicitlySet,
            None => continue,
        };
        let tokens = match switch.shape {
            SwitchShape::Toggle { .. } => vec![matches.get_flag(&switch.name).to_string()],
            _ => matches
                .get_many::<String>(&switch.name)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        };
        namespace.insert(&switch.name, RawEntry { tokens, provenance });
    }
    namespace
}

/// Parse argv into a namespace.
///
/// A required root switch that does not appear fails with
/// [`RunfigError::MissingRequiredValue`] unless help was asked for; every
/// other tokenizer failure (and `--help` itself) is a
/// [`RunfigError::Usage`].
pub fn parse_from<I, T>(
    name: &str,
    about: Option<&str>,
    surface: &Surface,
    args: I,
) -> Result<Namespace, RunfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let partition = partition_args(surface, args);

    if !partition.help
        && let Some(missing) = surface
            .switches()
            .iter()
            .find(|s| s.required && !partition.seen.contains(&s.name))
    {
        return Err(RunfigError::MissingRequiredValue(missing.name.clone()));
    }

    let matches = command(name, about, surface).try_get_matches_from(partition.claimed)?;
    Ok(namespace_from_matches(surface, &matches).with_unconsumed(partition.unconsumed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{bounded_schema, enum_schema, nested_schema, simple_schema};
    use crate::schema::Schema;
    use crate::surface::build_surface;
    use clap::error::ErrorKind;

    fn parse(schema: &Schema, args: &[&str]) -> Result<Namespace, RunfigError> {
        let surface = build_surface(schema).unwrap();
        parse_from("test", None, &surface, args.iter().copied())
    }

    fn entry<'a>(ns: &'a Namespace, name: &str) -> &'a RawEntry {
        ns.get(name).unwrap_or_else(|| panic!("no entry for {name}"))
    }

    #[test]
    fn partition_sets_aside_unknown_tokens() {
        let surface = build_surface(&simple_schema()).unwrap();
        let p = partition_args(
            &surface,
            ["test", "--a", "1", "--nope", "x", "y", "stray", "--c", "--", "--b", "3"],
        );
        assert_eq!(p.claimed, vec!["test", "--a", "1", "--c"]);
        assert_eq!(
            p.unconsumed,
            vec!["--nope", "x", "y", "stray", "--", "--b", "3"]
        );
        assert!(p.seen.contains("a"));
        assert!(!p.help);
    }

    #[test]
    fn partition_multi_stops_at_next_switch() {
        let surface = build_surface(&bounded_schema()).unwrap();
        let p = partition_args(&surface, ["test", "--xs", "4", "-5", "6", "--lr", "-1"]);
        assert_eq!(
            p.claimed,
            vec!["test", "--xs", "4", "-5", "6", "--lr", "-1"]
        );
        assert!(p.unconsumed.is_empty());
    }

    #[test]
    fn inline_values() {
        let ns = parse(&simple_schema(), &["test", "--a=3", "--e=hello"]).unwrap();
        assert_eq!(entry(&ns, "a").tokens, vec!["3"]);
        assert_eq!(entry(&ns, "e").tokens, vec!["hello"]);
    }

    #[test]
    fn toggles_negate_defaults() {
        let passed = parse(&simple_schema(), &["test", "--a", "1", "--c", "--d"]).unwrap();
        assert_eq!(entry(&passed, "c").tokens, vec!["true"]);
        assert_eq!(entry(&passed, "d").tokens, vec!["false"]);
        assert_eq!(entry(&passed, "c").provenance, Provenance::ExplicitlySet);

        let absent = parse(&simple_schema(), &["test", "--a", "1"]).unwrap();
        assert_eq!(entry(&absent, "c").tokens, vec!["false"]);
        assert_eq!(entry(&absent, "d").tokens, vec!["true"]);
        assert_eq!(entry(&absent, "d").provenance, Provenance::UntouchedDefault);
    }

    #[test]
    fn provenance_from_value_source() {
        let ns = parse(&simple_schema(), &["test", "--a", "1", "--b", "2"]).unwrap();
        assert_eq!(entry(&ns, "a").provenance, Provenance::ExplicitlySet);
        // Same literal as the default, still explicit.
        assert_eq!(entry(&ns, "b").provenance, Provenance::ExplicitlySet);
        assert_eq!(entry(&ns, "e").provenance, Provenance::UntouchedDefault);
        assert_eq!(entry(&ns, "e").tokens, vec!["test"]);
    }

    #[test]
    fn nested_file_and_child_switches() {
        let ns = parse(&nested_schema(), &["test", "--a", "3.2", "--b", "b.json"]).unwrap();
        assert_eq!(entry(&ns, "b").tokens, vec!["b.json"]);
        assert_eq!(entry(&ns, "b.c").provenance, Provenance::UntouchedDefault);

        let ns = parse(&nested_schema(), &["test", "--a", "3.2", "--b.c", "9"]).unwrap();
        assert!(ns.get("b").is_none());
        assert_eq!(entry(&ns, "b.c").provenance, Provenance::ExplicitlySet);
    }

    #[test]
    fn missing_required_switch() {
        match parse(&simple_schema(), &["test", "--b", "3"]) {
            Err(RunfigError::MissingRequiredValue(name)) => assert_eq!(name, "a"),
            other => panic!("Expected MissingRequiredValue, got {other:?}"),
        }
    }

    #[test]
    fn help_wins_over_missing_required() {
        match parse(&simple_schema(), &["test", "--help"]) {
            Err(RunfigError::Usage(e)) => assert_eq!(e.kind(), ErrorKind::DisplayHelp),
            other => panic!("Expected help, got {other:?}"),
        }
    }

    #[test]
    fn bound_checked_inline() {
        match parse(&bounded_schema(), &["test", "--lr", "2.1"]) {
            Err(RunfigError::Usage(e)) => assert_eq!(e.kind(), ErrorKind::ValueValidation),
            other => panic!("Expected usage error, got {other:?}"),
        }
        assert!(parse(&bounded_schema(), &["test", "--lr", "-1"]).is_ok());
        assert!(parse(&bounded_schema(), &["test", "--lr", "2"]).is_ok());
    }

    #[test]
    fn bad_token_is_usage_error() {
        assert!(matches!(
            parse(&simple_schema(), &["test", "--a", "one"]),
            Err(RunfigError::Usage(_))
        ));
    }

    #[test]
    fn choice_outside_set_is_usage_error() {
        match parse(&enum_schema(), &["test", "--act", "tanh"]) {
            Err(RunfigError::Usage(e)) => assert_eq!(e.kind(), ErrorKind::InvalidValue),
            other => panic!("Expected usage error, got {other:?}"),
        }
    }

    #[test]
    fn repeated_switch_overrides_itself() {
        let ns = parse(&simple_schema(), &["test", "--a", "1", "--a", "2"]).unwrap();
        assert_eq!(entry(&ns, "a").tokens, vec!["2"]);

        let ns = parse(&bounded_schema(), &["test", "--xs", "1", "2", "--xs", "4", "5", "6"]).unwrap();
        assert_eq!(entry(&ns, "xs").tokens, vec!["4", "5", "6"]);
    }

    #[test]
    fn multi_value_collects_tokens() {
        let ns = parse(&bounded_schema(), &["test", "--xs", "4", "5"]).unwrap();
        assert_eq!(entry(&ns, "xs").tokens, vec!["4", "5"]);
        let ns = parse(&bounded_schema(), &["test"]).unwrap();
        assert_eq!(entry(&ns, "xs").tokens, vec!["1", "2", "3"]);
    }

    #[test]
    fn optional_without_default_left_out() {
        let ns = parse(&enum_schema(), &["test"]).unwrap();
        assert!(ns.get("dropout").is_none());
    }

    #[test]
    fn unconsumed_carried_on_namespace() {
        let ns = parse(&simple_schema(), &["test", "--a", "1", "--wat", "2"]).unwrap();
        assert_eq!(ns.unconsumed(), &["--wat".to_string(), "2".to_string()]);
    }

    #[test]
    fn command_renders_help_text() {
        let surface = build_surface(&nested_schema()).unwrap();
        let mut cmd = command("test", Some("about text"), &surface);
        let help = cmd.render_help().to_string();
        assert!(help.contains("--b.c"));
        assert!(help.contains("load {yaml,yml,json} file for A"));
        assert!(help.contains("about text"));
    }
}
