// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Table-driven interpreter for f2py's flag grammars (paired negations, allow-listed prefixes, macros, enums, path lists, flag strings)
// role: cli/flag interpreter
// inputs: Raw argv tokens (program name stripped); a static FlagSpec table
// outputs: ParsedArgs (one resolved value per table entry, positional tokens, unrecognized remainder)
// side_effects: None; pure over its inputs
// invariants:
// - every table entry has exactly one value after parsing; later occurrences override or extend earlier ones
// - a disallowed value aborts with F2pyError::Configuration naming the value and the valid set
// - tokens after `--` are positional regardless of shape
// errors: F2pyError::{Configuration, MissingValue, UnexpectedValue}
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::warn;

use crate::error::F2pyError;

/// Prefix marking the negative spelling of a paired boolean flag.
pub const NEGATION: &str = "--no-";

/// Grammar of a single flag, with any grammar-specific parameters.
#[derive(Debug, Clone, Copy)]
pub enum FlagKind {
  /// Present means `true`.
  Switch,
  /// `--x` / `--no-x`; the last spelling seen wins.
  BoolPair { default: bool },
  /// One value, last occurrence wins.
  Single { default: Option<&'static str> },
  /// One value per occurrence, accumulated in order.
  Extend,
  /// Zero or more values per occurrence, each checked against `choices`.
  ExtendChoices { what: &'static str, choices: &'static [&'static str] },
  /// `<prefix><name>` with `name` drawn from `allowed`; names accumulate.
  AllowListed {
    prefix: &'static str,
    what: &'static str,
    allowed: &'static [&'static str],
  },
  /// `NAME[=VALUE]`, accumulated in order.
  Macro,
  /// One value drawn from `choices`.
  Choice {
    what: &'static str,
    choices: &'static [&'static str],
    default: Option<&'static str>,
  },
  /// Separator-delimited path list; occurrences extend.
  PathList,
  /// Space-delimited flag string; each occurrence adds one group.
  SpaceSplit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
  Zero,
  One,
  Optional,
  Many,
}

impl FlagKind {
  pub fn arity(&self) -> Arity {
    match self {
      FlagKind::Switch | FlagKind::BoolPair { .. } | FlagKind::AllowListed { .. } => Arity::Zero,
      FlagKind::PathList => Arity::Optional,
      FlagKind::ExtendChoices { .. } => Arity::Many,
      FlagKind::Single { .. }
      | FlagKind::Extend
      | FlagKind::Macro
      | FlagKind::Choice { .. }
      | FlagKind::SpaceSplit => Arity::One,
    }
  }

  /// Value a destination holds before any occurrence is seen.
  pub fn initial(&self) -> FlagValue {
    match self {
      FlagKind::Switch => FlagValue::Bool(false),
      FlagKind::BoolPair { default } => FlagValue::Bool(*default),
      FlagKind::Single { default } | FlagKind::Choice { default, .. } => {
        FlagValue::Str(default.map(str::to_string))
      }
      FlagKind::Extend | FlagKind::ExtendChoices { .. } | FlagKind::AllowListed { .. } => {
        FlagValue::List(Vec::new())
      }
      FlagKind::Macro => FlagValue::Macros(Vec::new()),
      FlagKind::PathList => FlagValue::Paths(Vec::new()),
      FlagKind::SpaceSplit => FlagValue::Groups(Vec::new()),
    }
  }
}

/// One row of the flag table.
#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
  /// Destination key in `ParsedArgs`.
  pub dest: &'static str,
  /// Every accepted spelling. Prefix-matched kinds leave this empty.
  pub names: &'static [&'static str],
  pub kind: FlagKind,
  pub metavar: Option<&'static str>,
  pub help: &'static str,
  pub hidden: bool,
}

impl FlagSpec {
  pub fn matches(&self, name: &str) -> bool {
    self.names.contains(&name)
  }

  fn matches_prefix(&self, token: &str) -> bool {
    match self.kind {
      FlagKind::AllowListed { prefix, .. } => token.len() > prefix.len() && token.starts_with(prefix),
      _ => false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
  Bool(bool),
  Str(Option<String>),
  List(Vec<String>),
  Paths(Vec<PathBuf>),
  Macros(Vec<(String, Option<String>)>),
  Groups(Vec<Vec<String>>),
}

/// Result of interpreting the raw token stream.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
  values: BTreeMap<&'static str, FlagValue>,
  seen: BTreeSet<&'static str>,
  /// Tokens that are not flags, in order (files and `skip:`/`only:` sentinels).
  pub positional: Vec<String>,
  /// Dash-prefixed tokens no table entry recognized.
  pub remainder: Vec<String>,
}

impl ParsedArgs {
  pub fn get(&self, dest: &str) -> Option<&FlagValue> {
    self.values.get(dest)
  }

  /// Whether the flag occurred at all, independent of the value it left behind.
  pub fn seen(&self, dest: &str) -> bool {
    self.seen.contains(dest)
  }

  pub fn flag(&self, dest: &str) -> bool {
    matches!(self.get(dest), Some(FlagValue::Bool(true)))
  }

  pub fn value(&self, dest: &str) -> Option<&str> {
    match self.get(dest) {
      Some(FlagValue::Str(v)) => v.as_deref(),
      _ => None,
    }
  }

  pub fn list(&self, dest: &str) -> &[String] {
    match self.get(dest) {
      Some(FlagValue::List(v)) => v,
      _ => &[],
    }
  }

  pub fn paths(&self, dest: &str) -> &[PathBuf] {
    match self.get(dest) {
      Some(FlagValue::Paths(v)) => v,
      _ => &[],
    }
  }

  pub fn macros(&self, dest: &str) -> &[(String, Option<String>)] {
    match self.get(dest) {
      Some(FlagValue::Macros(v)) => v,
      _ => &[],
    }
  }

  pub fn groups(&self, dest: &str) -> &[Vec<String>] {
    match self.get(dest) {
      Some(FlagValue::Groups(v)) => v,
      _ => &[],
    }
  }
}

// --- Conversion rules: (current value, new input) -> new value ---

/// `true` unless the spelling that matched is the negated one.
pub fn resolve_bool_pair(matched: &str) -> bool {
  !matched.starts_with(NEGATION)
}

pub fn accumulate_allowed(
  mut current: Vec<String>,
  name: &str,
  what: &'static str,
  allowed: &[&str],
) -> Result<Vec<String>, F2pyError> {
  if !allowed.contains(&name) {
    return Err(F2pyError::configuration(name, what, allowed));
  }
  current.push(name.to_string());
  Ok(current)
}

/// `NAME=VALUE` splits on the first `=`; a bare `NAME` is defined without a value.
pub fn parse_macro(raw: &str) -> (String, Option<String>) {
  match raw.split_once('=') {
    Some((name, value)) => (name.to_string(), Some(value.to_string())),
    None => (raw.to_string(), None),
  }
}

pub fn choose(raw: &str, what: &'static str, choices: &[&str]) -> Result<String, F2pyError> {
  if choices.contains(&raw) {
    Ok(raw.to_string())
  } else {
    Err(F2pyError::configuration(raw, what, choices))
  }
}

pub fn extend_paths(mut current: Vec<PathBuf>, raw: &str) -> Vec<PathBuf> {
  if !raw.is_empty() {
    current.extend(std::env::split_paths(raw));
  }
  current
}

pub fn split_flag_string(mut current: Vec<Vec<String>>, raw: &str) -> Vec<Vec<String>> {
  current.push(raw.split(' ').map(str::to_string).collect());
  current
}

/// Apply one occurrence of a flag to its destination's current value.
pub fn apply(
  kind: &FlagKind,
  matched: &str,
  raw: &[String],
  current: FlagValue,
) -> Result<FlagValue, F2pyError> {
  let first = raw.first().map(String::as_str);

  let next = match (kind, current) {
    (FlagKind::Switch, _) => FlagValue::Bool(true),
    (FlagKind::BoolPair { .. }, _) => FlagValue::Bool(resolve_bool_pair(matched)),
    (FlagKind::Single { .. }, current) => match first {
      Some(v) => FlagValue::Str(Some(v.to_string())),
      None => current,
    },
    (FlagKind::Choice { what, choices, .. }, current) => match first {
      Some(v) => FlagValue::Str(Some(choose(v, *what, choices)?)),
      None => current,
    },
    (FlagKind::Extend, FlagValue::List(mut items)) => {
      items.extend(raw.iter().cloned());
      FlagValue::List(items)
    }
    (FlagKind::ExtendChoices { what, choices }, FlagValue::List(mut items)) => {
      for v in raw {
        items.push(choose(v, *what, choices)?);
      }
      FlagValue::List(items)
    }
    (FlagKind::AllowListed { prefix, what, allowed }, FlagValue::List(items)) => {
      let name = matched.strip_prefix(*prefix).unwrap_or(matched);
      FlagValue::List(accumulate_allowed(items, name, *what, allowed)?)
    }
    (FlagKind::Macro, FlagValue::Macros(mut items)) => {
      items.extend(raw.iter().map(|v| parse_macro(v)));
      FlagValue::Macros(items)
    }
    (FlagKind::PathList, FlagValue::Paths(items)) => {
      FlagValue::Paths(raw.iter().fold(items, |acc, v| extend_paths(acc, v)))
    }
    (FlagKind::SpaceSplit, FlagValue::Groups(items)) => {
      FlagValue::Groups(raw.iter().fold(items, |acc, v| split_flag_string(acc, v)))
    }
    // Destination was seeded by `initial`, so the shapes above are exhaustive.
    (kind, _) => apply(kind, matched, raw, kind.initial())?,
  };
  Ok(next)
}

fn is_dash_token(token: &str) -> bool {
  token.len() > 1 && token.starts_with('-')
}

/// Whether the token after a value-taking flag starts a new flag instead of being its value.
/// A token containing a space is a value even when it starts with `-` (`--opt "-O3 -g"`).
fn looks_like_flag(token: &str) -> bool {
  is_dash_token(token) && !token.contains(' ')
}

/// Find the table row for a dash-token and any value glued onto it.
fn lookup<'t>(table: &'t [FlagSpec], token: &str) -> Option<(&'t FlagSpec, String, Option<String>)> {
  if let Some(spec) = table.iter().find(|s| s.matches(token)) {
    return Some((spec, token.to_string(), None));
  }

  if token.starts_with("--") {
    if let Some((name, value)) = token.split_once('=') {
      if let Some(spec) = table.iter().find(|s| s.matches(name)) {
        return Some((spec, name.to_string(), Some(value.to_string())));
      }
    }
    return table
      .iter()
      .find(|s| s.matches_prefix(token))
      .map(|spec| (spec, token.to_string(), None));
  }

  // Glued short form: -Ipath, -Dname=value, -lm
  if token.len() > 2 && token.is_char_boundary(2) {
    let (short, rest) = token.split_at(2);
    if let Some(spec) = table
      .iter()
      .find(|s| s.matches(short) && s.kind.arity() == Arity::One)
    {
      return Some((spec, short.to_string(), Some(rest.to_string())));
    }
  }
  None
}

/// Interpret `tokens` against `table`.
pub fn parse(tokens: &[String], table: &[FlagSpec]) -> Result<ParsedArgs, F2pyError> {
  let mut parsed = ParsedArgs {
    values: table.iter().map(|s| (s.dest, s.kind.initial())).collect(),
    ..ParsedArgs::default()
  };

  let mut iter = tokens.iter().peekable();
  let mut terminated = false;

  while let Some(token) = iter.next() {
    if terminated || !is_dash_token(token) {
      parsed.positional.push(token.clone());
      continue;
    }
    if token == "--" {
      terminated = true;
      continue;
    }

    let Some((spec, matched, inline)) = lookup(table, token) else {
      if token.contains(' ') {
        parsed.positional.push(token.clone());
        continue;
      }
      if !token.starts_with("-include") {
        warn!("{}: unknown flag, ignoring", token);
      }
      parsed.remainder.push(token.clone());
      continue;
    };

    let raw: Vec<String> = match (spec.kind.arity(), inline) {
      (Arity::Zero, Some(_)) => return Err(F2pyError::UnexpectedValue { flag: matched }),
      (Arity::Zero, None) => Vec::new(),
      (_, Some(v)) => vec![v],
      (Arity::One, None) => match iter.next_if(|t| !looks_like_flag(t)) {
        Some(v) => vec![v.clone()],
        None => return Err(F2pyError::MissingValue { flag: matched }),
      },
      (Arity::Optional, None) => iter.next_if(|t| !looks_like_flag(t)).cloned().into_iter().collect(),
      (Arity::Many, None) => {
        let mut values = Vec::new();
        while let Some(next) = iter.next_if(|t| !looks_like_flag(t)) {
          values.push(next.clone());
        }
        values
      }
    };

    let current = parsed.values.remove(spec.dest).unwrap_or_else(|| spec.kind.initial());
    let next = apply(&spec.kind, &matched, &raw, current)?;
    parsed.values.insert(spec.dest, next);
    parsed.seen.insert(spec.dest);
  }

  Ok(parsed)
}
