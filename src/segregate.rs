//! Recover `skip:` / `only:` function-name sublists from the positional tokens.

pub const SKIP: &str = "skip:";
pub const ONLY: &str = "only:";
pub const CLOSE: &str = ":";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
  File,
  Skip,
  Only,
}

/// Input files plus the function filters found between sentinels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionFilters {
  pub files: Vec<String>,
  pub skip: Vec<String>,
  pub only: Vec<String>,
}

/// Split positional tokens left to right into files, skip names and only names.
///
/// `skip:` and `only:` open a sublist (a new sentinel closes the previous one) and
/// `:` closes it. A `:` seen outside a sublist is an ordinary file token.
pub fn segregate(tokens: &[String]) -> FunctionFilters {
  let mut out = FunctionFilters::default();
  let mut mode = Mode::File;

  for token in tokens {
    match token.as_str() {
      SKIP => mode = Mode::Skip,
      ONLY => mode = Mode::Only,
      CLOSE if mode != Mode::File => mode = Mode::File,
      _ => match mode {
        Mode::File => out.files.push(token.clone()),
        Mode::Skip => out.skip.push(token.clone()),
        Mode::Only => out.only.push(token.clone()),
      },
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  fn toks(s: &[&str]) -> Vec<String> {
    s.iter().map(|t| t.to_string()).collect()
  }

  #[test]
  fn splits_files_and_sublists() {
    let f = segregate(&toks(&["a.f", "skip:", "x", "y", ":", "b.f90", "only:", "z", ":", "c.pyf"]));
    assert_eq!(f.files, ["a.f", "b.f90", "c.pyf"]);
    assert_eq!(f.skip, ["x", "y"]);
    assert_eq!(f.only, ["z"]);
  }

  #[test]
  fn new_sentinel_closes_previous_sublist() {
    let f = segregate(&toks(&["skip:", "x", "only:", "y", ":", "a.f"]));
    assert_eq!(f.skip, ["x"]);
    assert_eq!(f.only, ["y"]);
    assert_eq!(f.files, ["a.f"]);
  }

  #[test]
  fn colon_in_file_mode_is_a_file() {
    let f = segregate(&toks(&[":", "a.f", "skip:", "x", ":", ":"]));
    assert_eq!(f.files, [":", "a.f", ":"]);
    assert_eq!(f.skip, ["x"]);
  }

  #[test]
  fn unterminated_sublist_runs_to_the_end() {
    let f = segregate(&toks(&["a.f", "only:", "x", "b.f"]));
    assert_eq!(f.files, ["a.f"]);
    assert_eq!(f.only, ["x", "b.f"]);
  }

  fn token() -> impl Strategy<Value = String> {
    prop_oneof![
      Just(SKIP.to_string()),
      Just(ONLY.to_string()),
      Just(CLOSE.to_string()),
      "[a-z]{1,6}(\\.f90|\\.f|\\.pyf)?",
    ]
  }

  proptest! {
    #[test]
    fn every_non_sentinel_token_lands_in_exactly_one_bucket(tokens in prop::collection::vec(token(), 0..40)) {
      let f = segregate(&tokens);
      let is_sentinel = |t: &&String| *t == SKIP || *t == ONLY || *t == CLOSE;

      let mut want: Vec<&String> = tokens.iter().filter(|t| !is_sentinel(t)).collect();
      let mut got: Vec<&String> = f.files.iter().chain(&f.skip).chain(&f.only).filter(|t| !is_sentinel(t)).collect();
      want.sort();
      got.sort();
      prop_assert_eq!(got, want);

      prop_assert!(f.skip.iter().chain(&f.only).all(|t| !is_sentinel(&t)));
      prop_assert!(f.files.iter().all(|t| t != SKIP && t != ONLY));
    }

    #[test]
    fn files_before_any_sentinel_never_leak(tokens in prop::collection::vec(token(), 0..40)) {
      let f = segregate(&tokens);
      let lead: Vec<&String> = tokens.iter().take_while(|t| *t != SKIP && *t != ONLY).collect();
      prop_assert!(f.files.len() >= lead.len());
      for (got, want) in f.files.iter().zip(lead) {
        prop_assert_eq!(got, want);
      }
    }
  }
}
