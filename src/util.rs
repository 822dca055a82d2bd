// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Small helpers for paths, flag-group formatting, and man page rendering
// role: utilities/helpers
// inputs: Paths; token groups; clap Command
// outputs: Absolute paths, joined flag strings, man page text
// side_effects: none (reads the current directory only)
// invariants:
// - absolute never touches the filesystem beyond reading the current directory; symlinks are kept
// - join_groups flattens groups in occurrence order with single spaces
// errors: render_man_page surfaces IO errors from the renderer
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Command;

/// `p` joined onto the current directory when relative; unchanged otherwise.
pub fn absolute<P: AsRef<Path>>(p: P) -> PathBuf {
  let p = p.as_ref();
  if p.is_absolute() {
    return p.to_path_buf();
  }
  match std::env::current_dir() {
    Ok(cwd) => cwd.join(p),
    Err(_) => p.to_path_buf(),
  }
}

/// Space-join every token of every group, e.g. `[["-O2"], ["-g", "-Wall"]]` -> `-O2 -g -Wall`.
pub fn join_groups(groups: &[Vec<String>]) -> String {
  groups.iter().flatten().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Render a section-1 man page for `cmd`.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page(cmd: Command) -> Result<String> {
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
