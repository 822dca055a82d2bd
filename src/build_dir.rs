use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::util;

/// Directory the generated and compiled files go to.
///
/// An `Owned` directory was created by this run and is removed when released
/// (or dropped). A `Borrowed` one belongs to the user and is never removed.
#[derive(Debug)]
pub enum BuildDir {
  Owned(TempDir),
  Borrowed(PathBuf),
}

impl BuildDir {
  /// - `requested` set: create it (with parents) if needed and borrow it.
  /// - otherwise, when compiling: a fresh temp directory, owned.
  /// - otherwise: the current working directory, borrowed.
  pub fn acquire(requested: Option<&Path>, compile: bool) -> Result<Self> {
    if let Some(dir) = requested {
      std::fs::create_dir_all(dir)
        .with_context(|| format!("creating build directory {}", dir.display()))?;
      return Ok(BuildDir::Borrowed(util::absolute(dir)));
    }

    if compile {
      let td = tempfile::Builder::new()
        .prefix("f2py-")
        .tempdir()
        .context("creating temporary build directory")?;
      return Ok(BuildDir::Owned(td));
    }

    let cwd = std::env::current_dir().context("resolving current directory")?;
    Ok(BuildDir::Borrowed(cwd))
  }

  pub fn path(&self) -> &Path {
    match self {
      BuildDir::Owned(td) => td.path(),
      BuildDir::Borrowed(p) => p,
    }
  }

  pub fn is_owned(&self) -> bool {
    matches!(self, BuildDir::Owned(_))
  }

  /// Remove the directory if this run created it.
  pub fn release(self) -> Result<()> {
    match self {
      BuildDir::Owned(td) => {
        let path = td.path().to_path_buf();
        td.close()
          .with_context(|| format!("removing build directory {}", path.display()))?;
        debug!("removed build directory {}", path.display());
        Ok(())
      }
      BuildDir::Borrowed(_) => Ok(()),
    }
  }
}

/// Run `body` inside an acquired build directory and release it on every exit path.
///
/// An error from `body` takes precedence over a failure to clean up, which is
/// then only logged.
pub fn with_build_dir<T>(
  requested: Option<&Path>,
  compile: bool,
  body: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
  let dir = BuildDir::acquire(requested, compile)?;
  debug!(
    "build directory {} ({})",
    dir.path().display(),
    if dir.is_owned() { "temporary" } else { "kept" }
  );

  let result = body(dir.path());
  let released = dir.release();

  match (result, released) {
    (Ok(value), Ok(())) => Ok(value),
    (Ok(_), Err(e)) => Err(e),
    (Err(e), Ok(())) => Err(e),
    (Err(e), Err(cleanup)) => {
      warn!("{:#}", cleanup);
      Err(e)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn requested_directory_is_created_and_kept() {
    let td = TempDir::new().unwrap();
    let target = td.path().join("nested/build");

    let seen = with_build_dir(Some(&target), true, |dir| Ok(dir.to_path_buf())).unwrap();
    assert_eq!(seen, target);
    assert!(target.is_dir());
  }

  #[test]
  fn requested_directory_survives_a_failing_body() {
    let td = TempDir::new().unwrap();
    let target = td.path().join("out");
    let res: Result<()> = with_build_dir(Some(&target), true, |_| anyhow::bail!("boom"));
    assert!(res.is_err());
    assert!(target.is_dir());
  }

  #[test]
  fn temporary_directory_is_removed_after_success() {
    let mut seen = PathBuf::new();
    with_build_dir(None, true, |dir| {
      assert!(dir.is_dir());
      seen = dir.to_path_buf();
      Ok(())
    })
    .unwrap();
    assert!(!seen.as_os_str().is_empty());
    assert!(!seen.exists());
  }

  #[test]
  fn temporary_directory_is_removed_after_error() {
    let mut seen = PathBuf::new();
    let res: Result<()> = with_build_dir(None, true, |dir| {
      std::fs::write(dir.join("partial.c"), "int x;").unwrap();
      seen = dir.to_path_buf();
      anyhow::bail!("collaborator failed")
    });
    assert_eq!(res.unwrap_err().to_string(), "collaborator failed");
    assert!(!seen.exists());
  }

  #[test]
  #[serial]
  fn generation_only_uses_the_working_directory() {
    let (td, _guard) = test_support::temp_cwd();
    let cwd = std::env::current_dir().unwrap();
    let seen = with_build_dir(None, false, |dir| Ok(dir.to_path_buf())).unwrap();
    assert_eq!(seen, cwd);
    assert!(td.path().is_dir());
  }

  #[test]
  fn borrowed_release_is_a_no_op() {
    let td = TempDir::new().unwrap();
    let dir = BuildDir::acquire(Some(td.path()), false).unwrap();
    assert!(!dir.is_owned());
    dir.release().unwrap();
    assert!(td.path().is_dir());
  }
}
