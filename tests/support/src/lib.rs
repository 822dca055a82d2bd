//! test-support: helpers for robust, nextest-friendly tests.
//!
//! Add as a dev-dependency in your top-level `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support" }
//! ```
//!
//! Then in tests:
//! ```no_run
//! use test_support::{cmd_bin, toolchain_dir};
//!
//! let td = toolchain_dir(&[("build-wrappers", r#"echo '{"wrappers": []}'"#)]);
//! cmd_bin("f2py").current_dir(td.path()).env("F2PY_TOOLCHAIN", "sh").arg("a.f").assert().success();
//! ```

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

use std::{env, path::{Path, PathBuf}};

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
///
/// Safe to call from multiple tests; only the first call configures the global subscriber.
pub fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("warn,test=info"))
            .unwrap();
        // with_test_writer() causes logs to appear alongside failing tests only (cargo/nextest)
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
    Lazy::force(&INIT);
}

/// Create a temp directory that deletes on drop.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// Create (and return) a temp working directory for CLI tests.
/// Also sets CWD to that directory for the duration of `_guard`'s lifetime.
pub fn temp_cwd() -> (tempfile::TempDir, CwdGuard) {
    let td = tempdir();
    let guard = CwdGuard::push(td.path());
    (td, guard)
}

/// Set multiple environment variables for the duration of the returned guard.
pub fn with_env(vars: &[(&str, &str)]) -> EnvGuard {
    EnvGuard::set_many(vars)
}

/// Run a binary target with `assert_cmd`, returning the ready-to-run `Command`.
pub fn cmd_bin(bin: &str) -> assert_cmd::Command {
    init_tracing();
    assert_cmd::Command::cargo_bin(bin).expect("binary target not found")
}

/// Temp directory holding one shell script per toolchain operation.
///
/// With `F2PY_TOOLCHAIN=sh` and this directory as the working directory,
/// `sh <operation>` runs the script named after the operation. The scripts are
/// read by `sh`, never executed directly, so no exec bit is needed.
pub fn toolchain_dir(scripts: &[(&str, &str)]) -> tempfile::TempDir {
    let td = tempdir();
    for (operation, body) in scripts {
        write_file(td.path(), operation, body);
    }
    td
}

/// Write `contents` to `dir/rel`, creating parent directories.
pub fn write_file(dir: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
    }
    std::fs::write(&path, contents)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    path
}

/// Guard that restores the previous current working directory when dropped.
pub struct CwdGuard {
    prev: PathBuf,
}

impl CwdGuard {
    pub fn push<P: AsRef<Path>>(new_dir: P) -> Self {
        let prev = env::current_dir().expect("cwd");
        env::set_current_dir(&new_dir).unwrap_or_else(|e| {
            panic!("failed to set cwd to {}: {e}", new_dir.as_ref().display())
        });
        Self { prev }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.prev);
    }
}

/// Guard for temporarily setting environment variables.
pub struct EnvGuard {
    prev: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub fn set_many(kv: &[(&str, &str)]) -> Self {
        let mut prev = Vec::with_capacity(kv.len());
        for (k, v) in kv {
            let k_owned = k.to_string();
            prev.push((k_owned.clone(), env::var(k).ok()));
            env::set_var(k, v);
        }
        Self { prev }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (k, old) in self.prev.drain(..) {
            match old {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}
