//! Boundary to the scanner, wrapper generator, resource lookup and compilers.
//!
//! The front-end never scans Fortran, renders C or runs a compiler itself. It
//! assembles a request, hands it to a [`Toolchain`], and reports what comes back.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cli::Backend;
use crate::settings::WrapperSettings;

/// Include/library/macro contributions a resolved resource adds to a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceInfo {
  pub include_dirs: Vec<PathBuf>,
  pub library_dirs: Vec<PathBuf>,
  pub libraries: Vec<String>,
  pub define_macros: Vec<(String, Option<String>)>,
  pub extra_objects: Vec<String>,
}

impl ResourceInfo {
  pub fn is_empty(&self) -> bool {
    *self == ResourceInfo::default()
  }
}

/// Everything the legacy compiler needs to build one extension module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionBuildSpec {
  pub name: String,
  pub sources: Vec<String>,
  pub include_dirs: Vec<PathBuf>,
  pub library_dirs: Vec<PathBuf>,
  pub libraries: Vec<String>,
  pub define_macros: Vec<(String, Option<String>)>,
  pub undef_macros: Vec<String>,
  pub extra_objects: Vec<String>,
  /// Generator flags replayed by the compiler when it regenerates wrappers.
  pub f2py_options: Vec<String>,
}

impl ExtensionBuildSpec {
  /// Append a resource's contributions, keeping existing entries first.
  pub fn merge_resource(&mut self, info: ResourceInfo) {
    self.include_dirs.extend(info.include_dirs);
    self.library_dirs.extend(info.library_dirs);
    self.libraries.extend(info.libraries);
    self.define_macros.extend(info.define_macros);
    self.extra_objects.extend(info.extra_objects);
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistutilsBuild {
  pub extension: ExtensionBuildSpec,
  pub build_dir: PathBuf,
  /// Full setup argument vector, `build` command first.
  pub setup_args: Vec<String>,
  /// Bundles the compiler replays when it regenerates the wrappers.
  pub settings: WrapperSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendBuild {
  pub backend: Backend,
  pub module_name: Option<String>,
  pub include_dirs: Vec<PathBuf>,
  pub include_paths: Vec<PathBuf>,
  pub external_resources: Vec<String>,
  pub debug: bool,
  pub sources: Vec<String>,
  pub wrappers: Vec<PathBuf>,
  pub build_dir: PathBuf,
}

/// Operations provided by the code-generation and compilation layer.
///
/// Every call receives its configuration explicitly; implementations keep no
/// settings between calls.
pub trait Toolchain {
  /// Scan `sources` and render their signatures as `.pyf` text.
  fn scan_signatures(&self, settings: &WrapperSettings, sources: &[String]) -> Result<String>;

  /// Scan `sources` and write wrapper sources, returning their paths.
  fn build_wrappers(&self, settings: &WrapperSettings, sources: &[String]) -> Result<Vec<PathBuf>>;

  /// Look up a numerical-library resource on the host. `None` when not found.
  fn resolve_resource(&self, name: &str) -> Result<Option<ResourceInfo>>;

  fn compile_distutils(&self, build: &DistutilsBuild) -> Result<()>;

  fn compile_backend(&self, build: &BackendBuild) -> Result<()>;
}
