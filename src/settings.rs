// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Assemble the four configuration bundles handed to the toolchain; resolve module name and signature target
// role: settings/assembly
// inputs: Options, FunctionFilters, classified signature files, build directory
// outputs: WrapperSettings (rules, scanner, type-map, auxiliary), Option<module name>, Option<SignatureTarget>
// side_effects: Reads signature files to discover `python module` names; stats the signature target
// invariants:
// - bundles are built once per invocation and never mutated afterwards
// - an explicit -m always wins; without -c no name is guessed
// - an existing signature file without --overwrite-signature is a Conflict, reported before anything is written
// errors: IO errors on unreadable signature files carry the path; F2pyError::Conflict
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cli::Options;
use crate::error::F2pyError;
use crate::segregate::FunctionFilters;

/// Name used with -c when no signature file declares one.
pub const FALLBACK_MODULE_NAME: &str = "unititled";

/// Marker in the names of callback modules generated for user routines.
const USER_MODULE_MARKER: &str = "__user__";

static MODULE_NAME: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)^\s*python\s*module\s*(?P<name>\w+)").expect("module name pattern")
});

/// Options consumed by the C/API rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesSettings {
  pub module: Option<String>,
  pub build_path: PathBuf,
  pub do_rest_doc: bool,
  pub do_latex_doc: bool,
  pub short_latex: bool,
  pub verbose: bool,
  pub do_lower: bool,
  pub f2cmap_file: PathBuf,
  pub include_paths: Vec<PathBuf>,
  pub coutput: Option<String>,
  pub f2py_wrapper_output: Option<String>,
  pub emptygen: bool,
}

/// Options consumed by the Fortran scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerSettings {
  pub module: Option<String>,
  pub skip_funcs: Vec<String>,
  pub only_funcs: Vec<String>,
  pub verbose: bool,
  pub include_paths: Vec<PathBuf>,
  pub do_lower: bool,
  pub debug: Vec<String>,
  pub wrap_funcs: bool,
}

/// Options consumed by the Fortran-to-C type map loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMapSettings {
  pub f2cmap: PathBuf,
  pub headers: Vec<String>,
}

/// Options consumed by shared reporting helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxSettings {
  pub verbose: bool,
  pub debug: Vec<String>,
  pub wrap_funcs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperSettings {
  pub rules: RulesSettings,
  pub scanner: ScannerSettings,
  pub typemap: TypeMapSettings,
  pub aux: AuxSettings,
}

/// Where `-h` sends the generated signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureTarget {
  Stdout,
  File(PathBuf),
}

/// Headers requested with `-include<header>`, in order.
pub fn additional_headers(remainder: &[String]) -> Vec<String> {
  remainder
    .iter()
    .filter_map(|t| t.strip_prefix("-include"))
    .filter(|h| !h.is_empty())
    .map(str::to_string)
    .collect()
}

pub fn assemble(
  opts: &Options,
  filters: &FunctionFilters,
  module: Option<&str>,
  build_dir: &Path,
) -> WrapperSettings {
  let module = module.map(str::to_string);

  WrapperSettings {
    rules: RulesSettings {
      module: module.clone(),
      build_path: build_dir.to_path_buf(),
      do_rest_doc: opts.rest_doc,
      do_latex_doc: opts.latex_doc,
      short_latex: opts.short_latex,
      verbose: opts.verbose,
      do_lower: opts.lower,
      f2cmap_file: opts.f2cmap.clone(),
      include_paths: opts.include_paths.clone(),
      coutput: None,
      f2py_wrapper_output: None,
      emptygen: true,
    },
    scanner: ScannerSettings {
      module,
      skip_funcs: filters.skip.clone(),
      only_funcs: filters.only.clone(),
      verbose: opts.verbose,
      include_paths: opts.include_paths.clone(),
      do_lower: opts.lower,
      debug: opts.debug_api.clone(),
      wrap_funcs: opts.wrap_functions,
    },
    typemap: TypeMapSettings {
      f2cmap: opts.f2cmap.clone(),
      headers: additional_headers(&opts.remainder),
    },
    aux: AuxSettings {
      verbose: opts.verbose,
      debug: opts.debug_api.clone(),
      wrap_funcs: opts.wrap_functions,
    },
  }
}

/// First non-callback `python module <name>` declared in `source`.
pub fn module_name_in(source: &Path) -> Result<Option<String>> {
  let text = std::fs::read_to_string(source)
    .with_context(|| format!("reading signature file {}", source.display()))?;

  for line in text.lines() {
    if let Some(caps) = MODULE_NAME.captures(line) {
      let name = &caps["name"];
      if name.contains(USER_MODULE_MARKER) {
        continue;
      }
      return Ok(Some(name.to_string()));
    }
  }
  Ok(None)
}

/// Module name for this run; `None` leaves the choice to the scanner.
pub fn resolve_module_name(opts: &Options, pyf_files: &[String]) -> Result<Option<String>> {
  if let Some(name) = &opts.module {
    return Ok(Some(name.clone()));
  }
  if !opts.compile {
    return Ok(None);
  }
  for file in pyf_files {
    if let Some(name) = module_name_in(Path::new(file))? {
      return Ok(Some(name));
    }
  }
  Ok(Some(FALLBACK_MODULE_NAME.to_string()))
}

pub fn resolve_signature_target(
  opts: &Options,
  build_dir: &Path,
) -> Result<Option<SignatureTarget>, F2pyError> {
  let Some(hint) = &opts.hint_signature else {
    return Ok(None);
  };
  if hint.as_os_str() == "stdout" || hint.as_os_str() == "-" {
    return Ok(Some(SignatureTarget::Stdout));
  }

  let path = build_dir.join(hint);
  if path.is_file() && !opts.overwrite_signature {
    return Err(F2pyError::Conflict { path });
  }
  Ok(Some(SignatureTarget::File(path)))
}
