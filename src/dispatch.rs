// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Decide what an invocation does and drive the toolchain through it inside a scoped build directory
// role: orchestration/dispatch
// inputs: Options, a Toolchain, an output sink for stdout-bound text
// outputs: Outcome (exited early, signatures written, wrappers generated, compiled)
// side_effects: Creates/removes the build directory; writes the signature file; invokes toolchain operations
// invariants:
// - help/version/man/help-link never touch the filesystem
// - the signature conflict is detected before any toolchain call or file write
// - a signature request ends the run; nothing is compiled after it
// - an owned build directory is removed on every exit path
// errors: Conflict and Collaborator failures propagate unchanged; missing link resources only warn
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::build_dir::with_build_dir;
use crate::cli::{self, Action, Backend, Options, LINK_RESOURCES};
use crate::files::{classify, FileSet};
use crate::segregate::{segregate, FunctionFilters, CLOSE, ONLY, SKIP};
use crate::settings::{self, SignatureTarget};
use crate::toolchain::{BackendBuild, DistutilsBuild, ExtensionBuildSpec, ResourceInfo, Toolchain};
use crate::util;

/// How a run ended when it ended successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// Help, version, man page or resource listing was printed.
  Exited,
  SignaturesWritten(SignatureTarget),
  WrappersGenerated(Vec<PathBuf>),
  Compiled(Backend),
}

pub fn run(opts: &Options, toolchain: &dyn Toolchain, out: &mut dyn Write) -> Result<Outcome> {
  // Phase 1: short-circuit actions
  match &opts.action {
    Action::Help => {
      write!(out, "{}", cli::command().render_help())?;
      return Ok(Outcome::Exited);
    }
    Action::Version => {
      writeln!(out, "{}", cli::VERSION)?;
      return Ok(Outcome::Exited);
    }
    Action::GenMan => {
      write!(out, "{}", util::render_man_page(cli::command())?)?;
      return Ok(Outcome::Exited);
    }
    Action::HelpLink(names) => {
      help_link(names, toolchain, out)?;
      return Ok(Outcome::Exited);
    }
    Action::Build => {}
  }

  // Phase 2: split positional input
  let filters = segregate(&opts.positional);
  let files = classify(&filters.files);
  if !files.other.is_empty() {
    debug!("unclassified inputs: {:?}", files.other);
  }

  // Phase 3: everything else happens inside the build directory
  with_build_dir(opts.build_dir.as_deref(), opts.compile, |build_dir| {
    dispatch_in(opts, &filters, &files, build_dir, toolchain, out)
  })
}

fn dispatch_in(
  opts: &Options,
  filters: &FunctionFilters,
  files: &FileSet,
  build_dir: &Path,
  toolchain: &dyn Toolchain,
  out: &mut dyn Write,
) -> Result<Outcome> {
  let module = settings::resolve_module_name(opts, &files.pyf)?;
  let target = settings::resolve_signature_target(opts, build_dir)?;
  let wrapper_settings = settings::assemble(opts, filters, module.as_deref(), build_dir);
  if let Some(name) = &module {
    info!("module name: {}", name);
  }

  if opts.compile && opts.backend == Backend::Distutils {
    let mut extension = extension_spec(opts, files, module.as_deref(), f2py_options(opts, filters));
    link_resources(&mut extension, &opts.link_resource, toolchain)?;
    let build = DistutilsBuild {
      extension,
      build_dir: build_dir.to_path_buf(),
      setup_args: setup_args(opts, build_dir),
      settings: wrapper_settings,
    };
    toolchain.compile_distutils(&build)?;
    return Ok(Outcome::Compiled(Backend::Distutils));
  }

  let sources = files.fortran_sources();

  if let Some(target) = target {
    let text = toolchain.scan_signatures(&wrapper_settings, &sources)?;
    write_signatures(&target, &text, out)?;
    info!(
      "Stopping. Edit the signature file and then run f2py on the signature file: f2py {}",
      signature_label(&target)
    );
    return Ok(Outcome::SignaturesWritten(target));
  }

  let wrappers = toolchain.build_wrappers(&wrapper_settings, &sources)?;
  if !opts.compile {
    return Ok(Outcome::WrappersGenerated(wrappers));
  }
  if wrappers.is_empty() {
    warn!("no wrapper sources were generated, skipping {:?} compilation", opts.backend);
    return Ok(Outcome::WrappersGenerated(wrappers));
  }

  let build = BackendBuild {
    backend: opts.backend,
    module_name: module,
    include_dirs: opts.include_dirs.clone(),
    include_paths: opts.include_paths.clone(),
    external_resources: opts.link_resource.clone(),
    debug: opts.debug,
    sources,
    wrappers,
    build_dir: build_dir.to_path_buf(),
  };
  toolchain.compile_backend(&build)?;
  Ok(Outcome::Compiled(opts.backend))
}

fn signature_label(target: &SignatureTarget) -> String {
  match target {
    SignatureTarget::Stdout => "stdout".to_string(),
    SignatureTarget::File(p) => p.display().to_string(),
  }
}

fn write_signatures(target: &SignatureTarget, text: &str, out: &mut dyn Write) -> Result<()> {
  info!("Saving signatures to file {}", signature_label(target));
  match target {
    SignatureTarget::Stdout => out.write_all(text.as_bytes())?,
    SignatureTarget::File(path) => std::fs::write(path, text)
      .with_context(|| format!("writing signature file {}", path.display()))?,
  }
  Ok(())
}

/// Print whether each named resource (all known ones when none are named) resolves.
fn help_link(names: &[String], toolchain: &dyn Toolchain, out: &mut dyn Write) -> Result<()> {
  let all: Vec<String>;
  let names: &[String] = if names.is_empty() {
    all = LINK_RESOURCES.iter().map(|s| s.to_string()).collect();
    &all
  } else {
    names
  };

  for name in names {
    match toolchain.resolve_resource(name)? {
      Some(info) if !info.is_empty() => {
        writeln!(out, "{}:", name)?;
        write_resource(&info, out)?;
      }
      _ => writeln!(out, "{}:\n  NOT AVAILABLE", name)?,
    }
  }
  Ok(())
}

fn write_resource(info: &ResourceInfo, out: &mut dyn Write) -> Result<()> {
  let paths = |v: &[PathBuf]| v.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ");
  if !info.libraries.is_empty() {
    writeln!(out, "  libraries = {}", info.libraries.join(", "))?;
  }
  if !info.library_dirs.is_empty() {
    writeln!(out, "  library_dirs = {}", paths(&info.library_dirs))?;
  }
  if !info.include_dirs.is_empty() {
    writeln!(out, "  include_dirs = {}", paths(&info.include_dirs))?;
  }
  if !info.define_macros.is_empty() {
    let macros: Vec<String> = info
      .define_macros
      .iter()
      .map(|(k, v)| match v {
        Some(v) => format!("{}={}", k, v),
        None => k.clone(),
      })
      .collect();
    writeln!(out, "  define_macros = {}", macros.join(", "))?;
  }
  Ok(())
}

/// Generator flags the legacy compiler replays when it regenerates the wrappers.
pub fn f2py_options(opts: &Options, filters: &FunctionFilters) -> Vec<String> {
  let mut flags = vec![
    if opts.wrap_functions { "--wrap-functions" } else { "--no-wrap-functions" }.to_string(),
    if opts.lower { "--lower" } else { "--no-lower" }.to_string(),
  ];
  if !opts.debug_api.is_empty() {
    flags.push("--debug-capi".into());
  }
  if opts.quiet {
    flags.push("--quiet".into());
  }
  flags.push("--skip-empty-wrappers".into());
  for (sentinel, names) in [(SKIP, &filters.skip), (ONLY, &filters.only)] {
    if !names.is_empty() {
      flags.push(sentinel.into());
      flags.extend(names.iter().cloned());
      flags.push(CLOSE.into());
    }
  }
  if !opts.include_paths.is_empty() {
    flags.push("--include-paths".into());
    flags.extend(opts.include_paths.iter().map(|p| p.display().to_string()));
  }
  flags.push("--f2cmap".into());
  flags.push(opts.f2cmap.display().to_string());
  flags
}

/// `config_fc` arguments.
pub fn fortran_compiler_flags(opts: &Options) -> Vec<String> {
  let mut flags = Vec::new();
  if opts.help_fcompiler {
    flags.push("--help-fcompiler".to_string());
  }
  if let Some(p) = &opts.f77exec {
    flags.push(format!("--f77exec={}", p.display()));
  }
  if let Some(p) = &opts.f90exec {
    flags.push(format!("--f90exec={}", p.display()));
  }
  for (name, groups) in [
    ("f77flags", &opts.f77flags),
    ("f90flags", &opts.f90flags),
    ("arch", &opts.arch),
    ("opt", &opts.opt),
  ] {
    if !groups.is_empty() {
      flags.push(format!("--{}={}", name, util::join_groups(groups)));
    }
  }
  for (on, name) in [(opts.noopt, "--noopt"), (opts.noarch, "--noarch"), (opts.debug, "--debug")] {
    if on {
      flags.push(name.to_string());
    }
  }
  flags
}

/// `build_ext` arguments.
pub fn fortran_library_flags(opts: &Options) -> Vec<String> {
  let mut flags = Vec::new();
  if let Some(v) = &opts.fcompiler {
    flags.push(format!("--fcompiler={}", v));
  }
  if let Some(v) = &opts.compiler {
    flags.push(format!("--compiler={}", v));
  }
  flags
}

pub fn setup_args(opts: &Options, build_dir: &Path) -> Vec<String> {
  let dir = build_dir.display().to_string();
  let mut args: Vec<String> = vec![
    if opts.quiet { "--quiet" } else { "--verbose" }.into(),
    "build".into(),
    "--build-temp".into(),
    dir.clone(),
    "--build-base".into(),
    dir,
    "--build-platlib".into(),
    ".".into(),
    "--disable-optimization".into(),
  ];

  let fc = fortran_compiler_flags(opts);
  if !fc.is_empty() {
    args.push("config_fc".into());
    args.extend(fc);
  }
  let flib = fortran_library_flags(opts);
  if !flib.is_empty() {
    args.push("build_ext".into());
    args.extend(flib);
  }
  args
}

pub fn extension_spec(
  opts: &Options,
  files: &FileSet,
  module: Option<&str>,
  f2py_options: Vec<String>,
) -> ExtensionBuildSpec {
  ExtensionBuildSpec {
    name: module.unwrap_or(settings::FALLBACK_MODULE_NAME).to_string(),
    sources: files.pyf.iter().chain(&files.f77).chain(&files.f90).cloned().collect(),
    include_dirs: opts.include_dirs.iter().map(util::absolute).collect(),
    library_dirs: opts.library_path.iter().map(util::absolute).collect(),
    libraries: opts.library_name.clone(),
    define_macros: opts.define_macros.clone(),
    undef_macros: opts.undef_macros.clone(),
    extra_objects: files.objects.clone(),
    f2py_options,
  }
}

/// Merge each resolvable resource into `spec`; unresolvable ones are reported and skipped.
pub fn link_resources(spec: &mut ExtensionBuildSpec, names: &[String], toolchain: &dyn Toolchain) -> Result<()> {
  for name in names {
    match toolchain.resolve_resource(name)? {
      Some(info) if !info.is_empty() => {
        debug!("resource {}: {:?}", name, info);
        spec.merge_resource(info);
      }
      _ => warn!("No '{}' resources found in system (try `f2py --help-link`)", name),
    }
  }
  Ok(())
}
