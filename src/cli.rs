use std::path::PathBuf;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use serde::{Deserialize, Serialize};

use crate::flags::{self, FlagKind, FlagSpec, ParsedArgs};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Numerical-library resources accepted by `--link-<resource>` and `--help-link`.
pub const LINK_RESOURCES: &[&str] = &[
  "atlas", "atlas_threads", "atlas_blas", "atlas_blas_threads",
  "lapack_atlas", "lapack_atlas_threads", "atlas_3_10",
  "atlas_3_10_threads", "atlas_3_10_blas", "atlas_3_10_blas_threads",
  "lapack_atlas_3_10", "lapack_atlas_3_10_threads", "flame", "mkl",
  "openblas", "openblas_lapack", "openblas_clapack", "blis",
  "lapack_mkl", "blas_mkl", "accelerate", "openblas64_",
  "openblas64__lapack", "openblas_ilp64", "openblas_ilp64_lapack",
  "x11", "fft_opt", "fftw", "fftw2", "fftw3", "dfftw", "sfftw",
  "fftw_threads", "dfftw_threads", "sfftw_threads", "djbfft", "blas",
  "lapack", "lapack_src", "blas_src", "numpy", "f2py", "Numeric",
  "numeric", "numarray", "numerix", "lapack_opt", "lapack_ilp64_opt",
  "lapack_ilp64_plain_opt", "lapack64__opt", "blas_opt",
  "blas_ilp64_opt", "blas_ilp64_plain_opt", "blas64__opt",
  "boost_python", "agg2", "wx", "gdk_pixbuf_xlib_2",
  "gdk-pixbuf-xlib-2.0", "gdk_pixbuf_2", "gdk-pixbuf-2.0", "gdk",
  "gdk_2", "gdk-2.0", "gdk_x11_2", "gdk-x11-2.0", "gtkp_x11_2",
  "gtk+-x11-2.0", "gtkp_2", "gtk+-2.0", "xft", "freetype2", "umfpack",
  "amd",
];

pub const DEBUG_APIS: &[&str] = &["capi"];

pub const C_COMPILERS: &[&str] = &["bcpp", "cygwin", "mingw32", "msvc", "unix"];

pub const FORTRAN_COMPILERS: &[&str] = &[
  "absoft", "arm", "compaq", "compaqv", "flang", "fujitsu", "g95", "gnu",
  "gnu95", "hpux", "ibm", "intel", "intele", "intelem", "intelev", "intelv",
  "intelvem", "lahey", "mips", "nag", "nagfor", "none", "nv", "pathf95",
  "pg", "sun", "vast",
];

pub const BACKENDS: &[&str] = &["meson", "distutils"];

const fn flag(
  dest: &'static str,
  names: &'static [&'static str],
  kind: FlagKind,
  metavar: Option<&'static str>,
  help: &'static str,
) -> FlagSpec {
  FlagSpec { dest, names, kind, metavar, help, hidden: false }
}

const SWITCH: FlagKind = FlagKind::Switch;
const ONE: FlagKind = FlagKind::Single { default: None };

/// The f2py command line, one row per destination.
pub static FLAGS: &[FlagSpec] = &[
  flag("help", &["--help"], SWITCH, None, "Print the help"),
  flag("version", &["-v"], SWITCH, None, "Print f2py version ID and exit."),
  FlagSpec {
    dest: "gen_man",
    names: &["--gen-man"],
    kind: SWITCH,
    metavar: None,
    help: "Emit a troff man page to stdout",
    hidden: true,
  },
  flag(
    "module",
    &["-m", "--module"],
    ONE,
    Some("<modulename>"),
    "Name of the module; f2py generates a Python/C API file <modulename>module.c or extension module <modulename>.",
  ),
  flag(
    "lower",
    &["--lower", "--no-lower"],
    FlagKind::BoolPair { default: false },
    None,
    "Do [not] lower the cases in <fortran files>.",
  ),
  flag(
    "build_dir",
    &["-b", "--build-dir"],
    ONE,
    Some("<dirname>"),
    "All f2py generated files are created in <dirname>. Default is a temporary directory when compiling.",
  ),
  flag(
    "overwrite_signature",
    &["-o", "--overwrite-signature"],
    SWITCH,
    None,
    "Overwrite existing signature file.",
  ),
  flag(
    "latex_doc",
    &["--latex-doc", "--no-latex-doc"],
    FlagKind::BoolPair { default: false },
    None,
    "Create (or not) <modulename>module.tex. Default is --no-latex-doc.",
  ),
  flag(
    "short_latex",
    &["--short-latex"],
    SWITCH,
    None,
    "Create 'incomplete' LaTeX document (without commands \\documentclass, \\tableofcontents, and \\begin{document}, \\end{document}).",
  ),
  flag(
    "rest_doc",
    &["--rest-doc", "--no-rest-doc"],
    FlagKind::BoolPair { default: false },
    None,
    "Create (or not) <modulename>module.rst. Default is --no-rest-doc.",
  ),
  flag(
    "debug_api",
    &[],
    FlagKind::AllowListed { prefix: "--debug-", what: "debug API", allowed: DEBUG_APIS },
    Some("--debug-capi"),
    "Create C/API code that reports the state of the wrappers during runtime. Useful for debugging.",
  ),
  flag(
    "wrap_functions",
    &["--wrap-functions", "--no-wrap-functions"],
    FlagKind::BoolPair { default: true },
    None,
    "Create (or not) Fortran subroutine wrappers to Fortran 77 functions. Default is --wrap-functions.",
  ),
  flag(
    "include_paths",
    &["--include-paths"],
    FlagKind::PathList,
    Some("<path1>:<path2>"),
    "Search include files from the given directories.",
  ),
  flag(
    "help_link",
    &["--help-link"],
    FlagKind::ExtendChoices { what: "link resource", choices: LINK_RESOURCES },
    Some(".."),
    "List system resources found by the toolchain. [..] is an optional list of resource names.",
  ),
  flag(
    "f2cmap",
    &["--f2cmap"],
    FlagKind::Single { default: Some(".f2py_f2cmap") },
    Some("<filename>"),
    "Load Fortran-to-Python KIND specification from the given file. Default: .f2py_f2cmap in current directory.",
  ),
  flag("quiet", &["--quiet"], SWITCH, None, "Run quietly."),
  flag(
    "verbose",
    &["--verbose"],
    FlagKind::BoolPair { default: true },
    None,
    "Run with extra verbosity.",
  ),
  flag(
    "hint_signature",
    &["-h", "--hint-signature"],
    ONE,
    Some("<filename>"),
    "Write signatures of the fortran routines to file <filename> and exit. If <filename> is stdout or - the signatures are printed to stdout.",
  ),
  flag("compile", &["-c"], SWITCH, None, "Compile the extension module."),
  flag(
    "fcompiler",
    &["--fcompiler"],
    FlagKind::Choice { what: "Fortran compiler", choices: FORTRAN_COMPILERS, default: None },
    Some("<vendor>"),
    "Specify Fortran compiler type by vendor",
  ),
  flag(
    "compiler",
    &["--compiler"],
    FlagKind::Choice { what: "C compiler", choices: C_COMPILERS, default: None },
    Some("<type>"),
    "Specify distutils C compiler type",
  ),
  flag(
    "help_fcompiler",
    &["--help-fcompiler"],
    SWITCH,
    None,
    "List available Fortran compilers and exit",
  ),
  flag("f77exec", &["--f77exec"], ONE, Some("<path>"), "Specify the path to a F77 compiler"),
  flag("f90exec", &["--f90exec"], ONE, Some("<path>"), "Specify the path to a F90 compiler"),
  flag("f77flags", &["--f77flags"], FlagKind::SpaceSplit, Some("<flags>"), "Specify F77 compiler flags"),
  flag("f90flags", &["--f90flags"], FlagKind::SpaceSplit, Some("<flags>"), "Specify F90 compiler flags"),
  flag(
    "opt",
    &["--opt", "--optimization_flags"],
    FlagKind::SpaceSplit,
    Some("<flags>"),
    "Specify optimization flags",
  ),
  flag(
    "arch",
    &["--arch", "--architecture_optimizations"],
    FlagKind::SpaceSplit,
    Some("<flags>"),
    "Specify architecture specific optimization flags",
  ),
  flag("noopt", &["--noopt"], SWITCH, None, "Compile without optimization"),
  flag("noarch", &["--noarch"], SWITCH, None, "Compile without arch-dependent optimization"),
  flag("debug", &["--debug"], SWITCH, None, "Compile with debugging information"),
  flag(
    "library_path",
    &["-L", "--library-path"],
    FlagKind::Extend,
    Some("/path/to/lib/"),
    "Path to library",
  ),
  flag("undef_macros", &["-U"], FlagKind::Extend, Some("MACRO"), "Undefined macros"),
  flag("define_macros", &["-D"], FlagKind::Macro, Some("MACRO[=value]"), "Define macros"),
  flag(
    "library_name",
    &["-l", "--library_name"],
    FlagKind::Extend,
    Some("<libname>"),
    "Library name",
  ),
  flag(
    "include_dirs",
    &["-I", "--include_dirs"],
    FlagKind::Extend,
    Some("/path/to/include"),
    "Include directories",
  ),
  flag(
    "link_resource",
    &[],
    FlagKind::AllowListed { prefix: "--link-", what: "link resource", allowed: LINK_RESOURCES },
    Some("--link-<resource>"),
    "Link the extension module with <resource> as resolved by the toolchain.",
  ),
  flag(
    "backend",
    &["--backend"],
    FlagKind::Choice { what: "backend", choices: BACKENDS, default: Some("distutils") },
    Some("{meson,distutils}"),
    "Build backend used with -c. Default is distutils.",
  ),
];

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  Meson,
  Distutils,
}

impl Backend {
  fn from_name(name: &str) -> Self {
    match name {
      "meson" => Backend::Meson,
      _ => Backend::Distutils,
    }
  }
}

/// What the invocation was asked to do before any build work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Help,
  Version,
  GenMan,
  HelpLink(Vec<String>),
  Build,
}

/// Typed view over `ParsedArgs`, the configuration every later phase reads.
#[derive(Debug, Clone)]
pub struct Options {
  pub action: Action,
  pub module: Option<String>,
  pub lower: bool,
  pub build_dir: Option<PathBuf>,
  pub hint_signature: Option<PathBuf>,
  pub overwrite_signature: bool,
  pub latex_doc: bool,
  pub short_latex: bool,
  pub rest_doc: bool,
  pub debug_api: Vec<String>,
  pub wrap_functions: bool,
  pub include_paths: Vec<PathBuf>,
  pub f2cmap: PathBuf,
  pub quiet: bool,
  pub verbose: bool,
  pub compile: bool,
  pub backend: Backend,
  pub fcompiler: Option<String>,
  pub compiler: Option<String>,
  pub help_fcompiler: bool,
  pub f77exec: Option<PathBuf>,
  pub f90exec: Option<PathBuf>,
  pub f77flags: Vec<Vec<String>>,
  pub f90flags: Vec<Vec<String>>,
  pub opt: Vec<Vec<String>>,
  pub arch: Vec<Vec<String>>,
  pub noopt: bool,
  pub noarch: bool,
  pub debug: bool,
  pub library_path: Vec<PathBuf>,
  pub undef_macros: Vec<String>,
  pub define_macros: Vec<(String, Option<String>)>,
  pub library_name: Vec<String>,
  pub include_dirs: Vec<PathBuf>,
  pub link_resource: Vec<String>,
  /// Positional tokens, sentinels included.
  pub positional: Vec<String>,
  /// Unrecognized dash-tokens, e.g. `-include<header>`.
  pub remainder: Vec<String>,
}

#[cfg(test)]
impl Options {
  /// Options with every flag at its default and no positional input.
  pub fn defaults() -> Self {
    let parsed = flags::parse(&[], FLAGS).unwrap_or_default();
    normalize(&parsed)
  }
}

/// Interpret argv (program name excluded) into `Options`.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<Options> {
  let tokens: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
  let parsed = flags::parse(&tokens, FLAGS)?;
  Ok(normalize(&parsed))
}

fn to_paths(items: &[String]) -> Vec<PathBuf> {
  items.iter().map(PathBuf::from).collect()
}

pub fn normalize(p: &ParsedArgs) -> Options {
  let action = if p.flag("help") {
    Action::Help
  } else if p.flag("version") {
    Action::Version
  } else if p.flag("gen_man") {
    Action::GenMan
  } else if p.seen("help_link") {
    Action::HelpLink(p.list("help_link").to_vec())
  } else {
    Action::Build
  };

  Options {
    action,
    module: p.value("module").map(str::to_string),
    lower: p.flag("lower"),
    build_dir: p.value("build_dir").map(PathBuf::from),
    hint_signature: p.value("hint_signature").map(PathBuf::from),
    overwrite_signature: p.flag("overwrite_signature"),
    latex_doc: p.flag("latex_doc"),
    short_latex: p.flag("short_latex"),
    rest_doc: p.flag("rest_doc"),
    debug_api: p.list("debug_api").to_vec(),
    wrap_functions: p.flag("wrap_functions"),
    include_paths: p.paths("include_paths").to_vec(),
    f2cmap: PathBuf::from(p.value("f2cmap").unwrap_or(".f2py_f2cmap")),
    quiet: p.flag("quiet"),
    verbose: p.flag("verbose"),
    compile: p.flag("compile"),
    backend: Backend::from_name(p.value("backend").unwrap_or("distutils")),
    fcompiler: p.value("fcompiler").map(str::to_string),
    compiler: p.value("compiler").map(str::to_string),
    help_fcompiler: p.flag("help_fcompiler"),
    f77exec: p.value("f77exec").map(PathBuf::from),
    f90exec: p.value("f90exec").map(PathBuf::from),
    f77flags: p.groups("f77flags").to_vec(),
    f90flags: p.groups("f90flags").to_vec(),
    opt: p.groups("opt").to_vec(),
    arch: p.groups("arch").to_vec(),
    noopt: p.flag("noopt"),
    noarch: p.flag("noarch"),
    debug: p.flag("debug"),
    library_path: to_paths(p.list("library_path")),
    undef_macros: p.list("undef_macros").to_vec(),
    define_macros: p.macros("define_macros").to_vec(),
    library_name: p.list("library_name").to_vec(),
    include_dirs: to_paths(p.list("include_dirs")),
    link_resource: p.list("link_resource").to_vec(),
    positional: p.positional.clone(),
    remainder: p.remainder.clone(),
  }
}

/// Help/man rendering of the flag table. Parsing never goes through clap.
pub fn command() -> Command {
  let mut cmd = Command::new("f2py")
    .version(VERSION)
    .about(
      "Generate a Python C/API file (<modulename>module.c) that wraps the given Fortran \
       functions so they can be called from Python.\n\n\
       With the -c option the corresponding extension modules are built.",
    )
    .disable_help_flag(true)
    .disable_version_flag(true)
    .after_help(
      "Positional sublists:\n  skip: <names> :   Ignore fortran functions that follow until `:'.\n  \
       only: <names> :   Use only fortran functions that follow until `:'.\n\n\
       Using the following macros may be required with non-gcc Fortran compilers:\n  \
       -DPREPEND_FORTRAN -DNO_APPEND_FORTRAN -DUPPERCASE_FORTRAN -DUNDERSCORE_G77\n\n\
       Environment:\n  F2PY_TOOLCHAIN   program implementing the scan/generate/compile operations\n  \
       RUST_LOG         log filter (default: info, warn with --quiet)",
    )
    .arg(
      Arg::new("fortran_files")
        .value_name("<fortran files>")
        .num_args(0..)
        .action(ArgAction::Append)
        .help("Paths to fortran/signature files that will be scanned for <fortran functions> in order to determine their signatures."),
    );

  for spec in FLAGS {
    cmd = cmd.arg(spec_arg(spec));
  }
  cmd
}

fn spec_arg(spec: &FlagSpec) -> Arg {
  let mut arg = Arg::new(spec.dest).help(spec.help).hide(spec.hidden);

  let mut longs = spec.names.iter().filter_map(|n| n.strip_prefix("--"));
  let shorts = spec
    .names
    .iter()
    .filter(|n| !n.starts_with("--"))
    .filter_map(|n| n.strip_prefix('-'))
    .filter_map(|n| n.chars().next());

  match spec.kind {
    FlagKind::AllowListed { .. } => {
      // Rendered as a single pseudo-flag named by its metavar.
      let name = spec.metavar.unwrap_or(spec.dest).trim_start_matches('-');
      return arg.long(name).action(ArgAction::SetTrue);
    }
    _ => {
      if let Some(long) = longs.next() {
        arg = arg.long(long);
      }
      for alias in longs {
        arg = arg.visible_alias(alias);
      }
      for (i, short) in shorts.enumerate() {
        arg = if i == 0 { arg.short(short) } else { arg.visible_short_alias(short) };
      }
    }
  }

  match spec.kind.arity() {
    flags::Arity::Zero => arg.action(ArgAction::SetTrue),
    _ => {
      arg = arg.action(ArgAction::Append);
      if let Some(m) = spec.metavar {
        arg = arg.value_name(m);
      }
      arg
    }
  }
}
