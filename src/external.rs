// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Toolchain implementation that delegates every operation to an external program over JSON
// role: collaborator/subprocess bridge
// inputs: F2PY_TOOLCHAIN (program name), serialized requests
// outputs: Deserialized replies (signature text, wrapper paths, resource info)
// side_effects: Spawns `<program> <operation>` once per call; the child may write into the build directory
// invariants:
// - one request document on stdin, one reply document on stdout
// - a non-zero exit is always an F2pyError::Collaborator carrying the operation and stderr
// - compile operations ignore stdout
// errors: spawn failures, non-zero exits and unread requests map to Collaborator; malformed replies carry context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::F2pyError;
use crate::settings::WrapperSettings;
use crate::toolchain::{BackendBuild, DistutilsBuild, ResourceInfo, Toolchain};

pub const TOOLCHAIN_ENV: &str = "F2PY_TOOLCHAIN";
pub const DEFAULT_TOOLCHAIN: &str = "f2py-toolchain";

#[derive(Serialize)]
struct ScanRequest<'a> {
  settings: &'a WrapperSettings,
  sources: &'a [String],
}

#[derive(Deserialize)]
struct SignatureReply {
  signatures: String,
}

#[derive(Deserialize)]
struct WrapperReply {
  #[serde(default)]
  wrappers: Vec<PathBuf>,
}

#[derive(Serialize)]
struct ResourceRequest<'a> {
  name: &'a str,
}

#[derive(Deserialize)]
struct ResourceReply {
  #[serde(default)]
  resource: Option<ResourceInfo>,
}

#[derive(Debug, Clone)]
pub struct ExternalToolchain {
  program: String,
  args: Vec<String>,
}

impl ExternalToolchain {
  pub fn new(program: impl Into<String>) -> Self {
    Self { program: program.into(), args: Vec::new() }
  }

  /// Arguments placed before the operation name.
  #[cfg(test)]
  pub fn with_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args = args.into_iter().map(Into::into).collect();
    self
  }

  /// Program named by `F2PY_TOOLCHAIN`, or `f2py-toolchain` from `PATH`.
  pub fn from_env() -> Self {
    let program = std::env::var(TOOLCHAIN_ENV)
      .ok()
      .filter(|p| !p.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_TOOLCHAIN.to_string());
    Self::new(program)
  }

  #[cfg(test)]
  pub fn program(&self) -> &str {
    &self.program
  }

  fn collaborator(operation: &str, message: impl Into<String>) -> anyhow::Error {
    F2pyError::Collaborator { operation: operation.to_string(), message: message.into() }.into()
  }

  /// Run `<program> [args..] <operation>` with `request` on stdin; return raw stdout.
  fn run<Req: Serialize>(&self, operation: &str, request: &Req) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(request)
      .with_context(|| format!("serializing {} request", operation))?;
    debug!("{} {:?} {} ({} bytes)", self.program, self.args, operation, payload.len());

    let mut child = Command::new(&self.program)
      .args(&self.args)
      .arg(operation)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|e| Self::collaborator(operation, format!("spawning {}: {}", self.program, e)))?;

    // stdin is fed from its own thread while stdout/stderr drain, so a large
    // request never waits on a child blocked writing a large reply.
    let stdin = child.stdin.take();
    let (written, out) = std::thread::scope(|scope| {
      let writer = scope.spawn(move || match stdin {
        Some(mut stdin) => stdin.write_all(&payload),
        None => Ok(()),
      });
      let out = child.wait_with_output();
      let written = writer
        .join()
        .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
      (written, out)
    });
    let out = out.with_context(|| format!("waiting for {} {}", self.program, operation))?;

    let stderr = String::from_utf8_lossy(&out.stderr);
    if !out.status.success() {
      let message = match stderr.trim() {
        "" => format!("{} exited with {}", self.program, out.status),
        s => s.to_string(),
      };
      return Err(Self::collaborator(operation, message));
    }
    if let Err(e) = written {
      return Err(Self::collaborator(
        operation,
        format!("{} did not read the whole request: {}", self.program, e),
      ));
    }
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
      info!("{}", line);
    }
    Ok(out.stdout)
  }

  fn call<Req: Serialize, Resp: DeserializeOwned>(&self, operation: &str, request: &Req) -> Result<Resp> {
    let stdout = self.run(operation, request)?;
    serde_json::from_slice(&stdout)
      .with_context(|| format!("parsing {} reply from {}", operation, self.program))
  }
}

impl Toolchain for ExternalToolchain {
  fn scan_signatures(&self, settings: &WrapperSettings, sources: &[String]) -> Result<String> {
    let reply: SignatureReply = self.call("scan-signatures", &ScanRequest { settings, sources })?;
    Ok(reply.signatures)
  }

  fn build_wrappers(&self, settings: &WrapperSettings, sources: &[String]) -> Result<Vec<PathBuf>> {
    let reply: WrapperReply = self.call("build-wrappers", &ScanRequest { settings, sources })?;
    Ok(reply.wrappers)
  }

  fn resolve_resource(&self, name: &str) -> Result<Option<ResourceInfo>> {
    let reply: ResourceReply = self.call("resolve-resource", &ResourceRequest { name })?;
    Ok(reply.resource)
  }

  fn compile_distutils(&self, build: &DistutilsBuild) -> Result<()> {
    self.run("compile-distutils", build).map(|_| ())
  }

  fn compile_backend(&self, build: &BackendBuild) -> Result<()> {
    self.run("compile-backend", build).map(|_| ())
  }
}
