use predicates::prelude::*;
use std::path::PathBuf;

#[test]
fn signatures_to_stdout() {
  let td = test_support::toolchain_dir(&[(
    "scan-signatures",
    r#"cat > /dev/null; printf '%s\n' '{"signatures": "python module fib\n"}'"#,
  )]);
  test_support::cmd_bin("f2py")
    .current_dir(td.path())
    .env("F2PY_TOOLCHAIN", "sh")
    .args(["-h", "stdout", "fib.f"])
    .assert()
    .success()
    .stdout(predicate::str::diff("python module fib\n"));
}

#[test]
fn signatures_to_file_in_build_dir() {
  let td = test_support::toolchain_dir(&[(
    "scan-signatures",
    r#"cat > /dev/null; printf '%s\n' '{"signatures": "python module fib\n"}'"#,
  )]);
  test_support::cmd_bin("f2py")
    .current_dir(td.path())
    .env("F2PY_TOOLCHAIN", "sh")
    .env_remove("RUST_LOG")
    .args(["-b", "out", "-h", "fib.pyf", "fib.f"])
    .assert()
    .success()
    .stderr(predicate::str::contains("Saving signatures to file"));
  let written = std::fs::read_to_string(td.path().join("out/fib.pyf")).unwrap();
  assert_eq!(written, "python module fib\n");
}

#[test]
fn wrappers_are_requested_with_assembled_settings() {
  let td = test_support::toolchain_dir(&[(
    "build-wrappers",
    r#"cat > request.json; echo '{"wrappers": ["fibmodule.c"]}'"#,
  )]);
  test_support::cmd_bin("f2py")
    .current_dir(td.path())
    .env("F2PY_TOOLCHAIN", "sh")
    .args(["-m", "fib", "--lower", "-include<math.h>", "fib.f90", "fib.f", "only:", "fib", ":"])
    .assert()
    .success();

  let raw = std::fs::read_to_string(td.path().join("request.json")).unwrap();
  let request: serde_json::Value = serde_json::from_str(&raw).unwrap();
  assert_eq!(request["sources"], serde_json::json!(["fib.f", "fib.f90"]));
  assert_eq!(request["settings"]["scanner"]["only_funcs"], serde_json::json!(["fib"]));
  assert_eq!(request["settings"]["scanner"]["do_lower"], true);
  assert_eq!(request["settings"]["typemap"]["headers"], serde_json::json!(["<math.h>"]));
}

#[test]
fn failed_compile_removes_the_temporary_build_dir() {
  let td = test_support::toolchain_dir(&[(
    "compile-distutils",
    "cat > request.json; echo 'ld: cannot find -lfoo' >&2; exit 1",
  )]);
  test_support::cmd_bin("f2py")
    .current_dir(td.path())
    .env("F2PY_TOOLCHAIN", "sh")
    .args(["-c", "-lfoo", "fib.f90"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("ld: cannot find -lfoo"));

  let raw = std::fs::read_to_string(td.path().join("request.json")).unwrap();
  let request: serde_json::Value = serde_json::from_str(&raw).unwrap();
  let build_dir = PathBuf::from(request["build_dir"].as_str().unwrap());
  assert!(build_dir.is_absolute());
  assert!(!build_dir.exists());
  assert_eq!(request["extension"]["name"], "unititled");
  assert_eq!(request["extension"]["libraries"], serde_json::json!(["foo"]));
}

#[test]
fn distutils_compile_request_carries_the_settings_bundles() {
  let td = test_support::toolchain_dir(&[("compile-distutils", "cat > request.json")]);
  test_support::cmd_bin("f2py")
    .current_dir(td.path())
    .env("F2PY_TOOLCHAIN", "sh")
    .args(["-c", "--rest-doc", "-include<math.h>", "--f77flags=-g -O0", "-m", "fib", "fib.f90"])
    .assert()
    .success();

  let raw = std::fs::read_to_string(td.path().join("request.json")).unwrap();
  let request: serde_json::Value = serde_json::from_str(&raw).unwrap();
  assert_eq!(request["settings"]["typemap"]["headers"], serde_json::json!(["<math.h>"]));
  assert_eq!(request["settings"]["rules"]["do_rest_doc"], true);
  assert_eq!(request["settings"]["rules"]["module"], "fib");
  assert_eq!(request["extension"]["sources"], serde_json::json!(["fib.f90"]));
  let setup_args: Vec<String> = serde_json::from_value(request["setup_args"].clone()).unwrap();
  assert!(setup_args.iter().any(|a| a == "--f77flags=-g -O0"), "{setup_args:?}");
}

#[test]
fn help_link_reports_resolution() {
  let td = test_support::toolchain_dir(&[(
    "resolve-resource",
    r#"read -r req; case "$req" in *lapack*) echo '{"resource": {"libraries": ["lapack"]}}';; *) echo '{"resource": null}';; esac"#,
  )]);
  test_support::cmd_bin("f2py")
    .current_dir(td.path())
    .env("F2PY_TOOLCHAIN", "sh")
    .args(["--help-link", "lapack", "blas"])
    .assert()
    .success()
    .stdout(predicate::str::contains("lapack:\n  libraries = lapack"))
    .stdout(predicate::str::contains("blas:\n  NOT AVAILABLE"));
}
