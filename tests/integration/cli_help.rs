use predicates::prelude::*;

#[test]
fn help_lists_the_flag_table() {
  test_support::cmd_bin("f2py")
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("--hint-signature"))
    .stdout(predicate::str::contains("--link-<resource>"))
    .stdout(predicate::str::contains("skip: <names> :"));
}

#[test]
fn version_is_dash_v() {
  test_support::cmd_bin("f2py")
    .arg("-v")
    .assert()
    .success()
    .stdout(predicate::str::diff(format!("{}\n", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn help_wins_over_build_flags() {
  let td = test_support::tempdir();
  let build = td.path().join("never");
  test_support::cmd_bin("f2py")
    .args(["-c", "-b"])
    .arg(&build)
    .args(["--help", "a.f"])
    .assert()
    .success();
  assert!(!build.exists());
}

#[test]
fn gen_man_outputs_troff() {
  let out = test_support::cmd_bin("f2py").arg("--gen-man").output().unwrap();
  assert!(out.status.success());
  let text = String::from_utf8_lossy(&out.stdout);
  assert!(text.starts_with(".TH"), "expected troff man header");
}
