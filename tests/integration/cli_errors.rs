use predicates::prelude::*;

#[test]
fn unknown_link_resource_fails_before_any_side_effect() {
  let td = test_support::tempdir();
  let build = td.path().join("build");
  test_support::cmd_bin("f2py")
    .env("F2PY_TOOLCHAIN", "definitely-not-an-f2py-toolchain")
    .args(["-c", "--link-lapack", "--link-bogus", "-b"])
    .arg(&build)
    .arg("a.f90")
    .assert()
    .failure()
    .stderr(predicate::str::contains("bogus"))
    .stderr(predicate::str::contains("lapack"));
  assert!(!build.exists());
}

#[test]
fn unknown_backend_lists_the_choices() {
  test_support::cmd_bin("f2py")
    .args(["-c", "--backend", "cmake", "a.f90"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("cmake"))
    .stderr(predicate::str::contains("meson"));
}

#[test]
fn missing_value_is_reported() {
  test_support::cmd_bin("f2py")
    .args(["a.f", "-m"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("-m"));
}

#[test]
fn existing_signature_file_is_kept() {
  let td = test_support::tempdir();
  let sig = test_support::write_file(td.path(), "sig.pyf", "python module keep\n");

  test_support::cmd_bin("f2py")
    .env("F2PY_TOOLCHAIN", "definitely-not-an-f2py-toolchain")
    .arg("-b")
    .arg(td.path())
    .args(["-h", "sig.pyf", "a.f"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--overwrite-signature"))
    .stderr(predicate::str::contains("toolchain").not());

  assert_eq!(std::fs::read_to_string(&sig).unwrap(), "python module keep\n");
}

#[test]
fn missing_toolchain_is_a_collaborator_failure() {
  test_support::cmd_bin("f2py")
    .env("F2PY_TOOLCHAIN", "definitely-not-an-f2py-toolchain")
    .args(["-c", "a.f90"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("toolchain compile-distutils failed"));
}
