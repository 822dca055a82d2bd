use std::path::Path;

const F77_EXT: &[&str] = &["f", "for", "ftn", "f77"];
const F90_EXT: &[&str] = &["f90", "f95", "f03", "f08"];
const PYF_EXT: &[&str] = &["pyf", "src"];
const OBJ_EXT: &[&str] = &["o", "out", "so", "a"];

/// Input files partitioned by role. Order within each bucket follows the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
  pub f77: Vec<String>,
  pub f90: Vec<String>,
  pub pyf: Vec<String>,
  pub objects: Vec<String>,
  pub other: Vec<String>,
}

impl FileSet {
  /// Fortran sources handed to the scanner: fixed form first, then free form.
  pub fn fortran_sources(&self) -> Vec<String> {
    self.f77.iter().chain(&self.f90).cloned().collect()
  }
}

/// Suffix as `Path::extension` sees it (`a.f90` -> `f90`, `.f90` -> none).
fn extension(file: &str) -> Option<&str> {
  Path::new(file).extension().and_then(|e| e.to_str())
}

/// `name.pyf.src` counts as a signature source; any other `.src` does not.
fn is_pyf_template(file: &str) -> bool {
  Path::new(file)
    .file_stem()
    .and_then(|s| s.to_str())
    .is_some_and(|stem| stem.ends_with(".pyf"))
}

/// Partition `files` into the five role buckets by case-sensitive extension.
pub fn classify(files: &[String]) -> FileSet {
  let mut set = FileSet::default();

  for file in files {
    let bucket = match extension(file) {
      Some(ext) if F77_EXT.contains(&ext) => &mut set.f77,
      Some(ext) if F90_EXT.contains(&ext) => &mut set.f90,
      Some(ext) if OBJ_EXT.contains(&ext) => &mut set.objects,
      Some("src") if !is_pyf_template(file) => &mut set.other,
      Some(ext) if PYF_EXT.contains(&ext) => &mut set.pyf,
      _ => &mut set.other,
    };
    bucket.push(file.clone());
  }
  set
}
