use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
  /// Names no object type or property may use. Object names match exactly,
  /// property names match case-insensitively.
  pub reserved_names: Vec<String>,

  /// Skip top-level declarations whose name contains `(` or whose line
  /// contains `:=`. These are view definitions owned by a later stage.
  pub skip_derived_declarations: bool,
}

impl Default for CompileOptions {
  fn default() -> Self {
    Self {
      reserved_names: vec![],
      skip_derived_declarations: true,
    }
  }
}

impl CompileOptions {
  pub fn with_reserved_names<S: AsRef<str>>(reserved_names: &[S]) -> Self {
    Self {
      reserved_names: reserved_names
        .iter()
        .map(|x| x.as_ref().to_string())
        .collect(),
      ..Default::default()
    }
  }
}
