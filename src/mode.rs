use serde::{Deserialize, Serialize};

/// Input mode of the client. Key chords from the config keymap are looked up
/// per mode, so a binding like quit can exist in `Navigation` without ever
/// being visible to a focused text field.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
  #[default]
  Navigation,
  Insert,
  Visual,
}

impl std::fmt::Display for Mode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
    match self {
      Self::Navigation => write!(f, "NAV"),
      Self::Insert => write!(f, "INSERT"),
      Self::Visual => write!(f, "VISUAL"),
    }
  }
}
