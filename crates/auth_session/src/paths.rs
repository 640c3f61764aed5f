use std::path::{Path, PathBuf};

pub const IDENTITY_DIR: &str = ".agent_ui";
pub const IDENTITY_FILE: &str = "identity.json";

#[must_use]
pub fn default_identity_path(root: &Path) -> PathBuf {
    root.join(IDENTITY_DIR).join(IDENTITY_FILE)
}
