//! Filename resolution against the configuration directory.
//!
//! A filename is accepted only if it is a single plain path component:
//! no separators, no `.`/`..`, no absolute or drive prefix, no NUL byte.
//! Anything else is rejected before a filesystem call is made.

use std::path::{Component, Path, PathBuf};

use crate::error::AgentError;

/// A filename that has been checked to stay inside the config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigName(String);

impl ConfigName {
    /// Validate a raw filename taken from a request.
    pub fn parse(raw: &str) -> Result<Self, AgentError> {
        if raw.is_empty() || raw.contains('\0') || raw.contains('/') || raw.contains('\\') {
            return Err(AgentError::InvalidName(raw.to_string()));
        }

        let mut components = Path::new(raw).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == raw => Ok(Self(raw.to_string())),
            _ => Err(AgentError::InvalidName(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute location of this file under `dir`.
    pub fn resolve(&self, dir: &Path) -> PathBuf {
        dir.join(&self.0)
    }
}

impl std::fmt::Display for ConfigName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_names() {
        for name in ["app.conf", "default", ".hidden.conf", "a..b.conf"] {
            assert_eq!(ConfigName::parse(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn test_rejects_traversal_and_absolute_paths() {
        for name in [
            "",
            ".",
            "..",
            "../app.conf",
            "../../etc/passwd",
            "sub/../../x.conf",
            "/etc/nginx/nginx.conf",
            "sites/app.conf",
            "..\\win.conf",
            "C:\\nginx.conf",
            "nul\0.conf",
        ] {
            assert!(
                matches!(ConfigName::parse(name), Err(AgentError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_stays_in_dir() {
        let dir = Path::new("/etc/nginx/conf.d");
        let name = ConfigName::parse("app.conf").unwrap();
        let path = name.resolve(dir);
        assert_eq!(path, Path::new("/etc/nginx/conf.d/app.conf"));
        assert!(path.starts_with(dir));
    }
}
