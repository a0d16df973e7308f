//! The opaque firmware capability.
//!
//! Drivers only know firmware images by symbolic identifier; where the
//! bytes actually come from (a bundle, a directory, a download cache) is
//! the host's business.

use anyhow::Context;
use std::fmt::Formatter;
use std::fs;
use std::path::PathBuf;

/// Symbolic name of a firmware image, e.g. `dvb-demod-si2168-b40-01.fw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FirmwareId(pub &'static str);

impl std::fmt::Display for FirmwareId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait FirmwareProvider: Send + Sync {
    fn fetch(&self, id: FirmwareId) -> anyhow::Result<Vec<u8>>;
}

/// Serves firmware images straight out of `<root>/<id>`.
pub struct FirmwareDirectory {
    root: PathBuf,
}

impl FirmwareDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FirmwareProvider for FirmwareDirectory {
    fn fetch(&self, id: FirmwareId) -> anyhow::Result<Vec<u8>> {
        let path = self.root.join(id.0);
        fs::read(&path).with_context(|| format!("unable to load firmware from {}", path.display()))
    }
}
