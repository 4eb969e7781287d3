// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stable identity of this installation.

use std::path::{Path, PathBuf};

use lumen_core::LumenError;
use tracing::{info, warn};
use uuid::Uuid;

const DEVICE_FILE: &str = "device.txt";

/// Persistent installation id, stored under the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemId {
    id: Uuid,
    path: PathBuf,
}

impl SystemId {
    /// Reads `{data_dir}/device.txt`, creating it with a fresh id when it is
    /// missing or unreadable.
    pub fn load_or_create(data_dir: &Path) -> Result<Self, LumenError> {
        let path = data_dir.join(DEVICE_FILE);

        match std::fs::read_to_string(&path) {
            Ok(content) => match Uuid::parse_str(content.trim()) {
                Ok(id) => return Ok(Self { id, path }),
                Err(e) => warn!(path = %path.display(), error = %e, "device id is corrupt, regenerating"),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to read device id, regenerating"),
        }

        std::fs::create_dir_all(data_dir)?;
        let id = Uuid::new_v4();
        std::fs::write(&path, id.simple().to_string())?;
        info!(%id, "generated new system id");
        Ok(Self { id, path })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Display for SystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id.simple())
    }
}
