// Copyright (c) 2026 gripflow contributors
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/gripflow/gripflow-rs

//! On-disk protocol library
//!
//! A protocol is a saved block design. Each one lives in its own JSON file
//! named `Protocol <n>.json` under the protocols directory; the library loads
//! them all eagerly and only ever appends new files, never rewriting an
//! existing one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::block::BlockName;
use crate::error::GripflowError;

/// A saved block design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    /// User-visible display name
    pub name: String,
    /// Who created it
    pub maker: String,
    /// The `(block, seconds)` design itself
    #[serde(rename = "_buffer")]
    pub buffer: Vec<(BlockName, f64)>,
}

/// Library of saved protocols, keyed by file stem (`Protocol 0`, `Protocol 1`, ...).
#[derive(Debug, Clone)]
pub struct ProtocolLibrary {
    dir: PathBuf,
    protocols: BTreeMap<String, Protocol>,
}

impl ProtocolLibrary {
    /// Open the library, creating the directory and loading every
    /// `Protocol*.json` inside it. Unreadable files are logged and skipped.
    pub fn open(dir: &Path) -> Result<Self, GripflowError> {
        fs::create_dir_all(dir)?;

        let mut protocols = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !path.is_file()
                || !file_name.starts_with("Protocol")
                || !file_name.ends_with(".json")
            {
                continue;
            }

            let key = file_name.trim_end_matches(".json").to_string();
            match fs::read_to_string(&path)
                .map_err(GripflowError::from)
                .and_then(|text| serde_json::from_str::<Protocol>(&text).map_err(Into::into))
            {
                Ok(protocol) => {
                    debug!("Loaded protocol {}: {:?}", key, protocol.name);
                    protocols.insert(key, protocol);
                }
                Err(e) => warn!("Skipping unreadable protocol file {:?}: {}", path, e),
            }
        }

        info!("Protocol library at {:?} holds {} protocols", dir, protocols.len());
        Ok(Self {
            dir: dir.to_path_buf(),
            protocols,
        })
    }

    /// Look up a protocol by key.
    pub fn get(&self, key: &str) -> Result<&Protocol, GripflowError> {
        self.protocols
            .get(key)
            .ok_or_else(|| GripflowError::UnknownProtocol(key.to_string()))
    }

    /// The block design stored under `key`.
    pub fn get_buffer(&self, key: &str) -> Result<&[(BlockName, f64)], GripflowError> {
        Ok(&self.get(key)?.buffer)
    }

    /// Save a new protocol under the first free `Protocol <n>` key and
    /// return that key. Existing files are never touched.
    pub fn save(
        &mut self,
        name: &str,
        maker: &str,
        buffer: Vec<(BlockName, f64)>,
    ) -> Result<String, GripflowError> {
        let n = (0..)
            .find(|n| !self.protocols.contains_key(&format!("Protocol {n}")))
            .unwrap_or(0);
        let key = format!("Protocol {n}");

        let protocol = Protocol {
            name: name.to_string(),
            maker: maker.to_string(),
            buffer,
        };

        let path = self.dir.join(format!("{key}.json"));
        fs::write(&path, serde_json::to_string_pretty(&protocol)?)?;
        info!("Saved protocol {} ({:?}) to {:?}", key, name, path);

        self.protocols.insert(key.clone(), protocol);
        Ok(key)
    }

    /// Keys of every loaded protocol, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.protocols.keys().map(String::as_str)
    }

    /// Number of loaded protocols
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    /// True when no protocols are loaded
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gripflow-protocols-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn design() -> Vec<(BlockName, f64)> {
        vec![
            (BlockName::Real, 60.0),
            (BlockName::Hide, 30.0),
            (BlockName::Fake, 60.0),
        ]
    }

    #[test]
    fn test_save_allocates_sequential_keys() {
        let dir = scratch_dir("keys");
        let mut lib = ProtocolLibrary::open(&dir).unwrap();
        assert!(lib.is_empty());

        assert_eq!(lib.save("first", "user", design()).unwrap(), "Protocol 0");
        assert_eq!(lib.save("second", "user", design()).unwrap(), "Protocol 1");
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn test_reload_round_trip() {
        let dir = scratch_dir("reload");
        let mut lib = ProtocolLibrary::open(&dir).unwrap();
        lib.save("baseline", "user", design()).unwrap();

        let reloaded = ProtocolLibrary::open(&dir).unwrap();
        let protocol = reloaded.get("Protocol 0").unwrap();
        assert_eq!(protocol.name, "baseline");
        assert_eq!(protocol.maker, "user");
        assert_eq!(protocol.buffer, design());
    }

    #[test]
    fn test_save_fills_gaps_without_touching_existing_files() {
        let dir = scratch_dir("gaps");
        let mut lib = ProtocolLibrary::open(&dir).unwrap();
        lib.save("a", "user", design()).unwrap();
        lib.save("b", "user", design()).unwrap();

        // Remove Protocol 0 on disk and reload: the gap gets reused
        fs::remove_file(dir.join("Protocol 0.json")).unwrap();
        let mut lib = ProtocolLibrary::open(&dir).unwrap();
        assert_eq!(lib.save("c", "user", design()).unwrap(), "Protocol 0");

        // Protocol 1 is untouched
        assert_eq!(lib.get("Protocol 1").unwrap().name, "b");
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let dir = scratch_dir("unknown");
        let lib = ProtocolLibrary::open(&dir).unwrap();
        assert!(matches!(
            lib.get_buffer("Protocol 99"),
            Err(GripflowError::UnknownProtocol(_))
        ));
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = scratch_dir("bad");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Protocol 7.json"), "{ nope").unwrap();

        let lib = ProtocolLibrary::open(&dir).unwrap();
        assert!(lib.is_empty());
    }
}
