//! Decoding of uploaded package archives.
//!
//! A package archive is a ZIP file with the following layout, optionally
//! wrapped in a single top-level directory:
//!
//! ```text
//! package.toml   descriptor (required)
//! image.tar      deployable image (required)
//! ui.zip         UI asset bundle (required)
//! *.sql          schema init/upgrade scripts (optional)
//! ```
//!
//! Everything else is ignored. Extraction happens fully in memory.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use tracing::debug;

use super::error::RegistryError;

pub const DESCRIPTOR_ENTRY: &str = "package.toml";
pub const IMAGE_ENTRY: &str = "image.tar";
pub const UI_ENTRY: &str = "ui.zip";

/// Resource-fork tree added by the macOS archiver.
const MACOS_METADATA_DIR: &str = "__MACOSX/";

/// Maximum decompressed size per entry (512 MB).
const MAX_DECOMPRESSED_ENTRY_SIZE: u64 = 512 * 1024 * 1024;

/// Maximum total decompressed size across all kept entries (2048 MB).
const MAX_TOTAL_DECOMPRESSED_SIZE: u64 = 2048 * 1024 * 1024;

/// Named payloads pulled out of a package archive. Contents are not interpreted.
#[derive(Debug)]
pub struct PackageArchive {
    pub descriptor: Vec<u8>,
    pub image: Vec<u8>,
    pub ui: Vec<u8>,
    /// SQL scripts keyed by file name.
    pub sql_scripts: BTreeMap<String, Vec<u8>>,
}

impl PackageArchive {
    pub fn has_sql_script(&self, file_name: &str) -> bool {
        self.sql_scripts.contains_key(file_name)
    }
}

enum EntryKind {
    Descriptor,
    Image,
    Ui,
    Sql(String),
}

fn classify(name: &str) -> Option<EntryKind> {
    match name {
        DESCRIPTOR_ENTRY => Some(EntryKind::Descriptor),
        IMAGE_ENTRY => Some(EntryKind::Image),
        UI_ENTRY => Some(EntryKind::Ui),
        _ if !name.contains('/') && name.len() > 4 && name.ends_with(".sql") => {
            Some(EntryKind::Sql(name.to_string()))
        }
        _ => None,
    }
}

/// Returns the directory every entry lives under, if there is exactly one.
fn common_root(names: &[String]) -> Option<String> {
    let mut root: Option<&str> = None;
    for name in names {
        let (dir, _) = name.split_once('/')?;
        match root {
            None => root = Some(dir),
            Some(r) if r == dir => {}
            Some(_) => return None,
        }
    }
    root.map(|r| format!("{r}/"))
}

/// Decode `data` as a package archive.
pub fn extract(data: &[u8]) -> Result<PackageArchive, RegistryError> {
    if data.is_empty() {
        return Err(RegistryError::InvalidArchive("archive is empty".into()));
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| RegistryError::InvalidArchive(format!("not a ZIP archive: {e}")))?;

    // First pass: collect file entry names so a wrapping directory can be detected.
    let mut entries: Vec<(usize, String)> = Vec::new();
    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| RegistryError::InvalidArchive(format!("ZIP read error: {e}")))?;
        if file.is_dir() {
            continue;
        }
        // Reject entries with path traversal components (e.g. "../").
        let Some(path) = file.enclosed_name() else {
            continue;
        };
        let name = path.to_string_lossy().replace('\\', "/");
        if name.starts_with(MACOS_METADATA_DIR) {
            continue;
        }
        entries.push((i, name));
    }

    let names: Vec<String> = entries.iter().map(|(_, n)| n.clone()).collect();
    let root = common_root(&names);

    let mut descriptor = None;
    let mut image = None;
    let mut ui = None;
    let mut sql_scripts = BTreeMap::new();
    let mut total_decompressed: u64 = 0;

    for (index, full_name) in entries {
        let name = match &root {
            Some(prefix) => &full_name[prefix.len()..],
            None => full_name.as_str(),
        };
        let Some(kind) = classify(name) else {
            debug!(entry = %full_name, "Ignoring archive entry");
            continue;
        };

        let file = archive
            .by_index(index)
            .map_err(|e| RegistryError::InvalidArchive(format!("ZIP read error: {e}")))?;
        let mut buf = Vec::new();
        file.take(MAX_DECOMPRESSED_ENTRY_SIZE + 1)
            .read_to_end(&mut buf)
            .map_err(|e| RegistryError::InvalidArchive(format!("Failed to read '{name}': {e}")))?;

        if buf.len() as u64 > MAX_DECOMPRESSED_ENTRY_SIZE {
            return Err(RegistryError::InvalidArchive(format!(
                "Entry '{name}' exceeds maximum decompressed size of 512MB"
            )));
        }

        total_decompressed += buf.len() as u64;
        if total_decompressed > MAX_TOTAL_DECOMPRESSED_SIZE {
            return Err(RegistryError::InvalidArchive(
                "Total decompressed archive content exceeds 2048MB limit".into(),
            ));
        }

        let previous = match kind {
            EntryKind::Descriptor => descriptor.replace(buf),
            EntryKind::Image => image.replace(buf),
            EntryKind::Ui => ui.replace(buf),
            EntryKind::Sql(file_name) => sql_scripts.insert(file_name, buf),
        };
        if previous.is_some() {
            return Err(RegistryError::InvalidArchive(format!(
                "Duplicate entry '{name}'"
            )));
        }
    }

    let missing =
        |entry: &str| RegistryError::InvalidArchive(format!("missing required entry '{entry}'"));

    Ok(PackageArchive {
        descriptor: descriptor.ok_or_else(|| missing(DESCRIPTOR_ENTRY))?,
        image: image.ok_or_else(|| missing(IMAGE_ENTRY))?,
        ui: ui.ok_or_else(|| missing(UI_ENTRY))?,
        sql_scripts,
    })
}
