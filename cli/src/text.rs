use std::{fs, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use skirmish_engine::config::DocFormat;
use skirmish_engine::content::builtin_catalog;
use skirmish_engine::MonsterCatalog;

/// Reads a text file, honouring a UTF-8/UTF-16 byte-order mark if present.
pub fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        String::from_utf8(bytes).with_context(|| format!("{} is not UTF-8", path.display()))
    }
}

pub fn read_doc<T: for<'de> serde::Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = read_text_auto(path)?;
    DocFormat::from_path(path)
        .parse(&text)
        .with_context(|| format!("loading {}", path.display()))
}

/// A catalog file when given, otherwise the named built-in.
pub fn load_catalog(file: Option<&Path>, builtin: &str) -> Result<MonsterCatalog> {
    match file {
        Some(path) => {
            let text = read_text_auto(path)?;
            MonsterCatalog::parse(&text, DocFormat::from_path(path))
                .with_context(|| format!("loading catalog {}", path.display()))
        }
        None => builtin_catalog(builtin),
    }
}
