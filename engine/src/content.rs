use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::catalog::MonsterCatalog;
use crate::config::DocFormat;

const SRD_CORE: &str = include_str!("../content/monsters/srd_core.json");
const CRYPT: &str = include_str!("../content/monsters/crypt.yaml");

/// Catalog documents compiled into the binary, by name.
pub fn builtin_catalogs() -> HashMap<&'static str, (&'static str, DocFormat)> {
    HashMap::from([
        ("srd_core", (SRD_CORE, DocFormat::Json)),
        ("crypt", (CRYPT, DocFormat::Yaml)),
    ])
}

pub fn builtin_catalog(name: &str) -> Result<MonsterCatalog> {
    let catalogs = builtin_catalogs();
    let (text, format) = catalogs.get(name).copied().with_context(|| {
        let mut known: Vec<_> = catalogs.keys().copied().collect();
        known.sort_unstable();
        format!("no built-in catalog '{name}' (known: {})", known.join(", "))
    })?;
    MonsterCatalog::parse(text, format).with_context(|| format!("built-in catalog '{name}'"))
}
