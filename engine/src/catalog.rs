//! Monster catalogs.
//!
//! A catalog is an explicit, immutable value handed to the encounter
//! generator. There is no global cache; load or parse one where it is needed.

use std::collections::{BTreeSet, HashSet};
use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::DocFormat;
use crate::resolve::{DamageProfile, DamageType};
use crate::{EngineError, EngineResult};

/// A monster's signature attack, used when simulating a skirmish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterAttack {
    pub name: String,
    pub bonus: i32,
    pub damage: String,
    #[serde(default)]
    pub damage_type: DamageType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub id: String,
    pub name: String,
    pub xp: u32,
    pub ac: i32,
    pub hp: u32,
    pub cr: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub resistances: BTreeSet<DamageType>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub immunities: BTreeSet<DamageType>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub vulnerabilities: BTreeSet<DamageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<MonsterAttack>,
}

impl Monster {
    pub fn damage_profile(&self) -> DamageProfile {
        DamageProfile {
            resistances: self.resistances.clone(),
            immunities: self.immunities.clone(),
            vulnerabilities: self.vulnerabilities.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MonsterCatalog {
    monsters: Vec<Monster>,
}

impl MonsterCatalog {
    /// Builds a catalog, rejecting duplicate or empty ids.
    pub fn new(monsters: Vec<Monster>) -> EngineResult<Self> {
        let mut seen = HashSet::new();
        for m in &monsters {
            if m.id.trim().is_empty() {
                return Err(EngineError::Catalog(format!("monster '{}' has an empty id", m.name)));
            }
            if !seen.insert(m.id.as_str()) {
                return Err(EngineError::Catalog(format!("duplicate monster id '{}'", m.id)));
            }
        }
        Ok(Self { monsters })
    }

    /// Parses a catalog document: a bare list of monster records.
    pub fn parse(text: &str, format: DocFormat) -> Result<Self> {
        let monsters: Vec<Monster> = format.parse(text)?;
        Ok(Self::new(monsters)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        Self::parse(&text, DocFormat::from_path(path))
            .with_context(|| format!("loading catalog {}", path.display()))
    }

    pub fn get(&self, id: &str) -> EngineResult<&Monster> {
        self.monsters
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| EngineError::UnknownMonster(id.to_string()))
    }

    /// The monsters with the given ids, in the given order.
    pub fn select(&self, ids: &[String]) -> EngineResult<Vec<Monster>> {
        ids.iter().map(|id| self.get(id).cloned()).collect()
    }

    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.iter()
    }

    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }

    /// Lowest XP; the first listed wins a tie.
    pub fn cheapest(&self) -> Option<&Monster> {
        self.monsters.iter().min_by_key(|m| m.xp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
- id: rat
  name: Giant Rat
  xp: 25
  ac: 12
  hp: 7
  cr: "1/8"
- id: ghoul
  name: Ghoul
  xp: 200
  ac: 12
  hp: 22
  cr: "1"
  type: undead
  immunities: [poison]
"#;

    #[test]
    fn parses_yaml_records() {
        let cat = MonsterCatalog::parse(YAML, DocFormat::Yaml).unwrap();
        assert_eq!(cat.len(), 2);
        let ghoul = cat.get("ghoul").unwrap();
        assert_eq!(ghoul.kind.as_deref(), Some("undead"));
        assert!(ghoul.damage_profile().immunities.contains(&DamageType::Poison));
        assert_eq!(cat.cheapest().map(|m| m.id.as_str()), Some("rat"));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let doubled = format!(
            "{YAML}{}",
            "- {id: rat, name: Rat, xp: 10, ac: 10, hp: 2, cr: '0'}\n"
        );
        assert!(MonsterCatalog::parse(&doubled, DocFormat::Yaml).is_err());
    }

    #[test]
    fn unknown_id_is_typed_error() {
        let cat = MonsterCatalog::default();
        assert_eq!(cat.get("x"), Err(EngineError::UnknownMonster("x".into())));
    }
}
