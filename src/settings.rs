use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "md_to_sql/code.yaml";
const DEFAULT_INPUT_PATH: &str = "md_to_sql/code.md";
const DEFAULT_DB_PATH: &str = "data/daily_problem.sqlite";
const ENV_PREFIX: &str = "PROBLEM_INGEST";

/// Category → problem names, in the order the config file lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog(Vec<(String, Vec<String>)>);

impl Catalog {
    #[cfg(test)]
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn problem_count(&self) -> usize {
        self.0.iter().map(|(_, names)| names.len()).sum()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CatalogVisitor;

        impl<'de> Visitor<'de> for CatalogVisitor {
            type Value = Catalog;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category name to a list of problem names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Catalog, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((category, names)) = map.next_entry::<String, Option<Vec<String>>>()? {
                    entries.push((category, names.unwrap_or_default()));
                }
                Ok(Catalog(entries))
            }

            // `problem:` with nothing under it
            fn visit_unit<E: serde::de::Error>(self) -> Result<Catalog, E> {
                Ok(Catalog::default())
            }

            fn visit_none<E: serde::de::Error>(self) -> Result<Catalog, E> {
                Ok(Catalog::default())
            }
        }

        deserializer.deserialize_any(CatalogVisitor)
    }
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub database: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Settings {
    pub input: PathBuf,
    pub database: PathBuf,
    pub catalog: Catalog,
}

/// Layering: defaults < YAML file < `PROBLEM_INGEST_*` env < CLI flags.
pub fn load(config_path: &Path, overrides: &Overrides) -> Result<Settings> {
    let source = defaults()?
        .add_source(File::from(config_path).format(FileFormat::Yaml).required(true))
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .set_override_option("input", overrides.input.as_deref().map(path_value))?
        .set_override_option("database", overrides.database.as_deref().map(path_value))?
        .build()
        .with_context(|| format!("Failed to read config {:?}", config_path))?;
    from_config(&source)
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("input", DEFAULT_INPUT_PATH)?
        .set_default("database", DEFAULT_DB_PATH)?)
}

fn path_value(p: &Path) -> String {
    p.display().to_string()
}

fn from_config(source: &Config) -> Result<Settings> {
    let catalog = match source.get::<Catalog>("problem") {
        Ok(c) => c,
        Err(ConfigError::NotFound(_)) => Catalog::default(),
        Err(e) => return Err(e).context("Invalid `problem` section"),
    };
    debug!(?catalog, "problem catalog");

    Ok(Settings {
        input: PathBuf::from(source.get_string("input")?),
        database: PathBuf::from(source.get_string("database")?),
        catalog,
    })
}
