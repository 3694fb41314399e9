use crate::storage::{SchemaOptions, SqliteStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlogdbConfig {
    pub database: Option<String>,
    #[serde(default)]
    pub schema: SchemaOptions,
}

impl BlogdbConfig {
    /// Database path from the config, falling back to the default under `base`
    pub fn database_path(&self, base: &Path) -> PathBuf {
        self.database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_database_path_in(base))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("blogdb.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".blogdb").join("blog.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<BlogdbConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: BlogdbConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &BlogdbConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Create the database for `config`, then write the config file.
///
/// Nothing is written when the database cannot be opened, or when an
/// existing database was created with other schema options.
pub fn init_database(
    config_path: &Path,
    config: &BlogdbConfig,
    base: &Path,
    force: bool,
) -> anyhow::Result<SqliteStore> {
    if config_path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", config_path.display());
    }

    let db_path = config.database_path(base);
    ensure_db_dir(&db_path)?;
    let store = SqliteStore::open_with(&db_path, config.schema)?;
    if *store.options() != config.schema {
        anyhow::bail!(
            "{} was created with other schema options ({:?}); they cannot change afterwards",
            db_path.display(),
            store.options()
        );
    }

    write_config(config_path, config, force)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::OnDelete;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("blogdb.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_partial_schema_table_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blogdb.toml");
        std::fs::write(
            &path,
            "database = \"data/blog.db\"\n\n[schema]\ncategory_on_delete = \"cascade\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.database.as_deref(), Some("data/blog.db"));
        assert_eq!(config.schema.category_on_delete, OnDelete::Cascade);
        assert_eq!(config.schema.owner_on_delete, OnDelete::Cascade);
        assert!(config.schema.forbid_self_follow);
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blogdb.toml");
        let config = BlogdbConfig {
            database: None,
            schema: SchemaOptions {
                owner_on_delete: OnDelete::Restrict,
                category_on_delete: OnDelete::SetNull,
                forbid_self_follow: false,
            },
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.schema, config.schema);
        assert_eq!(
            loaded.database_path(dir.path()),
            dir.path().join(".blogdb").join("blog.db")
        );
    }

    #[test]
    fn test_init_database_writes_config_after_open() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("blogdb.toml");
        let config = BlogdbConfig::default();

        let store = init_database(&config_path, &config, dir.path(), false).unwrap();
        assert_eq!(*store.options(), SchemaOptions::default());
        assert!(config_path.exists());
        assert!(dir.path().join(".blogdb").join("blog.db").exists());

        assert!(init_database(&config_path, &config, dir.path(), false).is_err());
        init_database(&config_path, &config, dir.path(), true).unwrap();
    }

    #[test]
    fn test_init_database_failed_open_leaves_no_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("blogdb.toml");
        // A directory where the database file should be
        let db_dir = dir.path().join("blog.db");
        std::fs::create_dir(&db_dir).unwrap();
        let config = BlogdbConfig {
            database: Some(db_dir.to_string_lossy().to_string()),
            schema: SchemaOptions::default(),
        };

        assert!(init_database(&config_path, &config, dir.path(), false).is_err());
        assert!(!config_path.exists());
    }

    #[test]
    fn test_init_database_rejects_changed_options() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("blogdb.toml");
        init_database(&config_path, &BlogdbConfig::default(), dir.path(), false).unwrap();
        let before = std::fs::read_to_string(&config_path).unwrap();

        let restricted = BlogdbConfig {
            database: None,
            schema: SchemaOptions {
                owner_on_delete: OnDelete::Restrict,
                ..Default::default()
            },
        };
        let err = init_database(&config_path, &restricted, dir.path(), true).unwrap_err();
        assert!(err.to_string().contains("other schema options"));
        assert_eq!(std::fs::read_to_string(&config_path).unwrap(), before);
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("blog.db");
        ensure_db_dir(&db).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
