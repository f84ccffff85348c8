//! Source discovery and asset naming.

use glob::{Pattern, glob};
use std::path::{Path, PathBuf};
use surprise_core::Result;
use surprise_core::config::{IngestConfig, SourceSchema};
use tracing::{debug, warn};

/// A historical file with its asset name and schema settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// Path of the CSV file.
    pub path: PathBuf,
    /// Asset name used in the return column.
    pub asset: String,
    /// Column roles and locale.
    pub schema: SourceSchema,
}

/// Derives an asset name from a file name.
///
/// The extension is dropped, every configured substring is removed and
/// spaces become underscores: `DadosHistóricos-Ouro Futuros(1).csv` with the
/// default strip list gives `Ouro_Futuros`.
pub fn asset_name(path: &Path, strip: &[String]) -> String {
    let mut name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    for fragment in strip {
        if !fragment.is_empty() {
            name = name.replace(fragment.as_str(), "");
        }
    }
    name.trim().replace(' ', "_")
}

/// Files in `dir` matching any of `patterns`, sorted and deduplicated.
///
/// The directory part is escaped so only the patterns carry wildcards.
///
/// # Errors
///
/// Returns [`surprise_core::SurpriseError::GlobPattern`] for a malformed
/// pattern and [`surprise_core::SurpriseError::Glob`] for an unreadable match.
pub fn matching_files(dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let root = PathBuf::from(Pattern::escape(&dir.to_string_lossy()));
    let mut paths = Vec::new();
    for pattern in patterns {
        for entry in glob(&root.join(pattern).to_string_lossy())? {
            let path = entry?;
            if path.is_file() {
                paths.push(path);
            }
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Lists every source the ingest stage should process.
///
/// Files matched in `source_dir` come first in name order, then explicit
/// sources. A file listed explicitly is not also picked up from the
/// directory. A missing directory is reported and skipped.
///
/// # Errors
///
/// Returns a glob error for a malformed pattern or an unreadable match.
pub fn discover_sources(config: &IngestConfig) -> Result<Vec<ResolvedSource>> {
    let mut sources = Vec::new();

    if let Some(dir) = &config.source_dir {
        if dir.is_dir() {
            let names: Vec<PathBuf> = matching_files(dir, &config.patterns)?
                .into_iter()
                .filter(|path| !config.sources.iter().any(|s| &s.path == path))
                .collect();
            debug!(dir = %dir.display(), matched = names.len(), "scanned source directory");

            sources.extend(names.into_iter().map(|path| ResolvedSource {
                asset: asset_name(&path, &config.name_strip),
                schema: config.default_schema.clone(),
                path,
            }));
        } else {
            warn!(dir = %dir.display(), "source directory not found, skipping");
        }
    }

    sources.extend(config.sources.iter().map(|source| ResolvedSource {
        path: source.path.clone(),
        asset: source
            .asset
            .clone()
            .unwrap_or_else(|| asset_name(&source.path, &config.name_strip)),
        schema: source
            .schema
            .clone()
            .unwrap_or_else(|| config.default_schema.clone()),
    }));

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use surprise_core::config::SourceConfig;

    fn default_strip() -> Vec<String> {
        IngestConfig::default().name_strip
    }

    #[test]
    fn test_asset_name() {
        let strip = default_strip();
        assert_eq!(
            asset_name(Path::new("/up/DadosHistóricos-Ibovespa.csv"), &strip),
            "Ibovespa"
        );
        assert_eq!(
            asset_name(Path::new("DadosHistóricos-Ouro Futuros(1).csv"), &strip),
            "Ouro_Futuros"
        );
        assert_eq!(
            asset_name(Path::new("ÍndicesdeCommodities.csv"), &strip),
            "ÍndicesdeCommodities"
        );
    }

    #[test]
    fn test_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "DadosHistóricos-Ouro.csv",
            "DadosHistóricos-Ibovespa.csv",
            "ÍndicesdeCommodities.csv",
            "notes.txt",
        ] {
            fs::write(dir.path().join(name), "Date,Price\n").unwrap();
        }
        fs::create_dir(dir.path().join("Historico.csv")).unwrap();

        let names = |patterns: &[&str]| -> Vec<String> {
            let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
            matching_files(dir.path(), &patterns)
                .unwrap()
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };

        assert_eq!(
            names(&["*Hist*.csv"]),
            vec!["DadosHistóricos-Ibovespa.csv", "DadosHistóricos-Ouro.csv"]
        );
        assert_eq!(names(&["DadosHistóricos-[O]*.csv"]), vec!["DadosHistóricos-Ouro.csv"]);
        assert_eq!(names(&["*.csv", "Índices*.csv"]).len(), 3);
        assert!(names(&["*.json"]).is_empty());

        let bad = vec!["[".to_string()];
        assert!(matches!(
            matching_files(dir.path(), &bad),
            Err(surprise_core::SurpriseError::GlobPattern(_))
        ));
    }

    #[test]
    fn test_discover_sources() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["DadosHistóricos-B.csv", "DadosHistóricos-A.csv", "main.csv"] {
            fs::write(dir.path().join(name), "Date,Price\n").unwrap();
        }
        let explicit = dir.path().join("extra.csv");
        fs::write(&explicit, "Date,Price\n").unwrap();

        let config = IngestConfig {
            source_dir: Some(dir.path().to_path_buf()),
            patterns: vec!["DadosHistóricos-*.csv".to_string()],
            sources: vec![SourceConfig {
                path: explicit,
                asset: Some("Extra".to_string()),
                schema: None,
            }],
            ..Default::default()
        };
        let sources = discover_sources(&config).unwrap();
        let assets: Vec<&str> = sources.iter().map(|s| s.asset.as_str()).collect();
        assert_eq!(assets, vec!["A", "B", "Extra"]);
    }

    #[test]
    fn test_discover_missing_dir() {
        let config = IngestConfig {
            source_dir: Some(PathBuf::from("no/such/dir")),
            ..Default::default()
        };
        let sources = discover_sources(&config).unwrap();
        assert!(sources.is_empty());
    }
}
