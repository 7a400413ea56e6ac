//! Asset catalog: where data resources are found and outputs are registered.
//!
//! A catalog is a project directory. [`ManifestCatalog`] keeps its assets in an
//! `assets.json` manifest at the root; every asset path in it is relative to the root.

use crate::error::{GridfillError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};

/// Free-form asset metadata.
pub type Metadata = serde_json::Map<String, Value>;

/// Name of the manifest file at the catalog root.
pub const MANIFEST_FILE: &str = "assets.json";

/// A registered file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Location relative to the catalog root
    pub path: PathBuf,
}

impl Asset {
    /// Absolute location of the asset's file.
    pub fn file(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }

    /// Label written above inserted data: the path relative to the catalog root.
    pub fn label(&self) -> String {
        self.path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Properties to select assets by. Unset fields match anything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetFilter {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub tags: Vec<String>,
    pub metadata: Metadata,
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        if self.name.is_some() && self.name != asset.name {
            return false;
        }
        if self.kind.is_some() && self.kind != asset.kind {
            return false;
        }
        if !self.tags.iter().all(|tag| asset.tags.contains(tag)) {
            return false;
        }
        metadata_subset(&self.metadata, &asset.metadata)
    }
}

/// Properties recorded for a newly registered asset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssetProperties {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub tags: Vec<String>,
    pub metadata: Metadata,
}

/// Source of data resources and sink for outputs.
pub trait AssetCatalog {
    /// Absolute project root.
    fn root(&self) -> &Path;

    /// Assets matching `filter`, in catalog order.
    fn find_assets(&self, filter: &AssetFilter) -> Result<Vec<Asset>>;

    /// Register the file at `path` (relative to the root) and return its absolute path.
    fn add_asset(&mut self, path: &Path, properties: &AssetProperties) -> Result<PathBuf>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    assets: Vec<Asset>,
}

/// Catalog backed by `assets.json` in the project root.
#[derive(Debug)]
pub struct ManifestCatalog {
    root: PathBuf,
    manifest: Manifest,
}

impl ManifestCatalog {
    /// Open the catalog rooted at `root`. A missing manifest is an empty catalog.
    pub fn open(root: &Path) -> Result<Self> {
        let root = std::fs::canonicalize(root)?;
        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            let content = std::fs::read_to_string(&manifest_path)?;
            serde_json::from_str(&content)?
        } else {
            log::debug!("{} not found, starting an empty catalog", manifest_path.display());
            Manifest::default()
        };
        log::debug!(
            "catalog {} holds {} assets",
            root.display(),
            manifest.assets.len()
        );
        Ok(ManifestCatalog { root, manifest })
    }

    pub fn assets(&self) -> &[Asset] {
        &self.manifest.assets
    }

    fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(self.root.join(MANIFEST_FILE), content)?;
        Ok(())
    }
}

impl AssetCatalog for ManifestCatalog {
    fn root(&self) -> &Path {
        &self.root
    }

    fn find_assets(&self, filter: &AssetFilter) -> Result<Vec<Asset>> {
        Ok(self
            .manifest
            .assets
            .iter()
            .filter(|asset| filter.matches(asset))
            .cloned()
            .collect())
    }

    fn add_asset(&mut self, path: &Path, properties: &AssetProperties) -> Result<PathBuf> {
        let path = relative_path(path)?;
        let file = self.root.join(&path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let asset = Asset {
            name: properties.name.clone(),
            kind: properties.kind.clone(),
            tags: properties.tags.clone(),
            metadata: properties.metadata.clone(),
            path,
        };
        match self
            .manifest
            .assets
            .iter_mut()
            .find(|existing| existing.path == asset.path)
        {
            Some(existing) => *existing = asset,
            None => self.manifest.assets.push(asset),
        }
        self.save()?;
        Ok(file)
    }
}

/// Reject paths that would leave the catalog root.
pub(crate) fn relative_path(path: &Path) -> Result<PathBuf> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => {
                return Err(GridfillError::InvalidArgument(format!(
                    "asset path `{}` must be relative to the project root",
                    path.display()
                )));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(GridfillError::InvalidArgument("empty asset path".to_string()));
    }
    Ok(clean)
}

/// Whether every entry of `filter` is present in `actual`. Objects compare recursively,
/// numbers by value.
fn metadata_subset(filter: &Metadata, actual: &Metadata) -> bool {
    filter.iter().all(|(key, expected)| {
        actual
            .get(key)
            .is_some_and(|found| value_matches(expected, found))
    })
}

fn value_matches(expected: &Value, found: &Value) -> bool {
    match (expected, found) {
        (Value::Object(expected), Value::Object(found)) => metadata_subset(expected, found),
        (Value::Number(expected), Value::Number(found)) => expected.as_f64() == found.as_f64(),
        _ => expected == found,
    }
}

/// Parse `key=value` arguments into metadata. Dotted keys nest
/// (`run.id=7` -> `{"run": {"id": 7}}`); values are integers, floats, booleans or strings.
pub fn parse_metadata_args<S: AsRef<str>>(args: &[S]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for arg in args {
        let arg = arg.as_ref();
        let Some((key, value)) = arg.split_once('=') else {
            return Err(GridfillError::InvalidMetadata(format!(
                "`{}` is not key=value",
                arg
            )));
        };
        let path: Vec<&str> = key.trim().split('.').collect();
        if path.iter().any(|part| part.is_empty()) {
            return Err(GridfillError::InvalidMetadata(format!(
                "`{}` has an empty key",
                arg
            )));
        }
        insert_nested(&mut metadata, &path, parse_metadata_value(value.trim()));
    }
    Ok(metadata)
}

fn insert_nested(map: &mut Metadata, path: &[&str], value: Value) {
    let [head, rest @ ..] = path else {
        return;
    };
    if rest.is_empty() {
        map.insert(head.to_string(), value);
        return;
    }
    let entry = map
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Metadata::new()));
    if !entry.is_object() {
        *entry = Value::Object(Metadata::new());
    }
    if let Value::Object(child) = entry {
        insert_nested(child, rest, value);
    }
}

fn parse_metadata_value(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(n) = text.parse::<f64>()
        && let Some(n) = serde_json::Number::from_f64(n)
    {
        return Value::Number(n);
    }
    match text {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        _ => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn asset(path: &str, kind: &str, tags: &[&str], metadata: Value) -> Asset {
        Asset {
            name: None,
            kind: Some(kind.to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_filter_matches_type_tags_and_metadata_subset() {
        let a = asset("runs/a.csv", "raw", &["iv", "dark"], json!({"run": {"id": 7, "temp": 25.0}}));

        let mut filter = AssetFilter {
            kind: Some("raw".to_string()),
            tags: vec!["iv".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&a));

        filter.metadata = json!({"run": {"temp": 25}}).as_object().cloned().unwrap();
        assert!(filter.matches(&a));

        filter.metadata = json!({"run": {"id": 8}}).as_object().cloned().unwrap();
        assert!(!filter.matches(&a));

        filter.metadata.clear();
        filter.tags.push("light".to_string());
        assert!(!filter.matches(&a));
    }

    #[test]
    fn test_parse_metadata_args_nests_and_types_values() {
        let metadata =
            parse_metadata_args(&["run.id=7", "run.gain=1.5", "ok=true", "label=dark run"]).unwrap();
        assert_eq!(
            Value::Object(metadata),
            json!({"run": {"id": 7, "gain": 1.5}, "ok": true, "label": "dark run"})
        );
    }

    #[test]
    fn test_parse_metadata_args_rejects_bad_input() {
        assert!(matches!(
            parse_metadata_args(&["novalue"]),
            Err(GridfillError::InvalidMetadata(_))
        ));
        assert!(matches!(
            parse_metadata_args(&["a..b=1"]),
            Err(GridfillError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn test_manifest_catalog_round_trip() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            r#"{"assets": [
                {"type": "raw", "tags": ["iv"], "path": "data/b.csv"},
                {"type": "raw", "path": "data/a.csv"},
                {"type": "notes", "path": "notes.txt"}
            ]}"#,
        )
        .unwrap();

        let mut catalog = ManifestCatalog::open(dir.path()).unwrap();
        let filter = AssetFilter {
            kind: Some("raw".to_string()),
            ..Default::default()
        };
        let found = catalog.find_assets(&filter).unwrap();
        let labels: Vec<String> = found.iter().map(Asset::label).collect();
        assert_eq!(labels, vec!["data/b.csv", "data/a.csv"]);

        let props = AssetProperties {
            kind: Some("report".to_string()),
            ..Default::default()
        };
        let file = catalog.add_asset(Path::new("out/report.xlsx"), &props).unwrap();
        assert_eq!(file, catalog.root().join("out/report.xlsx"));
        assert!(catalog.root().join("out").is_dir());
        // Registering the same path again replaces the entry.
        catalog.add_asset(Path::new("out/report.xlsx"), &props).unwrap();

        let reopened = ManifestCatalog::open(dir.path()).unwrap();
        assert_eq!(reopened.assets().len(), 4);
        assert_eq!(reopened.assets()[3].kind.as_deref(), Some("report"));
    }

    #[test]
    fn test_add_asset_rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let mut catalog = ManifestCatalog::open(dir.path()).unwrap();
        let props = AssetProperties::default();
        assert!(catalog.add_asset(Path::new("../out.xlsx"), &props).is_err());
        assert!(catalog.add_asset(&dir.path().join("abs.xlsx"), &props).is_err());
    }
}
