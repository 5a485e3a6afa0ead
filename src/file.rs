//! Structured-file collaborator: load and save JSON/YAML mappings.
//!
//! The format is chosen by extension only, matched case-sensitively:
//!
//! | extension       | format |
//! |-----------------|--------|
//! | `.json`         | JSON   |
//! | `.yaml`, `.yml` | YAML   |
//!
//! YAML is parsed into the same `serde_json::Value` tree as JSON, so the rest
//! of the crate sees a single [`Mapping`] type regardless of the source.
//!
//! The engine never touches the filesystem directly: it goes through the
//! [`MappingLoader`] seam, which [`FsLoader`] implements with
//! [`load_mapping`].

use std::path::Path;

use crate::error::RunfigError;
use crate::value::Mapping;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn format_of(path: &Path) -> Option<Format> {
    match path.extension()?.to_str()? {
        "json" => Some(Format::Json),
        "yaml" | "yml" => Some(Format::Yaml),
        _ => None,
    }
}

pub fn is_supported_extension(path: &Path) -> bool {
    format_of(path).is_some()
}

/// Read a mapping from `path`.
///
/// The extension is checked before the filesystem, so an unsupported path
/// fails with [`RunfigError::UnsupportedFileType`] even when it does not
/// exist.
pub fn load_mapping(path: &Path) -> Result<Mapping, RunfigError> {
    let format = format_of(path).ok_or_else(|| RunfigError::UnsupportedFileType {
        path: path.to_path_buf(),
    })?;

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RunfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(RunfigError::IoError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    parse_mapping(&content, format, path)
}

fn parse_mapping(content: &str, format: Format, path: &Path) -> Result<Mapping, RunfigError> {
    let parse_error = |reason: String| RunfigError::ParseError {
        path: path.to_path_buf(),
        reason,
    };

    let value: serde_json::Value = match format {
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        Format::Yaml => {
            if content.trim().is_empty() {
                return Ok(Mapping::new());
            }
            serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?
        }
    };

    match value {
        serde_json::Value::Object(mapping) => Ok(mapping),
        serde_json::Value::Null if format == Format::Yaml => Ok(Mapping::new()),
        other => Err(parse_error(format!(
            "top level must be a mapping, found {}",
            kind_name(&other)
        ))),
    }
}

fn kind_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "a mapping",
    }
}

/// Write `mapping` to `path`, creating parent directories as needed.
pub fn save_mapping(path: &Path, mapping: &Mapping) -> Result<(), RunfigError> {
    let format = format_of(path).ok_or_else(|| RunfigError::UnsupportedFileType {
        path: path.to_path_buf(),
    })?;

    let io_error = |source: std::io::Error| RunfigError::IoError {
        path: path.to_path_buf(),
        source,
    };
    let encode_error = |reason: String| RunfigError::ParseError {
        path: path.to_path_buf(),
        reason,
    };

    let content = match format {
        Format::Json => {
            let mut s = serde_json::to_string_pretty(mapping).map_err(|e| encode_error(e.to_string()))?;
            s.push('\n');
            s
        }
        Format::Yaml => serde_yaml::to_string(mapping).map_err(|e| encode_error(e.to_string()))?,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, content).map_err(io_error)
}

/// Where the engine gets nested-config mappings from.
pub trait MappingLoader {
    fn load(&self, path: &Path) -> Result<Mapping, RunfigError>;
}

/// Loads from the filesystem with [`load_mapping`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl MappingLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<Mapping, RunfigError> {
        tracing::debug!(path = %path.display(), "loading nested config");
        load_mapping(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> Mapping {
        json!({"c": 5, "name": "resnet", "ratios": [0.5, 1.0]})
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn supported_extensions() {
        assert!(is_supported_extension(Path::new("a.json")));
        assert!(is_supported_extension(Path::new("a.yaml")));
        assert!(is_supported_extension(Path::new("dir/a.yml")));
        assert!(!is_supported_extension(Path::new("dir/a.YML")));
        assert!(!is_supported_extension(Path::new("a.JSON")));
        assert!(!is_supported_extension(Path::new("a.toml")));
        assert!(!is_supported_extension(Path::new("json")));
    }

    #[test]
    fn load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, r#"{"c": 5}"#).unwrap();
        let mapping = load_mapping(&path).unwrap();
        assert_eq!(mapping["c"], json!(5));
    }

    #[test]
    fn load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.yaml");
        fs::write(&path, "c: 5\nname: resnet\nratios:\n  - 0.5\n  - 1.0\n").unwrap();
        assert_eq!(load_mapping(&path).unwrap(), sample());
    }

    #[test]
    fn empty_yaml_is_empty_mapping() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.yml");
        fs::write(&path, "").unwrap();
        assert!(load_mapping(&path).unwrap().is_empty());
    }

    #[test]
    fn unsupported_extension_checked_first() {
        let err = load_mapping(Path::new("/nonexistent/model.toml")).unwrap_err();
        assert!(matches!(err, RunfigError::UnsupportedFileType { .. }));
    }

    #[test]
    fn upper_case_extension_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.JSON");
        fs::write(&path, r#"{"c": 5}"#).unwrap();
        let err = load_mapping(&path).unwrap_err();
        assert!(matches!(err, RunfigError::UnsupportedFileType { .. }));
    }

    #[test]
    fn missing_file() {
        let err = load_mapping(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, RunfigError::FileNotFound(_)));
    }

    #[test]
    fn non_mapping_top_level_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2]").unwrap();
        match load_mapping(&path).unwrap_err() {
            RunfigError::ParseError { reason, .. } => assert!(reason.contains("a list")),
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_mapping(&path).unwrap_err(),
            RunfigError::ParseError { .. }
        ));
    }

    #[test]
    fn save_then_load_each_format() {
        let dir = TempDir::new().unwrap();
        for name in ["out.json", "out.yaml"] {
            let path = dir.path().join("nested").join(name);
            save_mapping(&path, &sample()).unwrap();
            assert_eq!(load_mapping(&path).unwrap(), sample(), "{name}");
        }
    }

    #[test]
    fn save_preserves_key_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ordered.json");
        save_mapping(&path, &sample()).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let c = content.find("\"c\"").unwrap();
        let name = content.find("\"name\"").unwrap();
        assert!(c < name);
    }

    #[test]
    fn save_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let err = save_mapping(&dir.path().join("out.toml"), &sample()).unwrap_err();
        assert!(matches!(err, RunfigError::UnsupportedFileType { .. }));
    }
}
