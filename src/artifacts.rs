use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;

/// Replaces `path` with `contents` by writing a sibling temp file and
/// renaming it into place, so readers see either the old or the new file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".courseforge-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .with_context(|| format!("create temp file in: {}", parent.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("write temp file for: {}", path.display()))?;
    tmp.flush()
        .with_context(|| format!("flush temp file for: {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("rename temp file to: {}", path.display()))?;
    Ok(())
}

pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let mut data = serde_json::to_vec_pretty(value).context("serialize json")?;
    data.push(b'\n');
    write_atomic(path, &data)
}

pub fn write_yaml_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(value).context("serialize yaml")?;
    write_atomic(path, yaml.as_bytes())
}

/// Reads and deserializes a YAML file, mapping "not found" to `None`.
pub fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("read: {}", path.display())),
    };
    let value =
        serde_yaml::from_str(&raw).with_context(|| format!("parse yaml: {}", path.display()))?;
    Ok(Some(value))
}
