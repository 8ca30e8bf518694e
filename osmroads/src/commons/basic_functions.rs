use std::fs::create_dir_all;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geojson::FeatureCollection;
use serde::Serialize;
use tempfile::NamedTempFile;

/// Write a FeatureCollection as GeoJSON
pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> Result<()> {
    write_json(path, collection)
}

/// Serialize `value` to `path` through a temporary file in the same
/// directory, renamed into place once complete
///
/// Missing parent directories are created. On error the destination is left
/// as it was.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    create_dir_all(dir).context(format!("Failed to create directory: {:?}", dir))?;

    let mut file = NamedTempFile::new_in(dir)
        .context(format!("Failed to create temporary file in {:?}", dir))?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        serde_json::to_writer(&mut writer, value)
            .context(format!("Failed to serialize {:?}", path))?;
        writer.flush()?;
    }
    file.persist(path)
        .context(format!("Failed to write file: {:?}", path))?;
    Ok(())
}
