//! Attachment collection. Files pass through untouched.

use crate::Result;
use crate::core::io::ResourceSource;
use crate::types::{Resource, ResourceKind};

/// Collect the `files` directory of `source`; a missing directory yields none.
pub fn collect_files(source: &dyn ResourceSource) -> Result<Vec<Resource>> {
    let dir = ResourceKind::File.dir_name();
    let Some(names) = source.list_entries(dir)? else {
        return Ok(Vec::new());
    };

    let files = names
        .into_iter()
        .map(|name| {
            let data = source.read_entry(dir, &name)?;
            Ok(Resource::new(ResourceKind::File, name, data))
        })
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(count = files.len(), "collected files");
    Ok(files)
}
