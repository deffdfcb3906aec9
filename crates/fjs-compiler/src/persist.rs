//! Writing artifacts to disk.

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::compiler::SchemaCompiler;
use crate::error::PersistError;

impl SchemaCompiler {
    /// Compile `schema` and write its persisted form to `path`.
    ///
    /// Returns the entry point name. An existing file is only replaced when
    /// `overwrite` is set; the check happens before compiling.
    ///
    /// # Errors
    ///
    /// [`PersistError::AlreadyExists`] for an existing destination,
    /// [`PersistError::Compile`] when the schema does not compile,
    /// [`PersistError::Io`] when the file cannot be written.
    pub fn write_artifact(
        &self,
        path: impl AsRef<Path>,
        schema: &Value,
        overwrite: bool,
    ) -> Result<String, PersistError> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(PersistError::AlreadyExists(path.display().to_string()));
        }
        let (source, entry_point) = self.emit(schema)?;
        std::fs::write(path, source)?;
        info!(path = %path.display(), entry_point = %entry_point, "artifact written");
        Ok(entry_point)
    }
}
