use crate::error::{Result, StatsError};
use crate::table::UnifiedTable;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Destination for the finished table
pub trait TableSink: Send + Sync {
    /// Writes the table and returns where it went.
    fn write(&self, table: &UnifiedTable) -> Result<PathBuf>;
}

/// Writes a header row of labels followed by every table row.
/// Absent cells become empty fields.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_inner(&self, table: &UnifiedTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(table.columns().iter().map(|c| c.label.as_str()))?;
        for row in table.rows() {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl TableSink for CsvSink {
    fn write(&self, table: &UnifiedTable) -> Result<PathBuf> {
        debug!(path = %self.path.display(), "writing csv");
        self.write_inner(table).map_err(|e| StatsError::OutputWrite {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        info!(
            path = %self.path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "wrote table"
        );
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use tempfile::tempdir;

    #[test]
    fn test_writes_header_and_rows_creating_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let table = UnifiedTable::from_columns(vec![
            Column { label: "Player".into(), cells: vec![Some("Jose".into()), Some("A, B".into())] },
            Column { label: "Comp".into(), cells: vec![Some("ENG-Championship".into()), None] },
        ]);

        let written = CsvSink::new(&path).write(&table).unwrap();
        assert_eq!(written, path);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Player,Comp\nJose,ENG-Championship\n\"A, B\",\n");
    }

    #[test]
    fn test_unwritable_destination_is_output_error() {
        let dir = tempdir().unwrap();
        // a file where a directory is expected
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let table = UnifiedTable::from_columns(vec![Column { label: "Player".into(), cells: vec![] }]);

        let err = CsvSink::new(blocker.join("out.csv")).write(&table).unwrap_err();
        assert!(matches!(err, StatsError::OutputWrite { .. }));
    }
}
