use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use sw_types::{DataError, Dataset, GridError, GridResult};

/// A numeric table loaded from a CSV file with a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub path: PathBuf,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl Table {
    /// Load every row of `path`. Every cell must parse as a number.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> GridResult<Self> {
        let path = path.as_ref();
        tracing::info!("Loading CSV data from: {}", path.display());

        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to open CSV file {}: {}", path.display(), e),
            })?;

        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV headers of {}: {}", path.display(), e),
            })?
            .iter()
            .map(str::to_string)
            .collect();
        tracing::debug!("CSV headers: {:?}", columns);

        let mut rows = Vec::new();
        for (line_num, result) in rdr.records().enumerate() {
            // Line numbers are 1-based and the header takes line 1.
            let line = line_num as u64 + 2;
            let record = result.map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV record at line {}: {}", line, e),
            })?;

            let row = record
                .iter()
                .zip(&columns)
                .map(|(cell, column)| {
                    cell.parse::<f64>().map_err(|e| DataError::ParseError {
                        path: path.to_path_buf(),
                        line,
                        column: column.clone(),
                        message: format!("{cell:?} is not a number ({e})"),
                    })
                })
                .collect::<Result<Vec<f64>, DataError>>()?;
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(DataError::Empty {
                path: path.to_path_buf(),
            }
            .into());
        }

        tracing::info!("Loaded {} rows x {} columns from {}", rows.len(), columns.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            columns,
            rows,
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    fn column_index(&self, name: &str) -> GridResult<usize> {
        self.columns.iter().position(|c| c == name).ok_or_else(|| {
            GridError::schema(format!("column {name} not in {}", self.path.display()))
        })
    }

    /// Every column except `target`, in file order.
    pub fn feature_columns(&self, target: &str) -> Vec<String> {
        self.columns.iter().filter(|c| *c != target).cloned().collect()
    }

    /// Split into features (the named columns, in the given order) and the
    /// target column.
    pub fn split(&self, target: &str, feature_columns: &[String]) -> GridResult<Dataset> {
        let target_index = self.column_index(target)?;
        let feature_indices = feature_columns
            .iter()
            .map(|name| self.column_index(name))
            .collect::<GridResult<Vec<usize>>>()?;

        let features = self
            .rows
            .iter()
            .map(|row| feature_indices.iter().map(|&i| row[i]).collect())
            .collect();
        let target_values = self.rows.iter().map(|row| row[target_index]).collect();

        Dataset::new(feature_columns.to_vec(), features, target_values)
    }
}
