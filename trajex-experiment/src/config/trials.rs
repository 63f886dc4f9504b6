//! Trial rows from CSV.

use super::ConfigError;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Declared columns of a trials file. Columns outside the schema are kept
/// as custom attributes of each trial.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSchema {
    pub mandatory: Vec<String>,
    pub optional: Vec<String>,
}

impl Default for TrialSchema {
    fn default() -> Self {
        Self {
            mandatory: vec!["target".into()],
            optional: vec![
                "presented_target".into(),
                "max_movement_time".into(),
                "stimulus_onset".into(),
            ],
        }
    }
}

impl TrialSchema {
    pub fn with_mandatory(mut self, column: &str) -> Self {
        self.mandatory.push(column.to_string());
        self
    }

    fn is_declared(&self, column: &str) -> bool {
        self.mandatory.iter().chain(&self.optional).any(|c| c == column)
    }
}

/// One row of the trials file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialSpec {
    /// 1-based data row number, for messages.
    pub row: usize,
    pub target: f64,
    /// What is shown to the subject; defaults to the target value.
    pub presented_target: String,
    pub max_movement_time: Option<f64>,
    pub stimulus_onset: Option<f64>,
    pub custom: BTreeMap<String, String>,
}

fn parse_number(row: usize, column: &str, text: &str) -> Result<f64, ConfigError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::InvalidCell {
            row,
            column: column.to_string(),
            value: text.to_string(),
        })
}

fn optional_number(row: usize, column: &str, cells: &BTreeMap<String, String>) -> Result<Option<f64>, ConfigError> {
    match cells.get(column).map(|s| s.trim()) {
        None | Some("") => Ok(None),
        Some(text) => parse_number(row, column, text).map(Some),
    }
}

pub fn load_trials(path: impl AsRef<Path>, schema: &TrialSchema) -> Result<Vec<TrialSpec>, ConfigError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let trials = read_trials(file, schema)?;
    tracing::info!(path = %path.display(), trials = trials.len(), "loaded trials");
    Ok(trials)
}

pub fn read_trials(input: impl Read, schema: &TrialSchema) -> Result<Vec<TrialSpec>, ConfigError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(input);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if let Some(missing) = schema.mandatory.iter().find(|c| !headers.contains(c)) {
        return Err(ConfigError::MissingColumn(missing.clone()));
    }

    let mut trials = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let cells: BTreeMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        for column in &schema.mandatory {
            if cells.get(column).is_none_or(|v| v.trim().is_empty()) {
                return Err(ConfigError::MissingValue {
                    row,
                    column: column.clone(),
                });
            }
        }

        let target = match cells.get("target") {
            Some(text) if !text.trim().is_empty() => parse_number(row, "target", text)?,
            _ => {
                return Err(ConfigError::MissingValue {
                    row,
                    column: "target".into(),
                });
            }
        };
        let presented_target = cells
            .get("presented_target")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map_or_else(|| target.to_string(), str::to_string);

        trials.push(TrialSpec {
            row,
            target,
            presented_target,
            max_movement_time: optional_number(row, "max_movement_time", &cells)?,
            stimulus_onset: optional_number(row, "stimulus_onset", &cells)?,
            custom: cells
                .iter()
                .filter(|(k, _)| !schema.is_declared(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        });
    }
    Ok(trials)
}
