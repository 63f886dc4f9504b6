//! Result files: per-sample trajectories, per-trial results and the diagnostic log.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use trajex_core::{Sample, TrialInfo};

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("cannot create output file {path}: {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
}

fn create(path: &Path) -> Result<File, OutputError> {
    File::create(path).map_err(|source| OutputError::Create {
        path: path.display().to_string(),
        source,
    })
}

/// `trial,time,x,y` rows, one per recorded sample.
pub struct TrajectoryWriter {
    inner: csv::Writer<Box<dyn Write>>,
}

impl TrajectoryWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Self::from_writer(create(path.as_ref())?)
    }

    pub fn from_writer(w: impl Write + 'static) -> Result<Self, OutputError> {
        let mut inner = csv::Writer::from_writer(Box::new(w) as Box<dyn Write>);
        inner.write_record(["trial", "time", "x", "y"])?;
        Ok(Self { inner })
    }

    pub fn write_sample(&mut self, trial: usize, sample: &Sample) -> Result<(), OutputError> {
        self.inner.write_record([
            trial.to_string(),
            format!("{:.4}", sample.t),
            format!("{:.2}", sample.x),
            format!("{:.2}", sample.y),
        ])?;
        Ok(())
    }

    pub fn write_trial(&mut self, trial: usize, samples: &[Sample]) -> Result<(), OutputError> {
        for s in samples {
            self.write_sample(trial, s)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.inner.flush()?;
        Ok(())
    }
}

const RESULT_COLUMNS: [&str; 10] = [
    "trial_num",
    "target",
    "presented_target",
    "status",
    "error_code",
    "error_message",
    "movement_time",
    "response",
    "endpoint_error",
    "time_in_session",
];

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per finished trial.
///
/// The fixed columns are followed by the custom trial columns of the first
/// row written; later rows fill the same columns, blank where missing.
pub struct ResultsWriter {
    inner: csv::Writer<Box<dyn Write>>,
    custom_columns: Option<Vec<String>>,
}

impl ResultsWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Ok(Self::from_writer(create(path.as_ref())?))
    }

    pub fn from_writer(w: impl Write + 'static) -> Self {
        Self {
            inner: csv::Writer::from_writer(Box::new(w) as Box<dyn Write>),
            custom_columns: None,
        }
    }

    pub fn write(&mut self, info: &TrialInfo) -> Result<(), OutputError> {
        if self.custom_columns.is_none() {
            let custom: Vec<String> = info.custom.keys().cloned().collect();
            let mut header: Vec<&str> = RESULT_COLUMNS.to_vec();
            header.extend(custom.iter().map(String::as_str));
            self.inner.write_record(&header)?;
            self.custom_columns = Some(custom);
        }
        let custom = self.custom_columns.as_deref().unwrap_or_default();

        let mut record = vec![
            info.trial_num.to_string(),
            info.target.to_string(),
            info.presented_target.clone(),
            info.status.as_str().to_string(),
            cell(info.error_code.as_ref()),
            cell(info.error_message.as_ref()),
            cell(info.movement_time.get()),
            cell(info.response.get()),
            cell(info.endpoint_error),
            info.time_in_session.to_string(),
        ];
        record.extend(custom.iter().map(|c| cell(info.custom.get(c))));
        self.inner.write_record(&record)?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Lines of the form `<category>,<action>,<args...>`.
pub struct DiagnosticLog {
    out: BufWriter<Box<dyn Write>>,
}

impl DiagnosticLog {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Ok(Self::from_writer(create(path.as_ref())?))
    }

    pub fn from_writer(w: impl Write + 'static) -> Self {
        Self {
            out: BufWriter::new(Box::new(w)),
        }
    }

    pub fn line(&mut self, category: &str, action: &str, args: &[&dyn fmt::Display]) -> Result<(), OutputError> {
        write!(self.out, "{category},{action}")?;
        for arg in args {
            write!(self.out, ",{arg}")?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.out.flush()?;
        Ok(())
    }
}

impl fmt::Debug for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticLog").finish_non_exhaustive()
    }
}
