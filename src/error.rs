// Error taxonomy for the ETL run
// One variant per failing stage; the binary maps each to an exit code

use thiserror::Error;

type Source = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure the pipeline can surface.
///
/// None of these are recovered locally: the first one aborts the run and
/// reaches the operator with the stage that produced it.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("network error: {context}")]
    Network {
        context: String,
        #[source]
        source: Option<Source>,
    },

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("config error: {context}")]
    Config {
        context: String,
        #[source]
        source: Option<Source>,
    },

    #[error("I/O error: {context}")]
    Io {
        /// Stage that was doing the I/O
        stage: &'static str,
        context: String,
        #[source]
        source: Option<Source>,
    },

    #[error("storage error: {context}")]
    Storage {
        context: String,
        #[source]
        source: Option<Source>,
    },
}

impl EtlError {
    pub fn network(context: impl Into<String>, source: impl Into<Source>) -> Self {
        EtlError::Network {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    pub fn extraction(context: impl Into<String>) -> Self {
        EtlError::Extraction(context.into())
    }

    /// Config failure with no underlying error (validation)
    pub fn config(context: impl Into<String>) -> Self {
        EtlError::Config {
            context: context.into(),
            source: None,
        }
    }

    pub fn config_with(context: impl Into<String>, source: impl Into<Source>) -> Self {
        EtlError::Config {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// File I/O while writing the CSV output
    pub fn io(context: impl Into<String>, source: impl Into<Source>) -> Self {
        Self::io_at("write csv", context, source)
    }

    /// File or stream I/O in any other stage
    pub fn io_at(stage: &'static str, context: impl Into<String>, source: impl Into<Source>) -> Self {
        EtlError::Io {
            stage,
            context: context.into(),
            source: Some(source.into()),
        }
    }

    pub fn storage(context: impl Into<String>, source: impl Into<Source>) -> Self {
        EtlError::Storage {
            context: context.into(),
            source: Some(source.into()),
        }
    }

    /// Name of the stage that failed, for operator-facing messages
    pub fn stage(&self) -> &'static str {
        match self {
            EtlError::Network { .. } => "fetch",
            EtlError::Extraction(_) => "extract",
            EtlError::Config { .. } => "config",
            EtlError::Io { stage, .. } => *stage,
            EtlError::Storage { .. } => "database",
        }
    }

    /// Process exit status for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            EtlError::Extraction(_) => 1,
            EtlError::Storage { .. } => 2,
            EtlError::Network { .. } => 3,
            EtlError::Config { .. } => 4,
            EtlError::Io { .. } => 5,
        }
    }
}

impl From<rusqlite::Error> for EtlError {
    fn from(err: rusqlite::Error) -> Self {
        EtlError::storage("SQLite operation failed", err)
    }
}

impl From<csv::Error> for EtlError {
    fn from(err: csv::Error) -> Self {
        EtlError::io("CSV operation failed", err)
    }
}
