use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, inverted tolerance bands).
    ConfigValidation(String),
    /// Canonical table snapshot could not be parsed.
    SnapshotParse(String),
    /// Incoming rows document could not be parsed.
    RowsParse(String),
    /// Missing required column in CSV input.
    MissingColumn { column: String },
    /// A year-range key in the snapshot is malformed.
    YearSpanParse { context: String, value: String },
    /// Output serialization error.
    Serialize(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::SnapshotParse(msg) => write!(f, "snapshot parse error: {msg}"),
            Self::RowsParse(msg) => write!(f, "rows parse error: {msg}"),
            Self::MissingColumn { column } => write!(f, "missing column '{column}'"),
            Self::YearSpanParse { context, value } => {
                write!(f, "{context}: cannot parse year span '{value}'")
            }
            Self::Serialize(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
