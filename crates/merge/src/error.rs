use std::fmt;

#[derive(Debug)]
pub enum MergeError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty path, missing dataset, etc.).
    ConfigValidation(String),
    /// A table lacks columns a stage requires.
    MissingColumns { table: String, columns: Vec<String> },
    /// A reducer references an output column that is not declared before it.
    BadReducer(String),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumns { table, columns } => {
                write!(f, "table '{table}': missing required columns {columns:?}")
            }
            Self::BadReducer(msg) => write!(f, "bad reducer: {msg}"),
        }
    }
}

impl std::error::Error for MergeError {}
