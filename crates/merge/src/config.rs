use serde::Deserialize;

use crate::error::MergeError;

/// A merge run described in TOML: where each source dataset lives and where
/// the processed tables go.
///
/// ```toml
/// name = "Daily customer merge"
///
/// [inputs]
/// people_primary   = "data/people.json"
/// people_secondary = "data/people.yml"
/// promotions       = "data/promotions.csv"
/// transfers        = "data/transfers.csv"
/// transactions     = "data/transactions.csv"   # optional
///
/// [output]
/// dir = "data/processed"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    pub name: String,
    pub inputs: InputsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    pub people_primary: String,
    pub people_secondary: String,
    pub promotions: String,
    pub transfers: String,
    #[serde(default)]
    pub transactions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "processed".to_string()
}

impl MergeConfig {
    pub fn from_toml(s: &str) -> Result<Self, MergeError> {
        let config: Self = toml::from_str(s).map_err(|e| MergeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), MergeError> {
        let required = [
            ("inputs.people_primary", &self.inputs.people_primary),
            ("inputs.people_secondary", &self.inputs.people_secondary),
            ("inputs.promotions", &self.inputs.promotions),
            ("inputs.transfers", &self.inputs.transfers),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(MergeError::ConfigValidation(format!(
                    "{field} must not be empty"
                )));
            }
        }
        if let Some(t) = &self.inputs.transactions {
            if t.trim().is_empty() {
                return Err(MergeError::ConfigValidation(
                    "inputs.transactions must not be empty when present".into(),
                ));
            }
        }
        if self.output.dir.trim().is_empty() {
            return Err(MergeError::ConfigValidation(
                "output.dir must not be empty".into(),
            ));
        }
        Ok(())
    }
}
