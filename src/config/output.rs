//! Output selection: which currencies to keep and how to print them.

use clap::ValueEnum;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Currency codes to retain, upper-cased on load
    #[serde(deserialize_with = "deserialize_currencies")]
    pub currencies: Vec<String>,

    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            currencies: vec!["EUR".to_string(), "USD".to_string()],
            format: OutputFormat::Json,
        }
    }
}

/// Upper-cases and de-duplicates codes, keeping first occurrence order.
pub fn normalize_currencies<I, S>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for code in codes {
        let code = code.as_ref().trim().to_uppercase();
        if !code.is_empty() && !normalized.contains(&code) {
            normalized.push(code);
        }
    }
    normalized
}

fn deserialize_currencies<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let codes = Vec::<String>::deserialize(deserializer)?;
    Ok(normalize_currencies(codes))
}
