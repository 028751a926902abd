pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_recipients, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "external-link-report")]
#[command(about = "Emails the external resource link and domain reports for all courses")]
pub struct CliConfig {
    /// Comma-separated list of recipient e-mail addresses
    #[arg(value_delimiter = ',', required = true)]
    pub recipients: Vec<String>,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn recipient_list(&self) -> Vec<String> {
        self.recipients
            .iter()
            .map(|address| address.trim().to_string())
            .filter(|address| !address.is_empty())
            .collect()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_recipients("recipients", &self.recipient_list())
    }
}
