use crate::core::{ConfigProvider, RowErrorPolicy};
use crate::utils::error::{ReportError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_email, validate_file_extension, validate_non_empty_string, validate_path, validate_url,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "LINK_REPORT_CONFIG";

pub const DEFAULT_SUBJECT: &str = "External Resource Link Report";
pub const DEFAULT_BODY: &str = "Dear Customer Success,
Find attached a file containing course keys and their respective
external resource links.

If you have any questions/concerns with the report, please ask the
Enterprise Team (kindly)!

Sincerely,
The Enterprise Team";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub source: SourceConfig,
    pub email: EmailConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    CourseGraph,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub r#type: SourceType,
    pub endpoint: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub from: String,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub outbox_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            outbox_path: "./outbox".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub on_row_error: RowErrorPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl ReportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${COURSEGRAPH_HOST})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 依環境變數組出配置（未提供設定檔時使用）
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ReportError::MissingConfigError {
                    field: key.to_string(),
                })
        };

        let source = match lookup("LINK_REPORT_ROWS") {
            Some(path) => SourceConfig {
                r#type: SourceType::File,
                endpoint: None,
                database: None,
                username: None,
                password: None,
                timeout_seconds: None,
                path: Some(path),
            },
            None => {
                let host = require("COURSEGRAPH_HOST")?;
                let endpoint = match lookup("COURSEGRAPH_PORT") {
                    Some(port) => format!("https://{}:{}", host, port),
                    None => format!("https://{}", host),
                };
                SourceConfig {
                    r#type: SourceType::CourseGraph,
                    endpoint: Some(endpoint),
                    database: lookup("COURSEGRAPH_DATABASE"),
                    username: lookup("COURSEGRAPH_USER"),
                    password: lookup("COURSEGRAPH_PASSWORD"),
                    timeout_seconds: None,
                    path: None,
                }
            }
        };

        let on_row_error = match lookup("LINK_REPORT_ON_ROW_ERROR").as_deref() {
            None | Some("abort") => RowErrorPolicy::Abort,
            Some("skip") => RowErrorPolicy::Skip,
            Some(other) => {
                return Err(ReportError::InvalidConfigValueError {
                    field: "LINK_REPORT_ON_ROW_ERROR".to_string(),
                    value: other.to_string(),
                    reason: "Expected 'abort' or 'skip'".to_string(),
                })
            }
        };

        let format = match lookup("LINK_REPORT_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        Ok(Self {
            source,
            email: EmailConfig {
                from: require("SEND_EMAIL_FROM")?,
                subject: None,
                body: None,
            },
            output: lookup("LINK_REPORT_OUTBOX")
                .map(|outbox_path| OutputConfig { outbox_path })
                .unwrap_or_default(),
            processing: ProcessingConfig { on_row_error },
            logging: LoggingConfig { format },
        })
    }

    /// 有設定檔路徑就讀檔，否則讀環境變數
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => Self::from_env(),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        match self.source.r#type {
            SourceType::CourseGraph => {
                let endpoint = self.source.endpoint.as_deref().ok_or_else(|| {
                    ReportError::MissingConfigError {
                        field: "source.endpoint".to_string(),
                    }
                })?;
                validate_url("source.endpoint", endpoint)?;
                if let Some(database) = &self.source.database {
                    validate_non_empty_string("source.database", database)?;
                }
            }
            SourceType::File => {
                let path = self.source.path.as_deref().ok_or_else(|| {
                    ReportError::MissingConfigError {
                        field: "source.path".to_string(),
                    }
                })?;
                validate_path("source.path", path)?;
                validate_file_extension("source.path", path, &["json", "csv"])?;
            }
        }

        validate_email("email.from", &self.email.from)?;
        validate_path("output.outbox_path", &self.output.outbox_path)?;

        Ok(())
    }

    pub fn outbox_path(&self) -> &str {
        &self.output.outbox_path
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging.format
    }
}

impl ConfigProvider for ReportConfig {
    fn sender(&self) -> &str {
        &self.email.from
    }

    fn subject(&self) -> &str {
        self.email.subject.as_deref().unwrap_or(DEFAULT_SUBJECT)
    }

    fn body(&self) -> &str {
        self.email.body.as_deref().unwrap_or(DEFAULT_BODY)
    }

    fn row_error_policy(&self) -> RowErrorPolicy {
        self.processing.on_row_error
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
