//! Engine configuration.
//!
//! Configuration is an explicit value handed to the services and adapters at
//! construction. [`EngineConfig::from_env`] reads `PERMITDESK_*` variables,
//! falling back to defaults (with a warning) when a value cannot be used.

use crate::task::domain::ApprovalOrdering;
use camino::Utf8PathBuf;
use std::env;
use tracing::warn;

const DEFAULT_CODE_SEQUENCE_WIDTH: usize = 4;
const MAX_CODE_SEQUENCE_WIDTH: usize = 10;
const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 3;
const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const DEFAULT_ALLOWED_EXTENSIONS: [&str; 6] = [".pdf", ".doc", ".docx", ".jpg", ".jpeg", ".png"];
const DEFAULT_ATTACHMENT_ROOT: &str = "file/tasks";

const ENV_CODE_SEQUENCE_WIDTH: &str = "PERMITDESK_CODE_SEQUENCE_WIDTH";
const ENV_MAX_CODE_ATTEMPTS: &str = "PERMITDESK_MAX_CODE_ATTEMPTS";
const ENV_ENFORCE_APPROVAL_ORDER: &str = "PERMITDESK_ENFORCE_APPROVAL_ORDER";
const ENV_MAX_FILE_SIZE: &str = "PERMITDESK_MAX_FILE_SIZE";
const ENV_ALLOWED_EXTENSIONS: &str = "PERMITDESK_ALLOWED_EXTENSIONS";
const ENV_ATTACHMENT_ROOT: &str = "PERMITDESK_ATTACHMENT_ROOT";

/// Settings shared by the lifecycle services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Zero-padding width of the task code number.
    pub code_sequence_width: usize,
    /// How many codes `create` tries before giving up with a conflict.
    pub max_code_attempts: u32,
    /// Require stage one to be resolved before stage two.
    pub enforce_approval_order: bool,
    /// Attachment validation and placement.
    pub attachments: AttachmentLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            code_sequence_width: DEFAULT_CODE_SEQUENCE_WIDTH,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
            enforce_approval_order: false,
            attachments: AttachmentLimits::default(),
        }
    }
}

impl EngineConfig {
    /// Reads configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|name| env::var(name).ok())
    }

    /// Reads configuration through `get_env`, so callers can supply values
    /// without touching the process environment.
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let width = read_env(
            ENV_CODE_SEQUENCE_WIDTH,
            defaults.code_sequence_width,
            &get_env,
        );
        let code_sequence_width = if (1..=MAX_CODE_SEQUENCE_WIDTH).contains(&width) {
            width
        } else {
            warn!(
                "{ENV_CODE_SEQUENCE_WIDTH}={width} is outside 1..={MAX_CODE_SEQUENCE_WIDTH}. \
                 Using default {DEFAULT_CODE_SEQUENCE_WIDTH}."
            );
            defaults.code_sequence_width
        };

        let max_code_attempts = normalize_nonzero(
            read_env(ENV_MAX_CODE_ATTEMPTS, defaults.max_code_attempts, &get_env),
            ENV_MAX_CODE_ATTEMPTS,
            defaults.max_code_attempts,
        );

        Self {
            code_sequence_width,
            max_code_attempts,
            enforce_approval_order: read_env_bool(
                ENV_ENFORCE_APPROVAL_ORDER,
                defaults.enforce_approval_order,
                &get_env,
            ),
            attachments: AttachmentLimits::from_env_with(defaults.attachments, &get_env),
        }
    }

    /// Returns the approval ordering these settings select.
    #[must_use]
    pub const fn approval_ordering(&self) -> ApprovalOrdering {
        if self.enforce_approval_order {
            ApprovalOrdering::Sequential
        } else {
            ApprovalOrdering::Lenient
        }
    }
}

/// Attachment validation rules and storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLimits {
    /// Largest accepted upload, in bytes.
    pub max_file_size: u64,
    /// Accepted extensions, lower case with a leading dot.
    pub allowed_extensions: Vec<String>,
    /// Directory attachments are written under.
    pub root: Utf8PathBuf,
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_owned())
                .collect(),
            root: Utf8PathBuf::from(DEFAULT_ATTACHMENT_ROOT),
        }
    }
}

impl AttachmentLimits {
    fn from_env_with<F>(defaults: Self, get_env: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_file_size = normalize_nonzero(
            read_env(ENV_MAX_FILE_SIZE, defaults.max_file_size, get_env),
            ENV_MAX_FILE_SIZE,
            defaults.max_file_size,
        );

        let allowed_extensions = match get_env(ENV_ALLOWED_EXTENSIONS) {
            Some(value) => {
                let parsed = parse_extensions(&value);
                if parsed.is_empty() {
                    warn!("{ENV_ALLOWED_EXTENSIONS}='{value}' names no extensions. Using defaults.");
                    defaults.allowed_extensions
                } else {
                    parsed
                }
            }
            None => defaults.allowed_extensions,
        };

        let root = get_env(ENV_ATTACHMENT_ROOT)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .map_or(defaults.root, Utf8PathBuf::from);

        Self {
            max_file_size,
            allowed_extensions,
            root,
        }
    }

    /// Returns `true` when `extension` (with leading dot, any case) is
    /// accepted.
    #[must_use]
    pub fn allows_extension(&self, extension: &str) -> bool {
        let lowered = extension.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|allowed| *allowed == lowered)
    }
}

fn parse_extensions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|item| !item.is_empty())
        .map(|item| format!(".{item}"))
        .collect()
}

fn read_env<T, F>(name: &str, default: T, get_env: &F) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Invalid {name}='{value}': {err}. Using default {default}.");
                default
            }
        },
        None => default,
    }
}

fn read_env_bool<F>(name: &str, default: bool, get_env: &F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match get_env(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                warn!("Invalid {name}='{value}'. Using default {default}.");
                default
            }
        },
        None => default,
    }
}

fn normalize_nonzero<T>(value: T, name: &str, default: T) -> T
where
    T: PartialEq + Default + std::fmt::Display,
{
    if value == T::default() {
        warn!("{name} must be greater than zero. Using default {default}.");
        default
    } else {
        value
    }
}
