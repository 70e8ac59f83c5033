use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File name looked up in the package directory.
pub const CONFIG_FILE: &str = "ingen.toml";

pub const DEFAULT_OUTPUT: &str = "type_helpers.go";
pub const DEFAULT_METHOD: &str = "In";

/// Reserved words of Go; none of them can name a method.
const GO_KEYWORDS: [&str; 25] = [
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
    "package", "range", "return", "select", "struct", "switch", "type", "var",
];

/// How the comparability analysis treats opaque shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparabilityPolicy {
    /// Every opaque shape is comparable. Matches the historical behaviour of the tool.
    #[default]
    Permissive,
    /// Function-typed shapes are rejected as well.
    Strict,
}

/// The parsed `ingen.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub generate: GenerateSection,
    #[serde(default)]
    pub format: FormatSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateSection {
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub policy: ComparabilityPolicy,
}

impl Default for GenerateSection {
    fn default() -> Self {
        Self {
            output: default_output(),
            method: default_method(),
            exclude: Vec::new(),
            policy: ComparabilityPolicy::default(),
        }
    }
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatSection {
    /// External formatter invocation, e.g. `["gofmt"]`. Program first, then arguments.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid ingen.toml: {0}")]
    Parse(String),
    #[error("invalid method name '{0}': must be a Go identifier")]
    InvalidMethod(String),
    #[error("invalid output file name '{0}': expected a bare file name ending in .go")]
    InvalidOutput(String),
    #[error("invalid ingen.toml: [format] command must name a program")]
    EmptyFormatCommand,
}

/// Load `ingen.toml` from `dir`, falling back to defaults when the file is absent.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse_config(&content)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_method(&config.generate.method)?;
    validate_output(&config.generate.output)?;
    if let Some(command) = &config.format.command {
        if command.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(ConfigError::EmptyFormatCommand);
        }
    }
    Ok(config)
}

pub fn validate_method(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
                && name != "_"
                && !GO_KEYWORDS.contains(&name)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidMethod(name.to_string()))
    }
}

pub fn validate_output(name: &str) -> Result<(), ConfigError> {
    let bare = !name.contains('/') && !name.contains('\\');
    if bare && name.len() > ".go".len() && name.ends_with(".go") && !name.ends_with("_test.go") {
        Ok(())
    } else {
        Err(ConfigError::InvalidOutput(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.generate.output, "type_helpers.go");
        assert_eq!(config.generate.method, "In");
        assert_eq!(config.generate.policy, ComparabilityPolicy::Permissive);
        assert!(config.format.command.is_none());
    }

    #[test]
    fn full_file() {
        let config = parse_config(
            r#"
[generate]
output = "membership.go"
method = "OneOf"
exclude = ["Scratch", "Temp"]
policy = "strict"

[format]
command = ["gofmt", "-s"]
"#,
        )
        .unwrap();
        assert_eq!(config.generate.output, "membership.go");
        assert_eq!(config.generate.method, "OneOf");
        assert_eq!(config.generate.exclude, ["Scratch", "Temp"]);
        assert_eq!(config.generate.policy, ComparabilityPolicy::Strict);
        assert_eq!(
            config.format.command,
            Some(vec!["gofmt".to_string(), "-s".to_string()])
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse_config("[generate]\nmethods = \"In\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = parse_config("[generate]\npolicy = \"lenient\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn method_must_be_identifier() {
        assert!(validate_method("In").is_ok());
        assert!(validate_method("isOneOf2").is_ok());
        assert!(validate_method("_in").is_ok());
        assert!(matches!(validate_method(""), Err(ConfigError::InvalidMethod(_))));
        assert!(matches!(validate_method("_"), Err(ConfigError::InvalidMethod(_))));
        assert!(matches!(validate_method("2In"), Err(ConfigError::InvalidMethod(_))));
        assert!(matches!(validate_method("In-List"), Err(ConfigError::InvalidMethod(_))));
    }

    #[test]
    fn method_must_not_be_keyword() {
        for keyword in ["func", "type", "range", "map", "interface"] {
            assert!(matches!(
                validate_method(keyword),
                Err(ConfigError::InvalidMethod(ref name)) if name == keyword
            ));
        }
        assert!(validate_method("Range").is_ok());
        let err = parse_config("[generate]\nmethod = \"select\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMethod(_)));
    }

    #[test]
    fn output_must_be_bare_go_file() {
        assert!(validate_output("type_helpers.go").is_ok());
        assert!(validate_output("sub/type_helpers.go").is_err());
        assert!(validate_output("helpers.txt").is_err());
        assert!(validate_output(".go").is_err());
        assert!(validate_output("helpers_test.go").is_err());
    }

    #[test]
    fn empty_format_command_is_rejected() {
        let err = parse_config("[format]\ncommand = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyFormatCommand));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = std::env::temp_dir().join("ingen-config-missing-dir-test");
        let config = load_config(&dir).unwrap();
        assert_eq!(config, Config::default());
    }
}
