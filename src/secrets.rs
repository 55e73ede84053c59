use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Value written into a fresh secrets file; treated as "not configured".
pub const PLACEHOLDER: &str = "...";

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("You need to specify login and password in \"{}\"", .0.display())]
    Created(PathBuf),
    #[error("You need to specify login")]
    MissingLogin,
    #[error("You need to specify password")]
    MissingPassword,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SecretsError {
    /// The operator has to edit the secrets file before running again.
    pub fn needs_setup(&self) -> bool {
        matches!(
            self,
            SecretsError::Created(_) | SecretsError::MissingLogin | SecretsError::MissingPassword
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SecretsFile {
    login: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

fn configured(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != PLACEHOLDER)
}

/// Reads login and password from `path`. On first run the file is created
/// with placeholder values and [`SecretsError::Created`] is returned.
pub fn load(path: &Path) -> Result<Credentials, SecretsError> {
    if !path.is_file() {
        let template = SecretsFile {
            login: Some(PLACEHOLDER.to_string()),
            password: Some(PLACEHOLDER.to_string()),
        };
        std::fs::write(path, serde_json::to_string_pretty(&template)?)?;
        debug!(path = %path.display(), "created secrets template");
        return Err(SecretsError::Created(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let secrets: SecretsFile = serde_json::from_str(&content)?;
    let login = configured(secrets.login).ok_or(SecretsError::MissingLogin)?;
    let password = configured(secrets.password).ok_or(SecretsError::MissingPassword)?;

    Ok(Credentials { login, password })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn first_run_creates_template_and_halts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");

        let err = load(&path).unwrap_err();
        assert!(matches!(err, SecretsError::Created(_)));
        assert!(err.needs_setup());

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({"login": "...", "password": "..."}));

        let again = load(&path).unwrap_err();
        assert!(matches!(again, SecretsError::MissingLogin));
    }

    #[test]
    fn placeholder_or_missing_fields_are_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");

        std::fs::write(&path, r#"{"login": "me", "password": "..."}"#).unwrap();
        assert!(matches!(load(&path), Err(SecretsError::MissingPassword)));

        std::fs::write(&path, r#"{"password": "pw"}"#).unwrap();
        assert!(matches!(load(&path), Err(SecretsError::MissingLogin)));
    }

    #[test]
    fn configured_file_yields_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, r#"{"login": "me@mail.ru", "password": "пароль"}"#).unwrap();

        let creds = load(&path).unwrap();
        assert_eq!(creds.login, "me@mail.ru");
        assert_eq!(creds.password, "пароль");
    }

    #[test]
    fn malformed_file_is_an_error_not_a_setup_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, "login=me").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, SecretsError::Json(_)));
        assert!(!err.needs_setup());
    }
}
