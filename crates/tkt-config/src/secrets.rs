//! Service credential resolution.
//!
//! # Contract
//! - Settings store only env var NAMES ([`CredentialEnvNames`]).
//! - Binaries call [`resolve_credentials`] once at startup, before any ledger
//!   call, and pass the result into the store constructor.
//! - `Debug` redacts values; errors name the env var, never its value.

use crate::{ConfigError, CredentialEnvNames};

/// Service principal plus its private key, resolved from the environment.
#[derive(Clone)]
pub struct ServiceCredentials {
    /// Service account email.
    pub principal: String,
    /// PEM-encoded RSA private key with real newlines.
    pub private_key: String,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("principal", &"<REDACTED>")
            .field("private_key", &"<REDACTED>")
            .finish()
    }
}

/// Resolve credentials from the process environment.
pub fn resolve_credentials(names: &CredentialEnvNames) -> Result<ServiceCredentials, ConfigError> {
    resolve_credentials_with(names, |var| std::env::var(var).ok())
}

/// Resolve credentials through `lookup`. Tests pass a closure instead of
/// mutating the process environment.
pub fn resolve_credentials_with<F>(
    names: &CredentialEnvNames,
    lookup: F,
) -> Result<ServiceCredentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    let principal = non_blank(&names.principal_env).ok_or_else(|| ConfigError::Missing {
        what: "service principal",
        var: names.principal_env.clone(),
    })?;
    let raw_key = non_blank(&names.private_key_env).ok_or_else(|| ConfigError::Missing {
        what: "service private key",
        var: names.private_key_env.clone(),
    })?;

    Ok(ServiceCredentials {
        principal: principal.trim().to_string(),
        private_key: unescape_newlines(&raw_key),
    })
}

/// Keys pasted into a single-line env var carry literal `\n` sequences.
fn unescape_newlines(raw: &str) -> String {
    raw.trim().replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> CredentialEnvNames {
        CredentialEnvNames {
            principal_env: "TKT_TEST_PRINCIPAL".to_string(),
            private_key_env: "TKT_TEST_KEY".to_string(),
        }
    }

    #[test]
    fn escaped_newlines_become_real_newlines() {
        let creds = resolve_credentials_with(&names(), |var| match var {
            "TKT_TEST_PRINCIPAL" => Some("gate@project.iam.gserviceaccount.com".to_string()),
            "TKT_TEST_KEY" => Some("line1\\nline2\\n".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(creds.private_key, "line1\nline2\n");
        assert_eq!(creds.principal, "gate@project.iam.gserviceaccount.com");
    }

    #[test]
    fn blank_principal_is_missing() {
        let err = resolve_credentials_with(&names(), |var| match var {
            "TKT_TEST_PRINCIPAL" => Some("   ".to_string()),
            "TKT_TEST_KEY" => Some("k".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                what: "service principal",
                var: "TKT_TEST_PRINCIPAL".to_string()
            }
        );
    }

    #[test]
    fn debug_is_redacted() {
        let creds = ServiceCredentials {
            principal: "someone@example.org".to_string(),
            private_key: "super-secret".to_string(),
        };
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("someone@example.org"));
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<REDACTED>"));
    }
}
