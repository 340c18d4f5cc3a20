//! Shared `~/.aws/credentials` and `~/.aws/config` files.
//!
//! Only static keys and `region` are read. `role_arn`, `sso_*` and
//! `credential_process` profiles are not resolved.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::credentials::Credentials;
use crate::error::{ClientError, Result};

type Section = HashMap<String, String>;

/// The selected profile, merged from both shared files.
#[derive(Debug, Default, Clone)]
pub struct ProfileSet {
    name: String,
    credentials_path: Option<PathBuf>,
    credentials: Section,
    config: Section,
}

impl ProfileSet {
    /// Load `AWS_PROFILE` (or `default`) from the shared files. Missing files
    /// yield an empty profile.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let name = lookup("AWS_PROFILE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "default".to_string());
        let credentials_path = shared_file(&lookup, "AWS_SHARED_CREDENTIALS_FILE", "credentials");
        let config_path = shared_file(&lookup, "AWS_CONFIG_FILE", "config");

        let credentials = credentials_path
            .as_deref()
            .and_then(read_sections)
            .and_then(|mut sections| sections.remove(&name))
            .unwrap_or_default();
        let config_section = if name == "default" {
            "default".to_string()
        } else {
            format!("profile {name}")
        };
        let config = config_path
            .as_deref()
            .and_then(read_sections)
            .and_then(|mut sections| sections.remove(&config_section))
            .unwrap_or_default();

        tracing::debug!(profile = %name, "loaded shared AWS profile");
        Self {
            name,
            credentials_path,
            credentials,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.credentials
            .get(key)
            .or_else(|| self.config.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Static keys from the profile. `Ok(None)` when the profile has none.
    pub fn credentials(&self) -> Result<Option<Credentials>> {
        let access_key_id = self.get("aws_access_key_id");
        let secret_access_key = self.get("aws_secret_access_key");
        match (access_key_id, secret_access_key) {
            (None, None) => Ok(None),
            (Some(id), Some(secret)) => Ok(Some(Credentials {
                access_key_id: id.to_string(),
                secret_access_key: secret.to_string(),
                session_token: self.get("aws_session_token").map(str::to_string),
            })),
            _ => Err(ClientError::Profile {
                profile: self.name.clone(),
                path: self
                    .credentials_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                reason: "aws_access_key_id and aws_secret_access_key must both be set".into(),
            }),
        }
    }

    pub fn region(&self) -> Option<String> {
        self.get("region").map(str::to_string)
    }
}

fn shared_file(
    lookup: &impl Fn(&str) -> Option<String>,
    override_var: &str,
    file_name: &str,
) -> Option<PathBuf> {
    lookup(override_var)
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|home| home.join(".aws").join(file_name)))
}

fn read_sections(path: &Path) -> Option<HashMap<String, Section>> {
    let text = std::fs::read_to_string(path).ok()?;
    Some(parse_sections(&text))
}

/// Minimal INI parsing: `[section]` headers and `key = value` lines.
/// Comments start with `#` or `;`. Keys are lowercased.
fn parse_sections(text: &str) -> HashMap<String, Section> {
    let mut sections: HashMap<String, Section> = HashMap::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let header = header.split_whitespace().collect::<Vec<_>>().join(" ");
            sections.entry(header.clone()).or_default();
            current = Some(header);
            continue;
        }
        let (Some(section), Some((key, value))) = (&current, line.split_once('=')) else {
            continue;
        };
        if let Some(entries) = sections.get_mut(section) {
            entries.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }
    sections
}
