// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Client settings are loaded from a TOML file in the client root directory
//! (`ebics.toml` by default). The root itself comes from the
//! `EBICS_CLIENT_HOME` environment variable, falling back to
//! `$HOME/ebics/client`.
//!
//! ```toml
//! product_name = "Treasury Gateway"
//! language_code = "de"      # default "de"
//! country_code = "DE"       # default "DE"
//! password = "..."          # keystore password
//!
//! [bank]
//! url = "https://bank.example/ebics"
//! name = "Example Bank"
//! host_id = "HOST1"
//! use_certificate = false   # default false
//!
//! [partner]
//! id = "PARTNER1"
//!
//! [user]
//! id = "USER1"
//! name = "Jane Doe"
//! email = "jane@corp.example"
//! country = "Germany"
//! organization = "Corp Treasury"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::models::Product;

/// Environment variable overriding the client root directory.
pub const CLIENT_HOME_ENV: &str = "EBICS_CLIENT_HOME";

/// Settings file name inside the client root.
pub const SETTINGS_FILE: &str = "ebics.toml";

fn default_language() -> String {
    "de".to_string()
}

fn default_country() -> String {
    "DE".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct BankSettings {
    url: Url,
    name: String,
    host_id: String,
    #[serde(default)]
    use_certificate: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct PartnerSettings {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
struct UserSettings {
    id: String,
    name: String,
    email: String,
    country: String,
    organization: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SettingsFile {
    product_name: String,
    #[serde(default = "default_language")]
    language_code: String,
    #[serde(default = "default_country")]
    country_code: String,
    password: String,
    bank: BankSettings,
    partner: PartnerSettings,
    user: UserSettings,
}

/// Resolved runtime configuration, passed by reference into every session.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    settings: SettingsFile,
}

impl Config {
    /// Loads settings from `path`, anchoring all client state at `root`.
    pub fn load(root: impl Into<PathBuf>, path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::configuration(format!("settings file not found: {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        let mut settings: SettingsFile = toml::from_str(&raw)
            .map_err(|e| Error::configuration(format!("unreadable settings file: {e}")))?;
        settings.language_code = settings.language_code.to_lowercase();
        settings.country_code = settings.country_code.to_uppercase();

        Ok(Self {
            root: root.into(),
            settings,
        })
    }

    /// Loads settings from the conventional location under `root`.
    pub fn load_default(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let path = root.join(SETTINGS_FILE);
        Self::load(root, &path)
    }

    /// The client root directory, resolved from the environment.
    pub fn default_root() -> Result<PathBuf> {
        if let Some(home) = env::var_os(CLIENT_HOME_ENV) {
            return Ok(PathBuf::from(home));
        }
        let home = env::var_os("HOME")
            .ok_or_else(|| Error::configuration("neither EBICS_CLIENT_HOME nor HOME is set"))?;
        Ok(PathBuf::from(home).join("ebics").join("client"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bank_url(&self) -> &Url {
        &self.settings.bank.url
    }

    pub fn bank_name(&self) -> &str {
        &self.settings.bank.name
    }

    pub fn host_id(&self) -> &str {
        &self.settings.bank.host_id
    }

    pub fn bank_uses_certificate(&self) -> bool {
        self.settings.bank.use_certificate
    }

    pub fn partner_id(&self) -> &str {
        &self.settings.partner.id
    }

    pub fn user_id(&self) -> &str {
        &self.settings.user.id
    }

    pub fn user_name(&self) -> &str {
        &self.settings.user.name
    }

    pub fn user_email(&self) -> &str {
        &self.settings.user.email
    }

    pub fn user_country(&self) -> &str {
        &self.settings.user.country
    }

    pub fn user_organization(&self) -> &str {
        &self.settings.user.organization
    }

    pub fn language_code(&self) -> &str {
        &self.settings.language_code
    }

    pub fn country_code(&self) -> &str {
        &self.settings.country_code
    }

    pub fn password(&self) -> &str {
        &self.settings.password
    }

    /// Product descriptor attached to every protocol request.
    pub fn product(&self) -> Product {
        Product::new(self.settings.product_name.clone(), self.settings.language_code.clone())
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::for_tests_at("/tmp/ebics-client-tests")
    }

    #[cfg(test)]
    pub(crate) fn for_tests_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            settings: SettingsFile {
                product_name: "ebics-client".to_string(),
                language_code: "de".to_string(),
                country_code: "DE".to_string(),
                password: "test-password".to_string(),
                bank: BankSettings {
                    url: "https://bank.example/ebics".parse().unwrap(),
                    name: "Example Bank".to_string(),
                    host_id: "HOST1".to_string(),
                    use_certificate: false,
                },
                partner: PartnerSettings {
                    id: "PARTNER1".to_string(),
                },
                user: UserSettings {
                    id: "USER1".to_string(),
                    name: "Jane Doe".to_string(),
                    email: "jane@corp.example".to_string(),
                    country: "Germany".to_string(),
                    organization: "Corp Treasury".to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
product_name = "Treasury Gateway"
language_code = "FR"
country_code = "fr"
password = "s3cret"

[bank]
url = "https://bank.example/ebics"
name = "Example Bank"
host_id = "HOST1"

[partner]
id = "PARTNER1"

[user]
id = "USER1"
name = "Jane Doe"
email = "jane@corp.example"
country = "France"
organization = "Corp Treasury"
"#;

    #[test]
    fn loads_and_normalizes_locale_codes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::load_default(temp.path()).unwrap();
        assert_eq!(config.language_code(), "fr");
        assert_eq!(config.country_code(), "FR");
        assert_eq!(config.host_id(), "HOST1");
        assert_eq!(config.partner_id(), "PARTNER1");
        assert_eq!(config.user_id(), "USER1");
        assert!(!config.bank_uses_certificate());

        let product = config.product();
        assert_eq!(product.name, "Treasury Gateway");
        assert_eq!(product.language, "fr");
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let temp = TempDir::new().unwrap();
        let err = Config::load_default(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "product_name = ").unwrap();
        let err = Config::load_default(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn missing_required_key_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        fs::write(&path, "language_code = \"de\"").unwrap();
        let err = Config::load_default(temp.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
