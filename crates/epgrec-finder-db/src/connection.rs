//! Database connection management.

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlSslMode};
use sqlx::Connection;
use url::form_urlencoded;

use crate::error::FinderError;
use crate::query::DEFAULT_TABLE_PREFIX;

/// Connection parameters for the epgrec database (`[database]` table).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Driver name. Only `mysql` is supported.
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Login user.
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Server host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port. Accepts an integer or a numeric string.
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,
    /// Database name.
    pub dbname: String,
    /// Driver options, `key=value` pairs joined by `&`.
    #[serde(default)]
    pub option: String,
    /// epgrec table prefix.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
}

fn default_driver() -> String {
    String::from("mysql")
}

fn default_host() -> String {
    String::from("localhost")
}

const fn default_port() -> u16 {
    3306
}

fn default_table_prefix() -> String {
    String::from(DEFAULT_TABLE_PREFIX)
}

/// Port as written in the config file.
#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port: {s}"))),
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("username", &self.username)
            .field("password", &"****")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("option", &self.option)
            .field("table_prefix", &self.table_prefix)
            .finish()
    }
}

impl DatabaseConfig {
    /// Returns the data source name: `user:password@(host:port)/dbname?options`.
    #[must_use]
    pub fn dsn(&self) -> String {
        self.format_dsn(&self.password)
    }

    /// Same as [`Self::dsn`] with the password masked, for logs and errors.
    #[must_use]
    pub fn redacted_dsn(&self) -> String {
        self.format_dsn("****")
    }

    fn format_dsn(&self, password: &str) -> String {
        format!(
            "{}:{}@({}:{})/{}?{}",
            self.username, password, self.host, self.port, self.dbname, self.option
        )
    }

    /// Builds `sqlx` connect options.
    ///
    /// `charset`, `collation`, `ssl-mode` and `timezone` from the option
    /// string are applied; other keys are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver is not `mysql` or `ssl-mode` has an
    /// unknown value.
    pub fn connect_options(&self) -> Result<MySqlConnectOptions, FinderError> {
        if !self.driver.eq_ignore_ascii_case("mysql") {
            return Err(FinderError::UnsupportedDriver(self.driver.clone()));
        }

        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.dbname);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }

        for (key, value) in form_urlencoded::parse(self.option.as_bytes()) {
            options = match key.as_ref() {
                "charset" => options.charset(&value),
                "collation" => options.collation(&value),
                "ssl-mode" | "sslmode" => {
                    let mode: MySqlSslMode =
                        value.parse().map_err(|_| FinderError::InvalidOption {
                            key: key.clone().into_owned(),
                            value: value.clone().into_owned(),
                        })?;
                    options.ssl_mode(mode)
                }
                "timezone" | "time-zone" => options.timezone(Some(value.into_owned())),
                _ => {
                    tracing::debug!(key = %key, "Ignoring unsupported connection option");
                    options
                }
            };
        }

        Ok(options)
    }
}

/// Opens a single connection to the configured database.
///
/// # Errors
///
/// Returns an error if the options are invalid or the server cannot be reached.
pub async fn connect(config: &DatabaseConfig) -> Result<MySqlConnection, FinderError> {
    let options = config.connect_options()?;
    tracing::debug!(dsn = %config.redacted_dsn(), "Connecting to database");
    MySqlConnection::connect_with(&options)
        .await
        .map_err(FinderError::Connection)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use tracing::subscriber::with_default;
    use tracing_mock::{expect, subscriber};

    use super::*;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            driver: String::from("mysql"),
            username: String::from("epgrec"),
            password: String::from("secret"),
            host: String::from("db.local"),
            port: 3306,
            dbname: String::from("epgrec"),
            option: String::from("charset=utf8"),
            table_prefix: String::from(DEFAULT_TABLE_PREFIX),
        }
    }

    #[test]
    fn test_dsn_format() {
        // Arrange
        let config = config();

        // Act & Assert
        assert_eq!(config.dsn(), "epgrec:secret@(db.local:3306)/epgrec?charset=utf8");
        assert_eq!(
            config.redacted_dsn(),
            "epgrec:****@(db.local:3306)/epgrec?charset=utf8"
        );
    }

    #[test]
    fn test_debug_hides_password() {
        // Arrange & Act
        let out = format!("{:?}", config());

        // Assert
        assert!(!out.contains("secret"));
        assert!(out.contains("epgrec"));
    }

    #[test]
    fn test_deserialize_port_from_string() {
        // Arrange
        let src = r#"
            username = "u"
            dbname = "d"
            port = "3307"
        "#;

        // Act
        let config: DatabaseConfig = toml::from_str(src).unwrap();

        // Assert
        assert_eq!(config.port, 3307);
        assert_eq!(config.driver, "mysql");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.table_prefix, "Recorder_");
    }

    #[test]
    fn test_deserialize_port_from_integer() {
        // Arrange
        let src = "username = \"u\"\ndbname = \"d\"\nport = 13306\n";

        // Act
        let config: DatabaseConfig = toml::from_str(src).unwrap();

        // Assert
        assert_eq!(config.port, 13306);
    }

    #[test]
    fn test_deserialize_port_invalid() {
        // Arrange
        let src = "username = \"u\"\ndbname = \"d\"\nport = \"abc\"\n";

        // Act
        let result: Result<DatabaseConfig, _> = toml::from_str(src);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_connect_options_rejects_other_driver() {
        // Arrange
        let mut config = config();
        config.driver = String::from("postgres");

        // Act
        let result = config.connect_options();

        // Assert
        assert!(matches!(result, Err(FinderError::UnsupportedDriver(d)) if d == "postgres"));
    }

    #[test]
    fn test_connect_options_rejects_bad_ssl_mode() {
        // Arrange
        let mut config = config();
        config.option = String::from("ssl-mode=sometimes");

        // Act
        let result = config.connect_options();

        // Assert
        assert!(matches!(
            result,
            Err(FinderError::InvalidOption { key, value }) if key == "ssl-mode" && value == "sometimes"
        ));
    }

    #[test]
    fn test_connect_options_applies_known_options() {
        // Arrange
        let mut config = config();
        config.option = String::from("charset=utf8mb4&ssl-mode=disabled&timezone=%2B09%3A00");

        // Act
        let result = config.connect_options();

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_connect_options_logs_ignored_option() {
        // Arrange
        let mut config = config();
        config.option = String::from("parseTime=true");
        let (subscriber, handle) = subscriber::mock()
            .event(
                expect::event()
                    .at_level(tracing::Level::DEBUG)
                    .with_fields(expect::msg("Ignoring unsupported connection option")),
            )
            .only()
            .run_with_handle();

        // Act
        let result = with_default(subscriber, || config.connect_options());

        // Assert
        assert!(result.is_ok());
        handle.assert_finished();
    }
}
