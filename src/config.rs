//! Configuration loading
//!
//! Loads SQL Server connection configuration from environment variables
//! (optionally reading a .env file first) or from an ADO-style connection
//! string. The database name is the initial catalog the snapshot targets.

use crate::error::SqlSnapError;
use std::{env, path::Path};
use tracing::{debug, error, trace, warn};

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - SQL_SERVER_HOST (default: localhost)
    /// - SQL_SERVER_PORT (default: 1433)
    /// - SQL_SERVER_DATABASE (required)
    /// - SQL_SERVER_USER (required)
    /// - SQL_SERVER_PASSWORD (required)
    pub fn from_env() -> Result<Self, SqlSnapError> {
        debug!("Loading database configuration from environment");

        let host = env::var("SQL_SERVER_HOST").unwrap_or_else(|_| {
            trace!("SQL_SERVER_HOST not set, using default");
            "localhost".to_string()
        });

        let port_str = env::var("SQL_SERVER_PORT").unwrap_or_else(|_| {
            trace!("SQL_SERVER_PORT not set, using default");
            "1433".to_string()
        });

        let port = port_str.parse::<u16>().map_err(|e| {
            error!(port = ?port_str, error = ?e, "Invalid SQL_SERVER_PORT value");
            SqlSnapError::Config("SQL_SERVER_PORT must be a valid port number".to_string())
        })?;

        let database = env::var("SQL_SERVER_DATABASE").map_err(|_| {
            error!("SQL_SERVER_DATABASE environment variable is not set");
            SqlSnapError::Config("SQL_SERVER_DATABASE environment variable is required".to_string())
        })?;

        let user = env::var("SQL_SERVER_USER").map_err(|_| {
            error!("SQL_SERVER_USER environment variable is not set");
            SqlSnapError::Config("SQL_SERVER_USER environment variable is required".to_string())
        })?;

        let password = env::var("SQL_SERVER_PASSWORD").map_err(|_| {
            error!("SQL_SERVER_PASSWORD environment variable is not set");
            SqlSnapError::Config("SQL_SERVER_PASSWORD environment variable is required".to_string())
        })?;

        debug!(host = ?host, port = ?port, database = ?database, user = ?user, "Configuration loaded");

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
        })
    }

    /// Load a .env file and then read configuration from environment
    pub fn load(env_file: &Path) -> Result<Self, SqlSnapError> {
        if env_file.exists() {
            debug!(path = ?env_file, "Loading environment file");
            dotenvy::from_path(env_file).map_err(|e| {
                error!(path = ?env_file, error = ?e, "Failed to load environment file");
                SqlSnapError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        } else {
            warn!(path = ?env_file, "Environment file not found, using existing environment");
        }

        Self::from_env()
    }

    /// Parse an ADO-style connection string, e.g.
    /// `Server=localhost,1433;Database=MyDb;User Id=sa;Password=secret;`
    ///
    /// The `Database` (or `Initial Catalog`) key names the target catalog.
    /// Malformed input is rejected before any server contact.
    pub fn from_connection_string(connection_string: &str) -> Result<Self, SqlSnapError> {
        let mut host = None;
        let mut port = 1433u16;
        let mut database = None;
        let mut user = None;
        let mut password = None;

        for pair in connection_string.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                SqlSnapError::Config(format!("Malformed connection string segment '{pair}'"))
            })?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "server" | "data source" => {
                    // "host,port" or bare host
                    match value.split_once(',') {
                        Some((h, p)) => {
                            host = Some(h.trim().to_string());
                            port = p.trim().parse::<u16>().map_err(|_| {
                                SqlSnapError::Config(format!(
                                    "Invalid port '{}' in connection string",
                                    p.trim()
                                ))
                            })?;
                        }
                        None => host = Some(value.to_string()),
                    }
                }
                "database" | "initial catalog" => database = Some(value.to_string()),
                "user id" | "uid" => user = Some(value.to_string()),
                "password" | "pwd" => password = Some(value.to_string()),
                // TrustServerCertificate etc. are accepted and ignored
                _ => trace!(key = ?key, "Ignoring connection string key"),
            }
        }

        let require = |field: Option<String>, name: &str| {
            field.ok_or_else(|| {
                SqlSnapError::Config(format!("Connection string is missing '{name}'"))
            })
        };

        Ok(Self {
            host: require(host, "Server")?,
            port,
            database: require(database, "Database")?,
            user: require(user, "User Id")?,
            password: require(password, "Password")?,
        })
    }

    /// Build an ADO-style connection string
    pub fn connection_string(&self) -> String {
        format!(
            "Server={},{};Database={};User Id={};Password={};TrustServerCertificate=True;",
            self.host, self.port, self.database, self.user, self.password
        )
    }

    /// Build a connection string with password redacted (for error messages)
    pub fn redacted_connection_string(&self) -> String {
        format!(
            "Server={},{};Database={};User Id={};Password=***;",
            self.host, self.port, self.database, self.user
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn clear_env_vars() {
        env::remove_var("SQL_SERVER_HOST");
        env::remove_var("SQL_SERVER_PORT");
        env::remove_var("SQL_SERVER_DATABASE");
        env::remove_var("SQL_SERVER_USER");
        env::remove_var("SQL_SERVER_PASSWORD");
    }

    fn set_required_env_vars() {
        env::set_var("SQL_SERVER_DATABASE", "testdb");
        env::set_var("SQL_SERVER_USER", "testuser");
        env::set_var("SQL_SERVER_PASSWORD", "testpass");
    }

    #[test]
    fn test_from_env_with_defaults() {
        clear_env_vars();
        set_required_env_vars();

        let config = DbConfig::from_env().unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1433);
        assert_eq!(config.database, "testdb");
        assert_eq!(config.user, "testuser");
        assert_eq!(config.password, "testpass");
    }

    #[test]
    fn test_from_env_missing_database() {
        clear_env_vars();
        env::set_var("SQL_SERVER_USER", "testuser");
        env::set_var("SQL_SERVER_PASSWORD", "testpass");

        let result = DbConfig::from_env();

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("SQL_SERVER_DATABASE"));
    }

    #[test]
    fn test_parse_connection_string() {
        let config = DbConfig::from_connection_string(
            "Server=db.example.com,1434;Database=Orders;User Id=sa;Password=secret;TrustServerCertificate=True;",
        )
        .unwrap();

        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.port, 1434);
        assert_eq!(config.database, "Orders");
        assert_eq!(config.user, "sa");
        assert_eq!(config.password, "secret");
        assert_eq!(
            config.connection_string(),
            "Server=db.example.com,1434;Database=Orders;User Id=sa;Password=secret;TrustServerCertificate=True;"
        );
    }

    #[test]
    fn test_parse_connection_string_initial_catalog() {
        let config = DbConfig::from_connection_string(
            "Data Source=localhost;Initial Catalog=Orders;UID=sa;PWD=secret",
        )
        .unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1433);
        assert_eq!(config.database, "Orders");
    }

    #[test]
    fn test_parse_connection_string_missing_catalog() {
        let result = DbConfig::from_connection_string("Server=localhost;User Id=sa;Password=x");

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Database"));
    }

    #[test]
    fn test_parse_connection_string_malformed_segment() {
        let result = DbConfig::from_connection_string("Server=localhost;garbage;Database=x");

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("garbage"));
    }

    #[test]
    fn test_parse_connection_string_bad_port() {
        let result =
            DbConfig::from_connection_string("Server=localhost,notaport;Database=x;User Id=sa;Password=x");

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("port"));
    }

    #[test]
    fn test_redacted_connection_string() {
        let config = DbConfig {
            host: "localhost".to_string(),
            port: 1433,
            database: "mydb".to_string(),
            user: "myuser".to_string(),
            password: "secret".to_string(),
        };

        let conn_str = config.redacted_connection_string();

        assert!(!conn_str.contains("secret"));
        assert!(conn_str.contains("***"));
    }
}
