//! Connection pool settings.

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Default pool settings for the given URL
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.is_empty() {
            return Err("Database URL must not be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("Pool needs at least one connection".to_string());
        }
        if self.min_connections > self.max_connections {
            return Err(format!(
                "Minimum connections ({}) exceed maximum ({})",
                self.min_connections, self.max_connections
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_bounds() {
        let mut config = DatabaseConfig::with_url("postgres://localhost/club");
        assert!(config.validate().is_ok());

        config.min_connections = 20;
        assert!(config.validate().is_err());
    }
}
