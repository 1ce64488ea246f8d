use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PoolError;
use crate::types::DriverKind;

pub const DEFAULT_USER_NAME: &str = "root";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_AUTO_REOPEN_INTERVAL: Duration = Duration::from_millis(10_000);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings shared read-only by every worker of a pool.
///
/// Durations are expressed in milliseconds when (de)serialized:
/// ```rust
/// use sql_affinity_pool::prelude::*;
///
/// let cfg = ConnectionConfig::from_json_str(
///     r#"{ "kind": "sqlite", "database_name": "app.db", "auto_reopen_interval_ms": 500 }"#,
/// )?;
/// assert_eq!(cfg.auto_reopen_interval.as_millis(), 500);
/// assert_eq!(cfg.port, 3306);
/// # Ok::<(), PoolError>(())
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub kind: DriverKind,
    pub database_name: String,
    pub user_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub host: String,
    pub port: u16,
    /// Minimum gap between two open attempts on the same worker.
    #[serde(rename = "auto_reopen_interval_ms", with = "millis")]
    pub auto_reopen_interval: Duration,
    /// Upper bound on how long a caller waits for its worker; `None` waits forever.
    #[serde(rename = "call_timeout_ms", with = "opt_millis")]
    pub call_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DriverKind::Mysql)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("kind", &self.kind)
            .field("database_name", &self.database_name)
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auto_reopen_interval", &self.auto_reopen_interval)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(kind: DriverKind) -> Self {
        Self {
            kind,
            database_name: String::new(),
            user_name: DEFAULT_USER_NAME.to_string(),
            password: String::new(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            auto_reopen_interval: DEFAULT_AUTO_REOPEN_INTERVAL,
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
        }
    }

    #[must_use]
    pub fn builder(kind: DriverKind) -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new(kind)
    }

    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`PoolError::Config`] if the document is malformed or fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, PoolError> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| PoolError::Config(format!("invalid connection config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns [`PoolError::Config`] when the call timeout is zero.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.call_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PoolError::Config(
                "call timeout must be non-zero; use no timeout to wait indefinitely".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`ConnectionConfig`].
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    cfg: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    #[must_use]
    pub fn new(kind: DriverKind) -> Self {
        Self {
            cfg: ConnectionConfig::new(kind),
        }
    }

    #[must_use]
    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.cfg.database_name = name.into();
        self
    }

    #[must_use]
    pub fn user_name(mut self, user: impl Into<String>) -> Self {
        self.cfg.user_name = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.cfg.password = password.into();
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.cfg.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.cfg.port = port;
        self
    }

    #[must_use]
    pub fn auto_reopen_interval(mut self, interval: Duration) -> Self {
        self.cfg.auto_reopen_interval = interval;
        self
    }

    #[must_use]
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.cfg.call_timeout = timeout;
        self
    }

    /// # Errors
    /// Returns [`PoolError::Config`] if the assembled config is invalid.
    pub fn finish(self) -> Result<ConnectionConfig, PoolError> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub(super) fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}
