use std::collections::HashMap;
use std::str::FromStr;
use std::time;

use envconfig::Envconfig;

/// Host settings key carrying the vendor organization id.
pub const ORG_ID_KEY: &str = "organizationID";
/// Host settings key overriding the audience manager host.
pub const AUDIENCE_MANAGER_SERVER_KEY: &str = "audienceManagerServer";
pub const DEFAULT_AUDIENCE_MANAGER_SERVER: &str = "dpm.demdex.net";

const DEFAULT_CONNECT_TIMEOUT: time::Duration = time::Duration::from_millis(2000);
const DEFAULT_REQUEST_TIMEOUT: time::Duration = time::Duration::from_millis(10000);

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3302")]
    pub port: u16,

    pub org_id: Option<NonEmptyString>,

    #[envconfig(default = "dpm.demdex.net")]
    pub audience_manager_server: NonEmptyString,

    #[envconfig(default = "true")]
    pub use_tls: bool,

    #[envconfig(default = "2000")]
    pub connect_timeout: EnvMsDuration,

    #[envconfig(default = "10000")]
    pub request_timeout: EnvMsDuration,

    #[envconfig(default = "identity-attributes.json")]
    pub attribute_store_path: String,
}

impl Config {
    /// Produce a host:port address for binding a TcpListener.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            org_id: self.org_id.as_ref().map(|org_id| org_id.as_str().to_owned()),
            host: self.audience_manager_server.as_str().to_owned(),
            use_tls: self.use_tls,
            connect_timeout: self.connect_timeout.0,
            request_timeout: self.request_timeout.0,
        }
    }
}

/// Everything an `IdentitySyncClient` needs to know about the identity endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub org_id: Option<String>,
    /// Host (and optional port) of the audience manager, without scheme.
    pub host: String,
    pub use_tls: bool,
    pub connect_timeout: time::Duration,
    pub request_timeout: time::Duration,
}

impl SyncSettings {
    /// Read settings from the map the host hands to a kit on creation.
    pub fn from_kit_settings(settings: &HashMap<String, String>) -> Self {
        let host = settings
            .get(AUDIENCE_MANAGER_SERVER_KEY)
            .filter(|host| !host.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_AUDIENCE_MANAGER_SERVER.to_owned());

        Self {
            org_id: settings
                .get(ORG_ID_KEY)
                .filter(|org_id| !org_id.is_empty())
                .cloned(),
            host,
            ..Self::default()
        }
    }

    pub fn endpoint(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}/id", scheme, self.host)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            org_id: None,
            host: DEFAULT_AUDIENCE_MANAGER_SERVER.to_owned(),
            use_tls: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

#[derive(Debug, Clone)]
pub struct NonEmptyString(pub String);

impl NonEmptyString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StringIsEmptyError;

impl FromStr for NonEmptyString {
    type Err = StringIsEmptyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            Err(StringIsEmptyError)
        } else {
            Ok(NonEmptyString(s.to_owned()))
        }
    }
}
