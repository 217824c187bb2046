use std::time::Duration;

const USER_AGENT: &str = "pageinfo-api/0.1";
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got {value:?}")]
    NotANumber { name: &'static str, value: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub fetch_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            fetch_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            fetch_timeout: parse_var(&lookup, "PAGEINFO_FETCH_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            connect_timeout: parse_var(&lookup, "PAGEINFO_CONNECT_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
        })
    }

    /// Client shared by every request. Its pool is the only state requests
    /// have in common.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(self.connect_timeout)
            .timeout(self.fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(client)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { name, value }),
    }
}
