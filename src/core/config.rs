//! Purpose: Resolve bridge configuration from the process environment.
//! Exports: `BridgeConfig`, `ProxyFailurePolicy`, env variable names.
//! Role: Read once per `Initialize` call; the session layer never touches the environment.
//! Invariants: `from_lookup` is the only parser; `from_env` just feeds it `std::env::var`.
//! Invariants: Unknown policy values fall back to the default (`Abort`).
//! Invariants: Open account mode needs the exact value `true`.

pub const PROXY_SERVER_ENV: &str = "PROXY_SERVER";
pub const OPEN_ACCOUNT_ENV: &str = "X_OPEN_ACCOUNT";
pub const PROXY_FAILURE_ENV: &str = "TWEETBRIDGE_PROXY_FAILURE";
pub const LOG_ENV: &str = "TWEETBRIDGE_LOG";

/// What initialization does when the proxy address cannot be applied.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ProxyFailurePolicy {
    /// Log and abort the process.
    #[default]
    Abort,
    /// Return the failure in the `Err` envelope and stay uninitialized.
    Report,
}

impl ProxyFailurePolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Some(Self::Abort),
            "report" => Some(Self::Report),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BridgeConfig {
    pub proxy: Option<String>,
    pub open_account: bool,
    pub proxy_failure: ProxyFailurePolicy,
}

impl BridgeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let proxy = lookup(PROXY_SERVER_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let open_account = lookup(OPEN_ACCOUNT_ENV).is_some_and(|value| value == "true");
        let proxy_failure = lookup(PROXY_FAILURE_ENV)
            .and_then(|value| {
                let policy = ProxyFailurePolicy::parse(&value);
                if policy.is_none() {
                    tracing::warn!(value = %value, "unknown proxy failure policy, using abort");
                }
                policy
            })
            .unwrap_or_default();
        Self {
            proxy,
            open_account,
            proxy_failure,
        }
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_open_account(mut self, open_account: bool) -> Self {
        self.open_account = open_account;
        self
    }

    pub fn with_proxy_failure(mut self, policy: ProxyFailurePolicy) -> Self {
        self.proxy_failure = policy;
        self
    }
}
