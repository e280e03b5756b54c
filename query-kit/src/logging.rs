//! Request logging middleware
//!
//! Opt-in middleware that logs every accessor call with a UUID v7 request id,
//! its duration and its outcome. The result is passed through untouched.
//!
//! ```rust,ignore
//! use query_kit::logging::{LogConfig, LogLevel, logging_middleware};
//!
//! let config = LogConfig::new()
//!     .with_level(LogLevel::Debug)
//!     .with_spans(true)
//!     .exclude("health.*");
//!
//! client.defaults().push(DefaultsScope::Queries, logging_middleware(config));
//! ```

use crate::key::KeyPattern;
use crate::middleware::{MiddlewareRef, Next, Request, from_fn};
use crate::{ClientContext, QueryResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Unique identifier for one call, used for log correlation.
///
/// UUID v7, so ids sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)))
    }

    /// First eight characters, for compact output
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(8).collect()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// Log level for call logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Logging disabled.
    Off,
}

/// Configuration for [`logging_middleware`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level of the "call finished" event
    pub level: LogLevel,
    /// Include the call duration
    pub log_timing: bool,
    /// Log failed calls at `warn` with their error code
    pub log_errors: bool,
    /// Run the call inside an `info_span`
    pub create_spans: bool,
    /// Calls slower than this are logged at `warn`
    pub slow_threshold: Option<Duration>,
    /// Paths that are never logged
    pub excluded: Vec<KeyPattern>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_timing: true,
            log_errors: true,
            create_spans: false,
            slow_threshold: None,
            excluded: Vec::new(),
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_timing(mut self, enabled: bool) -> Self {
        self.log_timing = enabled;
        self
    }

    #[must_use]
    pub fn with_errors(mut self, enabled: bool) -> Self {
        self.log_errors = enabled;
        self
    }

    #[must_use]
    pub fn with_spans(mut self, enabled: bool) -> Self {
        self.create_spans = enabled;
        self
    }

    #[must_use]
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    /// Skip calls whose path matches `pattern` (e.g. `"health.*"`)
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excluded.push(KeyPattern::new(pattern));
        self
    }

    /// Returns true if calls at this request's path should be logged
    pub fn should_log(&self, req: &Request) -> bool {
        if self.level == LogLevel::Off {
            return false;
        }
        !self
            .excluded
            .iter()
            .any(|pattern| pattern.matches(req.prefix()))
    }

    fn is_slow(&self, duration: Duration) -> bool {
        self.slow_threshold
            .map(|threshold| duration > threshold)
            .unwrap_or(false)
    }
}

fn log_finished(
    level: LogLevel,
    request_id: &RequestId,
    path: &str,
    kind: &str,
    duration_ms: Option<u64>,
) {
    macro_rules! finished {
        ($lvl:expr) => {
            tracing::event!(
                $lvl,
                request_id = %request_id,
                path = %path,
                kind = %kind,
                duration_ms = ?duration_ms,
                "Call completed"
            )
        };
    }

    match level {
        LogLevel::Trace => finished!(tracing::Level::TRACE),
        LogLevel::Debug => finished!(tracing::Level::DEBUG),
        LogLevel::Info => finished!(tracing::Level::INFO),
        LogLevel::Warn => finished!(tracing::Level::WARN),
        LogLevel::Error => finished!(tracing::Level::ERROR),
        LogLevel::Off => {}
    }
}

async fn run_logged(
    config: &LogConfig,
    client: ClientContext,
    req: Request,
    next: Next,
) -> QueryResult<Value> {
    let request_id = RequestId::new();
    let path = req.path();
    let kind = req.kind().to_string();

    tracing::debug!(request_id = %request_id, path = %path, kind = %kind, "Call started");

    let start = Instant::now();
    let result = if config.create_spans {
        let span = tracing::info_span!(
            "query_kit_call",
            request_id = %request_id,
            path = %path,
            kind = %kind,
        );
        next(client, req).instrument(span).await
    } else {
        next(client, req).await
    };
    let duration = start.elapsed();
    let duration_ms = config.log_timing.then(|| duration.as_millis() as u64);

    match &result {
        Ok(_) => log_finished(config.level, &request_id, &path, &kind, duration_ms),
        Err(error) if config.log_errors => {
            tracing::warn!(
                request_id = %request_id,
                path = %path,
                kind = %kind,
                code = %error.code,
                duration_ms = ?duration_ms,
                "Call failed"
            );
        }
        Err(_) => {}
    }

    if config.is_slow(duration) {
        tracing::warn!(
            request_id = %request_id,
            path = %path,
            duration_ms = duration.as_millis() as u64,
            "Slow call"
        );
    }

    result
}

/// Creates a logging middleware with the given configuration.
pub fn logging_middleware(config: LogConfig) -> MiddlewareRef {
    let config = Arc::new(config);

    from_fn(move |client: ClientContext, req: Request, next: Next| {
        let config = Arc::clone(&config);
        async move {
            if !config.should_log(&req) {
                return next(client, req).await;
            }
            run_logged(&config, client, req, next).await
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryError;
    use crate::chain::build_middleware_chain;
    use crate::middleware::AccessorKind;
    use crate::options::HookOptions;
    use crate::tests::support::RecordingClient;
    use futures::future::BoxFuture;
    use serde_json::json;

    fn request(path: &[&str]) -> Request {
        let prefix: Arc<[String]> = path.iter().map(|s| s.to_string()).collect();
        Request::new(AccessorKind::Query, prefix, HookOptions::new())
    }

    fn base(result: QueryResult<Value>) -> Next {
        Arc::new(
            move |_client: ClientContext, _req: Request| -> BoxFuture<'static, QueryResult<Value>> {
                let result = result.clone();
                Box::pin(async move { result })
            },
        )
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
        assert_eq!(a.to_string().parse::<RequestId>().unwrap(), a);
    }

    #[test]
    fn test_excluded_paths() {
        let config = LogConfig::new().exclude("health.*");
        assert!(!config.should_log(&request(&["health", "ping"])));
        assert!(config.should_log(&request(&["api", "users"])));
        assert!(!LogConfig::new().with_level(LogLevel::Off).should_log(&request(&["api"])));
    }

    #[test]
    fn test_exclusion_ignores_string_variables() {
        let with_vars = |path: &[&str], vars: &str| {
            let mut req = request(path);
            req.options = HookOptions::new().with_variables(vars);
            req
        };

        let config = LogConfig::new().exclude("health");
        assert!(!config.should_log(&with_vars(&["health"], "ping")));

        let config = LogConfig::new().exclude("api.users.profile");
        assert!(config.should_log(&with_vars(&["api", "users"], "profile")));
    }

    #[test]
    fn test_slow_threshold() {
        let config = LogConfig::new().with_slow_threshold(Duration::from_millis(100));
        assert!(config.is_slow(Duration::from_millis(150)));
        assert!(!config.is_slow(Duration::from_millis(50)));
        assert!(!LogConfig::new().is_slow(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_passes_result_through() {
        let chain = build_middleware_chain(
            vec![logging_middleware(LogConfig::new().with_spans(true))],
            base(Ok(json!({"ok": true}))),
        );
        let out = chain(RecordingClient::context(), request(&["api", "users"])).await;
        assert_eq!(out.unwrap(), json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_passes_error_through() {
        let error = QueryError::not_found("gone");
        let chain = build_middleware_chain(
            vec![logging_middleware(LogConfig::new())],
            base(Err(error.clone())),
        );
        let out = chain(RecordingClient::context(), request(&["api", "users"])).await;
        assert_eq!(out.unwrap_err(), error);
    }
}
