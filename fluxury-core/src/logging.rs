//! Dispatch logging with pattern-based filtering
//!
//! # Example
//!
//! ```
//! use fluxury_core::{ActionLoggerConfig, Dispatcher, LoggingMiddleware, Message};
//!
//! // Log every action except the noisy ones
//! let config = ActionLoggerConfig::new(None, Some("Tick,Mouse*"));
//! let dispatcher: Dispatcher<Message> =
//!     Dispatcher::new().with_middleware(LoggingMiddleware::new(config));
//! ```

use crate::error::DispatchError;
use crate::middleware::Middleware;
use crate::Action;

/// Configuration for action logging with glob pattern filtering.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `SET*` matches SET, SET_FOO, etc.
/// - `*_ERROR` matches LOAD_ERROR, SAVE_ERROR, etc.
/// - `Tick` matches only Tick
#[derive(Debug, Clone)]
pub struct ActionLoggerConfig {
    /// If non-empty, only log actions matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude actions matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl Default for ActionLoggerConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: vec!["Tick".to_string()],
        }
    }
}

impl ActionLoggerConfig {
    /// Create a new config from comma-separated pattern strings
    ///
    /// # Arguments
    /// - `include`: comma-separated glob patterns (or None for all)
    /// - `exclude`: comma-separated glob patterns (or None for default excludes)
    ///
    /// # Example
    /// ```
    /// use fluxury_core::ActionLoggerConfig;
    ///
    /// let config = ActionLoggerConfig::new(Some("SET*,loadMessage"), Some("Tick"));
    /// assert!(config.should_log("SET_FOO"));
    /// assert!(config.should_log("loadMessage"));
    /// assert!(!config.should_log("Tick"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let include_patterns = include.map(split_patterns).unwrap_or_default();

        let exclude_patterns = exclude
            .map(split_patterns)
            .unwrap_or_else(|| Self::default().exclude_patterns);

        Self {
            include_patterns,
            exclude_patterns,
        }
    }

    /// Create a config with specific pattern vectors
    pub fn with_patterns(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include_patterns: include,
            exclude_patterns: exclude,
        }
    }

    /// Check if an action name should be logged based on include/exclude patterns
    pub fn should_log(&self, action_name: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| glob_match(p, action_name))
        {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| glob_match(p, action_name))
    }
}

fn split_patterns(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Middleware that traces dispatches that pass its filter
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    config: ActionLoggerConfig,
    /// Whether to log before the broadcast as well as after
    pub log_before: bool,
}

impl LoggingMiddleware {
    /// Log after each dispatch only
    pub fn new(config: ActionLoggerConfig) -> Self {
        Self {
            config,
            log_before: false,
        }
    }

    /// Log both before and after each dispatch
    pub fn verbose(config: ActionLoggerConfig) -> Self {
        Self {
            config,
            log_before: true,
        }
    }

    /// Log every action, no filtering
    pub fn log_all() -> Self {
        Self::new(ActionLoggerConfig::with_patterns(vec![], vec![]))
    }

    pub fn config(&self) -> &ActionLoggerConfig {
        &self.config
    }
}

impl<A: Action> Middleware<A> for LoggingMiddleware {
    fn before(&mut self, action: &A) {
        if self.log_before && self.config.should_log(action.name()) {
            tracing::debug!(action = %action.name(), "Dispatching action");
        }
    }

    fn after(&mut self, action: &A, result: &Result<(), DispatchError>) {
        if !self.config.should_log(action.name()) {
            return;
        }
        match result {
            Ok(()) => tracing::debug!(action = %action.name(), "Action processed"),
            Err(error) => tracing::warn!(action = %action.name(), %error, "Action failed"),
        }
    }
}

/// Simple glob pattern matching supporting `*` and `?`.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi).copied() {
            Some('*') => {
                backtrack = Some((pi, ti));
                pi += 1;
            }
            Some(c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match backtrack {
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    backtrack = Some((star_pi, star_ti + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}
