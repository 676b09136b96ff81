use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub schedule: ScheduleConfig,
    pub mail: MailConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `LAZYHIRE_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("LAZYHIRE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            database: DatabaseConfig::from_env_profiled(p),
            schedule: ScheduleConfig::from_env_profiled(p),
            mail: MailConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:    {}:{}", self.server.host, self.server.port);
        tracing::info!("  database:  url={}", self.database.url);
        tracing::info!(
            "  schedule:  cron='{}', collector_timeout={}s, max_manual_runs={}",
            self.schedule.cron,
            self.schedule.collector_timeout_secs,
            self.schedule.max_concurrent_manual_runs
        );
        if self.mail.is_configured() {
            tracing::info!(
                "  mail:      smtp={}:{}, recipient={}",
                self.mail.smtp_host.as_deref().unwrap_or("(none)"),
                self.mail.smtp_port,
                self.mail.recipient.as_deref().unwrap_or("(none)")
            );
        } else {
            tracing::info!("  mail:      not configured (digests go to the log)");
        }
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Database ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite://data/lazyhire.sqlite`.
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "DATABASE_URL", "sqlite://data/lazyhire.sqlite"),
            max_connections: profiled_env_u32(p, "DATABASE_MAX_CONNECTIONS", 5),
        }
    }
}

// ── Schedule ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 5-field cron expression, evaluated in UTC. Defaults to midnight daily.
    pub cron: String,
    pub collector_timeout_secs: u64,
    pub max_concurrent_manual_runs: u32,
}

impl ScheduleConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            cron: profiled_env_or(p, "SCRAPE_CRON", "0 0 * * *"),
            collector_timeout_secs: profiled_env_u64(p, "COLLECTOR_TIMEOUT_SECS", 60).max(1),
            max_concurrent_manual_runs: profiled_env_u32(p, "MAX_CONCURRENT_MANUAL_RUNS", 2)
                .max(1),
        }
    }

    pub fn collector_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.collector_timeout_secs)
    }
}

// ── Mail (digest delivery) ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub recipient: Option<String>,
    /// Link rendered into the digest body.
    pub dashboard_url: String,
}

impl MailConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            smtp_host: profiled_env_opt(p, "EMAIL_SMTP_HOST"),
            smtp_port: profiled_env_u16(p, "EMAIL_SMTP_PORT", 587),
            username: profiled_env_opt(p, "EMAIL_USER"),
            password: profiled_env_opt(p, "EMAIL_PASS"),
            recipient: profiled_env_opt(p, "RECIPIENT_EMAIL"),
            dashboard_url: profiled_env_or(p, "DASHBOARD_URL", "http://localhost:3000"),
        }
    }

    /// Digest mail needs at least an SMTP host, a sender and a recipient.
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.username.is_some() && self.recipient.is_some()
    }

    /// Sender mailbox, `LazyHire Digest <user>`.
    pub fn sender(&self) -> Option<String> {
        self.username
            .as_deref()
            .map(|user| format!("LazyHire Digest <{}>", user))
    }
}
