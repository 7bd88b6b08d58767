use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

use crate::keywords::KeywordClassifier;
use crate::scraping::curtin_html::DEFAULT_ORIGIN;
use crate::store::notion::{NotionSettings, DEFAULT_API_BASE, DEFAULT_NOTION_VERSION};

const DEFAULT_TIMEZONE: &str = "Australia/Perth";
const DEFAULT_USER_AGENT: &str = "free-food-sync/0.1 (+campus events digest)";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_MAX_PAGES: &str = "200";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Where synced records go.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Notion(NotionSettings),
    Sqlite(Option<PathBuf>),
    /// Scrape only, no store calls.
    DryRun,
}

/// Choices that come from the command line rather than the environment.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    /// `Some(None)` means "local store at the default path".
    pub local_db: Option<Option<PathBuf>>,
    pub skip_sweep: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StoreBackend,
    pub origin: String,
    pub timezone: Tz,
    pub classifier: KeywordClassifier,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_pages: u32,
    pub verify_tls: bool,
    pub skip_sweep: bool,
}

/// Loads `.env` (if any) and reads configuration from the process environment.
pub fn load_app_config(options: &RunOptions) -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(options, |key| std::env::var(key))
}

/// Builds configuration from an arbitrary lookup, so tests can feed a map
/// instead of mutating the process environment.
pub fn build_app_config<F>(options: &RunOptions, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let value = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let require = |var: &str| -> Result<String, ConfigError> {
        value(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };
    let or_default = |var: &str, default: &str| -> String {
        value(var).unwrap_or_else(|| default.to_string())
    };
    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };
    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };
    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };
    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match value(var).map(|v| v.to_lowercase()).as_deref() {
            None => Ok(default),
            Some("1" | "true" | "yes" | "on") => Ok(true),
            Some("0" | "false" | "no" | "off") => Ok(false),
            Some(other) => Err(invalid(var, format!("expected a boolean, got {other:?}"))),
        }
    };

    let timeout = Duration::from_secs(parse_u64("SCRAPER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);

    let backend = if options.dry_run {
        StoreBackend::DryRun
    } else if let Some(path) = &options.local_db {
        StoreBackend::Sqlite(path.clone())
    } else {
        StoreBackend::Notion(NotionSettings {
            token: require("NOTION_TOKEN")?,
            database_id: require("NOTION_DATABASE_ID")?,
            api_base: or_default("NOTION_API_BASE", DEFAULT_API_BASE),
            version: or_default("NOTION_VERSION", DEFAULT_NOTION_VERSION),
            timeout,
        })
    };

    let timezone_name = or_default("EVENTS_TIMEZONE", DEFAULT_TIMEZONE);
    let timezone = timezone_name
        .parse::<Tz>()
        .map_err(|e| invalid("EVENTS_TIMEZONE", e.to_string()))?;

    let classifier = match value("FOOD_KEYWORDS") {
        Some(list) => {
            let classifier = KeywordClassifier::new(list.split(','));
            if classifier.keywords().is_empty() {
                return Err(invalid("FOOD_KEYWORDS", "no keywords listed".to_string()));
            }
            classifier
        }
        None => KeywordClassifier::default(),
    };

    let max_pages = parse_u32("SCRAPER_MAX_PAGES", DEFAULT_MAX_PAGES)?;
    if max_pages == 0 {
        return Err(invalid("SCRAPER_MAX_PAGES", "must be at least 1".to_string()));
    }

    Ok(AppConfig {
        backend,
        origin: or_default("EVENTS_ORIGIN", DEFAULT_ORIGIN),
        timezone,
        classifier,
        user_agent: or_default("SCRAPER_USER_AGENT", DEFAULT_USER_AGENT),
        timeout,
        max_pages,
        verify_tls: parse_bool("SCRAPER_VERIFY_TLS", false)?,
        skip_sweep: options.skip_sweep,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned().ok_or(VarError::NotPresent)
    }

    const CREDENTIALS: [(&str, &str); 2] = [
        ("NOTION_TOKEN", "secret_abc"),
        ("NOTION_DATABASE_ID", "db123"),
    ];

    #[test]
    fn defaults_with_credentials() {
        let config =
            build_app_config(&RunOptions::default(), lookup(&CREDENTIALS)).expect("config");
        let StoreBackend::Notion(notion) = &config.backend else {
            panic!("expected notion backend, got {:?}", config.backend);
        };
        assert_eq!(notion.token, "secret_abc");
        assert_eq!(notion.database_id, "db123");
        assert_eq!(notion.api_base, DEFAULT_API_BASE);
        assert_eq!(config.origin, "https://www.curtin.edu.au");
        assert_eq!(config.timezone, chrono_tz::Australia::Perth);
        assert_eq!(config.max_pages, 200);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.verify_tls);
        assert!(config.classifier.has_free_food("bbq"));
    }

    #[test]
    fn missing_credentials_fail_fast() {
        let err = build_app_config(&RunOptions::default(), lookup(&[("NOTION_TOKEN", "x")]))
            .expect_err("database id missing");
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "NOTION_DATABASE_ID"));

        let err = build_app_config(
            &RunOptions::default(),
            lookup(&[("NOTION_TOKEN", "  "), ("NOTION_DATABASE_ID", "db")]),
        )
        .expect_err("blank token");
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "NOTION_TOKEN"));
    }

    #[test]
    fn local_and_dry_runs_need_no_credentials() {
        let options = RunOptions {
            local_db: Some(None),
            ..RunOptions::default()
        };
        let config = build_app_config(&options, lookup(&[])).expect("config");
        assert!(matches!(config.backend, StoreBackend::Sqlite(None)));

        let options = RunOptions {
            dry_run: true,
            local_db: Some(Some(PathBuf::from("x.sqlite"))),
            skip_sweep: true,
        };
        let config = build_app_config(&options, lookup(&[])).expect("config");
        assert!(matches!(config.backend, StoreBackend::DryRun));
        assert!(config.skip_sweep);
    }

    #[test]
    fn overrides_are_applied() {
        let mut vars = CREDENTIALS.to_vec();
        vars.extend([
            ("FOOD_KEYWORDS", "dumplings, sushi ,"),
            ("EVENTS_TIMEZONE", "Australia/Sydney"),
            ("EVENTS_ORIGIN", "https://events.example.edu"),
            ("SCRAPER_VERIFY_TLS", "true"),
            ("SCRAPER_MAX_PAGES", "5"),
        ]);
        let config = build_app_config(&RunOptions::default(), lookup(&vars)).expect("config");
        assert_eq!(config.classifier.keywords(), ["dumplings", "sushi"]);
        assert_eq!(config.timezone, chrono_tz::Australia::Sydney);
        assert_eq!(config.origin, "https://events.example.edu");
        assert!(config.verify_tls);
        assert_eq!(config.max_pages, 5);
    }

    #[test]
    fn invalid_values_are_reported() {
        for (var, raw) in [
            ("EVENTS_TIMEZONE", "Mars/Olympus"),
            ("SCRAPER_TIMEOUT_SECS", "soon"),
            ("SCRAPER_VERIFY_TLS", "maybe"),
            ("SCRAPER_MAX_PAGES", "0"),
            ("FOOD_KEYWORDS", " , ,"),
        ] {
            let mut vars = CREDENTIALS.to_vec();
            vars.push((var, raw));
            let err = build_app_config(&RunOptions::default(), lookup(&vars))
                .expect_err("invalid value");
            assert!(
                matches!(err, ConfigError::InvalidEnvVar { var: ref v, .. } if v == var),
                "{var}: {err}"
            );
        }
    }
}
