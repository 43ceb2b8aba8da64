//! Account-wide queue service properties

use queuestack_core::{QueueError, Result};
use serde::{Deserialize, Serialize};

/// Most CORS rules a service accepts
pub const MAX_CORS_RULES: usize = 5;

/// Longest retention period in days
pub const MAX_RETENTION_DAYS: u32 = 365;

/// HTTP verbs a CORS rule may allow
pub const CORS_METHODS: &[&str] = &["DELETE", "GET", "HEAD", "MERGE", "POST", "OPTIONS", "PUT"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub enabled: bool,
    pub days: Option<u32>,
}

impl RetentionPolicy {
    pub fn days(days: u32) -> Self {
        Self {
            enabled: true,
            days: Some(days),
        }
    }

    fn validate(&self, section: &str) -> Result<()> {
        match (self.enabled, self.days) {
            (true, None) => Err(QueueError::InvalidXmlDocument(format!(
                "{section}: retention days are required when retention is enabled"
            ))),
            (true, Some(days)) if days == 0 || days > MAX_RETENTION_DAYS => {
                Err(QueueError::InvalidXmlDocument(format!(
                    "{section}: retention days must be between 1 and {MAX_RETENTION_DAYS}, got {days}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Analytics logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logging {
    pub version: String,
    pub delete: bool,
    pub read: bool,
    pub write: bool,
    pub retention_policy: RetentionPolicy,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            delete: false,
            read: false,
            write: false,
            retention_policy: RetentionPolicy::default(),
        }
    }
}

/// Hour or minute metrics settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub version: String,
    pub enabled: bool,
    /// Whether API-level metrics are collected; required when enabled
    pub include_apis: Option<bool>,
    pub retention_policy: RetentionPolicy,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            enabled: false,
            include_apis: None,
            retention_policy: RetentionPolicy::default(),
        }
    }
}

impl Metrics {
    fn validate(&self, section: &str) -> Result<()> {
        if self.enabled && self.include_apis.is_none() {
            return Err(QueueError::InvalidXmlDocument(format!(
                "{section}: IncludeAPIs is required when metrics are enabled"
            )));
        }
        self.retention_policy.validate(section)
    }
}

/// One cross-origin access rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsRule {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub max_age_in_seconds: u32,
}

impl CorsRule {
    /// Rule allowing every origin and header for the given methods
    pub fn allow_all(methods: &[&str], max_age_in_seconds: u32) -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: methods.iter().map(|m| (*m).to_string()).collect(),
            allowed_headers: vec!["*".to_string()],
            exposed_headers: vec!["*".to_string()],
            max_age_in_seconds,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.allowed_origins.is_empty() {
            return Err(QueueError::InvalidXmlDocument(
                "CORS rule must allow at least one origin".to_string(),
            ));
        }
        if self.allowed_methods.is_empty() {
            return Err(QueueError::InvalidXmlDocument(
                "CORS rule must allow at least one method".to_string(),
            ));
        }
        if let Some(method) = self
            .allowed_methods
            .iter()
            .find(|m| !CORS_METHODS.contains(&m.as_str()))
        {
            return Err(QueueError::InvalidXmlDocument(format!(
                "unsupported CORS method: {method}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cors {
    pub rules: Vec<CorsRule>,
}

/// Service-wide configuration.
///
/// Each section is optional. When setting properties, a `None` section
/// leaves the stored value untouched; reading properties always returns
/// every section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProperties {
    pub logging: Option<Logging>,
    pub hour_metrics: Option<Metrics>,
    pub minute_metrics: Option<Metrics>,
    pub cors: Option<Cors>,
}

impl ServiceProperties {
    /// Properties of a freshly provisioned account
    pub fn service_defaults() -> Self {
        Self {
            logging: Some(Logging::default()),
            hour_metrics: Some(Metrics::default()),
            minute_metrics: Some(Metrics::default()),
            cors: Some(Cors::default()),
        }
    }

    pub fn with_logging(mut self, logging: Logging) -> Self {
        self.logging = Some(logging);
        self
    }

    pub fn with_hour_metrics(mut self, metrics: Metrics) -> Self {
        self.hour_metrics = Some(metrics);
        self
    }

    pub fn with_minute_metrics(mut self, metrics: Metrics) -> Self {
        self.minute_metrics = Some(metrics);
        self
    }

    pub fn with_cors_rules(mut self, rules: Vec<CorsRule>) -> Self {
        self.cors = Some(Cors { rules });
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(logging) = &self.logging {
            logging.retention_policy.validate("Logging")?;
        }
        if let Some(metrics) = &self.hour_metrics {
            metrics.validate("HourMetrics")?;
        }
        if let Some(metrics) = &self.minute_metrics {
            metrics.validate("MinuteMetrics")?;
        }
        if let Some(cors) = &self.cors {
            if cors.rules.len() > MAX_CORS_RULES {
                return Err(QueueError::InvalidXmlDocument(format!(
                    "at most {MAX_CORS_RULES} CORS rules are allowed, got {}",
                    cors.rules.len()
                )));
            }
            cors.rules.iter().try_for_each(CorsRule::validate)?;
        }
        Ok(())
    }

    /// Overwrite the sections of `current` that this value sets
    pub fn apply_to(&self, current: &mut ServiceProperties) {
        if let Some(logging) = &self.logging {
            current.logging = Some(logging.clone());
        }
        if let Some(metrics) = &self.hour_metrics {
            current.hour_metrics = Some(metrics.clone());
        }
        if let Some(metrics) = &self.minute_metrics {
            current.minute_metrics = Some(metrics.clone());
        }
        if let Some(cors) = &self.cors {
            current.cors = Some(cors.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_requires_days_in_range() {
        let mut logging = Logging {
            retention_policy: RetentionPolicy::days(10),
            ..Logging::default()
        };
        let props = ServiceProperties::default().with_logging(logging.clone());
        assert!(props.validate().is_ok());

        logging.retention_policy.days = Some(366);
        let props = ServiceProperties::default().with_logging(logging.clone());
        assert!(matches!(props.validate(), Err(QueueError::InvalidXmlDocument(_))));

        logging.retention_policy.days = None;
        let props = ServiceProperties::default().with_logging(logging);
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_enabled_metrics_need_include_apis() {
        let metrics = Metrics {
            enabled: true,
            ..Metrics::default()
        };
        let props = ServiceProperties::default().with_hour_metrics(metrics);
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_cors_rule_limits() {
        let rule = CorsRule::allow_all(&["POST", "GET"], 3600);
        let props = ServiceProperties::default().with_cors_rules(vec![rule.clone(); 5]);
        assert!(props.validate().is_ok());

        let props = ServiceProperties::default().with_cors_rules(vec![rule; 6]);
        assert!(props.validate().is_err());

        let bad = CorsRule::allow_all(&["FETCH"], 60);
        let props = ServiceProperties::default().with_cors_rules(vec![bad]);
        assert!(props.validate().is_err());
    }

    #[test]
    fn test_apply_to_only_overwrites_set_sections() {
        let mut current = ServiceProperties::service_defaults();
        let update = ServiceProperties::default()
            .with_cors_rules(vec![CorsRule::allow_all(&["GET"], 60)]);

        update.apply_to(&mut current);

        assert_eq!(current.cors.as_ref().unwrap().rules.len(), 1);
        assert_eq!(current.logging, Some(Logging::default()));
        assert_eq!(current.hour_metrics, Some(Metrics::default()));
    }

    #[test]
    fn test_cors_rule_allow_all() {
        let rule = CorsRule::allow_all(&["POST", "GET"], 3600);
        assert_eq!(rule.allowed_origins, vec!["*"]);
        assert_eq!(rule.allowed_methods, vec!["POST", "GET"]);
        assert_eq!(rule.exposed_headers, vec!["*"]);
        assert_eq!(rule.max_age_in_seconds, 3600);
    }
}
