use crate::config::types::{CacheBackend, CacheConfig, Config, IdentityConfig};
use crate::oembed::Provider;
use crate::scrape::{ExtractMethod, RuleConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_identity(&config.identity)?;
    validate_cache(&config.cache)?;
    validate_providers(&config.providers)?;
    validate_rules(&config.rules)?;
    Ok(())
}

/// Validates the client identity
fn validate_identity(identity: &IdentityConfig) -> Result<(), ConfigError> {
    if identity.client_name.is_empty() {
        return Err(ConfigError::Validation(
            "client-name cannot be empty".to_string(),
        ));
    }

    if !identity
        .client_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "client-name must contain only alphanumeric characters and hyphens, got '{}'",
            identity.client_name
        )));
    }

    if identity.client_version.is_empty() {
        return Err(ConfigError::Validation(
            "client-version cannot be empty".to_string(),
        ));
    }

    if Url::parse(&identity.contact_url).is_err() {
        return Err(ConfigError::InvalidUrl(identity.contact_url.clone()));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    if cache.backend == CacheBackend::Sqlite && cache.database_path.is_none() {
        return Err(ConfigError::Validation(
            "database-path is required when the cache backend is sqlite".to_string(),
        ));
    }

    if cache.success_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "success-ttl-secs must be >= 1".to_string(),
        ));
    }

    if cache.failure_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "failure-ttl-secs must be >= 1".to_string(),
        ));
    }

    if cache.fetch_timeout_secs < 1 || cache.fetch_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "fetch-timeout-secs must be between 1 and 300, got {}",
            cache.fetch_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the provider table
fn validate_providers(providers: &[Provider]) -> Result<(), ConfigError> {
    for provider in providers {
        if provider.name.is_empty() {
            return Err(ConfigError::Validation(
                "provider name cannot be empty".to_string(),
            ));
        }

        if Url::parse(&provider.base_url).is_err() {
            return Err(ConfigError::InvalidUrl(provider.base_url.clone()));
        }

        if provider.endpoints.is_empty() {
            return Err(ConfigError::Validation(format!(
                "provider '{}' declares no endpoints",
                provider.name
            )));
        }

        for endpoint in &provider.endpoints {
            if Url::parse(&endpoint.url).is_err() {
                return Err(ConfigError::InvalidUrl(endpoint.url.clone()));
            }
            if endpoint.schemes.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "endpoint '{}' of provider '{}' declares no schemes",
                    endpoint.url, provider.name
                )));
            }
        }
    }

    Ok(())
}

/// Validates scraping rules
fn validate_rules(rules: &[RuleConfig]) -> Result<(), ConfigError> {
    for rule in rules {
        if regex::Regex::new(&rule.pattern).is_err() {
            return Err(ConfigError::InvalidPattern(rule.pattern.clone()));
        }

        if rule.site.is_empty() {
            return Err(ConfigError::Validation(format!(
                "rule '{}' has an empty site label",
                rule.pattern
            )));
        }

        for field in &rule.fields {
            if field.name.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "rule '{}' declares a field with no name",
                    rule.site
                )));
            }
            if field.rules.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "field '{}' of rule '{}' has no selector rules",
                    field.name, rule.site
                )));
            }
            for selector_rule in &field.rules {
                if selector_rule.method == ExtractMethod::Attr && selector_rule.attr.is_none() {
                    return Err(ConfigError::Validation(format!(
                        "field '{}' of rule '{}' uses attr extraction without an attr name",
                        field.name, rule.site
                    )));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oembed::Endpoint;
    use crate::scrape::{FieldConfig, SelectorRule, Selectors};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_client_name_rejected() {
        let mut config = Config::default();
        config.identity.client_name = String::new();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_client_name_with_spaces_rejected() {
        let mut config = Config::default();
        config.identity.client_name = "bad name".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_contact_url_rejected() {
        let mut config = Config::default();
        config.identity.contact_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_sqlite_backend_requires_path() {
        let mut config = Config::default();
        config.cache.backend = CacheBackend::Sqlite;
        config.cache.database_path = None;
        assert!(validate(&config).is_err());

        config.cache.database_path = Some("./cache.db".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = Config::default();
        config.cache.success_ttl_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_provider_without_schemes_rejected() {
        let mut config = Config::default();
        config.providers = vec![Provider {
            name: "Broken".to_string(),
            base_url: "https://broken.example".to_string(),
            endpoints: vec![Endpoint {
                schemes: vec![],
                url: "https://broken.example/oembed".to_string(),
                discovery: false,
            }],
        }];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rule_with_bad_pattern_rejected() {
        let mut config = Config::default();
        config.rules = vec![RuleConfig {
            pattern: "([unclosed".to_string(),
            site: "broken".to_string(),
            locale: None,
            fields: vec![],
        }];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_attr_rule_without_attr_name_rejected() {
        let mut config = Config::default();
        config.rules = vec![RuleConfig {
            pattern: "^https://shop\\.example/".to_string(),
            site: "shop".to_string(),
            locale: None,
            fields: vec![FieldConfig {
                name: "image".to_string(),
                required: false,
                rules: vec![SelectorRule {
                    selector: Selectors::One("img".to_string()),
                    method: ExtractMethod::Attr,
                    attr: None,
                    collect_all: false,
                    processor: None,
                }],
            }],
        }];
        assert!(validate(&config).is_err());
    }
}
