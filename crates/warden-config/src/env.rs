//! Environment variable fallbacks.
//!
//! Env vars are a fallback, not an override: they only fill fields that no
//! config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "WARDEN_PROFILE",
        field_path: "policy.profile",
    },
    EnvMapping {
        var_name: "WARDEN_HOME_CHAIN_ID",
        field_path: "wallet.home_chain_id",
    },
    EnvMapping {
        var_name: "WARDEN_WALLET_ADDRESS",
        field_path: "wallet.address",
    },
    EnvMapping {
        var_name: "WARDEN_FROZEN",
        field_path: "wallet.frozen",
    },
    EnvMapping {
        var_name: "WARDEN_QUOTE_TIMEOUT_MS",
        field_path: "quote.timeout_ms",
    },
    EnvMapping {
        var_name: "WARDEN_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "WARDEN_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Apply env var fallbacks to fields no file layer set.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if matches!(
            sources.get(mapping.field_path),
            Some(ConfigLayer::User | ConfigLayer::File | ConfigLayer::Environment)
        ) {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field(merged, mapping.field_path, coerce(mapping.field_path, val));
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set `path` (dotted) in the tree, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let (parents, leaf) = path.rsplit_once('.').unwrap_or(("", path));

    let mut current = root;
    for segment in parents.split('.').filter(|s| !s.is_empty()) {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

/// Coerce a string to the TOML type of a known field.
fn coerce(path: &str, val: &str) -> toml::Value {
    if matches!(path, "wallet.home_chain_id" | "quote.timeout_ms")
        && let Ok(i) = val.parse::<i64>()
    {
        return toml::Value::Integer(i);
    }

    if path == "wallet.frozen"
        && let Ok(b) = val.parse::<bool>()
    {
        return toml::Value::Boolean(b);
    }

    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_apply_env_fallbacks() {
        let mut merged: toml::Value = toml::from_str("[policy]\nprofile = \"balanced\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("policy.profile".to_owned(), ConfigLayer::Defaults);
        let env = make_env(&[
            ("WARDEN_PROFILE", "autonomous"),
            ("WARDEN_HOME_CHAIN_ID", "1"),
            ("WARDEN_FROZEN", "true"),
        ]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(count, 3);
        assert_eq!(merged["policy"]["profile"].as_str(), Some("autonomous"));
        assert_eq!(merged["wallet"]["home_chain_id"].as_integer(), Some(1));
        assert_eq!(merged["wallet"]["frozen"].as_bool(), Some(true));
        assert_eq!(
            sources.get("policy.profile"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_fallback_skips_file_values() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::File);

        let env = make_env(&[("WARDEN_LOG_LEVEL", "debug")]);
        let count = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(count, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_unparseable_integer_stays_string() {
        assert_eq!(
            coerce("wallet.home_chain_id", "base"),
            toml::Value::String("base".to_owned())
        );
        assert_eq!(coerce("quote.timeout_ms", "250"), toml::Value::Integer(250));
    }

    #[test]
    fn test_unrelated_vars_ignored() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("HOME", "/root"), ("WARDEN_UNKNOWN", "x")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
    }
}
