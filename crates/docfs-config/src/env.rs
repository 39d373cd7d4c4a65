use regex::{Captures, Regex};
use std::env;
use std::sync::OnceLock;

use crate::ConfigError;

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("static regex")
    })
}

/// Interpolate environment variables in a string.
///
/// `${VAR}` is replaced with the value of `VAR`; `${VAR:-fallback}` uses
/// `fallback` when `VAR` is unset. Every unset variable without a fallback is
/// reported at once.
pub fn interpolate_env(input: &str) -> Result<String, ConfigError> {
    let mut missing = Vec::new();

    let result = placeholder().replace_all(input, |cap: &Captures<'_>| {
        let var_name = &cap[1];
        match (env::var(var_name), cap.get(2)) {
            (Ok(value), _) => value,
            (Err(_), Some(fallback)) => fallback.as_str().to_string(),
            (Err(_), None) => {
                if !missing.iter().any(|m| m == var_name) {
                    missing.push(var_name.to_string());
                }
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(ConfigError::MissingEnvVars(missing));
    }

    Ok(result.into_owned())
}
