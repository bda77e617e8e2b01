//! BuildConfig: the `key=value` control file read by the launcher stub

use super::constants::{
    ENV_KEY_PREFIX, KEY_ENTRY, KEY_UNZIP_PATH, KEY_UV_INSTALL_SCRIPT_UNIX,
    KEY_UV_INSTALL_SCRIPT_WINDOWS, KEY_WIN_GUI, REQUIRED_CONFIG_KEYS,
};
use crate::exceptions::{PyfuzeError, Result};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::str::FromStr;

/// A user environment variable declared as `KEY=value`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

impl FromStr for EnvVar {
    type Err = PyfuzeError;

    /// Split on the first `=` only; the value may itself contain `=`.
    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s.split_once('=').ok_or_else(|| {
            PyfuzeError::InvalidInput(format!("env entry '{s}' is not KEY=value"))
        })?;
        if key.is_empty() {
            return Err(PyfuzeError::InvalidInput(format!(
                "env entry '{s}' has an empty key"
            )));
        }
        Ok(EnvVar {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

/// Run-time parameters that end up in the control file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub unzip_path: String,
    pub win_gui: bool,
    pub uv_install_script_windows: String,
    pub uv_install_script_unix: String,
    pub env: Vec<EnvVar>,
}

/// Ordered flat string mapping, serialized one `key=value` per line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    entries: Vec<(String, String)>,
}

/// JSON object in insertion order
impl Serialize for BuildConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl BuildConfig {
    /// Build the control block with required keys first, then `env_*` keys.
    pub fn from_settings(settings: &RuntimeSettings, entry: &str) -> Result<Self> {
        let mut config = BuildConfig::default();
        config.insert(KEY_UNZIP_PATH, &settings.unzip_path)?;
        config.insert(KEY_ENTRY, entry)?;
        config.insert(KEY_WIN_GUI, if settings.win_gui { "1" } else { "0" })?;
        config.insert(
            KEY_UV_INSTALL_SCRIPT_WINDOWS,
            &settings.uv_install_script_windows,
        )?;
        config.insert(KEY_UV_INSTALL_SCRIPT_UNIX, &settings.uv_install_script_unix)?;
        for var in &settings.env {
            config.insert(&format!("{ENV_KEY_PREFIX}{}", var.key), &var.value)?;
        }
        Ok(config)
    }

    /// Insert or replace a key, keeping its original position on replace.
    pub fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() || key.contains(['=', '\n', '\r']) {
            return Err(PyfuzeError::InvalidInput(format!(
                "config key '{}' must be non-empty and contain no '=' or newline",
                key.escape_debug()
            )));
        }
        if value.contains(['\n', '\r']) {
            return Err(PyfuzeError::InvalidInput(format!(
                "config value for '{key}' must be a single line"
            )));
        }

        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `env_` entries with the prefix stripped
    pub fn env(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .filter_map(|(k, v)| k.strip_prefix(ENV_KEY_PREFIX).map(|name| (name, v)))
    }

    /// Required keys that are absent
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_CONFIG_KEYS
            .iter()
            .copied()
            .filter(|key| self.get(key).is_none())
            .collect()
    }

    /// Newline separated `key=value` lines, no trailing newline.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse control file text the way the launcher does: lines without `=`
    /// are skipped, the first `=` splits, whitespace around key and value is
    /// trimmed, and the first occurrence of a key wins.
    pub fn parse(text: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if entries.iter().any(|(k, _)| k == key) {
                continue;
            }
            entries.push((key.to_string(), value.trim().to_string()));
        }
        BuildConfig { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(env: &[&str]) -> RuntimeSettings {
        RuntimeSettings {
            unzip_path: "/tmp/x".to_string(),
            win_gui: false,
            uv_install_script_windows: "https://astral.sh/uv/install.ps1".to_string(),
            uv_install_script_unix: "https://astral.sh/uv/install.sh".to_string(),
            env: env.iter().map(|e| e.parse().unwrap()).collect(),
        }
    }

    #[test]
    fn test_serialize_order_and_format() {
        let config = BuildConfig::from_settings(&settings(&["FOO=bar"]), "main.py").unwrap();
        assert_eq!(
            config.serialize(),
            "unzip_path=/tmp/x\n\
             entry=main.py\n\
             win_gui=0\n\
             uv_install_script_windows=https://astral.sh/uv/install.ps1\n\
             uv_install_script_unix=https://astral.sh/uv/install.sh\n\
             env_FOO=bar"
        );
    }

    #[test]
    fn test_round_trip_recovers_pairs() {
        let config = BuildConfig::from_settings(&settings(&["FOO=bar"]), "main.py").unwrap();
        let parsed = BuildConfig::parse(&config.serialize());

        assert_eq!(parsed, config);
        assert_eq!(parsed.get("unzip_path"), Some("/tmp/x"));
        assert_eq!(parsed.get("entry"), Some("main.py"));
        assert_eq!(parsed.get("win_gui"), Some("0"));
        assert_eq!(parsed.get("env_FOO"), Some("bar"));
        assert_eq!(parsed.env().collect::<Vec<_>>(), vec![("FOO", "bar")]);
        assert!(parsed.missing_required().is_empty());
    }

    #[test]
    fn test_json_keeps_key_order() {
        let config = BuildConfig::from_settings(&settings(&["FOO=bar"]), "main.py").unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.starts_with(r#"{"unzip_path":"/tmp/x","entry":"main.py","win_gui":"0""#));
        assert!(json.ends_with(r#""env_FOO":"bar"}"#));
    }

    #[test]
    fn test_env_splits_on_first_equals() {
        let var: EnvVar = "UV_DEFAULT_INDEX=https://x/simple?a=b".parse().unwrap();
        assert_eq!(var.key, "UV_DEFAULT_INDEX");
        assert_eq!(var.value, "https://x/simple?a=b");

        let empty: EnvVar = "EMPTY=".parse().unwrap();
        assert_eq!(empty.value, "");

        assert!("NOEQUALS".parse::<EnvVar>().is_err());
        assert!("=value".parse::<EnvVar>().is_err());
    }

    #[test]
    fn test_insert_rejects_multiline_values() {
        let mut config = BuildConfig::default();
        assert!(config.insert("entry", "a\nb").is_err());
        assert!(config.insert("a=b", "c").is_err());
        config.insert("entry", "a.py").unwrap();
        config.insert("entry", "b.py").unwrap();
        assert_eq!(config.len(), 1);
        assert_eq!(config.get("entry"), Some("b.py"));
    }

    #[test]
    fn test_parse_is_tolerant() {
        let parsed = BuildConfig::parse("# comment\n  entry = app.py \r\nwin_gui=1\nentry=other.py\n");
        assert_eq!(parsed.get("entry"), Some("app.py"));
        assert_eq!(parsed.get("win_gui"), Some("1"));
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed.missing_required(),
            vec!["unzip_path", "uv_install_script_windows", "uv_install_script_unix"]
        );
    }
}
