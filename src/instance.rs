use serde::{Deserialize, Serialize};

/// Deployment-level instance state, as far as authentication cares.
///
/// A missing instance record and `is_setup_done == false` are equivalent:
/// both mean no credential flow may run yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub is_setup_done: bool,
}

/// Authentication provider flags from the instance admin panel.
///
/// The wire shape is the panel's formatted config: `SCREAMING_SNAKE` keys with
/// `"0"`/`"1"` string values. Missing keys read as `"0"`. Deserialization
/// applies the panel's `Boolean(parseInt(value))` coercion, so `"2"` or
/// `"01"` count as set while `"true"` does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct InstanceConfig {
    #[serde(with = "flag")]
    pub enable_signup: bool,
    #[serde(with = "flag")]
    pub enable_magic_link_login: bool,
    #[serde(with = "flag")]
    pub enable_email_password: bool,
}

impl InstanceConfig {
    /// Merges a partial update; keys absent from the patch keep their value.
    pub fn apply(&mut self, patch: InstanceConfigPatch) {
        if let Some(value) = patch.enable_signup {
            self.enable_signup = value;
        }
        if let Some(value) = patch.enable_magic_link_login {
            self.enable_magic_link_login = value;
        }
        if let Some(value) = patch.enable_email_password {
            self.enable_email_password = value;
        }
    }
}

/// Partial update to [`InstanceConfig`]; only supplied keys change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct InstanceConfigPatch {
    #[serde(with = "flag_opt", skip_serializing_if = "Option::is_none")]
    pub enable_signup: Option<bool>,
    #[serde(with = "flag_opt", skip_serializing_if = "Option::is_none")]
    pub enable_magic_link_login: Option<bool>,
    #[serde(with = "flag_opt", skip_serializing_if = "Option::is_none")]
    pub enable_email_password: Option<bool>,
}

/// `Boolean(parseInt(raw))`: set iff the leading integer is non-zero.
fn parse_flag(raw: &str) -> bool {
    let s = raw.trim_start();
    let digits = match s.as_bytes().first() {
        Some(b'+' | b'-') => &s[1..],
        _ => s,
    };
    let leading = digits.bytes().take_while(u8::is_ascii_digit);
    let mut any = false;
    let mut nonzero = false;
    for digit in leading {
        any = true;
        nonzero |= digit != b'0';
    }
    any && nonzero
}

mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "1" } else { "0" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(super::parse_flag(&raw))
    }
}

mod flag_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<bool>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(flag) => serializer.serialize_str(if *flag { "1" } else { "0" }),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| super::parse_flag(&s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_read_as_unset() {
        let config: InstanceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, InstanceConfig::default());
        assert!(!config.enable_signup);
    }

    #[test]
    fn formatted_config_roundtrip() {
        let config = InstanceConfig {
            enable_signup: true,
            enable_magic_link_login: false,
            enable_email_password: true,
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ENABLE_SIGNUP": "1",
                "ENABLE_MAGIC_LINK_LOGIN": "0",
                "ENABLE_EMAIL_PASSWORD": "1",
            })
        );
        let back: InstanceConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn parse_int_coercion() {
        assert!(parse_flag("1"));
        assert!(parse_flag("2"));
        assert!(parse_flag("01"));
        assert!(parse_flag(" 1"));
        assert!(parse_flag("-1"));
        assert!(parse_flag("1misc"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("-0"));
        assert!(!parse_flag("000"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("true"));
        assert!(!parse_flag("on"));
    }

    #[test]
    fn patch_touches_only_supplied_keys() {
        let mut config = InstanceConfig {
            enable_signup: true,
            enable_magic_link_login: true,
            enable_email_password: false,
        };
        config.apply(InstanceConfigPatch {
            enable_signup: Some(false),
            ..InstanceConfigPatch::default()
        });
        assert!(!config.enable_signup);
        assert!(config.enable_magic_link_login);
        assert!(!config.enable_email_password);
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let json = serde_json::to_value(InstanceConfigPatch::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn patch_deserializes_the_panel_payload() {
        let patch: InstanceConfigPatch =
            serde_json::from_str(r#"{"ENABLE_SIGNUP": "0"}"#).unwrap();
        assert_eq!(patch.enable_signup, Some(false));
        assert_eq!(patch.enable_magic_link_login, None);
    }
}
