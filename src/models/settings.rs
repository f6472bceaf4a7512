use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted type tag of a site setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Text,
    Json,
    Boolean,
    Number,
}

impl SettingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingType::Text => "text",
            SettingType::Json => "json",
            SettingType::Boolean => "boolean",
            SettingType::Number => "number",
        }
    }
}

impl std::str::FromStr for SettingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(SettingType::Text),
            "json" => Ok(SettingType::Json),
            "boolean" => Ok(SettingType::Boolean),
            "number" => Ok(SettingType::Number),
            other => Err(format!("unsupported setting type {:?}", other)),
        }
    }
}

/// A decoded setting value. Serializes as the bare value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Text(String),
    Json(Value),
    Bool(bool),
    Number(f64),
}

impl SettingValue {
    pub fn setting_type(&self) -> SettingType {
        match self {
            SettingValue::Text(_) => SettingType::Text,
            SettingValue::Json(_) => SettingType::Json,
            SettingValue::Bool(_) => SettingType::Boolean,
            SettingValue::Number(_) => SettingType::Number,
        }
    }

    /// Stored string form.
    pub fn encode(&self) -> String {
        match self {
            SettingValue::Text(s) => s.clone(),
            SettingValue::Json(v) => v.to_string(),
            SettingValue::Bool(b) => (if *b { "true" } else { "false" }).to_string(),
            SettingValue::Number(n) => n.to_string(),
        }
    }

    pub fn decode(raw: &str, setting_type: SettingType) -> Result<Self, String> {
        match setting_type {
            SettingType::Text => Ok(SettingValue::Text(raw.to_string())),
            SettingType::Json => serde_json::from_str(raw)
                .map(SettingValue::Json)
                .map_err(|e| format!("invalid json: {}", e)),
            SettingType::Boolean => Ok(SettingValue::Bool(raw == "true")),
            SettingType::Number => raw
                .trim()
                .parse::<f64>()
                .map(SettingValue::Number)
                .map_err(|e| format!("invalid number {:?}: {}", raw, e)),
        }
    }

    /// Build a value from an incoming `{ type, value }` pair, rejecting
    /// values that don't fit the declared type.
    pub fn from_parts(setting_type: SettingType, value: Value) -> Result<Self, String> {
        match (setting_type, value) {
            (SettingType::Text, Value::String(s)) => Ok(SettingValue::Text(s)),
            (SettingType::Text, other) => Err(format!("text setting expects a string, got {}", other)),
            (SettingType::Json, v) => Ok(SettingValue::Json(v)),
            (SettingType::Boolean, Value::Bool(b)) => Ok(SettingValue::Bool(b)),
            (SettingType::Boolean, Value::String(s)) if s == "true" || s == "false" => {
                Ok(SettingValue::Bool(s == "true"))
            }
            (SettingType::Boolean, other) => {
                Err(format!("boolean setting expects true or false, got {}", other))
            }
            (SettingType::Number, Value::Number(n)) => n
                .as_f64()
                .map(SettingValue::Number)
                .ok_or_else(|| "number out of range".to_string()),
            (SettingType::Number, Value::String(s)) => Self::decode(&s, SettingType::Number),
            (SettingType::Number, other) => {
                Err(format!("number setting expects a number, got {}", other))
            }
        }
    }
}

/// A `site_settings` row as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSetting {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type", default = "default_type_tag")]
    pub setting_type: String,
    #[serde(default)]
    pub updated_at: String,
}

fn default_type_tag() -> String {
    SettingType::Text.as_str().to_string()
}

impl SiteSetting {
    /// Decode the stored value. A malformed value or tag never fails the
    /// caller: bad JSON reads as an empty object, an unknown tag reads as
    /// text, an unparsable number yields `None`.
    pub fn decoded(&self) -> Option<SettingValue> {
        let setting_type = match self.setting_type.parse::<SettingType>() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Setting {:?}: {}; reading as text", self.key, e);
                SettingType::Text
            }
        };
        match SettingValue::decode(&self.value, setting_type) {
            Ok(v) => Some(v),
            Err(e) if setting_type == SettingType::Json => {
                log::warn!("Setting {:?}: {}; using empty object", self.key, e);
                Some(SettingValue::Json(Value::Object(Default::default())))
            }
            Err(e) => {
                log::warn!("Setting {:?}: {}", self.key, e);
                None
            }
        }
    }
}
