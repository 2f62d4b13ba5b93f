//! Session settings.

use crate::sql_value::SqlValue;

pub const DEFAULT_DATABASE: &str = "mydb";
pub const DEFAULT_ROWS_CACHE_LIMIT_BYTES: usize = 64 * 1024 * 1024;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),
    #[error("Invalid value for setting {name}: {value}")]
    InvalidValue { name: String, value: String },
    #[error("Expected a setting as name=value, got: {0}")]
    MalformedSetting(String),
}

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Database used for table references that do not name one.
    pub current_database: String,
    /// Total bytes all rows caches created for the session may hold at once.
    pub rows_cache_limit_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            current_database: DEFAULT_DATABASE.to_string(),
            rows_cache_limit_bytes: DEFAULT_ROWS_CACHE_LIMIT_BYTES,
        }
    }
}

impl SessionConfig {
    pub fn set_from_value(&mut self, name: &str, value: &SqlValue) -> Result<(), Error> {
        let invalid = || Error::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        match name {
            "current_database" => {
                let s = value.as_text().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
                self.current_database = s.clone();
            }
            "rows_cache_limit_bytes" => {
                let i = value.as_int().ok_or_else(invalid)?;
                self.rows_cache_limit_bytes = usize::try_from(*i).map_err(|_| invalid())?;
            }
            _ => return Err(Error::UnknownSetting(name.to_string())),
        }
        Ok(())
    }

    /// applies a `name=value` setting; values that parse as integers are integers, anything else is text.
    pub fn apply_setting(&mut self, setting: &str) -> Result<(), Error> {
        let (name, value) = setting
            .split_once('=')
            .ok_or_else(|| Error::MalformedSetting(setting.to_string()))?;
        let value = match value.parse::<i64>() {
            Ok(i) => SqlValue::Int(i),
            Err(_) => SqlValue::from(value),
        };
        self.set_from_value(name.trim(), &value)
    }

    pub fn get_as_value(&self, name: &str) -> Result<SqlValue, Error> {
        match name {
            "current_database" => Ok(SqlValue::Text(self.current_database.clone())),
            "rows_cache_limit_bytes" => Ok(SqlValue::Int(self.rows_cache_limit_bytes as i64)),
            _ => Err(Error::UnknownSetting(name.to_string())),
        }
    }
}

#[test]
fn test_set_and_get() {
    struct Case {
        desc: &'static str,
        name: &'static str,
        value: SqlValue,
        expected: Result<SqlValue, Error>,
    }
    let cases = vec![
        Case {
            desc: "set database",
            name: "current_database",
            value: SqlValue::from("other"),
            expected: Ok(SqlValue::from("other")),
        },
        Case {
            desc: "set limit",
            name: "rows_cache_limit_bytes",
            value: SqlValue::Int(1024),
            expected: Ok(SqlValue::Int(1024)),
        },
        Case {
            desc: "negative limit",
            name: "rows_cache_limit_bytes",
            value: SqlValue::Int(-1),
            expected: Err(Error::InvalidValue {
                name: "rows_cache_limit_bytes".to_string(),
                value: "-1".to_string(),
            }),
        },
        Case {
            desc: "empty database",
            name: "current_database",
            value: SqlValue::from(""),
            expected: Err(Error::InvalidValue {
                name: "current_database".to_string(),
                value: "".to_string(),
            }),
        },
        Case {
            desc: "unknown",
            name: "bogus",
            value: SqlValue::Int(1),
            expected: Err(Error::UnknownSetting("bogus".to_string())),
        },
    ];
    for case in cases {
        println!("Running case: {}", case.desc);
        let mut conf = SessionConfig::default();
        let actual = conf
            .set_from_value(case.name, &case.value)
            .and_then(|_| conf.get_as_value(case.name));
        assert_eq!(actual, case.expected);
    }
}

#[test]
fn test_apply_setting() {
    struct Case {
        desc: &'static str,
        setting: &'static str,
        expected: Result<SessionConfig, Error>,
    }
    let cases = vec![
        Case {
            desc: "text value",
            setting: "current_database=sales",
            expected: Ok(SessionConfig {
                current_database: "sales".to_string(),
                ..Default::default()
            }),
        },
        Case {
            desc: "integer value",
            setting: "rows_cache_limit_bytes=1024",
            expected: Ok(SessionConfig {
                rows_cache_limit_bytes: 1024,
                ..Default::default()
            }),
        },
        Case {
            desc: "integer where text is wanted",
            setting: "current_database=7",
            expected: Err(Error::InvalidValue {
                name: "current_database".to_string(),
                value: "7".to_string(),
            }),
        },
        Case {
            desc: "no equals sign",
            setting: "current_database",
            expected: Err(Error::MalformedSetting("current_database".to_string())),
        },
    ];
    for case in cases {
        println!("Running case: {}", case.desc);
        let mut conf = SessionConfig::default();
        let actual = conf.apply_setting(case.setting).map(|_| conf.clone());
        assert_eq!(actual, case.expected);
    }
}
