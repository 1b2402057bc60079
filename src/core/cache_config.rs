//! Purpose: Parse the compact cache backend connection string into its wire config.
//! Exports: `BackendConfig`, `parse_backend_config`, `CACHE_COLLECTION_NAME`.
//! Role: Turns `address:port[,weight,password,db_index]` into the JSON config
//! string handed to the cache client loader.
//! Invariants: Full form splits into at most 4 pieces; extra commas stay in `dbNum`.
//! Invariants: `conn` keeps the address as typed; the default scheme is only used to validate.
//! Invariants: Serialized keys are `conn`, `dbNum`, `key`, `password`, in that order.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use super::error::{Error, ErrorKind};

/// Namespace tag shared by every cache config this process produces.
pub const CACHE_COLLECTION_NAME: &str = "helm_repo_cache";

const DEFAULT_SCHEME: &str = "redis";
const DEFAULT_DB_NUM: &str = "0";
const SCHEME_DELIMITER: &str = "://";
const FULL_FORM_PIECES: usize = 4;
const FULL_FORM_USAGE: &str =
    "invalid redis config, it should be address:port[,weight,password,db_index]";

/// Structured form of a cache backend connection string.
///
/// Field order matches the key order the downstream loader has always received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub conn: String,
    #[serde(rename = "dbNum")]
    pub db_num: String,
    pub key: String,
    pub password: String,
}

impl BackendConfig {
    /// Parses either the short form (`host:port`) or the full form
    /// (`host:port,weight,password,db_index`). The weight is accepted but dropped.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        if raw.is_empty() {
            return Err(Error::new(ErrorKind::InvalidConfig).with_message("empty redis config"));
        }

        let config = if raw.contains(',') {
            let pieces: Vec<&str> = raw.splitn(FULL_FORM_PIECES, ',').collect();
            let [conn, _weight, password, db_num] = pieces[..] else {
                return Err(Error::new(ErrorKind::InvalidConfig)
                    .with_message(FULL_FORM_USAGE)
                    .with_hint("Use host:port alone, or supply all four comma-separated fields."));
            };
            Self::new(conn, password, db_num)
        } else {
            Self::new(raw, "", DEFAULT_DB_NUM)
        };

        let url = validate_address(&config.conn)?;
        tracing::debug!(
            endpoint = %redacted_endpoint(&url),
            db_num = %config.db_num,
            "parsed cache backend config"
        );
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|err| {
            Error::new(ErrorKind::Encoding)
                .with_message("failed to encode redis config")
                .with_source(err)
        })
    }

    fn new(conn: &str, password: &str, db_num: &str) -> Self {
        Self {
            conn: conn.to_string(),
            db_num: db_num.to_string(),
            key: CACHE_COLLECTION_NAME.to_string(),
            password: password.to_string(),
        }
    }
}

impl FromStr for BackendConfig {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

/// Parses `raw` and returns the serialized config string.
pub fn parse_backend_config(raw: &str) -> Result<String, Error> {
    BackendConfig::parse(raw)?.to_json()
}

// `Url::parse` silently strips tabs, newlines and edge whitespace, so those are
// rejected up front; otherwise `conn` would carry bytes that were never validated.
fn validate_address(addr: &str) -> Result<Url, Error> {
    if addr.is_empty() {
        return Err(Error::new(ErrorKind::InvalidConfig)
            .with_message("empty redis address")
            .with_hint(FULL_FORM_USAGE));
    }
    if addr.chars().any(|c| c.is_ascii_control()) || addr.trim() != addr {
        return Err(Error::new(ErrorKind::InvalidConfig).with_message(
            "invalid redis address: control character or surrounding whitespace",
        ));
    }
    let qualified = if addr.contains(SCHEME_DELIMITER) {
        addr.to_string()
    } else {
        format!("{DEFAULT_SCHEME}{SCHEME_DELIMITER}{addr}")
    };
    Url::parse(&qualified).map_err(|err| {
        Error::new(ErrorKind::InvalidConfig)
            .with_message(format!("invalid redis address: {err}"))
            .with_source(err)
    })
}

/// Host and port only; userinfo never reaches the logs.
fn redacted_endpoint(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendConfig, CACHE_COLLECTION_NAME, parse_backend_config, redacted_endpoint};
    use crate::core::error::ErrorKind;
    use proptest::prelude::*;
    use serde_json::Value;

    #[test]
    fn short_form_fills_defaults() {
        let config = BackendConfig::parse("redis-host:6379").expect("config");
        assert_eq!(config.conn, "redis-host:6379");
        assert_eq!(config.password, "");
        assert_eq!(config.db_num, "0");
        assert_eq!(config.key, CACHE_COLLECTION_NAME);
    }

    #[test]
    fn short_form_keeps_explicit_scheme() {
        let config = BackendConfig::parse("redis://:secret@cache.local:6380/2").expect("config");
        assert_eq!(config.conn, "redis://:secret@cache.local:6380/2");
        assert_eq!(config.db_num, "0");
    }

    #[test]
    fn full_form_drops_weight() {
        let config = BackendConfig::parse("10.0.0.5:6379,100,hunter2,3").expect("config");
        assert_eq!(config.conn, "10.0.0.5:6379");
        assert_eq!(config.password, "hunter2");
        assert_eq!(config.db_num, "3");
    }

    #[test]
    fn full_form_keeps_trailing_commas_in_db_num() {
        let config = BackendConfig::parse("host:1,w,pw,4,extra,more").expect("config");
        assert_eq!(config.password, "pw");
        assert_eq!(config.db_num, "4,extra,more");
    }

    #[test]
    fn full_form_allows_empty_password() {
        let config = BackendConfig::parse("host:6379,,,").expect("config");
        assert_eq!(config.password, "");
        assert_eq!(config.db_num, "");
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = BackendConfig::parse("").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert_eq!(err.message(), Some("empty redis config"));
    }

    #[test]
    fn partial_full_form_is_rejected() {
        for raw in ["host:1,w", "host:1,w,pw"] {
            let err = BackendConfig::parse(raw).expect_err("err");
            assert_eq!(err.kind(), ErrorKind::InvalidConfig);
            assert_eq!(
                err.message(),
                Some("invalid redis config, it should be address:port[,weight,password,db_index]")
            );
        }
    }

    #[test]
    fn unparsable_address_is_rejected() {
        let err = BackendConfig::parse("not a url!!,w,p,0").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert!(std::error::Error::source(&err).is_some());

        let err = BackendConfig::parse("host:notaport").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn control_characters_and_edge_whitespace_are_rejected() {
        let cases = [
            "host:6379\t",
            "ho\nst:6379",
            "host:6379 ",
            " host:6379",
            "\thost:6379,w,p,0",
            "host:6379\r,w,p,0",
            "redis://host\u{7f}:6379",
        ];
        for raw in cases {
            let err = BackendConfig::parse(raw).expect_err("err");
            assert_eq!(err.kind(), ErrorKind::InvalidConfig, "input {raw:?}");
            assert!(
                err.message()
                    .is_some_and(|message| message.starts_with("invalid redis address")),
                "input {raw:?}"
            );
        }
    }

    // `:6379` and an out-of-range port pass a lenient URL parser but cannot
    // name a reachable backend, so they are refused here.
    #[test]
    fn malformed_addresses_are_rejected() {
        let cases = [
            "host:notaport",
            "host:99999",
            ":6379",
            "ho st:6379",
            "redis://[::1:6379",
        ];
        for raw in cases {
            let err = BackendConfig::parse(raw).expect_err("err");
            assert_eq!(err.kind(), ErrorKind::InvalidConfig, "input {raw:?}");
            assert!(std::error::Error::source(&err).is_some(), "input {raw:?}");
        }
    }

    #[test]
    fn parse_failure_message_carries_url_cause() {
        let err = BackendConfig::parse("host:99999").expect_err("err");
        let message = err.message().expect("message");
        assert!(message.starts_with("invalid redis address: "));
        assert!(message.len() > "invalid redis address: ".len());
    }

    #[test]
    fn redacted_endpoint_drops_credentials() {
        let url = url::Url::parse("redis://:secret@cache.local:6380/2").expect("url");
        assert_eq!(redacted_endpoint(&url), "cache.local:6380");

        let url = url::Url::parse("redis://user:pw@cache.local").expect("url");
        assert_eq!(redacted_endpoint(&url), "cache.local");
    }

    #[test]
    fn empty_address_is_rejected() {
        let err = BackendConfig::parse(",w,p,0").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert_eq!(err.message(), Some("empty redis address"));
    }

    #[test]
    fn serialized_form_matches_wire_contract() {
        let json = parse_backend_config("cache:6379,1,pw,2").expect("json");
        assert_eq!(
            json,
            r#"{"conn":"cache:6379","dbNum":"2","key":"helm_repo_cache","password":"pw"}"#
        );

        let value: Value = serde_json::from_str(&json).expect("valid json");
        let obj = value.as_object().expect("object");
        assert_eq!(obj.len(), 4);
    }

    #[test]
    fn from_str_delegates_to_parse() {
        let config: BackendConfig = "host:6379".parse().expect("config");
        assert_eq!(config.conn, "host:6379");
    }

    proptest! {
        #[test]
        fn short_form_round_trips_address(host in "[a-z][a-z0-9-]{0,15}", port in 1u16..) {
            let addr = format!("{host}:{port}");
            let config = BackendConfig::parse(&addr).expect("config");
            prop_assert_eq!(config.conn, addr);
            prop_assert_eq!(config.password, "");
            prop_assert_eq!(config.db_num, "0");
        }

        #[test]
        fn full_form_ignores_weight(
            host in "[a-z][a-z0-9.]{0,15}",
            port in 1u16..,
            weight in "[^,]{0,8}",
            password in "[^,]{0,16}",
            db in ".{0,8}",
        ) {
            let addr = format!("{host}:{port}");
            let raw = format!("{addr},{weight},{password},{db}");
            let config = BackendConfig::parse(&raw).expect("config");
            prop_assert_eq!(config.conn, addr);
            prop_assert_eq!(config.password, password);
            prop_assert_eq!(config.db_num, db);
        }

        #[test]
        fn addresses_with_control_characters_never_parse(
            host in "[a-z]{1,8}",
            control in "[\\x00-\\x1f\\x7f]",
            port in 1u16..,
        ) {
            let raw = format!("{host}{control}:{port}");
            let err = BackendConfig::parse(&raw).expect_err("err");
            prop_assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        }
    }
}
