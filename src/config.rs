//! Server configuration.
//!
//! Defaults mirror a conservative `net/http`-style server: listen on `:8080`,
//! ten-second read, write and idle timeouts, 1 MiB of request headers.
//! Every value can be overridden from the environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `FOLIO_ADDR` | `0.0.0.0:8080` |
//! | `FOLIO_READ_TIMEOUT_SECS` | `10` |
//! | `FOLIO_WRITE_TIMEOUT_SECS` | `10` |
//! | `FOLIO_IDLE_TIMEOUT_SECS` | `10` |
//! | `FOLIO_MAX_HEADER_BYTES` | `1048576` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

/// hyper refuses read buffers smaller than this.
const MIN_HEADER_BYTES: usize = 8192;

/// Listener address, timeouts and limits for [`Server`](crate::Server).
#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    /// Time allowed for a client to send a complete request head.
    pub read_timeout: Duration,
    /// Time allowed for a handler to produce its response.
    pub write_timeout: Duration,
    /// A keep-alive connection with nothing in flight is closed after this long.
    pub idle_timeout: Duration,
    pub max_header_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(10),
            max_header_bytes: 1 << 20,
        }
    }
}

impl Config {
    /// Reads overrides from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys keep their
    /// default; set keys that fail to parse are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();

        let max_header_bytes = parse_or("FOLIO_MAX_HEADER_BYTES", &lookup, defaults.max_header_bytes)?;
        if max_header_bytes < MIN_HEADER_BYTES {
            return Err(Error::config(
                "FOLIO_MAX_HEADER_BYTES",
                format!("must be at least {MIN_HEADER_BYTES}"),
            ));
        }

        Ok(Self {
            addr: parse_or("FOLIO_ADDR", &lookup, defaults.addr)?,
            read_timeout: secs_or("FOLIO_READ_TIMEOUT_SECS", &lookup, defaults.read_timeout)?,
            write_timeout: secs_or("FOLIO_WRITE_TIMEOUT_SECS", &lookup, defaults.write_timeout)?,
            idle_timeout: secs_or("FOLIO_IDLE_TIMEOUT_SECS", &lookup, defaults.idle_timeout)?,
            max_header_bytes,
        })
    }
}

fn parse_or<T>(key: &'static str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| Error::config(key, e)),
        None => Ok(default),
    }
}

fn secs_or(key: &'static str, lookup: &impl Fn(&str) -> Option<String>, default: Duration) -> Result<Duration, Error> {
    let secs = parse_or(key, lookup, default.as_secs())?;
    if secs == 0 {
        return Err(Error::config(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}
