use std::{net::SocketAddr, path::PathBuf};

use chrono::Duration;
use clap::Parser;

/// Personal todo list server.
#[derive(Debug, Parser)]
#[command(name = "tickbox", version)]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "TICKBOX_BIND", default_value = "0.0.0.0:7890")]
    pub bind: SocketAddr,

    /// RON file holding users and todos.
    #[arg(long, env = "TICKBOX_DATA", default_value = "data.ron")]
    pub data_file: PathBuf,

    /// PEM certificate; serves HTTPS together with `--key`.
    #[arg(long, env = "SSL_CERT", requires = "key")]
    pub cert: Option<PathBuf>,

    /// PEM private key for `--cert`.
    #[arg(long, env = "SSL_KEY", requires = "cert")]
    pub key: Option<PathBuf>,

    /// Days a login stays valid without activity.
    #[arg(long, env = "TICKBOX_SESSION_DAYS", default_value_t = 14)]
    pub session_days: u16,
}

impl Config {
    pub fn session_ttl(&self) -> Duration {
        Duration::days(i64::from(self.session_days))
    }

    pub fn tls(&self) -> Option<(&PathBuf, &PathBuf)> {
        self.cert.as_ref().zip(self.key.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["tickbox"]).unwrap();

        assert_eq!(config.bind, SocketAddr::from(([0; 4], 7890)));
        assert_eq!(config.data_file, PathBuf::from("data.ron"));
        assert_eq!(config.session_ttl(), Duration::days(14));
        assert!(config.tls().is_none());
    }

    #[test]
    fn tls_needs_cert_and_key() {
        assert!(Config::try_parse_from(["tickbox", "--cert", "cert.pem"]).is_err());

        let config =
            Config::try_parse_from(["tickbox", "--cert", "cert.pem", "--key", "key.pem"]).unwrap();
        assert!(config.tls().is_some());
    }
}
