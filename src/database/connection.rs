use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::{DatabaseError, DEFAULT_PORT};

const APPLICATION_NAME: &str = "music-therapy";

/// `host`, `host:port` or `host,port`. IPv6 literals are written `[addr]`,
/// `[addr]:port`, `addr,port`, or bare without a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

fn parse_port(port: &str, address: &str) -> Result<u16, DatabaseError> {
    port.trim()
        .parse::<u16>()
        .map_err(|_| DatabaseError::InvalidServer(address.to_string()))
}

impl FromStr for ServerAddress {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DatabaseError::InvalidServer(s.to_string());

        let (host, port) = if let Some(bracketed) = s.strip_prefix('[') {
            let (host, rest) = bracketed.split_once(']').ok_or_else(invalid)?;
            let port = match rest.trim() {
                "" => DEFAULT_PORT,
                rest => match rest.strip_prefix([':', ',']) {
                    Some(port) => parse_port(port, s)?,
                    None => return Err(invalid()),
                },
            };
            (host.trim(), port)
        } else if let Some((host, port)) = s.rsplit_once(',') {
            (host.trim(), parse_port(port, s)?)
        } else {
            match s.split_once(':') {
                // More than one colon: a bare IPv6 address
                Some((_, rest)) if rest.contains(':') => (s, DEFAULT_PORT),
                Some((host, port)) => (host.trim(), parse_port(port, s)?),
                None => (s, DEFAULT_PORT),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// How to authenticate against the server.
#[derive(Clone)]
pub enum Credentials {
    Password { username: String, password: String },
    /// Use the identity of the current operating-system user.
    Trusted,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Credentials::Trusted => f.write_str("Trusted"),
        }
    }
}

pub(super) fn connect_options(
    server: &ServerAddress,
    db_name: &str,
    credentials: &Credentials,
) -> PgConnectOptions {
    // Without an explicit username the driver falls back to PGUSER or the
    // current OS user, which is what trusted authentication relies on.
    let options = PgConnectOptions::new()
        .host(&server.host)
        .port(server.port)
        .database(db_name)
        .application_name(APPLICATION_NAME);

    match credentials {
        Credentials::Password { username, password } => {
            options.username(username).password(password)
        }
        Credentials::Trusted => options,
    }
}

pub async fn connect(
    server: &str,
    db_name: &str,
    credentials: &Credentials,
) -> Result<PgConnection, DatabaseError> {
    let address: ServerAddress = server.parse()?;
    debug!("Connecting to {}/{} ({:?})", address, db_name, credentials);
    let options = connect_options(&address, db_name, credentials);
    Ok(PgConnection::connect_with(&options).await?)
}

/// Opens a connection authenticated with a username/password pair.
pub async fn connect_with_credentials(
    server: &str,
    db_name: &str,
    username: &str,
    password: &str,
) -> Result<PgConnection, DatabaseError> {
    let credentials = Credentials::Password {
        username: username.to_string(),
        password: password.to_string(),
    };
    connect(server, db_name, &credentials).await
}

/// Opens a connection authenticated as the current operating-system user.
pub async fn connect_trusted(server: &str, db_name: &str) -> Result<PgConnection, DatabaseError> {
    connect(server, db_name, &Credentials::Trusted).await
}
