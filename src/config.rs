use std::time::Duration;

use crate::{
    errors::Error,
    secret::Secret,
};

/// Environment variable holding the secret used to sign PIN-change tokens.
pub const SECRET_VAR: &str = "PIN_TOKEN_SECRET";

/// Environment variable overriding the maximum age of a PIN-change token, in
/// whole seconds.
pub const MAX_AGE_VAR: &str = "PIN_TOKEN_MAX_AGE_SECS";

/// The default maximum age of a PIN-change token: 1 day.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 3600);

/// The number of random bytes in a secret produced by `generate_secret`.
pub const GENERATED_SECRET_BYTES: usize = 32;

/// Configuration for signing and verifying PIN-change tokens. This should be
/// constructed once when the application starts, and passed to
/// `PinTokens::new`.
#[derive(Debug)]
pub struct TokenConfig {
    pub(crate) secret: Secret,
    pub(crate) max_age: Duration,
}

impl TokenConfig {
    /// Creates a configuration with the given secret and maximum token age.
    ///
    /// Returns `Error::MissingSecret` if the secret is empty.
    pub fn new(secret: Secret, max_age: Duration) -> Result<Self, Error> {
        if secret.is_empty() {
            return Err(Error::MissingSecret);
        }
        Ok(Self {secret, max_age})
    }

    /// Creates a configuration with the given secret, and the default maximum
    /// token age of 1 day.
    pub fn with_secret(secret: Secret) -> Result<Self, Error> {
        Self::new(secret, DEFAULT_MAX_AGE)
    }

    /// Reads the configuration from the `PIN_TOKEN_SECRET` and
    /// `PIN_TOKEN_MAX_AGE_SECS` environment variables. With the `dotenv`
    /// feature enabled, a `.env` file is loaded first, if there is one.
    ///
    /// A missing secret is an error; the maximum age is optional.
    pub fn from_env() -> Result<Self, Error> {
        #[cfg(feature = "dotenv")]
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let Some(secret) = lookup(SECRET_VAR) else {
            log::debug!("{SECRET_VAR} is not set");
            return Err(Error::MissingSecret);
        };

        let max_age = match lookup(MAX_AGE_VAR) {
            Some(value) => {
                let secs = value.trim()
                    .parse::<u64>()
                    .map_err(|_| Error::InvalidMaxAge {value})?;
                Duration::from_secs(secs)
            },
            None => DEFAULT_MAX_AGE,
        };

        Self::new(Secret(secret), max_age)
    }

    /// The maximum age of a token, used when verifying without an explicit
    /// override.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}

/// Randomly generates a new signing secret, URL-safe base64-encoded. This is
/// suitable as a value for `PIN_TOKEN_SECRET`.
pub fn generate_secret() -> Secret {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::{thread_rng, Rng};

    let mut bytes = [0u8; GENERATED_SECRET_BYTES];
    thread_rng().fill(&mut bytes as &mut [u8]);
    let secret = Secret(URL_SAFE_NO_PAD.encode(bytes));
    zeroize::Zeroize::zeroize(&mut bytes);
    secret
}
