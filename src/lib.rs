mod app;
mod config;
mod errors;
pub mod mail;
mod pins;
mod secret;
mod tokens;
mod users;

#[cfg(test)]
mod test_app;

pub use app::{
    App,
    AppAudit,
    AppConfig,
    AppDb,
    AppMailer,
    AppPublisher,
    AppTypes,
};
pub use config::{
    DEFAULT_MAX_AGE,
    MAX_AGE_VAR,
    SECRET_VAR,
    TokenConfig,
    generate_secret,
};
pub use errors::{
    Error,
    TokenError,
};
pub use pins::{
    ChangePinRequest,
    CredentialUpdate,
    PIN_CHANGED_BY_TOKEN,
    change_pin_with_token,
};
pub use secret::Secret;
pub use tokens::{
    PinTokens,
    SALT,
};
pub use users::{
    PinCredential,
    UserID,
};

/// Locker PINs are 4 digits long unless the application configures otherwise.
pub const DEFAULT_PIN_LENGTH: usize = 4;

/// The relay pin published for users who have no locker assigned.
pub const DEFAULT_RELAY_PIN: u8 = 15;
