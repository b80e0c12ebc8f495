use std::time::SystemTime;

use crate::{
    errors::Error,
    mail::Notification,
    pins::CredentialUpdate,
    secret::Secret,
    tokens::PinTokens,
    users::{PinCredential, UserID},
    DEFAULT_PIN_LENGTH,
    DEFAULT_RELAY_PIN,
};

pub trait App: AppConfig + AppDb + AppMailer + AppPublisher + AppAudit + AppTypes + Clone + 'static {
    /// Returns the current time. Tokens are issued and verified relative to
    /// this.
    ///
    /// Default is the system clock.
    fn time_now(&self) -> SystemTime {
        SystemTime::now()
    }
}

pub trait AppTypes: Sized {
    /// The type of a numeric ID in the database; usually `i64`, `i32`, etc.
    type ID: Into<i64> + TryFrom<i64> + Eq + Copy + std::fmt::Display;

    /// The type of a user in the application.
    type User: UserID<Self::ID> + Clone;

    /// A type representing an application error. This must support conversion
    /// from `pinlink::Error`.
    type Error: From<Error> + actix_web::ResponseError;
}

/// This trait defines functions which provide configuration parameters to the
/// PIN-change flow.
pub trait AppConfig {
    /// Returns the token service, constructed once at startup from a
    /// `TokenConfig`.
    fn pin_tokens(&self) -> &PinTokens;

    /// Returns the number of digits in a PIN.
    ///
    /// Default is 4.
    fn pin_length(&self) -> usize {
        DEFAULT_PIN_LENGTH
    }

    /// Returns the relay pin to publish for users who have no locker
    /// assigned.
    ///
    /// Default is 15.
    fn default_relay_pin(&self) -> u8 {
        DEFAULT_RELAY_PIN
    }
}

/// This trait defines functions which will be used to look up users and
/// their credentials, and to store new PINs.
#[trait_variant::make(Send)]
pub trait AppDb: AppTypes {
    /// Gets a user by their id.
    ///
    /// Returns `None` if there is no user with that id.
    async fn get_user_by_id(
        &self,
        user_id: Self::ID,
    ) -> Result<Option<Self::User>, Self::Error>;

    /// Gets the locker credentials for a user.
    ///
    /// Returns `None` if the user has no credentials record.
    async fn get_pin_credential(
        &self,
        user: &Self::User,
    ) -> Result<Option<PinCredential>, Self::Error>;

    /// Updates a user's stored PIN. This must be durable when it returns
    /// `Ok`, since the new PIN is published to the locker afterwards.
    async fn update_pin(
        &self,
        user: &Self::User,
        new_pin: &Secret,
    ) -> Result<(), Self::Error>;
}

/// This trait defines functions which will be used to send email
/// notifications and PIN-change links to users.
#[trait_variant::make(Send)]
pub trait AppMailer: AppTypes {
    /// Sends an email notification to the given user.
    async fn send_notification(
        &self,
        user: &Self::User,
        notification: Notification,
    ) -> Result<(), Self::Error>;

    /// Sends an email message to the given user, with a link to change their
    /// PIN. The link must lead to a route which invokes
    /// `change_pin_with_token` with this token.
    async fn send_pin_change_link(
        &self,
        user: &Self::User,
        token: Secret,
    ) -> Result<(), Self::Error>;
}

/// This trait defines how a changed credential is propagated to the locker
/// devices, e.g. over a message broker.
#[trait_variant::make(Send)]
pub trait AppPublisher: AppTypes {
    async fn publish_credential_update(
        &self,
        update: &CredentialUpdate<'_>,
    ) -> Result<(), Self::Error>;
}

/// This trait defines how user actions are recorded in the application's
/// history log.
#[trait_variant::make(Send)]
pub trait AppAudit: AppTypes {
    async fn log_history(
        &self,
        user: &Self::User,
        action: &str,
    ) -> Result<(), Self::Error>;
}
