use std::borrow::Cow;

use actix_web::http::StatusCode;

/// The ways in which a presented PIN-change token can fail verification.
/// Each kind calls for a different message to the user, so callers should
/// not collapse them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not structurally a token: wrong number of segments, an
    /// empty segment, or characters outside the URL-safe base64 alphabet.
    MalformedToken,

    /// The token is well-formed, but its signature does not match the one
    /// computed from its contents. Either the token was altered, or it was
    /// signed with a different secret.
    BadSignature,

    /// The token's signature is valid, but it is older than the permitted
    /// maximum age (or dated in the future).
    SignatureExpired,
}

#[derive(Debug)]
pub enum Error {
    /// A PIN-change token failed verification.
    Token(TokenError),

    /// Configuration error: no signing secret was provided, or it was empty.
    /// There is deliberately no fallback secret.
    MissingSecret,

    /// Configuration error: the maximum token age could not be parsed as a
    /// whole number of seconds.
    InvalidMaxAge {value: String},

    /// The request did not include both a token and a new PIN.
    MissingTokenOrPin,

    /// The new PIN is not exactly `AppConfig::pin_length()` ASCII digits.
    InvalidPin {length: usize},

    /// The token is valid, but the user it names no longer exists.
    NoSuchUser,

    /// The user exists, but has no PIN credential record to update.
    NoCredentials,

    /// Internal error which occurs when serializing a credential update.
    Serde(serde_json::Error),
}

impl TokenError {
    /// A message which can be shown to the user. Expired and tampered links
    /// are described differently, since only an expired link can be fixed by
    /// requesting a new one.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MalformedToken => "Invalid link.",
            Self::BadSignature => "Invalid or tampered link.",
            Self::SignatureExpired => "This link has expired. Please contact your administrator.",
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Token(_)
            | Self::MissingTokenOrPin
            | Self::InvalidPin {..} => StatusCode::BAD_REQUEST,

            Self::NoSuchUser
            | Self::NoCredentials => StatusCode::NOT_FOUND,

            Self::MissingSecret
            | Self::InvalidMaxAge {..}
            | Self::Serde(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A message which can be shown to the user. Internal errors get a
    /// generic message, so that configuration details are not leaked.
    pub fn user_message(&self) -> Cow<'static, str> {
        match self {
            Self::Token(e) => e.user_message().into(),
            Self::MissingTokenOrPin => "Missing token or new PIN.".into(),
            Self::InvalidPin {length} => format!("PIN must be exactly {length} digits.").into(),
            Self::NoSuchUser => "User not found.".into(),
            Self::NoCredentials => "User credentials not found.".into(),
            Self::MissingSecret
            | Self::InvalidMaxAge {..}
            | Self::Serde(_) => "An internal error occurred.".into(),
        }
    }

    pub(crate) fn as_app_err<T, E: From<Self>>(self) -> Result<T, E> {
        Err(E::from(self))
    }
}

impl From<TokenError> for Error {
    fn from(e: TokenError) -> Self {
        Self::Token(e)
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MalformedToken => "malformed token",
            Self::BadSignature => "bad signature",
            Self::SignatureExpired => "signature expired",
        })
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(e) => write!(f, "invalid PIN-change token: {e}"),
            Self::MissingSecret => f.write_str("no PIN token secret is configured"),
            Self::InvalidMaxAge {value} => write!(f, "invalid PIN token max age: {value:?}"),
            Self::MissingTokenOrPin => f.write_str("missing token or new PIN"),
            Self::InvalidPin {length} => write!(f, "PIN is not exactly {length} digits"),
            Self::NoSuchUser => f.write_str("no such user"),
            Self::NoCredentials => f.write_str("user has no PIN credentials"),
            Self::Serde(e) => write!(f, "serialization error: {e}"),
        }
    }
}

impl std::error::Error for TokenError {}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Token(e) => Some(e),
            Self::Serde(e) => Some(e),
            _ => None,
        }
    }
}
