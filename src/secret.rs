use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret string (a signing secret, PIN-change token, or PIN). Use
/// `Secret::from` to convert a `String` to a `Secret`, and `secret.expose()`
/// to access the string value where necessary.
///
/// Secrets are redacted in `std::fmt::Debug` displays, and are automatically
/// zeroed-out in memory when the value is dropped.
pub struct Secret(pub(crate) String);

impl Secret {
    /// Make use of this secret as a `&str`. This may be needed when embedding
    /// a token in an email link, or storing a PIN in the database.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl ZeroizeOnDrop for Secret {}

impl From<String> for Secret {
    fn from(string: String) -> Self {
        Self(string)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[SECRET]")
    }
}

impl<'de> serde::Deserialize<'de> for Secret {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)
            .map(Self::from)
    }
}
