use crate::{
    app::App,
    errors::Error,
    mail::Notification,
    secret::Secret,
};

/// The action recorded in the history log when a PIN is changed by a token.
pub const PIN_CHANGED_BY_TOKEN: &str = "PIN changed via activation link";

/// The JSON body of a request to change a PIN using a token. Both fields are
/// optional here, so that a missing field is reported as
/// `Error::MissingTokenOrPin` rather than as a deserialization failure.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ChangePinRequest {
    #[serde(default)]
    pub token: Option<Secret>,

    #[serde(default)]
    pub new_pin: Option<Secret>,
}

/// A changed credential, to be propagated to the locker devices by
/// `AppPublisher::publish_credential_update`.
#[derive(Debug)]
pub struct CredentialUpdate<'a> {
    pub user_id: i64,
    pub pin: &'a Secret,
    pub rfid_serial_number: Option<&'a str>,
    pub relay_pin: u8,
    pub is_active: bool,
}

impl CredentialUpdate<'_> {
    /// Serializes this update as a JSON message for the locker devices. The
    /// message contains the PIN in plain text.
    pub fn to_json(&self) -> Result<String, Error> {
        let message = serde_json::json!({
            "user_id": self.user_id,
            "pin": self.pin.expose(),
            "rfid": self.rfid_serial_number,
            "relay_pin": self.relay_pin,
            "is_active": self.is_active,
        });

        serde_json::to_string(&message)
            .map_err(Error::Serde)
    }
}

/// Changes a user's PIN, authorised by a PIN-change token instead of a login
/// session. The token is verified with the configured maximum age.
///
/// The new PIN is stored before it is published to the locker, recorded in
/// the history log, and notified to the user by email. If any of those
/// later steps fails, the error is returned but the new PIN remains stored.
///
/// Returns the user whose PIN was changed.
pub async fn change_pin_with_token<A: App>(
    app: &A,
    request: ChangePinRequest,
) -> Result<A::User, A::Error> {
    let (Some(token), Some(new_pin)) = (request.token, request.new_pin) else {
        return Error::MissingTokenOrPin.as_app_err();
    };
    if token.is_empty() || new_pin.is_empty() {
        return Error::MissingTokenOrPin.as_app_err();
    }

    check_pin_format(app, &new_pin)?;

    let user_id: A::ID = match app.pin_tokens().verify(token.expose(), app.time_now()) {
        Ok(user_id) => user_id,
        Err(e) => {
            log::info!("Rejected PIN-change token: {e}");
            return Error::Token(e).as_app_err();
        },
    };

    let Some(user) = app.get_user_by_id(user_id)
        .await?
    else {
        log::info!("PIN-change token names user #{user_id}, who does not exist");
        return Error::NoSuchUser.as_app_err();
    };

    let Some(credential) = app.get_pin_credential(&user)
        .await?
    else {
        log::info!("User #{user_id} has no PIN credentials");
        return Error::NoCredentials.as_app_err();
    };

    app.update_pin(&user, &new_pin)
        .await?;

    log::info!("Changed PIN for user #{user_id} using a PIN-change token");

    let update = CredentialUpdate {
        user_id: user_id.into(),
        pin: &new_pin,
        rfid_serial_number: credential.rfid_serial_number.as_deref(),
        relay_pin: credential.relay_pin
            .unwrap_or_else(|| app.default_relay_pin()),
        is_active: credential.is_active,
    };
    app.publish_credential_update(&update)
        .await?;

    app.log_history(&user, PIN_CHANGED_BY_TOKEN)
        .await?;

    // Notify the user that their PIN has been changed, in case they didn't
    // change it themselves.
    app.send_notification(&user, Notification::PinChanged)
        .await?;

    Ok(user)
}

/// Checks that a PIN consists of exactly `AppConfig::pin_length()` ASCII
/// digits.
fn check_pin_format<A: App>(app: &A, pin: &Secret) -> Result<(), Error> {
    let length = app.pin_length();
    let pin = pin.expose();

    if pin.len() != length || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidPin {length});
    }
    Ok(())
}
