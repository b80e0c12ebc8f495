use crate::{
    app::App,
    secret::Secret,
    users::UserID,
};

/// A type of notification which can be sent to a user by email.
#[derive(Debug)]
pub enum Notification {
    /// The user's account has been activated. The email should show their
    /// current PIN, and a link to change it which includes the token.
    AccountActivated {current_pin: Secret, pin_change_token: Secret},

    /// The user's PIN has been changed; they must be notified in case they
    /// did not change it themselves.
    PinChanged,
}

/// Issues a PIN-change token for the user, and emails it to them as a link.
/// The user does not need to be logged in to follow the link.
pub async fn issue_pin_change_link<A: App>(
    app: &A,
    user: &A::User,
) -> Result<(), A::Error> {
    let token = app.pin_tokens()
        .issue(user.id(), app.time_now());

    log::debug!("Issuing PIN-change link for user #{}", user.id());

    app.send_pin_change_link(user, token)
        .await
}

/// Notifies the user that their account has been activated. The email
/// includes their current PIN, and a PIN-change token so that they can choose
/// a new one.
pub async fn notify_account_activated<A: App>(
    app: &A,
    user: &A::User,
    current_pin: Secret,
) -> Result<(), A::Error> {
    let pin_change_token = app.pin_tokens()
        .issue(user.id(), app.time_now());

    log::info!("Sending account activation email to user #{}", user.id());

    let notification = Notification::AccountActivated {current_pin, pin_change_token};
    app.send_notification(user, notification)
        .await
}
