//! An in-memory `App` for testing the PIN-change flow.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::{
    app::{App, AppAudit, AppConfig, AppDb, AppMailer, AppPublisher, AppTypes},
    config::TokenConfig,
    errors::Error,
    mail::Notification,
    pins::CredentialUpdate,
    secret::Secret,
    tokens::PinTokens,
    users::{PinCredential, UserID},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TestUser {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    UpdatePin {user_id: i64, pin: String},
    Publish {user_id: i64, pin: String, rfid: Option<String>, relay_pin: u8, is_active: bool},
    History {user_id: i64, action: String},
    PinChanged {user_id: i64},
    AccountActivated {user_id: i64, current_pin: String, token: String},
    PinChangeLink {user_id: i64, token: String},
}

#[derive(Debug)]
pub(crate) enum TestError {
    Pin(Error),
    Mail,
    Publish,
}

#[derive(Default)]
struct TestState {
    users: HashMap<i64, TestUser>,
    credentials: HashMap<i64, PinCredential>,
    pins: HashMap<i64, String>,
    events: Vec<Event>,
    fail_mail: bool,
    fail_publish: bool,
}

#[derive(Clone)]
pub(crate) struct TestApp {
    pub now: SystemTime,
    tokens: Arc<PinTokens>,
    state: Arc<Mutex<TestState>>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = TokenConfig::with_secret(Secret::from("test secret".to_string())).unwrap();

        Self {
            now: UNIX_EPOCH + Duration::from_secs(1_700_000_000),
            tokens: Arc::new(PinTokens::new(&config)),
            state: Arc::default(),
        }
    }

    /// A copy of this app whose clock reads `secs` seconds later.
    pub fn later(&self, secs: u64) -> Self {
        Self {
            now: self.now + Duration::from_secs(secs),
            ..self.clone()
        }
    }

    fn state(&self) -> MutexGuard<'_, TestState> {
        self.state.lock().unwrap()
    }

    /// Adds a user with PIN `0000` and an active credential. The relay pin is
    /// `None` if no locker is assigned.
    pub fn add_user(&self, id: i64, relay_pin: Option<u8>) -> TestUser {
        let user = self.add_user_without_credentials(id);

        let mut state = self.state();
        state.credentials.insert(id, PinCredential {
            rfid_serial_number: Some(format!("RFID-{id}")),
            relay_pin,
            is_active: true,
        });
        state.pins.insert(id, "0000".to_string());

        user
    }

    pub fn add_user_without_credentials(&self, id: i64) -> TestUser {
        let user = TestUser {id};
        self.state().users.insert(id, user.clone());
        user
    }

    pub fn remove_user(&self, id: i64) {
        self.state().users.remove(&id);
    }

    pub fn pin_of(&self, id: i64) -> Option<String> {
        self.state().pins.get(&id).cloned()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn fail_mail(&self) {
        self.state().fail_mail = true;
    }

    pub fn fail_publish(&self) {
        self.state().fail_publish = true;
    }

    fn record(&self, event: Event) {
        self.state().events.push(event);
    }
}

impl UserID<i64> for TestUser {
    fn id(&self) -> i64 {
        self.id
    }
}

impl From<Error> for TestError {
    fn from(e: Error) -> Self {
        Self::Pin(e)
    }
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pin(e) => write!(f, "{e}"),
            Self::Mail => f.write_str("mail delivery failed"),
            Self::Publish => f.write_str("publish failed"),
        }
    }
}

impl actix_web::ResponseError for TestError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            Self::Pin(e) => e.status_code(),
            Self::Mail | Self::Publish => actix_web::http::StatusCode::BAD_GATEWAY,
        }
    }
}

impl App for TestApp {
    fn time_now(&self) -> SystemTime {
        self.now
    }
}

impl AppTypes for TestApp {
    type ID = i64;
    type User = TestUser;
    type Error = TestError;
}

impl AppConfig for TestApp {
    fn pin_tokens(&self) -> &PinTokens {
        &self.tokens
    }
}

impl AppDb for TestApp {
    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<TestUser>, TestError> {
        Ok(self.state().users.get(&user_id).cloned())
    }

    async fn get_pin_credential(&self, user: &TestUser) -> Result<Option<PinCredential>, TestError> {
        Ok(self.state().credentials.get(&user.id).cloned())
    }

    async fn update_pin(&self, user: &TestUser, new_pin: &Secret) -> Result<(), TestError> {
        self.state().pins.insert(user.id, new_pin.expose().to_string());
        self.record(Event::UpdatePin {user_id: user.id, pin: new_pin.expose().to_string()});
        Ok(())
    }
}

impl AppMailer for TestApp {
    async fn send_notification(&self, user: &TestUser, notification: Notification) -> Result<(), TestError> {
        if self.state().fail_mail {
            return Err(TestError::Mail);
        }

        let event = match notification {
            Notification::PinChanged => Event::PinChanged {user_id: user.id},
            Notification::AccountActivated {current_pin, pin_change_token} => Event::AccountActivated {
                user_id: user.id,
                current_pin: current_pin.expose().to_string(),
                token: pin_change_token.expose().to_string(),
            },
        };
        self.record(event);
        Ok(())
    }

    async fn send_pin_change_link(&self, user: &TestUser, token: Secret) -> Result<(), TestError> {
        if self.state().fail_mail {
            return Err(TestError::Mail);
        }

        self.record(Event::PinChangeLink {user_id: user.id, token: token.expose().to_string()});
        Ok(())
    }
}

impl AppPublisher for TestApp {
    async fn publish_credential_update(&self, update: &CredentialUpdate<'_>) -> Result<(), TestError> {
        if self.state().fail_publish {
            return Err(TestError::Publish);
        }

        self.record(Event::Publish {
            user_id: update.user_id,
            pin: update.pin.expose().to_string(),
            rfid: update.rfid_serial_number.map(str::to_string),
            relay_pin: update.relay_pin,
            is_active: update.is_active,
        });
        Ok(())
    }
}

impl AppAudit for TestApp {
    async fn log_history(&self, user: &TestUser, action: &str) -> Result<(), TestError> {
        self.record(Event::History {user_id: user.id, action: action.to_string()});
        Ok(())
    }
}
