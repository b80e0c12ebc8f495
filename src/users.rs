pub trait UserID<T> {
    /// Gets the user's id field.
    fn id(&self) -> T;
}

/// The parts of a user's locker credentials which are needed to propagate a
/// PIN change to their locker. The PIN itself is not included; it is only
/// ever written, through `AppDb::update_pin`.
#[derive(Debug, Clone)]
pub struct PinCredential {
    /// The serial number of the user's RFID card, if they have one.
    pub rfid_serial_number: Option<String>,

    /// The relay pin of the user's assigned locker, or `None` if no locker is
    /// assigned. `AppConfig::default_relay_pin()` is used in that case.
    pub relay_pin: Option<u8>,

    /// Whether the credential is enabled on the locker device.
    pub is_active: bool,
}
