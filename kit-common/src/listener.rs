//! Notification hooks the host SDK calls on a kit.
//!
//! Every method has a no-op default so a kit only implements what it reacts to.
use std::collections::HashMap;

use crate::identity::IdentityType;

pub trait ApplicationStateListener {
    fn on_application_foreground(&self) {}

    fn on_application_background(&self) {}
}

pub trait AttributeListener {
    fn set_user_attribute(&self, _key: &str, _value: &str) {}

    fn set_user_attribute_list(&self, _key: &str, _values: &[String]) {}

    /// When false the host flattens list attributes before calling `set_user_attribute`.
    fn supports_attribute_lists(&self) -> bool {
        false
    }

    fn set_all_user_attributes(
        &self,
        _attributes: &HashMap<String, String>,
        _attribute_lists: &HashMap<String, Vec<String>>,
    ) {
    }

    fn remove_user_attribute(&self, _key: &str) {}

    fn set_user_identity(&self, _identity_type: IdentityType, _value: &str) {}

    fn remove_user_identity(&self, _identity_type: IdentityType) {}
}

pub trait PushListener {
    /// Whether this kit wants to render the push message itself.
    fn will_handle_push_message(&self, _payload: &HashMap<String, String>) -> bool {
        false
    }

    fn on_push_message_received(&self, _payload: &HashMap<String, String>) {}

    /// Returns true if the kit claims the registration.
    fn on_push_registration(&self, _instance_id: &str, _sender_id: &str) -> bool {
        false
    }
}
