use {
    serde::{Serialize, Serializer, ser::SerializeMap},
    textrelay_config::MessageTypeField,
};

pub const CHANNEL_SMS: &str = "sms";
pub const MESSAGE_TYPE_TEXT: &str = "text";

/// Body of one outbound send. Built per submission and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    from: String,
    to: String,
    text: String,
    message_type_field: MessageTypeField,
}

impl SendRequest {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        message_type_field: MessageTypeField,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            message_type_field,
        }
    }

    pub fn sender(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

// The message type key differs between relay contract versions, so the body
// is written field by field instead of derived.
impl Serialize for SendRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("from", &self.from)?;
        map.serialize_entry("to", &self.to)?;
        map.serialize_entry("text", &self.text)?;
        map.serialize_entry("channel", CHANNEL_SMS)?;
        map.serialize_entry(self.message_type_field.key(), MESSAGE_TYPE_TEXT)?;
        map.end()
    }
}
