//! Platform-neutral reply payloads
//!
//! These mirror what a chat platform can show: a message with optional
//! embed and buttons, a modal form, an in-place update of an existing
//! message, or a bare acknowledgement.

use serde::Serialize;

/// Accent color used for every embed
pub const COLOR_BLUE: u32 = 0x3498db;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
            description: None,
            color: COLOR_BLUE,
            fields: Vec::new(),
            footer: None,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub disabled: bool,
}

/// Message sent to, or replacing one in, the channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed: Option<Embed>,
    /// Visible only to the invoking user
    pub ephemeral: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

impl Reply {
    /// Public text reply
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Text reply visible only to the invoker
    pub fn private(content: impl Into<String>) -> Self {
        Self {
            ephemeral: true,
            ..Self::text(content)
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embed: Some(embed),
            ..Self::default()
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputStyle {
    Short,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalInput {
    pub custom_id: String,
    pub label: String,
    pub placeholder: String,
    pub style: InputStyle,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Structured input form shown to the invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalForm {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<ModalInput>,
}

/// What the platform should do with an interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Send a new message
    Message(Reply),
    /// Open a form
    Modal(ModalForm),
    /// Edit the message hosting the pressed control
    Update(Reply),
    /// Acknowledge without changing anything
    Acknowledge,
}

impl Response {
    /// The reply carried by this response, if any
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Response::Message(reply) | Response::Update(reply) => Some(reply),
            Response::Modal(_) | Response::Acknowledge => None,
        }
    }
}
