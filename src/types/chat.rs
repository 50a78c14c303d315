use std::fmt;
use std::str::FromStr;

/// Known chat-id servers on WhatsApp Web.
pub const USER_SERVER: &str = "c.us";
pub const GROUP_SERVER: &str = "g.us";

/// ChatId addresses a conversation on the automation transport
/// (user@server, e.g. `919999999999@c.us`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatId {
    pub user: String,
    pub server: String,
}

impl ChatId {
    /// New chat id (user@server).
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
        }
    }

    /// Chat id for a phone number on the default user server.
    pub fn from_phone(phone: impl Into<String>) -> Self {
        Self::new(phone, USER_SERVER)
    }

    /// Chat id for a group.
    pub fn group(id: impl Into<String>) -> Self {
        Self::new(id, GROUP_SERVER)
    }

    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_empty()
    }
}

impl FromStr for ChatId {
    type Err = ChatIdParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('@').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(ChatIdParseError);
        }
        Ok(Self::new(parts[0], parts[1]))
    }
}

#[derive(Debug)]
pub struct ChatIdParseError;

impl fmt::Display for ChatIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid chat id format")
    }
}

impl std::error::Error for ChatIdParseError {}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}

impl serde::Serialize for ChatId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ChatId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChatId::from_str(&s).map_err(serde::de::Error::custom)
    }
}
