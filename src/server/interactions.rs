//! Interaction payloads
//!
//! Wire types for the platform's HTTP interactions, their ed25519 request
//! signatures, and conversion into an [`Invocation`].

use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::commands::{Invocation, OptionValue, Reply, UserRef};
use crate::notify::FollowupTarget;
use crate::types::{CofferError, Result};

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Interaction types
pub const PING: u8 = 1;
pub const APPLICATION_COMMAND: u8 = 2;

/// Response types
const PONG: u8 = 1;
const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;

/// Command option types
const OPTION_SUB_COMMAND: u8 = 1;
const OPTION_STRING: u8 = 3;
const OPTION_INTEGER: u8 = 4;
const OPTION_BOOLEAN: u8 = 5;
const OPTION_USER: u8 = 6;

#[derive(Debug, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub member: Option<Member>,
    /// Present instead of `member` outside servers
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<CommandData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Deserialize)]
pub struct Member {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub resolved: Resolved,
}

#[derive(Debug, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Resolved {
    #[serde(default)]
    pub users: HashMap<String, User>,
}

impl Interaction {
    /// Convert an application command into an invocation
    pub fn into_invocation(self) -> Result<Invocation> {
        if self.kind != APPLICATION_COMMAND {
            return Err(CofferError::BadRequest(format!(
                "Interaction type {} is not a command",
                self.kind
            )));
        }

        let data = self
            .data
            .ok_or_else(|| CofferError::BadRequest("Command interaction without data".into()))?;
        let guild_id = self
            .guild_id
            .ok_or_else(|| CofferError::BadRequest("Commands must be used in a server".into()))?;
        let caller = self
            .member
            .map(|m| m.user)
            .or(self.user)
            .ok_or_else(|| CofferError::BadRequest("Interaction without a user".into()))?;

        let mut invocation = Invocation::new(data.name, caller.id, caller.username, guild_id);

        // One level of subcommand nesting
        let mut options = data.options;
        if let Some(pos) = options.iter().position(|o| o.kind == OPTION_SUB_COMMAND) {
            let sub = options.swap_remove(pos);
            invocation.subcommand = Some(sub.name);
            options = sub.options;
        }

        for option in options {
            if let Some(value) = option_value(&option, &data.resolved) {
                invocation.options.insert(option.name, value);
            }
        }

        if let (Some(application_id), Some(token)) = (self.application_id, self.token) {
            invocation.followup = Some(FollowupTarget {
                application_id,
                token,
            });
        }

        Ok(invocation)
    }
}

fn option_value(option: &CommandOption, resolved: &Resolved) -> Option<OptionValue> {
    let value = option.value.as_ref()?;
    match option.kind {
        OPTION_STRING => value.as_str().map(|s| OptionValue::String(s.to_string())),
        OPTION_INTEGER => value.as_i64().map(OptionValue::Integer),
        OPTION_BOOLEAN => value.as_bool().map(OptionValue::Boolean),
        OPTION_USER => {
            let id = value.as_str()?;
            let username = resolved
                .users
                .get(id)
                .map(|u| u.username.clone())
                .unwrap_or_else(|| id.to_string());
            Some(OptionValue::User(UserRef {
                id: id.to_string(),
                username,
            }))
        }
        _ => None,
    }
}

/// Parse the hex-encoded application public key
pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey> {
    let bytes = hex::decode(hex_key.trim())
        .map_err(|e| CofferError::Config(format!("PUBLIC_KEY is not hex: {}", e)))?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
        CofferError::Config(format!("PUBLIC_KEY must be {} bytes", PUBLIC_KEY_LENGTH))
    })?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|e| CofferError::Config(format!("PUBLIC_KEY is not a valid ed25519 key: {}", e)))
}

/// Check the request signature over `timestamp || body`
pub fn verify_signature(
    key: &VerifyingKey,
    signature_hex: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<()> {
    let bytes = hex::decode(signature_hex)
        .map_err(|_| CofferError::Unauthorized("signature is not hex".into()))?;
    let bytes: [u8; SIGNATURE_LENGTH] = bytes
        .try_into()
        .map_err(|_| CofferError::Unauthorized("signature has the wrong length".into()))?;
    let signature = Signature::from_bytes(&bytes);

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify(&message, &signature)
        .map_err(|_| CofferError::Unauthorized("invalid request signature".into()))
}

pub fn pong() -> Value {
    json!({ "type": PONG })
}

pub fn message_response(reply: &Reply) -> Value {
    json!({
        "type": CHANNEL_MESSAGE_WITH_SOURCE,
        "data": reply.to_message_data(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn command_json() -> Value {
        json!({
            "type": 2,
            "application_id": "app1",
            "token": "tok",
            "guild_id": "g1",
            "member": { "user": { "id": "u1", "username": "alice" } },
            "data": {
                "name": "inventory",
                "options": [
                    { "name": "user", "type": 6, "value": "u2" },
                    { "name": "page", "type": 4, "value": 2 }
                ],
                "resolved": { "users": { "u2": { "id": "u2", "username": "bob" } } }
            }
        })
    }

    #[test]
    fn test_command_becomes_invocation() {
        let interaction: Interaction = serde_json::from_value(command_json()).unwrap();
        let inv = interaction.into_invocation().unwrap();
        assert_eq!(inv.command, "inventory");
        assert_eq!(inv.guild_id, "g1");
        assert_eq!(inv.username, "alice");
        assert_eq!(inv.page(), 2);
        assert_eq!(inv.target().username, "bob");
        assert_eq!(inv.followup.unwrap().token, "tok");
    }

    #[test]
    fn test_subcommand_options_flattened() {
        let interaction: Interaction = serde_json::from_value(json!({
            "type": 2,
            "guild_id": "g1",
            "member": { "user": { "id": "owner", "username": "owner" } },
            "data": {
                "name": "manage-announcements",
                "options": [{
                    "name": "disable",
                    "type": 1,
                    "options": [{ "name": "id", "type": 3, "value": "abcd1234" }]
                }]
            }
        }))
        .unwrap();
        let inv = interaction.into_invocation().unwrap();
        assert_eq!(inv.subcommand.as_deref(), Some("disable"));
        assert_eq!(inv.string("id"), Some("abcd1234"));
        assert!(inv.followup.is_none());
    }

    #[test]
    fn test_direct_message_rejected() {
        let mut raw = command_json();
        raw.as_object_mut().unwrap().remove("guild_id");
        let interaction: Interaction = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            interaction.into_invocation(),
            Err(CofferError::BadRequest(_))
        ));
    }

    #[test]
    fn test_signature_verification() {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let key = parse_public_key(&hex::encode(signing.verifying_key().to_bytes())).unwrap();

        let body = br#"{"type":1}"#;
        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = hex::encode(signing.sign(&message).to_bytes());

        assert!(verify_signature(&key, &signature, timestamp, body).is_ok());
        assert!(verify_signature(&key, &signature, "1700000001", body).is_err());
        assert!(verify_signature(&key, "zz", timestamp, body).is_err());
    }

    #[test]
    fn test_bad_public_key() {
        assert!(matches!(parse_public_key("abcd"), Err(CofferError::Config(_))));
        assert!(matches!(parse_public_key("not hex"), Err(CofferError::Config(_))));
    }
}
