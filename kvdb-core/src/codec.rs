//! # Command Codec
//!
//! MessagePack encoding of [`Command`] envelopes. Fields are written by name
//! (a map keyed by `"op"`, `"key"`, `"value"`), so readers tolerate fields
//! added by newer writers.

use crate::{Command, KvError, Result};
use bytes::Bytes;

/// Media type clients use when posting encoded commands.
pub const MSGPACK_CONTENT_TYPE: &str = "application/msgpack";

/// Largest encoded command accepted from clients.
///
/// Leaves room for the protobuf envelope inside the default 4 MiB gRPC
/// message limit, so anything accepted here fits in one `Propose` call.
pub const MAX_COMMAND_BYTES: usize = 4 * 1024 * 1024 - 1024;

/// Stateless encoder/decoder for [`Command`] envelopes.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandCodec;

impl CommandCodec {
    pub fn new() -> Self {
        Self
    }

    /// Encode a command as a MessagePack map.
    pub fn encode(&self, command: &Command) -> Result<Bytes> {
        rmp_serde::to_vec_named(command)
            .map(Bytes::from)
            .map_err(|e| KvError::encode(format!("MessagePack encoding failed: {}", e)))
    }

    /// Decode a command.
    ///
    /// Fails on truncated input, type mismatches and missing `op`/`key`
    /// fields. Unknown extra fields are ignored.
    pub fn decode(&self, bytes: &[u8]) -> Result<Command> {
        rmp_serde::from_slice(bytes)
            .map_err(|e| KvError::decode(format!("MessagePack decoding failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operation;
    use proptest::prelude::*;
    use serde::Serialize;

    // {"op": "SET", "key": "k", "value": "v"} as packed by msgpack-python
    const PYTHON_SET: &[u8] = &[
        0x83, 0xa2, b'o', b'p', 0xa3, b'S', b'E', b'T', 0xa3, b'k', b'e', b'y', 0xa1, b'k', 0xa5,
        b'v', b'a', b'l', b'u', b'e', 0xa1, b'v',
    ];

    #[derive(Serialize)]
    struct ExtendedCommand {
        op: String,
        key: String,
        value: String,
        ttl_seconds: u64,
    }

    #[derive(Serialize)]
    struct MistypedCommand {
        op: String,
        key: u32,
    }

    #[derive(Serialize)]
    struct KeylessCommand {
        op: String,
        value: String,
    }

    #[test]
    fn test_decode_external_client_payload() {
        let command = CommandCodec.decode(PYTHON_SET).unwrap();
        assert_eq!(command, Command::set("k", "v"));
        assert_eq!(CommandCodec.encode(&command).unwrap().as_ref(), PYTHON_SET);
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let bytes = rmp_serde::to_vec_named(&ExtendedCommand {
            op: "SET".into(),
            key: "user_1".into(),
            value: "alice".into(),
            ttl_seconds: 30,
        })
        .unwrap();

        let command = CommandCodec.decode(&bytes).unwrap();
        assert_eq!(command, Command::set("user_1", "alice"));
    }

    #[test]
    fn test_decode_keeps_unknown_operation() {
        let bytes = CommandCodec
            .encode(&Command::new(Operation::parse("BUMP"), "x", ""))
            .unwrap();
        let command = CommandCodec.decode(&bytes).unwrap();
        assert_eq!(command.operation, Operation::Unknown("BUMP".to_string()));
    }

    #[test]
    fn test_decode_without_value_field() {
        #[derive(Serialize)]
        struct Bare {
            op: String,
            key: String,
        }
        let bytes = rmp_serde::to_vec_named(&Bare {
            op: "DELETE".into(),
            key: "gone".into(),
        })
        .unwrap();
        assert_eq!(CommandCodec.decode(&bytes).unwrap(), Command::delete("gone"));
    }

    #[test]
    fn test_decode_failures() {
        let truncated = &PYTHON_SET[..PYTHON_SET.len() - 1];
        assert!(matches!(
            CommandCodec.decode(truncated),
            Err(KvError::Decode { .. })
        ));

        let mistyped = rmp_serde::to_vec_named(&MistypedCommand {
            op: "SET".into(),
            key: 7,
        })
        .unwrap();
        assert!(matches!(
            CommandCodec.decode(&mistyped),
            Err(KvError::Decode { .. })
        ));

        let keyless = rmp_serde::to_vec_named(&KeylessCommand {
            op: "SET".into(),
            value: "v".into(),
        })
        .unwrap();
        assert!(CommandCodec.decode(&keyless).is_err());

        assert!(CommandCodec.decode(b"").is_err());
        assert!(CommandCodec.decode(b"SET key value").is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            op in prop_oneof![Just("SET"), Just("DELETE")],
            key in "[a-zA-Z0-9_:.-]{1,32}",
            value in ".{0,64}",
        ) {
            let command = Command::new(Operation::parse(op), key, value);
            let bytes = CommandCodec.encode(&command).unwrap();
            prop_assert_eq!(CommandCodec.decode(&bytes).unwrap(), command);
        }
    }
}
