//! Wire encoding. Messages travel as JSON, tagged by kind.

use treelot_protocol::{Message, NodeId};

use crate::NetworkError;

/// An encoded message and the node that sent it.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub from: NodeId,
    pub payload: Vec<u8>,
}

pub fn encode(msg: &Message) -> Result<Vec<u8>, NetworkError> {
    Ok(serde_json::to_vec(msg)?)
}

pub fn decode(bytes: &[u8]) -> Result<Message, NetworkError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use treelot_protocol::{Announce, Reply};

    #[test]
    fn test_encoded_reply_is_tagged_json() {
        let bytes = encode(&Message::Reply(Reply::new(8, NodeId(2)))).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"reply":{"number":8,"owner_id":2}}"#
        );
    }

    #[test]
    fn test_decode_announce() {
        let msg = decode(br#"{"announce":{"message":"hi"}}"#).unwrap();
        assert_eq!(msg, Message::Announce(Announce::new("hi")));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(decode(b"\x00\x01"), Err(NetworkError::Codec(_))));
        assert!(decode(br#"{"reply":{"number":-1,"owner_id":2}}"#).is_err());
    }
}
