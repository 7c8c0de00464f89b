//! MessagePack codec helpers.
//!
//! Thin wrappers around `rmp-serde` for encoding and decoding call
//! envelopes. Every payload that crosses the caller boundary, over NATS or
//! in-process, goes through these two functions.

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// Encode a value to MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    rmp_serde::to_vec(value).map_err(NetError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetError> {
    rmp_serde::from_slice(bytes).map_err(NetError::Decode)
}

#[cfg(test)]
mod tests {
    use backend_auth::SessionId;
    use backend_facet::{CallOutcome, CallRequest, CallResponse, FacetFault};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_survives_codec() {
        let request = CallRequest::new(
            "EmailLoginFacet",
            "Login",
            vec![json!("a@b.com"), json!({ "nested": [1, -2, 3.5, null] })],
        )
        .with_session(Some(SessionId::from_raw("s-9")));
        let bytes = encode(&request).unwrap();
        let restored: CallRequest = decode(&bytes).unwrap();
        assert_eq!(request, restored);
    }

    #[test]
    fn test_fault_response_survives_codec() {
        let response = CallResponse {
            outcome: CallOutcome::Fault(FacetFault::authorization("login required")),
            session_id: None,
        };
        let restored: CallResponse = decode(&encode(&response).unwrap()).unwrap();
        assert_eq!(response, restored);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result: Result<CallRequest, _> = decode(&[0xFF, 0xFF]);
        assert!(matches!(result, Err(NetError::Decode(_))));
    }
}
