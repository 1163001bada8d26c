//! Wire formats for the Alipay open API.
//!
//! This crate knows how requests and responses look on the wire, and nothing
//! about keys:
//!
//! - [`canonicalize`]: the exact string a request signature covers
//! - [`RequestEnvelope`]: the flat, non-empty parameter set sent to the gateway
//! - [`unwrap_response`]: locating the `*_response` body and surfacing
//!   gateway errors as [`BusinessError`]
//!
//! # Example
//!
//! ```
//! use alipay_wire::{canonicalize, unwrap_response, WireError};
//!
//! assert_eq!(canonicalize([("a", Some("")), ("b", Some("x"))]), "b=x");
//!
//! let err = unwrap_response(r#"{"code":"40004","msg":"Business Failed"}"#).unwrap_err();
//! assert!(matches!(err, WireError::Business(e) if e.code == "40004"));
//! ```

mod canonical;
mod envelope;
mod error;
mod response;

pub use canonical::{canonicalize, canonicalize_excluding};
pub use envelope::{fields, RequestEnvelope, TIMESTAMP_FORMAT};
pub use error::{WireError, WireResult};
pub use response::{
    response_key, unwrap_response, BusinessError, UnwrappedResponse, ERROR_RESPONSE_KEY,
    RESPONSE_SUFFIX, SUCCESS_CODE,
};
