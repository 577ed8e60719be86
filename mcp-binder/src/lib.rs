//! Binding of untyped tool call arguments into typed request values.
//!
//! Incoming calls carry their parameters as a JSON object. The object is turned
//! into an [`ArgumentBag`] of [`ArgValue`]s, and a request struct is filled by
//! running a list of extractors over the bag with [`bind`]:
//!
//! ```
//! use mcp_binder::{ArgumentBag, bind, optional_ptr, required};
//!
//! #[derive(Default)]
//! struct GetTicket {
//!     id: i64,
//!     status: Option<String>,
//! }
//!
//! let bag = ArgumentBag::from_json(serde_json::json!({ "id": 42.0 })).unwrap();
//! let mut request = GetTicket::default();
//! bind(
//!     &bag,
//!     &mut [
//!         &mut required("id", &mut request.id),
//!         &mut optional_ptr("status", &mut request.status).one_of(&["open".to_owned()]),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(request.id, 42);
//! assert!(request.status.is_none());
//! ```
//!
//! Every extractor runs even when an earlier one fails, so the caller receives
//! the complete list of problems in a single [`BindErrors`].

#![warn(missing_docs, clippy::pedantic)]

mod convert;
mod error;
mod extract;
mod value;

pub use convert::{DateFormat, FromArg, LegacyDate, lookup};
pub use error::{BindError, BindErrors, BindResult};
pub use extract::{Extract, Field, bind, optional, optional_ptr, required};
pub use value::{ArgValue, ArgumentBag};
