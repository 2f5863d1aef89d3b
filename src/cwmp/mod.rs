//! CWMP (TR-069) protocol core
//!
//! - **envelope**: SOAP body -> [`RpcEvent`]
//! - **machine**: per-exchange dispatch over session and needs-push ledger
//! - **encoder**: [`NextAction`] -> HTTP body and headers
//! - **store**: storage seams the dispatcher is handed

pub mod encoder;
pub mod envelope;
pub mod machine;
pub mod rpc;
pub mod store;

/// SOAP 1.1 envelope namespace
pub const NS_SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// CWMP 1.0 namespace
pub const NS_CWMP: &str = "urn:dslforum-org:cwmp-1-0";

pub use encoder::{EncodedResponse, encode};
pub use envelope::{ParseError, parse, read};
pub use machine::Dispatcher;
pub use rpc::{Inform, NextAction, RpcEvent, SetParameterValuesResponse, SetParamsStatus};
pub use store::{DeviceSession, NeedsConfigStore, SessionStore};
