//! Typed CWMP RPC events and state machine decisions

use crate::params::ResolvedParams;

/// Event code sent on first contact after a factory reset
pub const EVENT_BOOTSTRAP: &str = "0 BOOTSTRAP";

/// Event code sent after every power cycle or reboot
pub const EVENT_BOOT: &str = "1 BOOT";

/// Inbound RPC extracted from one HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcEvent {
    /// SOAP fault raised by the CPE; carries the raw fault XML for logging
    Fault { detail: String },
    /// CPE announcing identity and lifecycle events
    Inform(Inform),
    /// CPE reporting the outcome of a pushed configuration
    SetParameterValuesResponse(SetParameterValuesResponse),
    /// Body parsed but carried no method we handle
    Unrecognized { method: Option<String> },
    /// No body at all: the CPE is ready to receive a request
    Empty,
}

impl RpcEvent {
    /// Method name for logging
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Fault { .. } => "Fault",
            Self::Inform(_) => "Inform",
            Self::SetParameterValuesResponse(_) => "SetParameterValuesResponse",
            Self::Unrecognized { method } => method.as_deref().unwrap_or("<none>"),
            Self::Empty => "<empty>",
        }
    }
}

/// Fields of an Inform RPC
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inform {
    /// `cwmp:ID` header, echoed in the acknowledgement
    pub cwmp_id: Option<String>,
    /// `DeviceId/SerialNumber`
    pub serial: Option<String>,
    /// `Event/EventStruct/EventCode` in document order; `None` when the
    /// Inform has no `Event` node at all
    pub events: Option<Vec<String>>,
}

impl Inform {
    /// Whether the events announce a (re)boot
    #[must_use]
    pub fn is_boot(&self) -> bool {
        self.events
            .iter()
            .flatten()
            .any(|code| code == EVENT_BOOTSTRAP || code == EVENT_BOOT)
    }
}

/// Fields of a `SetParameterValuesResponse` RPC
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetParameterValuesResponse {
    /// `cwmp:ID` header, logged with the outcome
    pub cwmp_id: Option<String>,
    /// Raw text of the `Status` node
    pub status: Option<String>,
}

impl SetParameterValuesResponse {
    #[must_use]
    pub fn status(&self) -> SetParamsStatus {
        SetParamsStatus::from_raw(self.status.as_deref())
    }
}

/// Interpretation of the `SetParameterValuesResponse` status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetParamsStatus {
    /// `0`: all changes applied
    Applied,
    /// `1`: changes accepted, applied after a reboot
    AppliedRebootRequired,
    /// Anything else, including a missing `Status` node
    Unknown(Option<String>),
}

impl SetParamsStatus {
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("0") => Self::Applied,
            Some("1") => Self::AppliedRebootRequired,
            other => Self::Unknown(other.map(ToString::to_string)),
        }
    }
}

/// What the ACS sends back for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    /// Acknowledge an Inform, echoing its correlation id
    InformAck { cwmp_id: Option<String> },
    /// Push configuration with a `SetParameterValues` request
    PushConfig {
        serial: String,
        cwmp_id: String,
        params: ResolvedParams,
    },
    /// Empty acknowledgement, nothing more to do
    Ack,
    /// Empty poll from a session that never sent an Inform
    NoSession,
    /// Acknowledge a CPE fault
    FaultAck,
    /// Generic server banner
    Banner,
    /// Body was not parseable XML
    MalformedXml,
}
