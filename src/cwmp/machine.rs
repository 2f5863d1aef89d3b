//! CWMP session state machine
//!
//! There is no stored "current state". Each HTTP exchange is dispatched on
//! what arrived (empty body, Inform, `SetParameterValuesResponse`, fault,
//! anything else), the serial bound to the HTTP session, and the needs-push
//! flag for that serial. The session and the ledger are the long-lived state.
//!
//! A configuration push spans three exchanges:
//!
//! ```text
//! CPE                              ACS
//!  | -- Inform (1 BOOT) ----------> |  bind serial, ledger[serial] = true
//!  | <------------- InformResponse  |
//!  | -- empty POST ---------------> |  ledger[serial] == true
//!  | <--------- SetParameterValues  |
//!  | -- SetParameterValuesResponse> |  ledger[serial] = false
//!  | <------------------ empty ack  |
//! ```
//!
//! The ledger is read and written without locking; duplicate exchanges for
//! one serial may push twice.

use uuid::Uuid;

use super::envelope::ParseError;
use super::rpc::{Inform, NextAction, RpcEvent, SetParameterValuesResponse, SetParamsStatus};
use super::store::{DeviceSession, NeedsConfigStore};
use crate::Result;
use crate::params::ParameterProvider;

/// Dispatches one exchange against the ledger and parameter source
pub struct Dispatcher<'a> {
    ledger: &'a dyn NeedsConfigStore,
    params: &'a dyn ParameterProvider,
}

impl<'a> Dispatcher<'a> {
    #[must_use]
    pub fn new(ledger: &'a dyn NeedsConfigStore, params: &'a dyn ParameterProvider) -> Self {
        Self { ledger, params }
    }

    /// Decide the reply to one exchange, updating `session` and the ledger
    ///
    /// # Errors
    ///
    /// Returns error only if the ledger store fails
    pub fn dispatch(
        &self,
        session: &mut DeviceSession,
        input: std::result::Result<RpcEvent, ParseError>,
    ) -> Result<NextAction> {
        let event = match input {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "could not parse request body");
                return Ok(NextAction::MalformedXml);
            }
        };

        tracing::debug!(
            serial = ?session.serial(),
            method = event.method(),
            "dispatching CWMP request"
        );

        match event {
            RpcEvent::Empty => self.poll(session),
            RpcEvent::Inform(inform) => self.inform(session, inform),
            RpcEvent::SetParameterValuesResponse(response) => {
                self.set_params_response(session, &response)
            }
            RpcEvent::Fault { detail } => {
                tracing::error!(
                    serial = ?session.serial(),
                    fault = %detail,
                    "CPE reported a fault"
                );
                Ok(NextAction::FaultAck)
            }
            RpcEvent::Unrecognized { method } => {
                tracing::info!(
                    serial = ?session.serial(),
                    method = ?method,
                    "unhandled CWMP method"
                );
                Ok(NextAction::Banner)
            }
        }
    }

    /// Empty body: the CPE waits for our request
    fn poll(&self, session: &DeviceSession) -> Result<NextAction> {
        let Some(serial) = session.serial() else {
            tracing::error!(
                "received an empty request from an unknown device, cannot generate configuration"
            );
            return Ok(NextAction::NoSession);
        };

        match self.ledger.get(serial)? {
            None => {
                // Unseen serial: mark it, the push happens on the next poll
                self.ledger.set(serial, true)?;
                tracing::info!(
                    serial = %serial,
                    "first poll from unseen device, marked for configuration"
                );
                Ok(NextAction::Ack)
            }
            Some(true) => self.push(serial),
            Some(false) => {
                tracing::info!(serial = %serial, "device already configured");
                Ok(NextAction::Ack)
            }
        }
    }

    /// Build the `SetParameterValues` push; the flag stays set until the
    /// CPE answers
    fn push(&self, serial: &str) -> Result<NextAction> {
        let params = match self.params.resolve(Some(serial)) {
            Ok(params) => params,
            Err(e) => {
                tracing::error!(
                    serial = %serial,
                    error = %e,
                    "failed to load configuration parameters"
                );
                return Ok(NextAction::Ack);
            }
        };

        let cwmp_id = next_cwmp_id();
        tracing::info!(
            serial = %serial,
            cwmp_id = %cwmp_id,
            count = params.len(),
            "sending configuration"
        );

        Ok(NextAction::PushConfig {
            serial: serial.to_string(),
            cwmp_id,
            params,
        })
    }

    fn inform(&self, session: &mut DeviceSession, inform: Inform) -> Result<NextAction> {
        let events = inform.events.as_deref().unwrap_or_default().join(", ");

        let Some(serial) = inform.serial.as_deref() else {
            tracing::warn!(
                cwmp_id = ?inform.cwmp_id,
                events = %events,
                "inform without a serial number, device identity unusable"
            );
            return Ok(NextAction::InformAck {
                cwmp_id: inform.cwmp_id,
            });
        };

        session.set_serial(serial);

        if inform.is_boot() {
            self.ledger.set(serial, true)?;
            tracing::info!(serial = %serial, "device booted");
        }

        tracing::info!(
            serial = %serial,
            cwmp_id = ?inform.cwmp_id,
            events = %events,
            "device informed us"
        );

        Ok(NextAction::InformAck {
            cwmp_id: inform.cwmp_id,
        })
    }

    fn set_params_response(
        &self,
        session: &DeviceSession,
        response: &SetParameterValuesResponse,
    ) -> Result<NextAction> {
        let Some(serial) = session.serial() else {
            tracing::error!(
                cwmp_id = ?response.cwmp_id,
                status = ?response.status,
                "SetParameterValuesResponse from a session without a device serial"
            );
            return Ok(NextAction::Ack);
        };

        match response.status() {
            SetParamsStatus::Applied => {
                tracing::info!(
                    serial = %serial,
                    cwmp_id = ?response.cwmp_id,
                    "device applied configuration changes without reboot"
                );
            }
            SetParamsStatus::AppliedRebootRequired => {
                tracing::info!(
                    serial = %serial,
                    cwmp_id = ?response.cwmp_id,
                    "device applied configuration changes but requires a reboot"
                );
            }
            SetParamsStatus::Unknown(raw) => {
                tracing::warn!(
                    serial = %serial,
                    cwmp_id = ?response.cwmp_id,
                    status = raw.as_deref().unwrap_or("<missing>"),
                    "device returned unknown status value"
                );
            }
        }

        self.ledger.set(serial, false)?;
        Ok(NextAction::Ack)
    }
}

/// Correlation id for an ACS-initiated RPC
fn next_cwmp_id() -> String {
    Uuid::new_v4().simple().to_string()
}
