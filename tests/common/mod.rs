//! Shared test utilities

use std::sync::Arc;

use femto_acs::api::{self, ApiState};
use femto_acs::{DbPool, ParameterSource, db};

pub const PARAMS: &str = "\
[Common]
Device.ManagementServer.PeriodicInformInterval = 60|xsd:unsignedInt
Device.Services.FAPService.1.CellConfig.LTE.EPC.TAC = 1|xsd:unsignedInt

[SN1]
Device.Services.FAPService.1.CellConfig.LTE.EPC.TAC = 7|xsd:unsignedInt
";

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Build the full router over `db` with the sample parameters
pub fn build_test_router(db: DbPool) -> axum::Router {
    let params = Arc::new(ParameterSource::parse(PARAMS).expect("sample params parse"));
    api::router(Arc::new(ApiState::new(db, params)))
}

/// SOAP envelope with a `cwmp:ID` header around `body`
pub fn envelope(cwmp_id: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap-env:Envelope xmlns:soap-env="http://schemas.xmlsoap.org/soap/envelope/"
                   xmlns:soap-enc="http://schemas.xmlsoap.org/soap/encoding/"
                   xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
  <soap-env:Header><cwmp:ID soap-env:mustUnderstand="1">{cwmp_id}</cwmp:ID></soap-env:Header>
  <soap-env:Body>{body}</soap-env:Body>
</soap-env:Envelope>"#
    )
}

/// Inform from `serial` carrying the given event codes
pub fn inform(cwmp_id: &str, serial: &str, events: &[&str]) -> String {
    let structs: String = events
        .iter()
        .map(|code| {
            format!("<EventStruct><EventCode>{code}</EventCode><CommandKey/></EventStruct>")
        })
        .collect();
    envelope(
        cwmp_id,
        &format!(
            r#"<cwmp:Inform>
                 <DeviceId><Manufacturer>sysmocom</Manufacturer><SerialNumber>{serial}</SerialNumber></DeviceId>
                 <Event soap-enc:arrayType="cwmp:EventStruct[{}]">{structs}</Event>
                 <MaxEnvelopes>1</MaxEnvelopes>
               </cwmp:Inform>"#,
            events.len()
        ),
    )
}

/// `SetParameterValuesResponse` with an optional status
pub fn set_params_response(status: Option<&str>) -> String {
    let status = status.map(|s| format!("<Status>{s}</Status>")).unwrap_or_default();
    envelope(
        "99",
        &format!("<cwmp:SetParameterValuesResponse>{status}</cwmp:SetParameterValuesResponse>"),
    )
}
