//! SOAP envelope reader
//!
//! Turns a raw request body into an [`RpcEvent`]. Lookups are
//! namespace-qualified for the envelope (`soap-env:Header`, `soap-env:Body`,
//! `cwmp:ID`) and the RPC element itself; the RPC's own children
//! (`DeviceId`, `Event`, `Status`, ...) are unqualified, as CPEs send them.
//! Missing optional nodes yield `None` rather than an error.

use roxmltree::{Document, Node};
use thiserror::Error;

use super::rpc::{Inform, RpcEvent, SetParameterValuesResponse};
use super::{NS_CWMP, NS_SOAP_ENV};

/// Body could not be read as an XML document
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Read one request body; an empty body is the CPE's "ready for requests"
///
/// # Errors
///
/// Returns [`ParseError`] if a non-empty body is not well-formed XML
pub fn read(body: &[u8]) -> Result<RpcEvent, ParseError> {
    if body.is_empty() {
        return Ok(RpcEvent::Empty);
    }
    parse(body)
}

/// Parse a SOAP envelope into an RPC event
///
/// # Errors
///
/// Returns [`ParseError`] if `body` is not well-formed XML
pub fn parse(body: &[u8]) -> Result<RpcEvent, ParseError> {
    let text = std::str::from_utf8(body)?;
    let doc = Document::parse(text)?;
    let root = doc.root_element();

    let Some(body) = child(root, Some(NS_SOAP_ENV), "Body") else {
        return Ok(RpcEvent::Unrecognized { method: None });
    };

    for node in body.children().filter(Node::is_element) {
        if is(node, Some(NS_SOAP_ENV), "Fault") {
            return Ok(RpcEvent::Fault {
                detail: doc.input_text()[node.range()].to_string(),
            });
        }
        if is(node, Some(NS_CWMP), "Inform") {
            return Ok(RpcEvent::Inform(Inform {
                cwmp_id: cwmp_id(root),
                serial: inform_serial(node),
                events: inform_events(node),
            }));
        }
        if is(node, Some(NS_CWMP), "SetParameterValuesResponse") {
            return Ok(RpcEvent::SetParameterValuesResponse(
                SetParameterValuesResponse {
                    cwmp_id: cwmp_id(root),
                    status: set_response_status(node),
                },
            ));
        }
    }

    let method = body
        .children()
        .find(Node::is_element)
        .map(|n| n.tag_name().name().to_string());
    Ok(RpcEvent::Unrecognized { method })
}

fn is(node: Node<'_, '_>, ns: Option<&str>, name: &str) -> bool {
    node.is_element() && node.tag_name().namespace() == ns && node.tag_name().name() == name
}

/// First direct child element with the given expanded name
fn child<'a, 'input>(
    node: Node<'a, 'input>,
    ns: Option<&str>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|c| is(*c, ns, name))
}

fn text(node: Node<'_, '_>) -> Option<String> {
    node.text().map(ToString::to_string)
}

/// `soap-env:Header/cwmp:ID`
fn cwmp_id(root: Node<'_, '_>) -> Option<String> {
    let header = child(root, Some(NS_SOAP_ENV), "Header")?;
    child(header, Some(NS_CWMP), "ID").and_then(text)
}

/// `DeviceId/SerialNumber` under an Inform
fn inform_serial(inform: Node<'_, '_>) -> Option<String> {
    let device_id = child(inform, None, "DeviceId")?;
    child(device_id, None, "SerialNumber").and_then(text)
}

/// `Event/EventStruct/EventCode` under an Inform
fn inform_events(inform: Node<'_, '_>) -> Option<Vec<String>> {
    let event = child(inform, None, "Event")?;
    let codes = event
        .children()
        .filter(|n| is(*n, None, "EventStruct"))
        .filter_map(|s| child(s, None, "EventCode"))
        .filter_map(text)
        .collect();
    Some(codes)
}

/// `Status` under a `SetParameterValuesResponse`
fn set_response_status(response: Node<'_, '_>) -> Option<String> {
    child(response, None, "Status").and_then(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(header: &str, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soap-env:Envelope xmlns:soap-env="http://schemas.xmlsoap.org/soap/envelope/"
                   xmlns:soap-enc="http://schemas.xmlsoap.org/soap/encoding/"
                   xmlns:cwmp="urn:dslforum-org:cwmp-1-0">
  <soap-env:Header>{header}</soap-env:Header>
  <soap-env:Body>{body}</soap-env:Body>
</soap-env:Envelope>"#
        )
    }

    const ID_HEADER: &str = r#"<cwmp:ID soap-env:mustUnderstand="1">4711</cwmp:ID>"#;

    #[test]
    fn test_inform_with_events() {
        let xml = envelope(
            ID_HEADER,
            r#"<cwmp:Inform>
                 <DeviceId>
                   <Manufacturer>sysmocom</Manufacturer>
                   <SerialNumber>SN1</SerialNumber>
                 </DeviceId>
                 <Event soap-enc:arrayType="cwmp:EventStruct[2]">
                   <EventStruct><EventCode>4 VALUE CHANGE</EventCode><CommandKey></CommandKey></EventStruct>
                   <EventStruct><EventCode>0 BOOTSTRAP</EventCode><CommandKey></CommandKey></EventStruct>
                 </Event>
               </cwmp:Inform>"#,
        );

        let RpcEvent::Inform(inform) = parse(xml.as_bytes()).unwrap() else {
            panic!("expected Inform");
        };
        assert_eq!(inform.cwmp_id.as_deref(), Some("4711"));
        assert_eq!(inform.serial.as_deref(), Some("SN1"));
        assert_eq!(
            inform.events,
            Some(vec!["4 VALUE CHANGE".to_string(), "0 BOOTSTRAP".to_string()])
        );
        assert!(inform.is_boot());
    }

    #[test]
    fn test_inform_event_without_structs_is_empty_list() {
        let xml = envelope(
            "",
            "<cwmp:Inform><DeviceId><SerialNumber>SN1</SerialNumber></DeviceId><Event/></cwmp:Inform>",
        );
        let RpcEvent::Inform(inform) = parse(xml.as_bytes()).unwrap() else {
            panic!("expected Inform");
        };
        assert_eq!(inform.events, Some(vec![]));
        assert_eq!(inform.cwmp_id, None);
    }

    #[test]
    fn test_inform_without_event_node() {
        let xml = envelope(ID_HEADER, "<cwmp:Inform><DeviceId/></cwmp:Inform>");
        let RpcEvent::Inform(inform) = parse(xml.as_bytes()).unwrap() else {
            panic!("expected Inform");
        };
        assert_eq!(inform.events, None);
        assert_eq!(inform.serial, None);
    }

    #[test]
    fn test_set_parameter_values_response() {
        let xml = envelope(
            ID_HEADER,
            "<cwmp:SetParameterValuesResponse><Status>1</Status></cwmp:SetParameterValuesResponse>",
        );
        let event = parse(xml.as_bytes()).unwrap();
        assert_eq!(
            event,
            RpcEvent::SetParameterValuesResponse(SetParameterValuesResponse {
                cwmp_id: Some("4711".to_string()),
                status: Some("1".to_string()),
            })
        );
    }

    #[test]
    fn test_set_parameter_values_response_without_status() {
        let xml = envelope("", "<cwmp:SetParameterValuesResponse/>");
        let RpcEvent::SetParameterValuesResponse(resp) = parse(xml.as_bytes()).unwrap() else {
            panic!("expected SetParameterValuesResponse");
        };
        assert_eq!(resp.status, None);
    }

    #[test]
    fn test_fault_keeps_raw_xml() {
        let xml = envelope(
            "",
            "<soap-env:Fault><faultcode>Client</faultcode><faultstring>CWMP fault</faultstring></soap-env:Fault>",
        );
        let RpcEvent::Fault { detail } = parse(xml.as_bytes()).unwrap() else {
            panic!("expected Fault");
        };
        assert!(detail.starts_with("<soap-env:Fault>"));
        assert!(detail.contains("CWMP fault"));
    }

    #[test]
    fn test_first_known_child_wins() {
        let xml = envelope(
            "",
            "<cwmp:GetRPCMethods/><cwmp:SetParameterValuesResponse><Status>0</Status></cwmp:SetParameterValuesResponse><cwmp:Inform/>",
        );
        assert!(matches!(
            parse(xml.as_bytes()).unwrap(),
            RpcEvent::SetParameterValuesResponse(_)
        ));
    }

    #[test]
    fn test_unknown_method_is_unrecognized() {
        let xml = envelope("", "<cwmp:GetRPCMethods/>");
        assert_eq!(
            parse(xml.as_bytes()).unwrap(),
            RpcEvent::Unrecognized {
                method: Some("GetRPCMethods".to_string())
            }
        );
    }

    #[test]
    fn test_wrong_namespace_is_unrecognized() {
        let xml = envelope("", r#"<Inform xmlns="urn:dslforum-org:cwmp-1-2"/>"#);
        assert!(matches!(
            parse(xml.as_bytes()).unwrap(),
            RpcEvent::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_missing_body_is_unrecognized() {
        let xml = r#"<soap-env:Envelope xmlns:soap-env="http://schemas.xmlsoap.org/soap/envelope/"/>"#;
        assert_eq!(
            parse(xml.as_bytes()).unwrap(),
            RpcEvent::Unrecognized { method: None }
        );
    }

    #[test]
    fn test_unqualified_envelope_is_unrecognized() {
        let xml = "<Envelope><Body><Inform/></Body></Envelope>";
        assert_eq!(
            parse(xml.as_bytes()).unwrap(),
            RpcEvent::Unrecognized { method: None }
        );
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(parse(b"not xml"), Err(ParseError::Xml(_))));
        assert!(matches!(parse(&[0xff, 0xfe, 0x00]), Err(ParseError::Utf8(_))));
    }

    #[test]
    fn test_read_empty_body() {
        assert_eq!(read(b"").unwrap(), RpcEvent::Empty);
        assert!(read(b" ").is_err());
    }
}
