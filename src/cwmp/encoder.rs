//! RPC response encoder
//!
//! Renders a [`NextAction`] into the HTTP body, content type, and extra
//! headers sent back to the CPE.

use std::fmt::Write as _;

use super::rpc::NextAction;
use super::{NS_CWMP, NS_SOAP_ENV};
use crate::params::ResolvedParams;

/// Server identification sent in `Server` and `SOAPServer`
pub const SERVER_BANNER: &str = concat!("femto-acs/", env!("CARGO_PKG_VERSION"));

/// Plain-text banner for non-CWMP requests
pub const BANNER_TEXT: &str = "This is a femto-acs/tr069 server";

/// Reply to a body that is not XML
pub const MALFORMED_XML_TEXT: &str = "Could not parse the request as XML";

/// Reply to a CPE fault
pub const FAULT_ACK_TEXT: &str = "Fault";

pub const CONTENT_TYPE_XML: &str = "text/xml";
pub const CONTENT_TYPE_XML_UTF8: &str = "text/xml; charset=\"utf-8\"";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

const NS_SOAP_ENC: &str = "http://schemas.xmlsoap.org/soap/encoding/";
const NS_XSD: &str = "http://www.w3.org/2001/XMLSchema";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Encoded HTTP response for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedResponse {
    pub body: String,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, &'static str)>,
}

impl EncodedResponse {
    fn plain(body: &str, content_type: &'static str) -> Self {
        Self {
            body: body.to_string(),
            content_type,
            headers: Vec::new(),
        }
    }
}

/// Render an action to its HTTP representation
#[must_use]
pub fn encode(action: &NextAction) -> EncodedResponse {
    match action {
        NextAction::InformAck { cwmp_id } => EncodedResponse {
            body: inform_response(cwmp_id.as_deref()),
            content_type: CONTENT_TYPE_XML_UTF8,
            headers: vec![("SOAPServer", SERVER_BANNER), ("Server", SERVER_BANNER)],
        },
        NextAction::PushConfig {
            cwmp_id, params, ..
        } => EncodedResponse::plain(&set_parameter_values(cwmp_id, params), CONTENT_TYPE_XML),
        NextAction::Ack | NextAction::NoSession => EncodedResponse::plain("", CONTENT_TYPE_XML),
        NextAction::FaultAck => EncodedResponse::plain(FAULT_ACK_TEXT, CONTENT_TYPE_XML),
        NextAction::Banner => EncodedResponse::plain(BANNER_TEXT, CONTENT_TYPE_TEXT),
        NextAction::MalformedXml => EncodedResponse::plain(MALFORMED_XML_TEXT, CONTENT_TYPE_TEXT),
    }
}

fn envelope_open(out: &mut String, cwmp_id: &str) {
    let _ = write!(
        out,
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<soap-env:Envelope xmlns:soap-enc=\"{enc}\" xmlns:soap-env=\"{env}\" ",
            "xmlns:xsd=\"{xsd}\" xmlns:xsi=\"{xsi}\" xmlns:cwmp=\"{cwmp}\">\n",
            "  <soap-env:Header>\n",
            "    <cwmp:ID soap-env:mustUnderstand=\"1\">{id}</cwmp:ID>\n",
            "  </soap-env:Header>\n",
            "  <soap-env:Body>\n",
        ),
        enc = NS_SOAP_ENC,
        env = NS_SOAP_ENV,
        xsd = NS_XSD,
        xsi = NS_XSI,
        cwmp = NS_CWMP,
        id = escape(cwmp_id),
    );
}

fn envelope_close(out: &mut String) {
    out.push_str("  </soap-env:Body>\n</soap-env:Envelope>\n");
}

/// `InformResponse` echoing the Inform's correlation id
fn inform_response(cwmp_id: Option<&str>) -> String {
    let mut out = String::new();
    envelope_open(&mut out, cwmp_id.unwrap_or_default());
    out.push_str(concat!(
        "    <cwmp:InformResponse>\n",
        "      <MaxEnvelopes>1</MaxEnvelopes>\n",
        "    </cwmp:InformResponse>\n",
    ));
    envelope_close(&mut out);
    out
}

/// `SetParameterValues` request carrying every resolved parameter
fn set_parameter_values(cwmp_id: &str, params: &ResolvedParams) -> String {
    let mut out = String::new();
    envelope_open(&mut out, cwmp_id);
    let _ = writeln!(out, "    <cwmp:SetParameterValues>");
    let _ = writeln!(
        out,
        "      <ParameterList soap-enc:arrayType=\"cwmp:ParameterValueStruct[{}]\">",
        params.len()
    );
    for (name, entry) in params {
        let _ = write!(
            out,
            concat!(
                "        <ParameterValueStruct>\n",
                "          <Name>{name}</Name>\n",
                "          <Value xsi:type=\"{xmltype}\">{value}</Value>\n",
                "        </ParameterValueStruct>\n",
            ),
            name = escape(name),
            xmltype = escape(&entry.xmltype),
            value = escape(&entry.value),
        );
    }
    out.push_str("      </ParameterList>\n");
    out.push_str("      <ParameterKey></ParameterKey>\n");
    out.push_str("    </cwmp:SetParameterValues>\n");
    envelope_close(&mut out);
    out
}

/// Escape text for element content and double-quoted attributes
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamEntry;

    fn param(value: &str, xmltype: &str) -> ParamEntry {
        ParamEntry {
            value: value.to_string(),
            xmltype: xmltype.to_string(),
        }
    }

    #[test]
    fn test_inform_ack_echoes_id_and_sets_headers() {
        let encoded = encode(&NextAction::InformAck {
            cwmp_id: Some("4711".to_string()),
        });

        assert_eq!(encoded.content_type, CONTENT_TYPE_XML_UTF8);
        assert!(encoded.headers.contains(&("Server", SERVER_BANNER)));
        assert!(encoded.headers.contains(&("SOAPServer", SERVER_BANNER)));
        assert!(encoded.body.contains(">4711</cwmp:ID>"));
        assert!(encoded.body.contains("<cwmp:InformResponse>"));

        let doc = roxmltree::Document::parse(&encoded.body).unwrap();
        let id = doc
            .descendants()
            .find(|n| n.has_tag_name((NS_CWMP, "ID")))
            .and_then(|n| n.text());
        assert_eq!(id, Some("4711"));
    }

    #[test]
    fn test_set_parameter_values_lists_every_param() {
        let mut params = ResolvedParams::new();
        params.insert("Device.A".to_string(), param("1", "xsd:int"));
        params.insert("Device.B".to_string(), param("a<b&c", "xsd:string"));

        let encoded = encode(&NextAction::PushConfig {
            serial: "SN1".to_string(),
            cwmp_id: "abc".to_string(),
            params,
        });

        assert_eq!(encoded.content_type, CONTENT_TYPE_XML);
        assert!(encoded.body.contains("cwmp:ParameterValueStruct[2]"));
        assert!(encoded.body.contains("<Value xsi:type=\"xsd:int\">1</Value>"));
        assert!(encoded.body.contains("a&lt;b&amp;c"));

        let doc = roxmltree::Document::parse(&encoded.body).unwrap();
        let names: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name("Name"))
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(names, vec!["Device.A", "Device.B"]);
    }

    #[test]
    fn test_empty_acks() {
        for action in [NextAction::Ack, NextAction::NoSession] {
            let encoded = encode(&action);
            assert!(encoded.body.is_empty());
            assert_eq!(encoded.content_type, CONTENT_TYPE_XML);
        }
    }

    #[test]
    fn test_plain_text_replies() {
        assert_eq!(encode(&NextAction::Banner).body, BANNER_TEXT);
        assert_eq!(encode(&NextAction::MalformedXml).body, MALFORMED_XML_TEXT);
        assert_eq!(encode(&NextAction::FaultAck).body, FAULT_ACK_TEXT);
        assert_eq!(encode(&NextAction::FaultAck).content_type, CONTENT_TYPE_XML);
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;"
        );
    }
}
