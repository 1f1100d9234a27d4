//! Responses returned by the KKM Server.
//!
//! A [`Response`] is a shared base (`Status`, `Error`, `IdCommand`, …) plus a
//! closed set of well-known optional payload fields. Fields outside that set
//! are ignored on decode. Responses are never mutated after they are received.

use serde::{Deserialize, Serialize};

use crate::identifiers::empty_as_none;
use crate::status::{classify, status_text, StatusOutcome};
use crate::{CommandId, DeviceNumber, KkmStatus, UniversalId};

/// A decoded device-server response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Raw status code; see [`Response::status`].
    #[serde(rename = "Status")]
    pub status_code: i64,

    /// Device or server error text. Empty on success.
    #[serde(rename = "Error", default)]
    pub error: String,

    #[serde(rename = "Message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Echo of the originating command name.
    #[serde(rename = "Command", default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Echo of the originating command identifier. Empty strings decode as `None`.
    #[serde(
        rename = "IdCommand",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub command_id: Option<CommandId>,

    #[serde(rename = "NumDevice", default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceNumber>,

    // -- shift and check results ------------------------------------------
    #[serde(rename = "CheckNumber", default, skip_serializing_if = "Option::is_none")]
    pub check_number: Option<u64>,

    #[serde(rename = "SessionNumber", default, skip_serializing_if = "Option::is_none")]
    pub session_number: Option<u64>,

    #[serde(
        rename = "SessionCheckNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub session_check_number: Option<u64>,

    /// Fiscal document QR payload (`t=…&s=…&fn=…&i=…&fp=…`).
    #[serde(rename = "QRCode", default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,

    /// Link to the document at the fiscal data operator.
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "Cash", default, skip_serializing_if = "Option::is_none")]
    pub cash: Option<f64>,

    #[serde(
        rename = "ElectronicPayment",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub electronic_payment: Option<f64>,

    // -- payment terminal results -----------------------------------------
    #[serde(
        rename = "UniversalID",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub universal_id: Option<UniversalId>,

    #[serde(rename = "Amount", default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    /// Terminal slip text, ready to print.
    #[serde(rename = "Slip", default, skip_serializing_if = "Option::is_none")]
    pub slip: Option<String>,

    // -- device list ------------------------------------------------------
    #[serde(rename = "ListUnit", default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<DeviceInfo>>,
}

impl Response {
    /// Creates a bare response with the given status and no payload.
    pub fn with_status(status: KkmStatus) -> Self {
        Self {
            status_code: status.code(),
            ..Self::default()
        }
    }

    /// Returns the protocol status, or `None` for codes outside the protocol.
    pub fn status(&self) -> Option<KkmStatus> {
        KkmStatus::from_code(self.status_code)
    }

    /// Semantic outcome of the status code.
    pub fn outcome(&self) -> StatusOutcome {
        classify(self.status_code)
    }

    /// Human-readable status text.
    pub fn status_text(&self) -> String {
        status_text(self.status_code)
    }

    /// `true` when the device reported success.
    pub fn is_ok(&self) -> bool {
        self.status() == Some(KkmStatus::Ok)
    }
}

/// One entry of the `ListUnit` array returned by `List`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    #[serde(rename = "NumDevice")]
    pub device: DeviceNumber,
    #[serde(rename = "IdDevice")]
    pub device_id: String,
    /// Powered on. The server spells this field `OnOf`.
    #[serde(rename = "OnOf")]
    pub on_off: bool,
    #[serde(rename = "Active")]
    pub active: bool,
    #[serde(rename = "TypeDevice")]
    pub type_device: String,
    #[serde(rename = "IdTypeDevice")]
    pub type_device_id: String,
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "NameDevice")]
    pub name: String,
    #[serde(rename = "KktNumber")]
    pub kkt_number: String,
    #[serde(rename = "INN")]
    pub inn: String,
    #[serde(rename = "TaxVariant")]
    pub tax_variant: String,
    #[serde(rename = "AddDate")]
    pub add_date: String,
    #[serde(rename = "OFD_Error")]
    pub ofd_error: String,
    #[serde(rename = "OFD_NumErrorDoc")]
    pub ofd_num_error_doc: u64,
    #[serde(rename = "OFD_DateErrorDoc")]
    pub ofd_date_error_doc: String,
    #[serde(rename = "FN_DateEnd")]
    pub fn_date_end: String,
    /// Fiscal drive memory nearly full. The server spells this `FN_MemOverflowl`.
    #[serde(rename = "FN_MemOverflowl")]
    pub fn_mem_overflow: bool,
    #[serde(rename = "FN_IsFiscal")]
    pub fn_is_fiscal: bool,
    #[serde(rename = "PaperOver")]
    pub paper_over: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn minimal_response_decodes() {
        let r: Response = serde_json::from_value(json!({ "Status": 0, "Error": "" }))
            .expect("minimal body");
        assert!(r.is_ok());
        assert!(r.command_id.is_none());
        assert_eq!(r.status_text(), "done, success");
    }

    #[test]
    fn empty_id_command_decodes_as_absent() {
        let r: Response =
            serde_json::from_value(json!({ "Status": 1, "Error": "", "IdCommand": "" }))
                .expect("decode");
        assert_eq!(r.status(), Some(KkmStatus::Run));
        assert!(r.command_id.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let r: Response = serde_json::from_value(json!({
            "Status": 2,
            "Error": "paper out",
            "Warning": "something new",
            "AdvancePayment": 0
        }))
        .expect("decode");
        assert_eq!(r.outcome(), StatusOutcome::DoneError);
        assert_eq!(r.error, "paper out");
    }

    #[test]
    fn unknown_status_code_is_preserved() {
        let r: Response = serde_json::from_value(json!({ "Status": 42 })).expect("decode");
        assert_eq!(r.status(), None);
        assert_eq!(r.status_code, 42);
        assert!(r.status_text().contains("42"));
    }

    #[test]
    fn payment_payload_decodes() {
        let r: Response = serde_json::from_value(json!({
            "Status": 0,
            "Error": "",
            "IdCommand": "id-1",
            "UniversalID": "CN:1254********1234;RN:7;RRN:1234567890;AC:123456",
            "Amount": 100.0,
            "Slip": "slip text",
            "NumDevice": 1
        }))
        .expect("decode");
        assert_eq!(r.command_id.as_ref().map(CommandId::as_str), Some("id-1"));
        assert_eq!(r.amount, Some(100.0));
        assert_eq!(r.device, Some(DeviceNumber::new(1)));
        assert!(r.universal_id.is_some());
    }

    #[test]
    fn device_list_decodes_server_spellings() {
        let r: Response = serde_json::from_value(json!({
            "Status": 0,
            "Error": "",
            "ListUnit": [{ "NumDevice": 1, "OnOf": true, "FN_MemOverflowl": true, "NameDevice": "A" }]
        }))
        .expect("decode");
        let devices = r.devices.expect("list present");
        assert_eq!(devices.len(), 1);
        assert!(devices[0].on_off);
        assert!(devices[0].fn_mem_overflow);
        assert_eq!(devices[0].name, "A");
    }
}
