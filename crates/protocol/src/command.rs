//! Typed commands sent to the KKM Server.
//!
//! A [`Command`] is a shared base (correlation identifier, optional device
//! timeout) plus exactly one [`CommandKind`]. Kinds are internally tagged by
//! the `Command` field so the JSON body matches the device-server protocol:
//!
//! ```json
//! { "Command": "OpenShift", "IdCommand": "…", "NumDevice": 0, "InnKkm": "", … }
//! ```
//!
//! Field names are part of the external protocol and are preserved exactly,
//! including the server's own spellings (`GetRezult`, `CashierVATIN`).

use serde::{Deserialize, Serialize};

use crate::identifiers::empty_as_none;
use crate::{CommandId, DeviceNumber, UniversalId};

/// Cashier name used when a shift or check command does not set one.
pub const DEFAULT_CASHIER_NAME: &str = "Тестовый кассир";

/// Cashier taxpayer number used when a shift or check command does not set one.
pub const DEFAULT_CASHIER_VATIN: &str = "123456789012";

// ---------------------------------------------------------------------------
// Command envelope
// ---------------------------------------------------------------------------

/// A command addressed to the device server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Correlation identifier. Absent until the correlator assigns one; an
    /// empty `IdCommand` decodes as absent.
    #[serde(
        rename = "IdCommand",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<CommandId>,

    /// Device-side execution timeout in seconds.
    ///
    /// Values above 60 also extend the HTTP request deadline
    /// (see [`crate::timeout::effective_timeout`]).
    #[serde(rename = "Timeout", default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// The command name and its kind-specific fields.
    #[serde(flatten)]
    pub kind: CommandKind,
}

impl Command {
    /// Creates a command of the given kind without an identifier.
    pub fn new(kind: CommandKind) -> Self {
        Self {
            id: None,
            timeout_secs: None,
            kind,
        }
    }

    /// Builds the status query for a previously issued command.
    ///
    /// The query carries the *tracked* command's identifier; the correlator
    /// therefore leaves it untouched.
    pub fn get_result(id: CommandId) -> Self {
        Self {
            id: Some(id),
            timeout_secs: None,
            kind: CommandKind::GetResult,
        }
    }

    /// Sets the device-side timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Sets the correlation identifier up front.
    ///
    /// Identifiers are assigned once; an already identified command keeps its
    /// original identifier.
    #[must_use]
    pub fn with_id(mut self, id: CommandId) -> Self {
        if self.id.is_none() {
            self.id = Some(id);
        }
        self
    }

    /// Returns the correlation identifier, if one has been assigned.
    pub fn id(&self) -> Option<&CommandId> {
        self.id.as_ref()
    }

    /// Assigns `id` if the command has none yet and returns the identifier
    /// the command carries afterwards.
    pub(crate) fn id_or_insert_with(&mut self, id: impl FnOnce() -> CommandId) -> &CommandId {
        self.id.get_or_insert_with(id)
    }

    /// Returns the wire name of the command (the `Command` field).
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

impl From<CommandKind> for Command {
    fn from(kind: CommandKind) -> Self {
        Self::new(kind)
    }
}

// ---------------------------------------------------------------------------
// Command kinds
// ---------------------------------------------------------------------------

/// The closed set of commands this client issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Command")]
pub enum CommandKind {
    /// Enumerate devices registered in the server.
    List(ListDevices),
    /// Open a cash-register shift.
    OpenShift(ShiftParams),
    /// Close a cash-register shift (prints the Z-report).
    CloseShift(ShiftParams),
    /// Charge a bank card through the payment terminal.
    PayByPaymentCard(CardPayment),
    /// Refund a completed card payment.
    ReturnPaymentByPaymentCard(CardReversal),
    /// Cancel (void) a card payment.
    CancelPaymentByPaymentCard(CardReversal),
    /// Print a fiscal or non-fiscal receipt.
    RegisterCheck(Box<RegisterCheck>),
    /// Query the status of a command issued earlier.
    #[serde(rename = "GetRezult")]
    GetResult,
}

impl CommandKind {
    /// Returns the wire name (the value of the `Command` field).
    pub fn name(&self) -> &'static str {
        match self {
            Self::List(_) => "List",
            Self::OpenShift(_) => "OpenShift",
            Self::CloseShift(_) => "CloseShift",
            Self::PayByPaymentCard(_) => "PayByPaymentCard",
            Self::ReturnPaymentByPaymentCard(_) => "ReturnPaymentByPaymentCard",
            Self::CancelPaymentByPaymentCard(_) => "CancelPaymentByPaymentCard",
            Self::RegisterCheck(_) => "RegisterCheck",
            Self::GetResult => "GetRezult",
        }
    }

    /// Returns `true` for commands that go through the bank payment terminal.
    pub fn is_payment(&self) -> bool {
        matches!(self, Self::PayByPaymentCard(_))
    }

    /// Returns `true` for the `GetRezult` status query.
    pub fn is_status_query(&self) -> bool {
        matches!(self, Self::GetResult)
    }
}

// ---------------------------------------------------------------------------
// Kind payloads
// ---------------------------------------------------------------------------

/// Selectors for the `List` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListDevices {
    /// Restrict to one device; `0` lists all.
    #[serde(rename = "NumDevice")]
    pub device: DeviceNumber,
    /// Restrict to devices registered for this taxpayer number.
    #[serde(rename = "InnKkm")]
    pub inn: String,
    /// Only devices enabled in the server configuration.
    #[serde(rename = "Active")]
    pub active: bool,
    /// Only devices that are switched on.
    #[serde(rename = "OnOff")]
    pub on_off: bool,
    /// Only devices with fiscal-data-operator transmission errors.
    #[serde(rename = "OFD_Error")]
    pub ofd_error: bool,
    /// Only devices with a fiscalised fiscal drive.
    #[serde(rename = "FN_IsFiscal")]
    pub fn_is_fiscal: bool,
}

impl Default for ListDevices {
    fn default() -> Self {
        Self {
            device: DeviceNumber::ANY,
            inn: String::new(),
            active: true,
            on_off: true,
            ofd_error: false,
            fn_is_fiscal: true,
        }
    }
}

/// Parameters shared by `OpenShift` and `CloseShift`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftParams {
    #[serde(rename = "NumDevice")]
    pub device: DeviceNumber,
    #[serde(rename = "InnKkm")]
    pub inn: String,
    #[serde(rename = "TaxVariant")]
    pub tax_variant: String,
    #[serde(rename = "IdDevice")]
    pub device_id: String,
    #[serde(rename = "CashierName")]
    pub cashier_name: String,
    #[serde(rename = "CashierVATIN")]
    pub cashier_vatin: String,
    /// Register the operation without printing a paper document.
    #[serde(rename = "NotPrint")]
    pub not_print: bool,
}

impl Default for ShiftParams {
    fn default() -> Self {
        Self {
            device: DeviceNumber::ANY,
            inn: String::new(),
            tax_variant: String::new(),
            device_id: String::new(),
            cashier_name: DEFAULT_CASHIER_NAME.to_string(),
            cashier_vatin: DEFAULT_CASHIER_VATIN.to_string(),
            not_print: false,
        }
    }
}

/// A card payment through the payment terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPayment {
    #[serde(rename = "NumDevice")]
    pub device: DeviceNumber,
    #[serde(rename = "InnKkm")]
    pub inn: String,
    /// Amount to charge, in roubles.
    #[serde(rename = "Amount")]
    pub amount: f64,
    /// Merchant-side receipt reference printed on the slip.
    #[serde(rename = "ReceiptNumber")]
    pub receipt_number: String,
}

/// Refund or cancellation of an earlier card payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardReversal {
    #[serde(rename = "NumDevice")]
    pub device: DeviceNumber,
    #[serde(rename = "InnKkm")]
    pub inn: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    /// Terminal reference of the payment being reversed.
    #[serde(rename = "UniversalID")]
    pub universal_id: UniversalId,
}

/// A receipt to print, fiscal or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterCheck {
    #[serde(rename = "NumDevice")]
    pub device: DeviceNumber,
    #[serde(rename = "InnKkm")]
    pub inn: String,
    #[serde(rename = "KktNumber")]
    pub kkt_number: String,
    #[serde(rename = "IsFiscalCheck")]
    pub is_fiscal: bool,
    /// Operation sign: `0` sale, `1` sale return, and so on per the server docs.
    #[serde(rename = "TypeCheck")]
    pub type_check: u8,
    #[serde(rename = "NotPrint")]
    pub not_print: bool,
    #[serde(rename = "NumberCopies")]
    pub number_copies: u32,
    #[serde(rename = "CashierName")]
    pub cashier_name: String,
    #[serde(rename = "CashierVATIN")]
    pub cashier_vatin: String,
    /// E-mail or phone the electronic receipt is sent to.
    #[serde(rename = "ClientAddress")]
    pub client_address: String,
    #[serde(rename = "TaxVariant")]
    pub tax_variant: String,
    #[serde(rename = "CheckStrings")]
    pub lines: Vec<CheckString>,
    #[serde(rename = "Cash")]
    pub cash: f64,
    #[serde(rename = "ElectronicPayment")]
    pub electronic_payment: f64,
    #[serde(rename = "AdvancePayment")]
    pub advance_payment: f64,
    #[serde(rename = "Credit")]
    pub credit: f64,
    #[serde(rename = "CashProvision")]
    pub cash_provision: f64,
}

impl Default for RegisterCheck {
    fn default() -> Self {
        Self {
            device: DeviceNumber::ANY,
            inn: String::new(),
            kkt_number: String::new(),
            is_fiscal: true,
            type_check: 0,
            not_print: false,
            number_copies: 0,
            cashier_name: DEFAULT_CASHIER_NAME.to_string(),
            cashier_vatin: DEFAULT_CASHIER_VATIN.to_string(),
            client_address: "test@example.com".to_string(),
            tax_variant: String::new(),
            lines: Vec::new(),
            cash: 0.0,
            electronic_payment: 0.0,
            advance_payment: 0.0,
            credit: 0.0,
            cash_provision: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Receipt lines
// ---------------------------------------------------------------------------

/// One line of a receipt. Exactly one of the variants is sent per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CheckString {
    PrintText(PrintText),
    PrintImage(PrintImage),
    Register(Box<RegisterItem>),
    BarCode(BarCode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintText {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Font", default, skip_serializing_if = "Option::is_none")]
    pub font: Option<u8>,
    #[serde(rename = "Intensity", default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintImage {
    /// Base64-encoded image.
    #[serde(rename = "Image")]
    pub image: String,
}

/// A fiscal line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Quantity")]
    pub quantity: f64,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "Department", default, skip_serializing_if = "Option::is_none")]
    pub department: Option<u32>,
    /// VAT rate code as defined by the server (`-1` no VAT, `0`, `10`, `20`, …).
    #[serde(rename = "Tax")]
    pub tax: i32,
    #[serde(rename = "SignMethodCalculation")]
    pub sign_method_calculation: u8,
    #[serde(rename = "SignCalculationObject")]
    pub sign_calculation_object: u8,
    #[serde(rename = "MeasureOfQuantity", default, skip_serializing_if = "Option::is_none")]
    pub measure_of_quantity: Option<u32>,
    #[serde(rename = "CountryOfOrigin", default, skip_serializing_if = "Option::is_none")]
    pub country_of_origin: Option<String>,
    #[serde(rename = "CustomsDeclaration", default, skip_serializing_if = "Option::is_none")]
    pub customs_declaration: Option<String>,
    #[serde(rename = "ExciseAmount", default, skip_serializing_if = "Option::is_none")]
    pub excise_amount: Option<f64>,
    #[serde(rename = "GoodCodeData", default, skip_serializing_if = "Option::is_none")]
    pub good_code: Option<GoodCodeData>,
}

/// Product marking code attached to a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodCodeData {
    #[serde(rename = "BarCode")]
    pub bar_code: String,
    #[serde(rename = "ContainsSerialNumber", default, skip_serializing_if = "Option::is_none")]
    pub contains_serial_number: Option<bool>,
    #[serde(rename = "AcceptOnBad", default, skip_serializing_if = "Option::is_none")]
    pub accept_on_bad: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarCode {
    #[serde(rename = "BarcodeType")]
    pub kind: BarcodeType,
    #[serde(rename = "Barcode")]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BarcodeType {
    Ean13,
    Code39,
    Code128,
    Qr,
    Pdf417,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_serialises_with_protocol_field_names() {
        let cmd = Command::new(CommandKind::List(ListDevices::default()));
        let value = serde_json::to_value(&cmd).expect("serialise");
        assert_eq!(
            value,
            json!({
                "Command": "List",
                "NumDevice": 0,
                "InnKkm": "",
                "Active": true,
                "OnOff": true,
                "OFD_Error": false,
                "FN_IsFiscal": true,
            })
        );
    }

    #[test]
    fn identified_command_carries_id_command() {
        let id = CommandId::new("1234").expect("non-empty");
        let cmd = Command::new(CommandKind::OpenShift(ShiftParams::default())).with_id(id);
        let value = serde_json::to_value(&cmd).expect("serialise");
        assert_eq!(value["Command"], "OpenShift");
        assert_eq!(value["IdCommand"], "1234");
        assert_eq!(value["CashierName"], DEFAULT_CASHIER_NAME);
        assert_eq!(value["CashierVATIN"], DEFAULT_CASHIER_VATIN);
        assert_eq!(value["IdDevice"], "");
    }

    #[test]
    fn get_result_uses_server_spelling() {
        let id = CommandId::new("abc").expect("non-empty");
        let value = serde_json::to_value(Command::get_result(id)).expect("serialise");
        assert_eq!(value, json!({ "Command": "GetRezult", "IdCommand": "abc" }));
    }

    #[test]
    fn with_id_never_replaces_an_existing_id() {
        let first = CommandId::new("first").expect("non-empty");
        let second = CommandId::new("second").expect("non-empty");
        let cmd = Command::get_result(first.clone()).with_id(second);
        assert_eq!(cmd.id(), Some(&first));
    }

    #[test]
    fn timeout_is_sent_only_when_set() {
        let cmd = Command::new(CommandKind::GetResult);
        let value = serde_json::to_value(&cmd).expect("serialise");
        assert!(value.get("Timeout").is_none());

        let value = serde_json::to_value(cmd.with_timeout_secs(90)).expect("serialise");
        assert_eq!(value["Timeout"], 90);
    }

    #[test]
    fn card_reversal_round_trips_through_json() {
        let cmd = Command::new(CommandKind::ReturnPaymentByPaymentCard(CardReversal {
            device: DeviceNumber::new(2),
            inn: String::new(),
            amount: 150.5,
            universal_id: UniversalId::new("CN:1;RN:2").expect("non-empty"),
        }));
        let text = serde_json::to_string(&cmd).expect("serialise");
        let back: Command = serde_json::from_str(&text).expect("deserialise");
        assert_eq!(back, cmd);
        assert_eq!(back.name(), "ReturnPaymentByPaymentCard");
    }

    #[test]
    fn check_strings_use_variant_keys() {
        let line = CheckString::BarCode(BarCode {
            kind: BarcodeType::Qr,
            value: "https://example.com".into(),
        });
        let value = serde_json::to_value(line).expect("serialise");
        assert_eq!(
            value,
            json!({ "BarCode": { "BarcodeType": "QR", "Barcode": "https://example.com" } })
        );
    }

    #[test]
    fn only_card_payment_is_a_payment() {
        let pay = CommandKind::PayByPaymentCard(CardPayment {
            device: DeviceNumber::ANY,
            inn: String::new(),
            amount: 1.0,
            receipt_number: "r".into(),
        });
        assert!(pay.is_payment());
        assert!(!CommandKind::GetResult.is_payment());
        assert!(CommandKind::GetResult.is_status_query());
    }
}
