//! Typed device operations built on [`KkmClient::execute`] and
//! [`KkmClient::execute_with_polling`].

use protocol::{
    CardPayment, CardReversal, Command, CommandKind, DeviceNumber, KkmError, ListDevices,
    PollingPolicy, RegisterCheck, Response, ShiftParams,
};

use crate::KkmClient;

/// Device timeout, in seconds, sent with every `RegisterCheck`.
const REGISTER_CHECK_TIMEOUT_SECS: u64 = 30;

/// A card payment request. `receipt_number` defaults to `TEST-<unix millis>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CardPaymentRequest {
    pub device: DeviceNumber,
    pub inn: String,
    pub amount: f64,
    pub receipt_number: Option<String>,
}

impl CardPaymentRequest {
    pub fn new(amount: f64) -> Self {
        Self {
            device: DeviceNumber::ANY,
            inn: String::new(),
            amount,
            receipt_number: None,
        }
    }

    fn into_payment(self) -> CardPayment {
        CardPayment {
            device: self.device,
            inn: self.inn,
            amount: self.amount,
            receipt_number: self.receipt_number.unwrap_or_else(|| {
                format!("TEST-{}", chrono::Utc::now().timestamp_millis())
            }),
        }
    }
}

impl KkmClient {
    /// Lists devices registered in the server. Answered synchronously.
    pub async fn list_devices(&self, filter: ListDevices) -> Result<Response, KkmError> {
        self.execute(Command::new(CommandKind::List(filter))).await
    }

    pub async fn open_shift(&self, params: ShiftParams) -> Result<Response, KkmError> {
        self.polled(Command::new(CommandKind::OpenShift(params))).await
    }

    pub async fn close_shift(&self, params: ShiftParams) -> Result<Response, KkmError> {
        self.polled(Command::new(CommandKind::CloseShift(params))).await
    }

    /// Charges a card. Polls with [`PollingPolicy::PAYMENT`]: the cardholder
    /// may need a while at the terminal.
    pub async fn pay_by_card(&self, request: CardPaymentRequest) -> Result<Response, KkmError> {
        self.polled(Command::new(CommandKind::PayByPaymentCard(request.into_payment())))
            .await
    }

    /// Refunds an earlier card payment identified by its `UniversalID`.
    pub async fn return_card_payment(&self, reversal: CardReversal) -> Result<Response, KkmError> {
        self.polled(Command::new(CommandKind::ReturnPaymentByPaymentCard(reversal)))
            .await
    }

    /// Voids an earlier card payment identified by its `UniversalID`.
    pub async fn cancel_card_payment(&self, reversal: CardReversal) -> Result<Response, KkmError> {
        self.polled(Command::new(CommandKind::CancelPaymentByPaymentCard(reversal)))
            .await
    }

    pub async fn register_check(&self, check: RegisterCheck) -> Result<Response, KkmError> {
        let command = Command::new(CommandKind::RegisterCheck(Box::new(check)))
            .with_timeout_secs(REGISTER_CHECK_TIMEOUT_SECS);
        self.polled(command).await
    }

    async fn polled(&self, command: Command) -> Result<Response, KkmError> {
        let policy = PollingPolicy::for_command(&command);
        self.execute_with_polling(command, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_number_defaults_to_timestamp() {
        let payment = CardPaymentRequest::new(10.0).into_payment();
        assert!(payment.receipt_number.starts_with("TEST-"), "{}", payment.receipt_number);
        assert!(payment.receipt_number["TEST-".len()..]
            .chars()
            .all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn explicit_receipt_number_is_kept() {
        let request = CardPaymentRequest {
            receipt_number: Some("R-42".into()),
            ..CardPaymentRequest::new(10.0)
        };
        assert_eq!(request.into_payment().receipt_number, "R-42");
    }
}
