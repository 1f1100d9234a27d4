//! Canned device list and per-command response generators.
//!
//! Every generator takes the RNG explicitly so a seeded emulator produces
//! the same sequence of responses run after run.

use chrono::{SecondsFormat, Utc};
use protocol::{
    CardPayment, CardReversal, CommandId, DeviceInfo, DeviceNumber, KkmStatus, ListDevices,
    RegisterCheck, Response, ShiftParams, UniversalId,
};
use rand::Rng;

const FISCAL_DRIVE: &str = "9999078900002838";
const OFD_DOCUMENT_URL: &str =
    "https://ofd-ya.ru/getFiscalDoc?kktRegId=0000000000061716&fiscalSign=839499349";
const NEVER: &str = "0001-01-01T00:00:00";

const PAYMENT_ERRORS: [&str; 4] = [
    "Карта не читается",
    "Отклонено банком",
    "Недостаточно средств",
    "Терминал недоступен",
];

pub(crate) const NOT_FOUND_MESSAGE: &str = "Команда не найдена или уже выполнена";
pub(crate) const STARTED_MESSAGE: &str = "Команда запущена на выполнение";

/// A fiscal register and an inactive payment terminal.
pub(crate) fn device_list() -> Vec<DeviceInfo> {
    let added = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    vec![
        DeviceInfo {
            device: DeviceNumber::new(1),
            device_id: "6a6151a5-b352-485c-8f01-45da05d3df18".into(),
            on_off: true,
            active: true,
            type_device: "Фискальный регистратор".into(),
            type_device_id: "KkmStrihM".into(),
            ip: "192.168.1.100".into(),
            name: "ШТРИХ-М-ПТК".into(),
            kkt_number: "123456789".into(),
            inn: "123456789012".into(),
            tax_variant: "ОСН".into(),
            add_date: added.clone(),
            ofd_date_error_doc: NEVER.into(),
            fn_date_end: "2025-12-31T23:59:59".into(),
            fn_is_fiscal: true,
            ..DeviceInfo::default()
        },
        DeviceInfo {
            device: DeviceNumber::new(2),
            device_id: "7b7252b6-c463-596d-9g12-56eb16e4eg29".into(),
            on_off: true,
            active: false,
            type_device: "Платежный терминал".into(),
            type_device_id: "PaymentTerminal".into(),
            ip: "192.168.1.101".into(),
            name: "Эквайринговый терминал".into(),
            add_date: added,
            ofd_date_error_doc: NEVER.into(),
            fn_date_end: NEVER.into(),
            ..DeviceInfo::default()
        },
    ]
}

/// Completed response skeleton echoing the command name and id.
fn answer(status: KkmStatus, command: &str, id: Option<&CommandId>) -> Response {
    Response {
        command: Some(command.to_string()),
        command_id: id.cloned(),
        ..Response::with_status(status)
    }
}

fn failure(command: &str, id: Option<&CommandId>, error: &str) -> Response {
    Response {
        error: error.to_string(),
        ..answer(KkmStatus::Error, command, id)
    }
}

/// Devices without an explicit number answer as device 1.
fn answering_device(device: DeviceNumber) -> DeviceNumber {
    if device.is_any() {
        DeviceNumber::new(1)
    } else {
        device
    }
}

fn qr_code(rng: &mut impl Rng, sum: &str) -> String {
    format!(
        "t={}&s={sum}&fn={FISCAL_DRIVE}&i={}&fp={}",
        Utc::now().format("%Y%m%dT%H%M%S"),
        rng.gen_range(0..1_000),
        rng.gen_range(0..999_999_999u64),
    )
}

pub(crate) fn list(filter: &ListDevices) -> Response {
    let devices = device_list()
        .into_iter()
        .filter(|d| filter.device.is_any() || d.device == filter.device)
        .filter(|d| d.active == filter.active)
        .filter(|d| d.on_off == filter.on_off)
        .collect();
    Response {
        message: Some(String::new()),
        command: Some("List".into()),
        devices: Some(devices),
        ..Response::with_status(KkmStatus::Ok)
    }
}

/// `OpenShift` / `CloseShift`.
pub(crate) fn shift(
    rng: &mut impl Rng,
    error_rate: f64,
    opening: bool,
    params: &ShiftParams,
    id: Option<&CommandId>,
) -> Response {
    let (command, error, message) = if opening {
        ("OpenShift", "Смена уже открыта", "Смена успешно открыта")
    } else {
        ("CloseShift", "Смена не была открыта", "Смена успешно закрыта")
    };
    if rng.gen_bool(error_rate.clamp(0.0, 1.0)) {
        return failure(command, id, error);
    }
    Response {
        message: Some(message.into()),
        check_number: Some(rng.gen_range(1..=1_000)),
        session_number: Some(rng.gen_range(1..=100)),
        qr_code: Some(qr_code(rng, "0.00")),
        device: Some(answering_device(params.device)),
        ..answer(KkmStatus::Ok, command, id)
    }
}

pub(crate) fn payment(
    rng: &mut impl Rng,
    error_rate: f64,
    payment: &CardPayment,
    id: Option<&CommandId>,
) -> Response {
    const COMMAND: &str = "PayByPaymentCard";
    if rng.gen_bool(error_rate.clamp(0.0, 1.0)) {
        let error = PAYMENT_ERRORS[rng.gen_range(0..PAYMENT_ERRORS.len())];
        return Response {
            device: Some(answering_device(payment.device)),
            ..failure(COMMAND, id, error)
        };
    }

    let card = format!("1254********{}", rng.gen_range(1_000..=9_999));
    let rrn: u64 = rng.gen_range(1_000_000_000..=9_999_999_999);
    let auth_code = rng.gen_range(100_000..=999_999);
    let slip = format!(
        "====================================\n\
         Организация: ООО Тестовая организация\n\
         ИНН: 123456789012\n\
         Терминал: 21094544\n\
         Мерчант: 781000055557\n\
         ------------------------------------\n \
         ОПЛАТА \n\
         Карта: Visa Credit\n\
         Номер: {card}\n\
         Сумма (руб): {amount}\n\
         ------------------------------------\n\
         Статус: Одобрено\n\
         Код авторизации: {auth_code}\n\
         Номер ссылки: {rrn}\n\
         Номер чека: {receipt}\n\
         ====================================",
        amount = payment.amount,
        receipt = rng.gen_range(0..100),
    );
    let universal_id = format!(
        "CN:{card};RN:{};RRN:{rrn};AC:{auth_code}",
        rng.gen_range(0..100)
    );

    Response {
        message: Some("Платеж успешно выполнен".into()),
        universal_id: UniversalId::new(universal_id),
        amount: Some(payment.amount),
        slip: Some(slip),
        device: Some(answering_device(payment.device)),
        ..answer(KkmStatus::Ok, COMMAND, id)
    }
}

/// `ReturnPaymentByPaymentCard` / `CancelPaymentByPaymentCard`. Always succeeds.
pub(crate) fn reversal(refund: bool, reversal: &CardReversal, id: Option<&CommandId>) -> Response {
    let (command, message, slip) = if refund {
        ("ReturnPaymentByPaymentCard", "Возврат успешно выполнен", "Чек возврата...")
    } else {
        ("CancelPaymentByPaymentCard", "Отмена успешно выполнена", "Чек отмены...")
    };
    Response {
        message: Some(message.into()),
        universal_id: Some(reversal.universal_id.clone()),
        amount: Some(reversal.amount),
        slip: Some(slip.into()),
        device: Some(answering_device(reversal.device)),
        ..answer(KkmStatus::Ok, command, id)
    }
}

pub(crate) fn register_check(
    rng: &mut impl Rng,
    error_rate: f64,
    check: &RegisterCheck,
    id: Option<&CommandId>,
) -> Response {
    const COMMAND: &str = "RegisterCheck";
    if rng.gen_bool(error_rate.clamp(0.0, 1.0)) {
        return failure(COMMAND, id, "Закончилась бумага в принтере");
    }
    Response {
        message: Some("Чек успешно напечатан".into()),
        check_number: Some(rng.gen_range(1..=1_000)),
        session_number: Some(rng.gen_range(1..=100)),
        session_check_number: Some(rng.gen_range(1..=50)),
        url: Some(OFD_DOCUMENT_URL.into()),
        qr_code: Some(qr_code(rng, &check.cash.to_string())),
        cash: Some(check.cash),
        electronic_payment: Some(check.electronic_payment),
        device: Some(answering_device(check.device)),
        ..answer(KkmStatus::Ok, COMMAND, id)
    }
}

/// Interim answer for a command still running on the device.
pub(crate) fn running(command: &str, id: &CommandId) -> Response {
    Response {
        message: Some(STARTED_MESSAGE.into()),
        ..answer(KkmStatus::Run, command, Some(id))
    }
}

pub(crate) fn not_found(id: Option<&CommandId>) -> Response {
    Response {
        error: NOT_FOUND_MESSAGE.into(),
        ..answer(KkmStatus::NotFound, "GetRezult", id)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn id() -> CommandId {
        CommandId::new("id-1").expect("non-empty")
    }

    #[test]
    fn default_filter_lists_only_the_active_register() {
        let r = list(&ListDevices::default());
        let devices = r.devices.expect("ListUnit");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device, DeviceNumber::new(1));
    }

    #[test]
    fn inactive_filter_lists_the_terminal() {
        let filter = ListDevices {
            active: false,
            ..ListDevices::default()
        };
        let devices = list(&filter).devices.expect("ListUnit");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Эквайринговый терминал");
    }

    #[test]
    fn device_number_filter_excludes_other_devices() {
        let filter = ListDevices {
            device: DeviceNumber::new(2),
            ..ListDevices::default()
        };
        assert!(list(&filter).devices.expect("ListUnit").is_empty());
    }

    #[test]
    fn certain_shift_failure_reports_error_status() {
        let mut rng = StdRng::seed_from_u64(1);
        let r = shift(&mut rng, 1.0, true, &ShiftParams::default(), Some(&id()));
        assert_eq!(r.status(), Some(KkmStatus::Error));
        assert_eq!(r.error, "Смена уже открыта");
        assert_eq!(r.command_id, Some(id()));
    }

    #[test]
    fn successful_shift_defaults_to_device_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let r = shift(&mut rng, 0.0, false, &ShiftParams::default(), Some(&id()));
        assert!(r.is_ok());
        assert_eq!(r.command.as_deref(), Some("CloseShift"));
        assert_eq!(r.device, Some(DeviceNumber::new(1)));
        assert!(r.qr_code.expect("qr").contains("&s=0.00&fn=9999078900002838"));
    }

    #[test]
    fn approved_payment_has_universal_id_and_slip() {
        let mut rng = StdRng::seed_from_u64(7);
        let request = CardPayment {
            device: DeviceNumber::ANY,
            inn: String::new(),
            amount: 250.5,
            receipt_number: "R-1".into(),
        };
        let r = payment(&mut rng, 0.0, &request, Some(&id()));

        assert!(r.is_ok());
        assert_eq!(r.amount, Some(250.5));
        let uid = r.universal_id.expect("UniversalID");
        let parts: Vec<&str> = uid.as_str().split(';').collect();
        assert_eq!(parts.len(), 4);
        assert!(parts[0].starts_with("CN:1254********"));
        assert!(parts[1].starts_with("RN:"));
        assert!(parts[2].starts_with("RRN:"));
        assert!(parts[3].starts_with("AC:"));
        assert!(r.slip.expect("slip").contains("Сумма (руб): 250.5"));
    }

    #[test]
    fn declined_payment_uses_a_known_error() {
        let mut rng = StdRng::seed_from_u64(7);
        let request = CardPayment {
            device: DeviceNumber::new(3),
            inn: String::new(),
            amount: 1.0,
            receipt_number: "R-1".into(),
        };
        let r = payment(&mut rng, 1.0, &request, None);
        assert_eq!(r.status(), Some(KkmStatus::Error));
        assert!(PAYMENT_ERRORS.contains(&r.error.as_str()), "{}", r.error);
        assert_eq!(r.device, Some(DeviceNumber::new(3)));
    }

    #[test]
    fn register_check_echoes_payment_totals() {
        let mut rng = StdRng::seed_from_u64(3);
        let check = RegisterCheck {
            cash: 100.0,
            electronic_payment: 20.0,
            ..RegisterCheck::default()
        };
        let r = register_check(&mut rng, 0.0, &check, Some(&id()));
        assert_eq!(r.cash, Some(100.0));
        assert_eq!(r.electronic_payment, Some(20.0));
        assert!(r.url.is_some());
        let session_check = r.session_check_number.expect("SessionCheckNumber");
        assert!((1..=50).contains(&session_check));
    }

    #[test]
    fn same_seed_same_responses() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let params = ShiftParams::default();
        let ra = shift(&mut a, 0.5, true, &params, None);
        let rb = shift(&mut b, 0.5, true, &params, None);
        assert_eq!(ra.status_code, rb.status_code);
        assert_eq!(ra.check_number, rb.check_number);
        assert_eq!(ra.session_number, rb.session_number);
    }
}
