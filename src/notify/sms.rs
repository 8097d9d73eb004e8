// src/notify/sms.rs
//
// Order-confirmation SMS through an HTTP gateway. Phone numbers are
// normalized to the canonical +216 form before dispatch; anything that does
// not normalize is skipped silently rather than treated as a failure.

use serde::Deserialize;
use serde_json::json;
use std::fmt;

use crate::config::SmsConfig;
use crate::models::Order;

pub const COUNTRY_CODE: &str = "216";

/// Leading digits of valid Tunisian mobile numbers.
pub const ALLOWED_LEADING_DIGITS: [char; 5] = ['2', '3', '4', '5', '9'];

/// Normalizes a raw phone input to `+216XXXXXXXX`. Accepts local 8-digit
/// numbers, `216`-prefixed, `+216`-prefixed and `00`-prefixed forms; returns
/// None for anything that is not an 8-digit national number with an allowed
/// leading digit.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut national = digits.as_str();
    if let Some(rest) = national.strip_prefix("00") {
        national = rest;
    }
    if let Some(rest) = national.strip_prefix(COUNTRY_CODE) {
        if rest.len() == 8 {
            national = rest;
        }
    }
    let national = national.trim_start_matches('0');

    if national.len() != 8 {
        return None;
    }

    let leading = national.chars().next()?;
    if !ALLOWED_LEADING_DIGITS.contains(&leading) {
        return None;
    }

    Some(format!("+{COUNTRY_CODE}{national}"))
}

pub fn confirmation_message(order_id: i32, total_price: &str) -> String {
    format!(
        "EventPass: order #{order_id} confirmed, total {total_price} TND. \
         Your tickets were sent by email - check your spam folder."
    )
}

#[derive(Debug)]
pub enum SmsError {
    Http(reqwest::Error),
    Gateway { status: u16, body: String },
}

impl fmt::Display for SmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmsError::Http(e) => write!(f, "sms http error: {e}"),
            SmsError::Gateway { status, body } => {
                write!(f, "sms gateway error status={status} body={body}")
            }
        }
    }
}

impl From<reqwest::Error> for SmsError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    code: Option<i32>,
    #[serde(default)]
    message: Option<String>,
}

/// The gateway answers 200 with a JSON body carrying its own status code;
/// only code 200 counts as accepted.
pub async fn send_sms(config: &SmsConfig, to: &str, message: &str) -> Result<(), SmsError> {
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/messages", config.base_url.trim_end_matches('/')))
        .header("X-Api-Key", &config.api_key)
        .json(&json!({
            "from": config.sender,
            "to": to,
            "text": message,
        }))
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(SmsError::Gateway {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: GatewayResponse = serde_json::from_str(&body).unwrap_or(GatewayResponse {
        code: None,
        message: None,
    });

    if parsed.code != Some(200) {
        return Err(SmsError::Gateway {
            status: status.as_u16(),
            body: parsed.message.unwrap_or(body),
        });
    }

    Ok(())
}

/// Sends the confirmation for one order. Ok(false) means the order had no
/// usable phone number and the SMS was skipped.
pub async fn send_confirmation(config: &SmsConfig, order: &Order) -> Result<bool, String> {
    let Some(raw_phone) = order.buyer_phone.as_deref() else {
        return Ok(false);
    };

    let Some(phone) = normalize_phone(raw_phone) else {
        log::info!("sms skipped for order_id={}: unusable phone", order.id);
        return Ok(false);
    };

    let message = confirmation_message(order.id, &order.total_price);

    send_sms(config, &phone, &message)
        .await
        .map_err(|e| e.to_string())?;

    Ok(true)
}
