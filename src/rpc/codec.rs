//! Protobuf messages and payload helpers for the distribution module's
//! `ValidatorCommission` ABCI query.

use crate::domain::DecCoin;
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use prost::Message;

/// gRPC route of the distribution query, routed through `abci_query`.
pub const VALIDATOR_COMMISSION_PATH: &str =
    "/cosmos.distribution.v1beta1.Query/ValidatorCommission";

/// Fractional digits carried by the ledger's `LegacyDec` amounts.
const LEGACY_DEC_PRECISION: usize = 18;

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorCommissionRequest {
    #[prost(string, tag = "1")]
    pub validator_address: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryValidatorCommissionResponse {
    #[prost(message, optional, tag = "1")]
    pub commission: Option<ValidatorAccumulatedCommission>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ValidatorAccumulatedCommission {
    #[prost(message, repeated, tag = "1")]
    pub commission: Vec<ProtoDecCoin>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoDecCoin {
    #[prost(string, tag = "1")]
    pub denom: String,
    #[prost(string, tag = "2")]
    pub amount: String,
}

/// Hex-encodes the request body expected in the `data` param of `abci_query`.
pub fn encode_commission_request(operator_address: &str) -> String {
    let request = QueryValidatorCommissionRequest {
        validator_address: operator_address.to_owned(),
    };
    hex::encode(request.encode_to_vec())
}

/// Decodes the base64 `value` of an `abci_query` response into domain coins.
///
/// An empty payload is a valid encoding of a validator with no accrued commission.
pub fn decode_commission_response(value: &str) -> Result<Vec<DecCoin>> {
    let bytes = BASE64_STANDARD
        .decode(value.trim())
        .context("commission payload is not valid base64")?;
    let response = QueryValidatorCommissionResponse::decode(bytes.as_slice())
        .context("failed to decode QueryValidatorCommissionResponse")?;

    response
        .commission
        .map(|accumulated| accumulated.commission)
        .unwrap_or_default()
        .into_iter()
        .map(|coin| {
            let amount = legacy_dec_to_decimal(&coin.amount)
                .with_context(|| format!("invalid commission amount for {}", coin.denom))?;
            Ok(DecCoin::new(coin.denom, amount))
        })
        .collect()
}

/// Renders a `LegacyDec` wire value (an integer scaled by 10^18) as a
/// fixed-point decimal string. Values that already carry a decimal point are
/// passed through after validation.
pub fn legacy_dec_to_decimal(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    if digits.is_empty() {
        bail!("empty decimal amount");
    }

    if digits.contains('.') {
        let mut parts = digits.splitn(2, '.');
        let whole = parts.next().unwrap_or_default();
        let fraction = parts.next().unwrap_or_default();
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            bail!("malformed decimal amount '{raw}'");
        }
        return Ok(raw.to_owned());
    }

    if !all_digits(digits) {
        bail!("malformed decimal amount '{raw}'");
    }

    let padded = format!("{digits:0>width$}", width = LEGACY_DEC_PRECISION + 1);
    let split = padded.len() - LEGACY_DEC_PRECISION;
    let (whole, fraction) = padded.split_at(split);
    let whole = whole.trim_start_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };
    let sign = if negative { "-" } else { "" };

    Ok(format!("{sign}{whole}.{fraction}"))
}

fn all_digits(value: &str) -> bool {
    value.bytes().all(|byte| byte.is_ascii_digit())
}
