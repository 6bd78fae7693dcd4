use core::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    crc,
    custom::AdditionalData,
    tlv::{self, format_segment, write_segment},
    validators,
    Error,
};

pub const FORMAT_INDICATOR_TAG: &str = "00";
pub const MERCHANT_ACCOUNT_TAG: &str = "36";
pub const MERCHANT_CATEGORY_TAG: &str = "52";
pub const CURRENCY_TAG: &str = "53";
pub const AMOUNT_TAG: &str = "54";
pub const COUNTRY_CODE_TAG: &str = "58";
pub const MERCHANT_NAME_TAG: &str = "59";
pub const MERCHANT_CITY_TAG: &str = "60";
pub const ADDITIONAL_DATA_TAG: &str = "62";
pub const CHECKSUM_TAG: &str = "63";

/// Sub-tags of the merchant account information template (`36`).
pub const GUID_SUB_TAG: &str = "00";
pub const ALIAS_SUB_TAG: &str = "01";

/// Sub-tags of the additional data template (`62`).
pub const REFERENCE_LABEL_SUB_TAG: &str = "05";
pub const MERCHANT_CHANNEL_SUB_TAG: &str = "11";

pub const FORMAT_INDICATOR: &str = "01";
pub const GLOBALLY_UNIQUE_IDENTIFIER: &str = "int.bceao.pi";
pub const MERCHANT_CATEGORY_CODE: &str = "0000";
/// XOF
pub const CURRENCY: &str = "952";
pub const MERCHANT_NAME: &str = "X";
pub const MERCHANT_CITY: &str = "X";

/// Checksum tag followed by its fixed length, the part of segment `63` covered by the sum.
pub const CHECKSUM_HEADER: &str = "6304";

/// Kind of QR code, carried on the wire as the merchant channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QrType {
    Static,
    Dynamic,
}

impl QrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QrType::Static => "STATIC",
            QrType::Dynamic => "DYNAMIC",
        }
    }

    /// Merchant channel value written to sub-tag `11`.
    pub fn merchant_channel(&self) -> &'static str {
        match self {
            QrType::Static => "000",
            QrType::Dynamic => "400",
        }
    }

    /// Only `400` means dynamic, anything else reads as static.
    pub fn from_merchant_channel(channel: &str) -> Self {
        if channel.trim() == "400" {
            QrType::Dynamic
        } else {
            QrType::Static
        }
    }
}

impl FromStr for QrType {
    type Err = Error;

    /// Trims and ignores case.
    fn from_str(val: &str) -> Result<Self, Self::Err> {
        match val.trim().to_ascii_uppercase().as_str() {
            "STATIC" => Ok(QrType::Static),
            "DYNAMIC" => Ok(QrType::Dynamic),
            _ => Err(Error::UnknownQrType(val.into())),
        }
    }
}

impl Display for QrType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction amount as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Integer(u64),
    Decimal(f64),
    Text(String),
}

impl Amount {
    /// Canonical digit string, `None` for empty text.
    pub fn normalize(&self) -> super::Result<Option<String>> {
        let digits = match self {
            Amount::Integer(value) => value.to_string(),
            Amount::Decimal(value) => {
                if !value.is_finite() || value.fract() != 0.0 || *value < 0.0 {
                    return Err(Error::AmountNotDigits);
                }
                if *value == 0.0 {
                    "0".into()
                } else {
                    format!("{value:.0}")
                }
            }
            Amount::Text(value) if value.is_empty() => return Ok(None),
            Amount::Text(value) => value.trim().into(),
        };

        validators::check_amount_digits(&digits)?;

        Ok(Some(digits))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::Integer(value)
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Amount::Integer(value.into())
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Decimal(value)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::Text(value.into())
    }
}

impl From<String> for Amount {
    fn from(value: String) -> Self {
        Amount::Text(value)
    }
}

/// Raw payment fields as handed over by a caller, checked only when encoded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentInput {
    /// UUID v4 alias of the merchant.
    pub alias: String,

    /// ISO2 code of a UEMOA country.
    pub country_code: String,

    /// `STATIC` or `DYNAMIC`, case-insensitive.
    pub qr_type: String,

    /// 1 to 25 characters.
    pub reference_label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
}

impl PaymentInput {
    /// Builder over the mandatory fields.
    pub fn builder(
        alias: impl Into<String>,
        country_code: impl Into<String>,
        qr_type: impl Into<String>,
        reference_label: impl Into<String>,
    ) -> PaymentBuilder {
        PaymentBuilder {
            input: PaymentInput {
                alias: alias.into(),
                country_code: country_code.into(),
                qr_type: qr_type.into(),
                reference_label: reference_label.into(),
                amount: None,
            },
            options: PayloadOptions::default(),
        }
    }

    /// Checks every field in wire order and returns the typed request.
    ///
    /// The first violated rule is reported.
    pub fn validate(&self) -> super::Result<PaymentRequest> {
        if self.alias.is_empty() {
            return Err(Error::AliasMissing);
        }
        if !validators::is_uuid_v4(&self.alias) {
            return Err(Error::InvalidAlias);
        }

        if self.country_code.is_empty() {
            return Err(Error::CountryCodeMissing);
        }
        if !validators::is_supported_country(&self.country_code) {
            return Err(Error::UnsupportedCountry(self.country_code.clone()));
        }

        if self.qr_type.is_empty() {
            return Err(Error::QrTypeMissing);
        }
        let qr_type = self.qr_type.parse::<QrType>()?;

        if self.reference_label.is_empty() {
            return Err(Error::ReferenceLabelMissing);
        }
        if !validators::is_valid_reference_label(&self.reference_label) {
            return Err(Error::ReferenceLabelTooLong(
                self.reference_label.chars().count(),
            ));
        }

        let amount = match &self.amount {
            Some(amount) => amount.normalize()?,
            None => None,
        };

        Ok(PaymentRequest {
            alias: self.alias.clone(),
            country_code: self.country_code.clone(),
            qr_type,
            reference_label: self.reference_label.clone(),
            amount,
        })
    }
}

impl From<PaymentRequest> for PaymentInput {
    fn from(request: PaymentRequest) -> Self {
        PaymentInput {
            alias: request.alias,
            country_code: request.country_code,
            qr_type: request.qr_type.as_str().into(),
            reference_label: request.reference_label,
            amount: request.amount.map(Amount::Text),
        }
    }
}

/// Options that do not belong to the payment itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PayloadOptions {
    pub additional_data: AdditionalData,
}

#[derive(Debug)]
pub struct PaymentBuilder {
    input: PaymentInput,
    options: PayloadOptions,
}

impl PaymentBuilder {
    pub fn with_amount(mut self, amount: impl Into<Amount>) -> Self {
        self.input.amount = Some(amount.into());
        self
    }

    /// Purpose of transaction, sub-tag `12` of template 62.
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.options.additional_data.purpose_of_transaction = Some(purpose.into());
        self
    }

    /// Custom template 62 sub-field. The tag is checked when encoding.
    pub fn with_custom(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .additional_data
            .custom
            .insert(tag.into(), value.into());
        self
    }

    pub fn build(self) -> (PaymentInput, PayloadOptions) {
        (self.input, self.options)
    }

    pub fn encode(self) -> super::Result<String> {
        encode_with(&self.input, &self.options)
    }
}

/// Payment fields recovered from a valid payload, or produced by
/// [`PaymentInput::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub alias: String,
    pub country_code: String,
    pub qr_type: QrType,
    pub reference_label: String,

    /// Canonical digit string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

impl PaymentRequest {
    fn write_to(&self, options: &PayloadOptions, buffer: &mut String) -> super::Result<()> {
        write_segment(buffer, FORMAT_INDICATOR_TAG, FORMAT_INDICATOR)?;

        let merchant_account = format_segment(GUID_SUB_TAG, GLOBALLY_UNIQUE_IDENTIFIER)?
            + &format_segment(ALIAS_SUB_TAG, &self.alias)?;
        write_segment(buffer, MERCHANT_ACCOUNT_TAG, &merchant_account)?;

        write_segment(buffer, MERCHANT_CATEGORY_TAG, MERCHANT_CATEGORY_CODE)?;
        write_segment(buffer, CURRENCY_TAG, CURRENCY)?;

        if let Some(amount) = &self.amount {
            write_segment(buffer, AMOUNT_TAG, amount)?;
        }

        write_segment(buffer, COUNTRY_CODE_TAG, &self.country_code)?;
        write_segment(buffer, MERCHANT_NAME_TAG, MERCHANT_NAME)?;
        write_segment(buffer, MERCHANT_CITY_TAG, MERCHANT_CITY)?;

        let mut additional = String::with_capacity(tlv::MAX_VALUE_LEN);
        write_segment(
            &mut additional,
            REFERENCE_LABEL_SUB_TAG,
            &self.reference_label,
        )?;
        write_segment(
            &mut additional,
            MERCHANT_CHANNEL_SUB_TAG,
            self.qr_type.merchant_channel(),
        )?;
        options.additional_data.write_to(&mut additional)?;
        write_segment(buffer, ADDITIONAL_DATA_TAG, &additional)?;

        // The checksum covers its own tag and length, never its value.
        buffer.push_str(CHECKSUM_HEADER);
        let checksum = crc::checksum(buffer);
        buffer.push_str(&checksum);

        Ok(())
    }
}

/// Builds the EMV payload for `input` with default options.
pub fn encode(input: &PaymentInput) -> super::Result<String> {
    encode_with(input, &PayloadOptions::default())
}

/// Builds the EMV payload for `input`.
///
/// Fields are checked before anything is written, see [`PaymentInput::validate`]. Custom
/// sub-tags and segment lengths are checked while writing.
pub fn encode_with(input: &PaymentInput, options: &PayloadOptions) -> super::Result<String> {
    let request = input.validate()?;

    let mut buffer = String::with_capacity(160);
    request.write_to(options, &mut buffer)?;

    debug!(
        qr_type = %request.qr_type,
        len = buffer.len(),
        "encoded PI-SPI payload"
    );

    Ok(buffer)
}
