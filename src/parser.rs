//! Payload validation.
//!
//! Unlike encoding, validation never fails: every problem found is collected into a
//! [`ValidationReport`] so a scanned code can be explained to the user.

use std::panic::{self, AssertUnwindSafe};

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    crc,
    payment::{
        QrType, ADDITIONAL_DATA_TAG, ALIAS_SUB_TAG, AMOUNT_TAG, CHECKSUM_TAG, COUNTRY_CODE_TAG,
        FORMAT_INDICATOR, FORMAT_INDICATOR_TAG, MERCHANT_ACCOUNT_TAG, MERCHANT_CHANNEL_SUB_TAG,
        REFERENCE_LABEL_SUB_TAG,
    },
    tlv::{self, SegmentMap, TlvError},
    PaymentRequest,
};

/// Format indicator plus the checksum segment header and value.
pub const MIN_PAYLOAD_LEN: usize = 12;

const CHECKSUM_LEN: usize = 4;

/// A single problem found in a payload.
///
/// Displayed as the message shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Finding {
    #[error("payload must be a non-empty string")]
    EmptyPayload,

    #[error("payload too short to contain EMV segments")]
    PayloadTooShort,

    #[error("{0}")]
    Structure(TlvError),

    #[error("payload analysis error: {0}")]
    Analysis(String),

    #[error("tag 00 (format indicator) missing")]
    FormatIndicatorMissing,

    #[error("tag 00 invalid (must be 01)")]
    InvalidFormatIndicator,

    #[error("tag 36 (merchant account information) missing")]
    MerchantInfoMissing,

    #[error("merchant information analysis error: {0}")]
    MerchantInfo(TlvError),

    #[error("alias missing in merchant information (tag 36)")]
    AliasMissing,

    #[error("tag 58 (country code) missing")]
    CountryCodeMissing,

    #[error("tag 62 (additional data field) missing")]
    AdditionalDataMissing,

    #[error("additional data analysis error: {0}")]
    AdditionalData(TlvError),

    #[error("tag 05 (reference label) missing in additional data")]
    ReferenceLabelMissing,

    #[error("tag 11 (merchant channel) missing in additional data")]
    MerchantChannelMissing,

    #[error("tag 63 (checksum) missing")]
    ChecksumMissing,

    #[error("invalid checksum")]
    InvalidChecksum,
}

impl Serialize for Finding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of [`validate`].
///
/// `data` is only present when `errors` is empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PaymentRequest>,
}

impl ValidationReport {
    fn valid(data: PaymentRequest) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            data: Some(data),
        }
    }

    fn invalid(errors: Vec<Finding>) -> Self {
        Self {
            valid: false,
            errors,
            data: None,
        }
    }

    /// Error messages in the order they were found.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn has(&self, finding: &Finding) -> bool {
        self.errors.contains(finding)
    }
}

/// Validates a PI-SPI payload and recovers its payment fields.
///
/// Empty or too short input and a broken segment stream stop the analysis. Otherwise
/// every content check runs and all findings are reported together, in the order
/// format indicator, merchant information, country, additional data, checksum.
pub fn validate(payload: &str) -> ValidationReport {
    let report = guarded(|| analyze(payload));

    debug!(
        valid = report.valid,
        errors = report.errors.len(),
        "validated PI-SPI payload"
    );

    report
}

/// Runs `analysis`, turning a panic into a single [`Finding::Analysis`].
fn guarded(analysis: impl FnOnce() -> ValidationReport) -> ValidationReport {
    panic::catch_unwind(AssertUnwindSafe(analysis)).unwrap_or_else(|cause| {
        let message = cause
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| cause.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown failure".into());

        warn!(%message, "PI-SPI payload analysis aborted");
        ValidationReport::invalid(vec![Finding::Analysis(message)])
    })
}

fn analyze(payload: &str) -> ValidationReport {
    if payload.is_empty() {
        return ValidationReport::invalid(vec![Finding::EmptyPayload]);
    }
    if payload.chars().count() < MIN_PAYLOAD_LEN {
        return ValidationReport::invalid(vec![Finding::PayloadTooShort]);
    }

    let segments = match tlv::parse_segments(payload) {
        Ok(segments) => segments,
        Err(err) => return ValidationReport::invalid(vec![Finding::Structure(err)]),
    };

    let content = SegmentContent::check(&segments, payload);
    if !content.errors.is_empty() {
        return ValidationReport::invalid(content.errors);
    }

    ValidationReport::valid(content.into_request(&segments))
}

/// Fields extracted while checking segment contents.
#[derive(Debug, Default)]
struct SegmentContent {
    errors: Vec<Finding>,
    alias: Option<String>,
    country_code: Option<String>,
    reference_label: Option<String>,
    merchant_channel: Option<String>,
}

impl SegmentContent {
    fn check(segments: &SegmentMap, payload: &str) -> Self {
        let mut content = Self::default();

        content.check_format_indicator(present(segments, FORMAT_INDICATOR_TAG));
        content.check_merchant_info(present(segments, MERCHANT_ACCOUNT_TAG));
        content.check_country_code(present(segments, COUNTRY_CODE_TAG));
        content.check_additional_data(present(segments, ADDITIONAL_DATA_TAG));
        content.check_checksum(present(segments, CHECKSUM_TAG), payload);

        content
    }

    fn check_format_indicator(&mut self, value: Option<&str>) {
        match value {
            None => self.errors.push(Finding::FormatIndicatorMissing),
            Some(value) if value != FORMAT_INDICATOR => {
                self.errors.push(Finding::InvalidFormatIndicator)
            }
            Some(_) => {}
        }
    }

    fn check_merchant_info(&mut self, value: Option<&str>) {
        let Some(value) = value else {
            self.errors.push(Finding::MerchantInfoMissing);
            return;
        };

        match tlv::parse_segments(value) {
            Ok(merchant_info) => {
                self.alias = present(&merchant_info, ALIAS_SUB_TAG).map(Into::into);
                if self.alias.is_none() {
                    self.errors.push(Finding::AliasMissing);
                }
            }
            Err(err) => self.errors.push(Finding::MerchantInfo(err)),
        }
    }

    fn check_country_code(&mut self, value: Option<&str>) {
        self.country_code = value.map(Into::into);
        if self.country_code.is_none() {
            self.errors.push(Finding::CountryCodeMissing);
        }
    }

    fn check_additional_data(&mut self, value: Option<&str>) {
        let Some(value) = value else {
            self.errors.push(Finding::AdditionalDataMissing);
            return;
        };

        match tlv::parse_segments(value) {
            Ok(additional) => {
                self.reference_label =
                    present(&additional, REFERENCE_LABEL_SUB_TAG).map(Into::into);
                self.merchant_channel =
                    present(&additional, MERCHANT_CHANNEL_SUB_TAG).map(Into::into);

                if self.reference_label.is_none() {
                    self.errors.push(Finding::ReferenceLabelMissing);
                }
                if self.merchant_channel.is_none() {
                    self.errors.push(Finding::MerchantChannelMissing);
                }
            }
            Err(err) => self.errors.push(Finding::AdditionalData(err)),
        }
    }

    fn check_checksum(&mut self, value: Option<&str>, payload: &str) {
        let Some(value) = value else {
            self.errors.push(Finding::ChecksumMissing);
            return;
        };

        let covered_len = payload.chars().count().saturating_sub(CHECKSUM_LEN);
        let covered: String = payload.chars().take(covered_len).collect();

        if crc::checksum(&covered) != value {
            self.errors.push(Finding::InvalidChecksum);
        }
    }

    fn into_request(self, segments: &SegmentMap) -> PaymentRequest {
        let channel = self.merchant_channel.unwrap_or_default();
        let qr_type = QrType::from_merchant_channel(&channel);
        if qr_type == QrType::Static && channel.trim() != QrType::Static.merchant_channel() {
            warn!(%channel, "unknown merchant channel, reading payload as STATIC");
        }

        PaymentRequest {
            alias: self.alias.unwrap_or_default(),
            country_code: self.country_code.unwrap_or_default(),
            qr_type,
            reference_label: self.reference_label.unwrap_or_default(),
            amount: segments.get(AMOUNT_TAG).cloned(),
        }
    }
}

/// Value of `tag`, treating an empty value as absent.
fn present<'a>(segments: &'a SegmentMap, tag: &str) -> Option<&'a str> {
    segments
        .get(tag)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}
