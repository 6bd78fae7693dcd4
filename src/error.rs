use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a payload or rendering it.
///
/// Encoding stops at the first violated rule, so a call yields exactly one of these.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("parameter \"alias\" is required")]
    AliasMissing,

    #[error("alias must be a valid UUID v4")]
    InvalidAlias,

    #[error("parameter \"countryCode\" is required")]
    CountryCodeMissing,

    #[error("countryCode {0:?} must be one of the UEMOA ISO2 codes (BJ, BF, CI, ML, NE, SN, TG, GW)")]
    UnsupportedCountry(String),

    #[error("parameter \"qrType\" is required")]
    QrTypeMissing,

    #[error("parameter \"qrType\" must be \"STATIC\" or \"DYNAMIC\", got {0:?}")]
    UnknownQrType(String),

    #[error("parameter \"referenceLabel\" is required")]
    ReferenceLabelMissing,

    #[error("referenceLabel must not exceed 25 characters, got {0}")]
    ReferenceLabelTooLong(usize),

    #[error("amount must contain only digits")]
    AmountNotDigits,

    #[error("amount must not exceed 13 digits, got {0}")]
    AmountTooLong(usize),

    #[error("additional data sub-tag {0:?} must be exactly 2 alphanumeric characters")]
    InvalidSubTag(String),

    /// The value does not fit the two-digit length field.
    #[error("value of tag {tag} is {len} characters long, at most 99 fit in a segment")]
    SegmentTooLong { tag: String, len: usize },

    #[error("unexpected QR matrix format: {0}")]
    MatrixShape(String),

    #[error("no QR engine available")]
    EngineUnavailable,

    #[error("QR engine failure: {0}")]
    Engine(String),
}
