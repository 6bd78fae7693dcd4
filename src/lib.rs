//! Building and validating PI-SPI merchant QR payloads.
//!
//! Payloads follow the EMV merchant-presented QR layout used by the BCEAO instant payment
//! system: tag-length-value segments terminated by a CRC-16 checksum.
//!
//! ```
//! use pispi_qr::{validate, PaymentInput, QrType};
//!
//! let payload = PaymentInput::builder(
//!     "3497a720-ab11-4973-9619-534e04f263a1",
//!     "CI",
//!     "STATIC",
//!     "CAISSE_A01",
//! )
//! .with_amount(1500u32)
//! .encode()
//! .unwrap();
//!
//! let report = validate(&payload);
//! assert!(report.valid);
//! assert_eq!(report.data.unwrap().qr_type, QrType::Static);
//! ```

mod crc;
mod custom;
mod error;
mod parser;
mod payment;
pub mod render;
mod string_types;
pub mod tlv;
pub mod validators;

pub use crc::{checksum, checksum_u16};
pub use custom::*;
pub use error::{Error, Result};
pub use parser::*;
pub use payment::*;
pub use string_types::*;
