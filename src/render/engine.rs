//! QR matrix engines.
//!
//! The process keeps one engine handle. It is resolved on first use and then reused;
//! a failed resolution is kept as well and not retried until [`reset_engine`].

use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{info, warn};

use super::matrix::{ErrorCorrection, RawModules};
use crate::Error;

/// Turns a payload into a module matrix.
pub trait QrEngine: Send + Sync {
    fn create(&self, payload: &str, level: ErrorCorrection) -> Result<RawModules, Error>;
}

type EngineSlot = Option<Result<Arc<dyn QrEngine>, Error>>;

static ENGINE: Lazy<RwLock<EngineSlot>> = Lazy::new(|| RwLock::new(None));

/// Process-wide engine, resolved on first call.
pub fn engine() -> Result<Arc<dyn QrEngine>, Error> {
    if let Some(resolved) = ENGINE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return resolved.clone();
    }

    let mut slot = ENGINE.write().unwrap_or_else(PoisonError::into_inner);
    slot.get_or_insert_with(|| {
        let resolved = default_engine();
        match &resolved {
            Ok(_) => info!("QR engine resolved"),
            Err(err) => warn!(%err, "QR engine unavailable"),
        }
        resolved
    })
    .clone()
}

/// Replaces the process-wide engine.
pub fn set_engine(engine: Arc<dyn QrEngine>) {
    *ENGINE.write().unwrap_or_else(PoisonError::into_inner) = Some(Ok(engine));
}

/// Forgets the process-wide engine, the next [`engine`] call resolves it again.
pub fn reset_engine() {
    *ENGINE.write().unwrap_or_else(PoisonError::into_inner) = None;
}

#[cfg(feature = "qrcode")]
fn default_engine() -> Result<Arc<dyn QrEngine>, Error> {
    Ok(Arc::new(QrCodeEngine))
}

#[cfg(not(feature = "qrcode"))]
fn default_engine() -> Result<Arc<dyn QrEngine>, Error> {
    Err(Error::EngineUnavailable)
}

/// Engine backed by the `qrcode` crate.
#[cfg(feature = "qrcode")]
#[derive(Clone, Copy, Debug, Default)]
pub struct QrCodeEngine;

#[cfg(feature = "qrcode")]
impl QrEngine for QrCodeEngine {
    fn create(&self, payload: &str, level: ErrorCorrection) -> Result<RawModules, Error> {
        let code = qrcode::QrCode::with_error_correction_level(payload.as_bytes(), level.into())
            .map_err(|err| Error::Engine(err.to_string()))?;

        let data = code
            .to_colors()
            .into_iter()
            .map(|color| u8::from(color == qrcode::Color::Dark))
            .collect();

        Ok(RawModules::from_data(code.width(), data))
    }
}

#[cfg(feature = "qrcode")]
impl From<ErrorCorrection> for qrcode::EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::Low => qrcode::EcLevel::L,
            ErrorCorrection::Medium => qrcode::EcLevel::M,
            ErrorCorrection::Quartile => qrcode::EcLevel::Q,
            ErrorCorrection::High => qrcode::EcLevel::H,
        }
    }
}
