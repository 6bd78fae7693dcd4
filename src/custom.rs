use std::{cmp::Ordering, collections::BTreeMap};

use serde::Deserialize;

use super::{tlv, validators::is_valid_sub_tag, Error};

/// Sub-tag of the purpose of transaction inside template 62.
pub const PURPOSE_OF_TRANSACTION_TAG: &str = "12";

/// Extra sub-fields for the additional data template (`62`).
///
/// Reference label (`05`) and merchant channel (`11`) always come from the payment
/// itself; these follow them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdditionalData {
    /// Purpose of transaction, emitted as sub-tag `12` when not empty.
    pub purpose_of_transaction: Option<String>,

    /// Free form sub-fields, emitted in [`sub_tag_order`].
    pub custom: BTreeMap<String, String>,
}

impl AdditionalData {
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose_of_transaction = Some(purpose.into());
        self
    }

    pub fn with_custom(mut self, tag: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(tag.into(), value.into());
        self
    }

    /// Writes the optional sub-fields after the mandatory ones.
    ///
    /// Fails on the first custom tag that is not 2 alphanumeric characters.
    pub(crate) fn write_to(&self, buffer: &mut String) -> super::Result<()> {
        if let Some(purpose) = self.purpose_of_transaction.as_deref() {
            if !purpose.is_empty() {
                tlv::write_segment(buffer, PURPOSE_OF_TRANSACTION_TAG, purpose)?;
            }
        }

        let mut custom: Vec<_> = self.custom.iter().collect();
        custom.sort_by(|(a, _), (b, _)| sub_tag_order(a, b));

        for (tag, value) in custom {
            if !is_valid_sub_tag(tag) {
                return Err(Error::InvalidSubTag(tag.clone()));
            }
            tlv::write_segment(buffer, tag, value)?;
        }

        Ok(())
    }
}

/// Ignores ASCII case, then puts lowercase before uppercase: `0A < aa < AA < AB`.
pub fn sub_tag_order(a: &str, b: &str) -> Ordering {
    let folded = |tag: &str| tag.to_ascii_lowercase();
    let lower_first = |tag: &str| -> Vec<bool> {
        tag.chars().map(|c| c.is_ascii_uppercase()).collect()
    };

    folded(a)
        .cmp(&folded(b))
        .then_with(|| lower_first(a).cmp(&lower_first(b)))
        .then_with(|| a.cmp(b))
}
