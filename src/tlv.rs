//! EMV tag-length-value grammar.
//!
//! A segment is a 2 character tag, a 2 digit decimal length and that many characters of
//! value. Segments are concatenated without separators. Templates `36` and `62` hold
//! nested segments with the same grammar, so one scanner serves every level.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{
    string_types::{ExactSizeString, StringExt},
    Error,
};

pub type Tag = ExactSizeString<2>;

/// Largest value a 2 digit length can announce.
pub const MAX_VALUE_LEN: usize = 99;

/// Tag to value, last occurrence of a repeated tag wins.
pub type SegmentMap = BTreeMap<Tag, String>;

/// One decoded tag-length-value unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub tag: Tag,
    pub value: String,
}

/// Structural failure of a segment stream.
///
/// The tag is kept as read, it may be shorter than 2 characters at the end of the input.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TlvError {
    #[error("invalid length for tag {0}")]
    InvalidLength(String),

    #[error("segment {0} truncated")]
    Truncated(String),
}

/// Appends `tag`, the zero padded length of `value` and `value` to `buffer`.
pub fn write_segment(buffer: &mut String, tag: &str, value: &str) -> super::Result<()> {
    let value = value
        .to_max_size::<MAX_VALUE_LEN>()
        .ok_or_else(|| Error::SegmentTooLong {
            tag: tag.into(),
            len: value.chars().count(),
        })?;

    buffer.push_str(tag);
    buffer.push_str(&format!("{:02}", value.char_len()));
    buffer.push_str(&value);

    Ok(())
}

/// Same as [`write_segment`], returning the segment as a new string.
pub fn format_segment(tag: &str, value: &str) -> super::Result<String> {
    let mut buffer = String::with_capacity(4 + value.len());
    write_segment(&mut buffer, tag, value)?;
    Ok(buffer)
}

/// Scans `data` into an ordered list of segments.
///
/// Stops at the first length that is not two decimal digits or whose value window runs
/// past the end of the input.
pub fn parse_segment_list(data: &str) -> Result<Vec<Segment>, TlvError> {
    let chars: Vec<char> = data.chars().collect();
    let mut segments = Vec::new();
    let mut cursor = 0;

    while cursor < chars.len() {
        let tag: String = window(&chars, cursor, cursor + 2).iter().collect();
        let length = parse_length(window(&chars, cursor + 2, cursor + 4))
            .ok_or_else(|| TlvError::InvalidLength(tag.clone()))?;

        let value_start = cursor + 4;
        let value_end = value_start + length;

        if value_end > chars.len() {
            return Err(TlvError::Truncated(tag));
        }

        segments.push(Segment {
            // A parsed length implies two full tag characters precede it.
            tag: Tag::new_unchecked(tag),
            value: chars[value_start..value_end].iter().collect(),
        });
        cursor = value_end;
    }

    Ok(segments)
}

/// Scans `data` into a tag map.
pub fn parse_segments(data: &str) -> Result<SegmentMap, TlvError> {
    Ok(parse_segment_list(data)?
        .into_iter()
        .map(|segment| (segment.tag, segment.value))
        .collect())
}

fn window(chars: &[char], start: usize, end: usize) -> &[char] {
    let len = chars.len();
    &chars[start.min(len)..end.min(len)]
}

/// Both characters must be decimal digits, so `0A` is an invalid length rather than `0`.
fn parse_length(digits: &[char]) -> Option<usize> {
    match digits {
        [tens, units] => Some(tens.to_digit(10)? as usize * 10 + units.to_digit(10)? as usize),
        _ => None,
    }
}
