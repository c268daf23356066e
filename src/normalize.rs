//! Text rules applied to field values before they are framed as tags.
//!
//! Tag lengths count bytes, and most readers count characters, so every text
//! field is folded to printable ASCII first: accents are removed by canonical
//! decomposition followed by dropping combining marks, and whatever is still
//! not ASCII is dropped.
use {
    crate::{Error, Result},
    tracing::warn,
    unicode_normalization::{char::is_combining_mark, UnicodeNormalization},
};

pub const MAX_MERCHANT_NAME_LEN: usize = 25;
pub const MAX_MERCHANT_CITY_LEN: usize = 15;
pub const MAX_REFERENCE_LABEL_LEN: usize = 25;
pub const MAX_DESCRIPTION_LEN: usize = 72;
pub const MAX_POSTAL_CODE_LEN: usize = 8;

/// How to handle correctable problems.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Leniency {
    /// Correct errors
    Allow,

    /// Correct, but log a warning.
    #[default]
    Warn,

    /// Be strict and return an error.
    Strict,
}

impl Leniency {
    pub fn check(self, msg: &'static str, error: impl FnOnce() -> Error) -> Result<()> {
        match self {
            Self::Strict => Err(error()),
            Self::Warn => {
                warn!("{}", msg);
                Ok(())
            }
            Self::Allow => Ok(()),
        }
    }
}

/// Removes diacritics, then everything that is not printable ASCII.
pub fn fold_ascii(text: &str) -> String {
    text.nfd()
        .filter(|&c| !is_combining_mark(c))
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect()
}

/// Keeps the first `max` characters of `text`, subject to `leniency`.
pub fn clamp(field: &'static str, text: String, max: usize, leniency: Leniency) -> Result<String> {
    let actual = text.chars().count();
    if actual <= max {
        return Ok(text);
    }
    match leniency {
        Leniency::Strict => return Err(Error::FieldOverflow { field, max, actual }),
        Leniency::Warn => warn!(field, max, actual, "truncating field"),
        Leniency::Allow => {}
    }
    Ok(text.chars().take(max).collect())
}

/// Uppercase, ASCII folded, at most 25 characters.
pub fn merchant_name(text: &str, leniency: Leniency) -> Result<String> {
    upper_folded("merchant name", text, MAX_MERCHANT_NAME_LEN, leniency)
}

/// Uppercase, ASCII folded, at most 15 characters.
pub fn merchant_city(text: &str, leniency: Leniency) -> Result<String> {
    upper_folded("merchant city", text, MAX_MERCHANT_CITY_LEN, leniency)
}

/// Uppercases before folding so that `ß` becomes `SS`. Trimming comes last,
/// as folding may drop characters next to spaces.
fn upper_folded(
    field: &'static str,
    text: &str,
    max: usize,
    leniency: Leniency,
) -> Result<String> {
    let folded = fold_ascii(&text.to_uppercase()).trim().to_owned();
    let clamped = clamp(field, folded, max, leniency)?;
    Ok(clamped.trim_end().to_owned())
}

pub fn reference_label(text: &str, leniency: Leniency) -> Result<String> {
    clamp(
        "reference label",
        fold_ascii(text).trim().to_owned(),
        MAX_REFERENCE_LABEL_LEN,
        leniency,
    )
}

pub fn description(text: &str, leniency: Leniency) -> Result<String> {
    clamp(
        "description",
        fold_ascii(text).trim().to_owned(),
        MAX_DESCRIPTION_LEN,
        leniency,
    )
}

/// CEP: digits only, at most 8.
pub fn postal_code(text: &str, leniency: Leniency) -> Result<String> {
    let digits = text.chars().filter(char::is_ascii_digit).collect();
    clamp("postal code", digits, MAX_POSTAL_CODE_LEN, leniency)
}
