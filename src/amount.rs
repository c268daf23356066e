//! Transaction amount, tag `54`.
use {
    crate::{Error, Result},
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

/// Longest amount value allowed by EMV QRCPS-MPM.
pub const MAX_AMOUNT_LEN: usize = 13;

/// Non-negative amount in BRL, stored in centavos.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn from_centavos(centavos: u64) -> Self {
        Self(centavos)
    }

    /// Rounds to the nearest centavo.
    pub fn from_reais(reais: f64) -> Result<Self> {
        if !reais.is_finite() || reais < 0.0 {
            return Err(Error::InvalidAmount(reais.to_string()));
        }
        let centavos = (reais * 100.0).round();
        if centavos > u64::MAX as f64 {
            return Err(Error::InvalidAmount(reais.to_string()));
        }
        Ok(Self(centavos as u64))
    }

    pub const fn centavos(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Value of the amount tag, or `None` when the tag must be omitted.
    pub fn to_field(self) -> Option<String> {
        format_amount(self)
    }
}

/// Formats with exactly two decimals, then drops a literal `.00` suffix, so
/// `15.00` becomes `15` while `15.50` stays `15.50`. Zero yields `None`: the
/// amount tag is omitted rather than encoded as zero.
///
/// The suffix test works on the formatted text, not on the number. This is
/// the same thing for two-decimal formatting only.
pub fn format_amount(amount: Amount) -> Option<String> {
    if amount.is_zero() {
        return None;
    }
    let fixed = amount.to_string();
    Some(match fixed.strip_suffix(".00") {
        Some(integral) => integral.to_owned(),
        None => fixed,
    })
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Parses `15`, `15.5` or `15.50`. At most two decimals are accepted.
impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidAmount(s.to_owned());
        let (integral, fraction) = match s.split_once('.') {
            Some((integral, fraction)) => (integral, fraction),
            None => (s, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if integral.is_empty() || !all_digits(integral) || !all_digits(fraction) {
            return Err(invalid());
        }
        if fraction.len() > 2 || (s.contains('.') && fraction.is_empty()) {
            return Err(invalid());
        }
        let reais: u64 = integral.parse().map_err(|_| invalid())?;
        let centavos = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse::<u64>().map_err(|_| invalid())?,
        };
        reais
            .checked_mul(100)
            .and_then(|c| c.checked_add(centavos))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
