use {
    crate::{Amount, ConfigError},
    serde::{Deserialize, Serialize},
    std::fmt::{self, Display, Formatter},
    tracing::warn,
};

/// Receiving account identity, owned by whoever stores the merchant
/// configuration. Passed into the encoder explicitly.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MerchantSettings {
    pub pix_key:       String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pix_key_type:  Option<PixKeyKind>,
    pub merchant_name: String,
    pub merchant_city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code:   Option<String>,
}

impl MerchantSettings {
    pub fn new(
        pix_key: impl Into<String>,
        merchant_name: impl Into<String>,
        merchant_city: impl Into<String>,
    ) -> Self {
        Self {
            pix_key: pix_key.into(),
            merchant_name: merchant_name.into(),
            merchant_city: merchant_city.into(),
            ..Self::default()
        }
    }

    /// Blank values count as missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(&self.pix_key, &self.merchant_name, &self.merchant_city)
    }
}

/// Everything that goes into one payload.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PixFields {
    pub pix_key:               String,
    pub merchant_name:         String,
    pub merchant_city:         String,
    /// `None` or zero omits the amount tag.
    #[serde(default)]
    pub amount:                Option<Amount>,
    pub transaction_reference: String,
    #[serde(default)]
    pub description:           Option<String>,
    #[serde(default)]
    pub postal_code:           Option<String>,
}

impl PixFields {
    pub fn from_settings(settings: &MerchantSettings, reference: impl Into<String>) -> Self {
        if let Some(declared) = settings.pix_key_type {
            let detected = PixKeyKind::classify(&settings.pix_key);
            if detected != Some(declared) {
                warn!(%declared, ?detected, "PIX key does not look like its declared type");
            }
        }
        Self {
            pix_key: settings.pix_key.clone(),
            merchant_name: settings.merchant_name.clone(),
            merchant_city: settings.merchant_city.clone(),
            amount: None,
            transaction_reference: reference.into(),
            description: None,
            postal_code: settings.postal_code.clone(),
        }
    }

    #[must_use]
    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate(&self.pix_key, &self.merchant_name, &self.merchant_city)
    }
}

fn validate(pix_key: &str, merchant_name: &str, merchant_city: &str) -> Result<(), ConfigError> {
    if pix_key.trim().is_empty() {
        return Err(ConfigError::MissingPixKey);
    }
    if merchant_name.trim().is_empty() {
        return Err(ConfigError::MissingMerchantName);
    }
    if merchant_city.trim().is_empty() {
        return Err(ConfigError::MissingMerchantCity);
    }
    Ok(())
}

/// Tag `01`.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointOfInitiation {
    /// `12`, the payload may be paid any number of times.
    #[default]
    Static,

    /// `11`, the payload is meant to be paid once.
    Dynamic,
}

impl PointOfInitiation {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Static => "12",
            Self::Dynamic => "11",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "12" => Some(Self::Static),
            "11" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

/// The kinds of PIX key registered in the directory. Keys are encoded
/// verbatim whatever their kind; this is diagnostics only.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixKeyKind {
    Cpf,
    Cnpj,
    Email,
    Phone,
    Random,
}

impl PixKeyKind {
    /// Guesses the kind from the key's shape.
    pub fn classify(key: &str) -> Option<Self> {
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if let Some(number) = key.strip_prefix('+') {
            return (all_digits(number) && (12..=13).contains(&number.len())).then_some(Self::Phone);
        }
        if all_digits(key) {
            return match key.len() {
                11 => Some(Self::Cpf),
                14 => Some(Self::Cnpj),
                _ => None,
            };
        }
        if is_uuid(key) {
            return Some(Self::Random);
        }
        match key.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Some(Self::Email),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpf => "cpf",
            Self::Cnpj => "cnpj",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Random => "random",
        }
    }
}

impl Display for PixKeyKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_uuid(key: &str) -> bool {
    let groups = key.split('-').collect::<Vec<_>>();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(group, len)| group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit()))
}
