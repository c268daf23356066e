//! PIX BR Code payload codec.
//!
//! A BR Code is the text carried by the QR codes of Brazil's instant payment
//! scheme. It follows the EMV QR Code Specification for Merchant-Presented
//! Mode: a stream of `id ‖ length ‖ value` tags where both `id` and `length`
//! are two ASCII decimal digits, some values are themselves tag streams, and
//! the whole payload is closed by a CRC16 tag `63`.
//!
//! ```
//! use pix_brcode::{build_payload, parse_payload, Amount, MerchantSettings, PixFields};
//!
//! let settings = MerchantSettings::new("user@example.com", "Pneus Store", "São Paulo");
//! let fields = PixFields::from_settings(&settings, "ORD-1")
//!     .with_amount(Amount::from_centavos(48990));
//! let payload = build_payload(&fields)?;
//!
//! let decoded = parse_payload(payload.as_str())?;
//! assert!(decoded.crc_valid);
//! assert_eq!(decoded.pix_key(), Some("user@example.com"));
//! assert_eq!(decoded.merchant_city(), Some("SAO PAULO"));
//! # Ok::<(), pix_brcode::Error>(())
//! ```

pub mod amount;
pub mod crc;
mod error;
pub mod normalize;
pub mod payload;
pub mod tlv;

pub use self::{
    amount::{format_amount, Amount},
    crc::{crc16, Checksum},
    error::{ConfigError, Error, Result},
    normalize::Leniency,
    payload::{
        build_payload, parse_payload, DecodedPayload, Encoder, MerchantSettings, PixFields,
        PixKeyKind, PixPayload, PointOfInitiation, UnsignedPayload,
    },
    tlv::{Scope, Tag, TagId, TlvCodec, Value},
};
