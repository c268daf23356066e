//! The `id ‖ length ‖ value` tag stream.
//!
//! Both `id` and `length` are two ASCII decimal digits and `length` counts the
//! bytes of `value`. Template tags (merchant account information and
//! additional data) carry a nested tag stream as their value, whose length is
//! that of the concatenated sub-tags.
//!
//! Lengths are self-describing, so one wrong length shifts every following
//! tag. Decoding therefore fails hard on the first inconsistency instead of
//! attempting any recovery.

mod buf;
mod tag_id;

pub use self::{
    buf::{BufCodec, BufDecimal, BufMutCodec, BufMutDecimal},
    tag_id::TagId,
};
use {
    crate::{normalize::Leniency, Error, Result},
    bytes::{Buf, BufMut, BytesMut},
    serde::Serialize,
    std::str,
};

/// Largest value length expressible in the two-digit length field.
pub const MAX_VALUE_LEN: usize = 99;

pub trait Codec<T> {
    type Parent;

    fn encoded_size(&self, value: &T) -> usize {
        let mut buffer = BytesMut::new();
        self.encode(&mut buffer, value);
        buffer.len()
    }

    fn encode<B: BufMut>(&self, buffer: &mut B, value: &T);

    fn decode<B: Buf>(&self, buffer: &mut B, parent: Self::Parent) -> Result<T>;
}

/// Where in the payload a tag stream lives. Sub-tag ids are only meaningful
/// relative to their template.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize)]
pub enum Scope {
    TopLevel,
    MerchantAccount,
    AdditionalData,
}

impl Scope {
    /// Scope of the nested stream carried by `id`, or `None` for a leaf.
    pub const fn template(self, id: TagId) -> Option<Self> {
        match self {
            Self::TopLevel if id.is_merchant_account() => Some(Self::MerchantAccount),
            Self::TopLevel if id.get() == TagId::ADDITIONAL_DATA.get() => {
                Some(Self::AdditionalData)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Leaf(String),
    Nested(Vec<Tag>),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Tag {
    id:    TagId,
    value: Value,
}

impl Value {
    /// Length in bytes of the encoded value, i.e. the tag's length field.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Leaf(text) => text.len(),
            Self::Nested(children) => children.iter().map(Tag::encoded_len).sum(),
        }
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(text) => Some(text),
            Self::Nested(_) => None,
        }
    }

    pub fn children(&self) -> &[Tag] {
        match self {
            Self::Leaf(_) => &[],
            Self::Nested(children) => children,
        }
    }
}

impl Tag {
    pub fn leaf(id: TagId, value: impl Into<String>) -> Result<Self> {
        Self::new(id, Value::Leaf(value.into()))
    }

    pub fn nested(id: TagId, children: Vec<Self>) -> Result<Self> {
        Self::new(id, Value::Nested(children))
    }

    pub fn new(id: TagId, value: Value) -> Result<Self> {
        let len = value.encoded_len();
        if len > MAX_VALUE_LEN {
            return Err(Error::ValueTooLong { id, len });
        }
        Ok(Self { id, value })
    }

    pub const fn id(&self) -> TagId {
        self.id
    }

    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Encoded length including the four header digits.
    pub fn encoded_len(&self) -> usize {
        4 + self.value.encoded_len()
    }

    /// Raw text of the value. Templates are re-encoded.
    pub fn raw_value(&self) -> String {
        match &self.value {
            Value::Leaf(text) => text.clone(),
            Value::Nested(children) => encode_tags(children),
        }
    }

    pub fn find(tags: &[Self], id: TagId) -> Option<&Self> {
        tags.iter().find(|tag| tag.id == id)
    }
}

/// Concatenates the encoding of `tags`.
pub fn encode_tags(tags: &[Tag]) -> String {
    let codec = TlvCodec::default();
    let mut buffer = BytesMut::with_capacity(tags.iter().map(Tag::encoded_len).sum());
    for tag in tags {
        buffer.put_codec(&codec, tag);
    }
    // Tags are built from `String`s and ASCII header digits.
    String::from_utf8_lossy(&buffer).into_owned()
}

/// `id ‖ zero padded length ‖ value` for a single leaf.
pub fn build_tag(id: TagId, value: &str) -> Result<String> {
    Ok(encode_tags(&[Tag::leaf(id, value)?]))
}

/// Parses a top-level tag stream with the default codec.
pub fn parse(payload: &str) -> Result<Vec<Tag>> {
    Codec::<Vec<Tag>>::decode(&TlvCodec::default(), &mut payload.as_bytes(), Scope::TopLevel)
}

/// The tag stream codec.
#[derive(Clone, Copy, Debug)]
pub struct TlvCodec {
    /// Bytes left over that are too short to hold a tag header.
    pub trailing_data: Leniency,

    /// Non-ASCII bytes inside a value. Such values are counted in bytes by
    /// this codec but in characters by many others.
    pub non_ascii: Leniency,
}

/// Strict framing, but only warn on non-ASCII text.
impl Default for TlvCodec {
    fn default() -> Self {
        Self {
            trailing_data: Leniency::Strict,
            non_ascii:     Leniency::Warn,
        }
    }
}

impl Codec<Tag> for TlvCodec {
    type Parent = Scope;

    fn encoded_size(&self, value: &Tag) -> usize {
        value.encoded_len()
    }

    fn encode<B: BufMut>(&self, buffer: &mut B, value: &Tag) {
        buffer.put_decimal2(value.id.get());
        // Bounded by the `Tag` constructors.
        buffer.put_decimal2(value.value.encoded_len() as u8);
        match &value.value {
            Value::Leaf(text) => buffer.put_slice(text.as_bytes()),
            Value::Nested(children) => {
                buffer.put_codec(self, children);
            }
        }
    }

    /// Errors carry offsets relative to the start of the tag.
    fn decode<B: Buf>(&self, buffer: &mut B, scope: Self::Parent) -> Result<Tag> {
        if buffer.remaining() < 4 {
            return Err(Error::malformed(0, "truncated tag header"));
        }
        let id = buffer
            .get_decimal2()
            .and_then(TagId::new)
            .ok_or(Error::malformed(0, "tag id is not two decimal digits"))?;
        let len = buffer
            .get_decimal2()
            .ok_or(Error::malformed(2, "tag length is not two decimal digits"))?
            as usize;
        if buffer.remaining() < len {
            return Err(Error::malformed(2, "tag length exceeds remaining payload"));
        }
        let bytes = buffer.copy_to_bytes(len);
        let value = match scope.template(id) {
            Some(inner) => {
                let children = Codec::<Vec<Tag>>::decode(self, &mut bytes.as_ref(), inner)
                    .map_err(|e| e.shifted(4))?;
                Value::Nested(children)
            }
            None => {
                let text = str::from_utf8(&bytes)
                    .map_err(|_| Error::malformed(4, "tag value is not valid UTF-8"))?;
                if !text.is_ascii() {
                    self.non_ascii.check("tag value is not ASCII", || {
                        Error::malformed(4, "tag value is not ASCII")
                    })?;
                }
                Value::Leaf(text.to_owned())
            }
        };
        Ok(Tag { id, value })
    }
}

impl Codec<Vec<Tag>> for TlvCodec {
    type Parent = Scope;

    fn encoded_size(&self, value: &Vec<Tag>) -> usize {
        value.iter().map(Tag::encoded_len).sum()
    }

    fn encode<B: BufMut>(&self, buffer: &mut B, value: &Vec<Tag>) {
        for tag in value {
            buffer.put_codec(self, tag);
        }
    }

    fn decode<B: Buf>(&self, buffer: &mut B, scope: Self::Parent) -> Result<Vec<Tag>> {
        let total = buffer.remaining();
        let mut tags = Vec::new();
        while buffer.has_remaining() {
            let offset = total - buffer.remaining();
            if buffer.remaining() < 4 {
                self.trailing_data.check("ignoring trailing bytes after last tag", || {
                    Error::malformed(offset, "truncated tag header")
                })?;
                buffer.advance(buffer.remaining());
                break;
            }
            let tag: Tag = buffer
                .get_codec(self, scope)
                .map_err(|e| e.shifted(offset))?;
            tags.push(tag);
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(id: u8) -> TagId {
        TagId::new(id).unwrap()
    }

    #[test]
    fn test_build_tag() {
        assert_eq!(build_tag(id(0), "01").unwrap(), "000201");
        assert_eq!(build_tag(id(58), "BR").unwrap(), "5802BR");
        assert_eq!(build_tag(id(54), "").unwrap(), "5400");
        assert_eq!(
            build_tag(TagId::GUI, "BR.GOV.BCB.PIX").unwrap(),
            "0014BR.GOV.BCB.PIX"
        );
    }

    #[test]
    fn test_value_too_long() {
        let long = "X".repeat(100);
        assert_eq!(
            Tag::leaf(id(59), long),
            Err(Error::ValueTooLong { id: id(59), len: 100 })
        );
        assert!(Tag::leaf(id(59), "X".repeat(99)).is_ok());
    }

    #[test]
    fn test_nested_length_is_concatenated_length() {
        let tag = Tag::nested(TagId::ADDITIONAL_DATA, vec![
            Tag::leaf(TagId::REFERENCE_LABEL, "ORD-1").unwrap(),
        ])
        .unwrap();
        assert_eq!(tag.value().encoded_len(), 9);
        assert_eq!(encode_tags(&[tag]), "62090505ORD-1");
    }

    #[test]
    fn test_nested_overflow() {
        let children = (0..10)
            .map(|i| Tag::leaf(id(i), "0123456").unwrap())
            .collect::<Vec<_>>();
        assert!(matches!(
            Tag::nested(TagId::MERCHANT_ACCOUNT, children),
            Err(Error::ValueTooLong { len: 110, .. })
        ));
    }

    #[test]
    fn test_parse_nested() {
        let tags = parse("26220014BR.GOV.BCB.PIX0100620705031235802BR").unwrap();
        assert_eq!(tags.len(), 3);
        let account = tags[0].value().children();
        assert_eq!(account.len(), 2);
        assert_eq!(account[0].value().as_leaf(), Some("BR.GOV.BCB.PIX"));
        assert_eq!(account[1].value().as_leaf(), Some(""));
        let additional = tags[1].value().children();
        assert_eq!(additional[0].id(), TagId::REFERENCE_LABEL);
        assert_eq!(additional[0].value().as_leaf(), Some("123"));
        assert_eq!(tags[2].value().as_leaf(), Some("BR"));
    }

    #[test]
    fn test_parse_rejects_overlong_length() {
        assert_eq!(
            parse("0002015910SHORT"),
            Err(Error::malformed(8, "tag length exceeds remaining payload"))
        );
    }

    #[test]
    fn test_parse_rejects_bad_digits() {
        assert_eq!(
            parse("0002015A02BR"),
            Err(Error::malformed(6, "tag id is not two decimal digits"))
        );
        assert_eq!(
            parse("00020158X2BR"),
            Err(Error::malformed(8, "tag length is not two decimal digits"))
        );
    }

    #[test]
    fn test_parse_rejects_truncated_header() {
        assert_eq!(
            parse("000201630"),
            Err(Error::malformed(6, "truncated tag header"))
        );
        let lenient = TlvCodec {
            trailing_data: Leniency::Allow,
            ..TlvCodec::default()
        };
        let tags: Vec<Tag> = lenient
            .decode(&mut &b"000201630"[..], Scope::TopLevel)
            .unwrap();
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn test_nested_error_offset() {
        // The sub-tag inside 62 claims 9 bytes but only 3 follow.
        assert_eq!(
            parse("000201620705090RD"),
            Err(Error::malformed(6 + 4 + 2, "tag length exceeds remaining payload"))
        );
    }

    #[test]
    fn test_nested_encoding_matches_stream_encoding() {
        let codec = TlvCodec::default();
        let children = vec![
            Tag::leaf(TagId::GUI, "BR.GOV.BCB.PIX").unwrap(),
            Tag::leaf(TagId::PIX_KEY, "k").unwrap(),
        ];
        let mut stream = BytesMut::new();
        Codec::<Vec<Tag>>::encode(&codec, &mut stream, &children);
        assert_eq!(&stream[..], b"0014BR.GOV.BCB.PIX0101k");

        let account = Tag::nested(TagId::MERCHANT_ACCOUNT, children).unwrap();
        let mut nested = BytesMut::new();
        nested.put_codec(&codec, &account);
        assert_eq!(&nested[..4], b"2623");
        assert_eq!(&nested[4..], &stream[..]);
    }

    #[test]
    fn test_encoded_size() {
        let codec = TlvCodec::default();
        let tag = Tag::leaf(id(59), "PNEUS STORE").unwrap();
        assert_eq!(Codec::<Tag>::encoded_size(&codec, &tag), 15);
        let tags = vec![tag.clone(), tag];
        assert_eq!(Codec::<Vec<Tag>>::encoded_size(&codec, &tags), 30);
    }
}
