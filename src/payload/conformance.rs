//! BR Code profile checks on a decoded payload.
//!
//! Decoding only guarantees framing and reports the checksum. These checks
//! cover the mandatory tags and their fixed values, which a receiving
//! institution verifies before accepting a payment.
use {
    super::{
        DecodedPayload, PointOfInitiation, COUNTRY_BR, CURRENCY_BRL, PAYLOAD_FORMAT_INDICATOR,
        PIX_GUI,
    },
    crate::{
        normalize::{MAX_MERCHANT_CITY_LEN, MAX_MERCHANT_NAME_LEN, MAX_REFERENCE_LABEL_LEN},
        Amount, TagId,
    },
    serde::Serialize,
    std::fmt::{self, Display, Formatter},
};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Violation {
    pub tag:     TagId,
    pub problem: String,
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "tag {}: {}", self.tag, self.problem)
    }
}

pub(super) fn check(payload: &DecodedPayload) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut report = |tag: TagId, problem: String| violations.push(Violation { tag, problem });

    match payload.tags.first() {
        Some(first) if first.id() == TagId::PAYLOAD_FORMAT_INDICATOR => {}
        _ => report(
            TagId::PAYLOAD_FORMAT_INDICATOR,
            "must be the first tag".to_owned(),
        ),
    }
    expect_value(
        &mut report,
        TagId::PAYLOAD_FORMAT_INDICATOR,
        payload.payload_format_indicator(),
        PAYLOAD_FORMAT_INDICATOR,
    );

    if let Some(code) = payload.get(TagId::POINT_OF_INITIATION) {
        if PointOfInitiation::from_code(code).is_none() {
            report(
                TagId::POINT_OF_INITIATION,
                format!("expected 11 or 12, found {code:?}"),
            );
        }
    }

    if payload.tag(TagId::MERCHANT_ACCOUNT).is_none() {
        report(TagId::MERCHANT_ACCOUNT, "missing".to_owned());
    } else {
        match payload.gui() {
            Some(gui) if gui.eq_ignore_ascii_case(PIX_GUI) => {}
            gui => report(
                TagId::MERCHANT_ACCOUNT,
                format!("expected GUI {PIX_GUI}, found {gui:?}"),
            ),
        }
        if payload.pix_key().is_none() && payload.url().is_none() {
            report(
                TagId::MERCHANT_ACCOUNT,
                "neither a PIX key nor a payload URL".to_owned(),
            );
        }
    }

    match payload.merchant_category_code() {
        Some(mcc) if mcc.len() == 4 && mcc.bytes().all(|b| b.is_ascii_digit()) => {}
        mcc => report(
            TagId::MERCHANT_CATEGORY_CODE,
            format!("expected four digits, found {mcc:?}"),
        ),
    }

    expect_value(
        &mut report,
        TagId::TRANSACTION_CURRENCY,
        payload.currency(),
        CURRENCY_BRL,
    );

    if let Some(amount) = payload.amount_text() {
        if amount.parse::<Amount>().is_err() {
            report(
                TagId::TRANSACTION_AMOUNT,
                format!("not a decimal amount: {amount:?}"),
            );
        } else if amount.ends_with(".00") {
            report(
                TagId::TRANSACTION_AMOUNT,
                format!("redundant zero cents in {amount:?}"),
            );
        }
    }

    expect_value(&mut report, TagId::COUNTRY_CODE, payload.country_code(), COUNTRY_BR);
    expect_len(
        &mut report,
        TagId::MERCHANT_NAME,
        payload.merchant_name(),
        MAX_MERCHANT_NAME_LEN,
    );
    expect_len(
        &mut report,
        TagId::MERCHANT_CITY,
        payload.merchant_city(),
        MAX_MERCHANT_CITY_LEN,
    );

    if payload.tag(TagId::ADDITIONAL_DATA).is_none() {
        report(TagId::ADDITIONAL_DATA, "missing".to_owned());
    } else {
        expect_len(
            &mut report,
            TagId::ADDITIONAL_DATA,
            payload.reference_label(),
            MAX_REFERENCE_LABEL_LEN,
        );
    }

    match payload.tags.last() {
        Some(last) if last.id() == TagId::CRC => {
            if !payload.crc_valid {
                report(
                    TagId::CRC,
                    format!(
                        "checksum mismatch, computed {}",
                        payload.computed_checksum
                    ),
                );
            }
        }
        _ => report(TagId::CRC, "must be the last tag".to_owned()),
    }

    violations
}

fn expect_value(
    report: &mut impl FnMut(TagId, String),
    tag: TagId,
    actual: Option<&str>,
    expected: &str,
) {
    if actual != Some(expected) {
        report(tag, format!("expected {expected:?}, found {actual:?}"));
    }
}

fn expect_len(
    report: &mut impl FnMut(TagId, String),
    tag: TagId,
    actual: Option<&str>,
    max: usize,
) {
    match actual {
        Some(text) if (1..=max).contains(&text.chars().count()) => {}
        Some(text) => report(
            tag,
            format!("length {} outside 1..={max}", text.chars().count()),
        ),
        None => report(tag, "missing".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use crate::parse_payload;

    #[test]
    fn test_third_party_payload_conforms() {
        let decoded = parse_payload(
            "00020101021226740014br.gov.bcb.pix2552pix.ebanx.com/qr/v2/38F7AD7762682F2240A28D9911A089525204000053039865802BR5924Facebook Servicos Online6009SAO PAULO62070503***6304E5EA",
        )
        .unwrap();
        assert!(decoded.crc_valid);
        assert!(decoded.conformance().is_empty());
    }

    #[test]
    fn test_reports_problems() {
        let decoded = parse_payload(
            "00020101021326380014BR.GOV.BCB.PIX0116user@example.com52040000530398654041.005802US5900600062006304ABCD",
        )
        .unwrap();
        assert!(!decoded.crc_valid);
        let tags = decoded
            .conformance()
            .into_iter()
            .map(|v| v.tag.get())
            .collect::<Vec<_>>();
        assert_eq!(tags, vec![1, 54, 58, 59, 60, 62, 63]);
    }

    #[test]
    fn test_missing_templates() {
        let decoded = parse_payload("0002015802BR6304ABCD").unwrap();
        let problems = decoded.conformance();
        assert!(problems.iter().any(|v| v.tag.get() == 26 && v.problem == "missing"));
        assert!(problems.iter().any(|v| v.tag.get() == 62 && v.problem == "missing"));
        assert!(problems.iter().any(|v| v.tag.get() == 52));
    }
}
