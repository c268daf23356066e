
use {
    anyhow::{anyhow as err, ensure, Result},
    pix_brcode::{parse_payload, Amount, Error, PixKeyKind, PointOfInitiation, TagId},
    vectors::{
        LEADING_ZERO_CHECKSUM, REFERENCE, SPLICED_CHECKSUM, THIRD_PARTY, WITHOUT_INITIATION,
    },
};

#[test]
fn test_decode_reference() -> Result<()> {
    let decoded = parse_payload(REFERENCE)?;
    ensure!(decoded.crc_valid, "reference payload must validate");
    assert_eq!(decoded.payload_format_indicator(), Some("01"));
    assert_eq!(decoded.point_of_initiation(), Some(PointOfInitiation::Static));
    assert_eq!(decoded.gui(), Some("BR.GOV.BCB.PIX"));
    assert_eq!(decoded.pix_key(), Some("user@example.com"));
    assert_eq!(decoded.merchant_category_code(), Some("0000"));
    assert_eq!(decoded.currency(), Some("986"));
    assert_eq!(decoded.amount(), Some(Amount::from_centavos(48990)));
    assert_eq!(decoded.country_code(), Some("BR"));
    assert_eq!(decoded.merchant_name(), Some("PNEUS STORE"));
    assert_eq!(decoded.merchant_city(), Some("SAO PAULO"));
    assert_eq!(decoded.reference_label(), Some("ORD-1"));
    assert_eq!(decoded.description(), None);
    assert!(decoded.conformance().is_empty());
    Ok(())
}

#[test]
fn test_decode_third_party() -> Result<()> {
    let decoded = parse_payload(THIRD_PARTY)?;
    ensure!(decoded.crc_valid);
    assert_eq!(decoded.gui(), Some("br.gov.bcb.pix"));
    assert_eq!(decoded.pix_key(), None);
    let url = decoded.url().ok_or_else(|| err!("payload URL not found"))?;
    ensure!(url.starts_with("pix.ebanx.com/qr/v2/"));
    assert_eq!(decoded.amount(), None);
    assert_eq!(decoded.reference_label(), Some("***"));
    assert_eq!(decoded.merchant_name(), Some("Facebook Servicos Online"));
    Ok(())
}

#[test]
fn test_decode_without_initiation() -> Result<()> {
    let decoded = parse_payload(WITHOUT_INITIATION)?;
    ensure!(decoded.crc_valid);
    assert_eq!(decoded.point_of_initiation(), None);
    assert_eq!(decoded.description(), Some("Pagamento de 489.9"));
    assert_eq!(
        decoded.pix_key().and_then(PixKeyKind::classify),
        Some(PixKeyKind::Email)
    );
    // Tag 01 is optional in the profile.
    assert!(decoded.conformance().is_empty());
    Ok(())
}

#[test]
fn test_spliced_checksum_is_malformed() {
    // `6304` declares four characters, ` 03B`, and a lone `E` remains.
    assert_eq!(
        parse_payload(SPLICED_CHECKSUM),
        Err(Error::Malformed {
            offset: SPLICED_CHECKSUM.len() - 1,
            reason: "truncated tag header",
        })
    );
}

#[test]
fn test_leading_zero_checksum() -> Result<()> {
    let decoded = parse_payload(LEADING_ZERO_CHECKSUM)?;
    ensure!(decoded.crc_valid);
    assert_eq!(decoded.computed_checksum.to_string(), "03BE");
    assert_eq!(decoded.point_of_initiation(), Some(PointOfInitiation::Dynamic));
    // Valid checksum, but `10.00` carries redundant zero cents.
    let problems = decoded.conformance();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].tag, TagId::TRANSACTION_AMOUNT);
    Ok(())
}

#[test]
fn test_truncated_payloads_are_rejected() {
    for cut in 1..REFERENCE.len() {
        let truncated = &REFERENCE[..cut];
        match parse_payload(truncated) {
            Err(Error::Malformed { .. }) => {}
            // Cutting exactly at a tag boundary leaves a well-framed stream.
            Ok(decoded) => assert!(!decoded.crc_valid, "cut at {cut}"),
            Err(other) => panic!("unexpected error {other} at {cut}"),
        }
    }
}

#[test]
fn test_altered_payload_fails_checksum() -> Result<()> {
    let altered = REFERENCE.replace("489.90", "189.90");
    let decoded = parse_payload(&altered)?;
    ensure!(!decoded.crc_valid);
    assert_eq!(decoded.amount(), Some(Amount::from_centavos(18990)));
    let problems = decoded.conformance();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].tag, TagId::CRC);
    Ok(())
}

#[test]
fn test_non_digit_header() {
    let broken = REFERENCE.replacen("5303", "53O3", 1);
    assert!(matches!(
        parse_payload(&broken),
        Err(Error::Malformed {
            reason: "tag length is not two decimal digits",
            ..
        })
    ));
}

#[test]
fn test_fields_json() -> Result<()> {
    let decoded = parse_payload(REFERENCE)?;
    let json = serde_json::to_value(decoded.fields())?;
    assert_eq!(json["26.01"], "user@example.com");
    assert_eq!(json["62.05"], "ORD-1");

    let json = serde_json::to_value(&decoded)?;
    assert_eq!(json["crc_valid"], true);
    assert_eq!(json["checksum"], "1135");
    assert_eq!(json["tags"][0]["id"], "00");
    assert_eq!(json["tags"][0]["value"], "01");
    assert_eq!(json["tags"][2]["value"][1]["value"], "user@example.com");
    Ok(())
}
