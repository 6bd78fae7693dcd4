use pispi_qr::{
    checksum, encode, encode_with,
    tlv::{parse_segment_list, parse_segments, TlvError},
    validate, AdditionalData, Error, Finding, PayloadOptions, PaymentInput, QrType,
};

const ALIAS: &str = "3497a720-ab11-4973-9619-534e04f263a1";
const REFERENCE_CAISSE: &str = "CAISSE_A01";
const REFERENCE_PRODUIT: &str = "Produit-ABC-123654";
const REFERENCE_TX: &str = "Tx-20251112-055052-001";

fn input(qr_type: &str, reference: &str) -> PaymentInput {
    PaymentInput::builder(ALIAS, "CI", qr_type, reference).build().0
}

fn base_payload() -> String {
    encode(&input("STATIC", REFERENCE_CAISSE)).unwrap()
}

/// Re-encodes `(tag, value)` pairs, dropping any checksum and appending a fresh one.
fn rebuild(entries: &[(String, String)]) -> String {
    let mut body = String::new();
    for (tag, value) in entries.iter().filter(|(tag, _)| tag != "63") {
        body.push_str(&format!("{tag}{:02}{value}", value.chars().count()));
    }
    body.push_str("6304");
    let sum = checksum(&body);
    body + &sum
}

fn entries(payload: &str) -> Vec<(String, String)> {
    parse_segment_list(payload)
        .unwrap()
        .into_iter()
        .map(|segment| (segment.tag.to_string(), segment.value))
        .collect()
}

fn set(entries: &mut [(String, String)], tag: &str, value: String) {
    if let Some(entry) = entries.iter_mut().find(|(t, _)| t == tag) {
        entry.1 = value;
    }
}

fn nested_without(value: &str, tag: &str) -> String {
    entries(value)
        .into_iter()
        .filter(|(t, _)| t != tag)
        .map(|(t, v)| format!("{t}{:02}{v}", v.chars().count()))
        .collect()
}

fn assert_valid_checksum(payload: &str) {
    let segments = parse_segments(payload).unwrap();
    let (covered, sum) = payload.split_at(payload.len() - 4);
    assert_eq!(segments.get("63").map(String::as_str), Some(sum));
    assert_eq!(checksum(covered), sum);
}

#[test]
fn static_without_amount() {
    let payload = base_payload();
    let segments = parse_segments(&payload).unwrap();
    let additional = parse_segments(&segments["62"]).unwrap();

    assert_eq!(segments["00"], "01");
    assert!(segments["36"].contains(ALIAS));
    assert!(!segments.contains_key("54"));
    assert_eq!(segments["58"], "CI");
    assert_eq!(segments["59"], "X");
    assert_eq!(segments["60"], "X");
    assert_eq!(additional["05"], REFERENCE_CAISSE);
    assert_eq!(additional["11"], "000");
    assert_valid_checksum(&payload);
}

#[test]
fn static_with_amount() {
    let payload = PaymentInput::builder(ALIAS, "CI", "STATIC", REFERENCE_PRODUIT)
        .with_amount(1500u32)
        .encode()
        .unwrap();
    let segments = parse_segments(&payload).unwrap();
    let additional = parse_segments(&segments["62"]).unwrap();

    assert_eq!(segments["54"], "1500");
    assert_eq!(additional["05"], REFERENCE_PRODUIT);
    assert_eq!(additional["11"], "000");
    assert_valid_checksum(&payload);
}

#[test]
fn dynamic_with_and_without_amount() {
    for amount in [None, Some(82500u32)] {
        let mut input = input("DYNAMIC", REFERENCE_TX);
        input.amount = amount.map(Into::into);

        let payload = encode(&input).unwrap();
        let segments = parse_segments(&payload).unwrap();
        let additional = parse_segments(&segments["62"]).unwrap();

        assert_eq!(segments.get("54").cloned(), amount.map(|a| a.to_string()));
        assert_eq!(additional["05"], REFERENCE_TX);
        assert_eq!(additional["11"], "400");
        assert_valid_checksum(&payload);
    }
}

#[test]
fn segments_follow_canonical_order() {
    let payload = PaymentInput::builder(ALIAS, "CI", "STATIC", REFERENCE_CAISSE)
        .with_amount("42")
        .encode()
        .unwrap();
    let tags: Vec<String> = entries(&payload).into_iter().map(|(tag, _)| tag).collect();
    assert_eq!(
        tags,
        ["00", "36", "52", "53", "54", "58", "59", "60", "62", "63"]
    );
}

#[test]
fn additional_data_overrides() {
    let options = PayloadOptions {
        additional_data: AdditionalData::default()
            .with_purpose("FACTURE")
            .with_custom("AB", "VALEUR2")
            .with_custom("AA", "VALEUR1"),
    };
    let payload = encode_with(&input("STATIC", REFERENCE_CAISSE), &options).unwrap();
    let segments = parse_segments(&payload).unwrap();
    let additional: Vec<String> = entries(&segments["62"])
        .into_iter()
        .map(|(tag, value)| format!("{tag}={value}"))
        .collect();

    assert_eq!(
        additional,
        [
            "05=CAISSE_A01",
            "11=000",
            "12=FACTURE",
            "AA=VALEUR1",
            "AB=VALEUR2"
        ]
    );
    assert!(validate(&payload).valid);
}

#[test]
fn invalid_custom_sub_tag() {
    let result = PaymentInput::builder(ALIAS, "CI", "STATIC", REFERENCE_CAISSE)
        .with_custom("0@", "INVALID")
        .encode();
    assert_eq!(result, Err(Error::InvalidSubTag("0@".into())));
}

#[test]
fn encode_errors() {
    let mut bad = input("UNKNOWN", REFERENCE_CAISSE);
    assert_eq!(encode(&bad), Err(Error::UnknownQrType("UNKNOWN".into())));

    bad.qr_type.clear();
    assert_eq!(encode(&bad), Err(Error::QrTypeMissing));

    let mut bad = input("STATIC", REFERENCE_CAISSE);
    bad.amount = Some("12,50".into());
    assert_eq!(encode(&bad), Err(Error::AmountNotDigits));
    bad.amount = Some("15.00".into());
    assert_eq!(encode(&bad), Err(Error::AmountNotDigits));
    bad.amount = Some(12.5.into());
    assert_eq!(encode(&bad), Err(Error::AmountNotDigits));

    let mut bad = input("STATIC", REFERENCE_CAISSE);
    bad.country_code = "FR".into();
    assert_eq!(encode(&bad), Err(Error::UnsupportedCountry("FR".into())));
}

#[test]
fn amount_given_as_text_keeps_leading_zeros() {
    let payload = PaymentInput::builder(ALIAS, "CI", "STATIC", REFERENCE_CAISSE)
        .with_amount("000123")
        .encode()
        .unwrap();
    assert_eq!(parse_segments(&payload).unwrap()["54"], "000123");
}

#[test]
fn boundaries() {
    let mut input = input("STATIC", &"A".repeat(25));
    assert!(encode(&input).is_ok());
    input.reference_label.push('A');
    assert_eq!(encode(&input), Err(Error::ReferenceLabelTooLong(26)));

    input.reference_label.pop();
    input.amount = Some("9".repeat(13).into());
    assert!(encode(&input).is_ok());
    input.amount = Some("9".repeat(14).into());
    assert_eq!(encode(&input), Err(Error::AmountTooLong(14)));
}

#[test]
fn round_trip() {
    let cases = [
        PaymentInput::builder(ALIAS, "CI", "STATIC", REFERENCE_CAISSE).build().0,
        PaymentInput::builder(ALIAS, "SN", "dynamic", REFERENCE_TX)
            .with_amount(1000u32)
            .build()
            .0,
        PaymentInput::builder(ALIAS.to_uppercase(), "GW", "STATIC", "é-label")
            .with_amount(7.0)
            .build()
            .0,
    ];

    for input in cases {
        let expected = input.validate().unwrap();
        let report = validate(&encode(&input).unwrap());
        assert!(report.valid, "{:?}", report.errors);
        assert_eq!(report.data.as_ref(), Some(&expected));

        // The decoded request encodes back to the same payload.
        let again: PaymentInput = report.data.unwrap().into();
        assert_eq!(encode(&again), encode(&input));
    }
}

#[test]
fn validate_reports_amount_as_text() {
    let payload = PaymentInput::builder(ALIAS, "CI", "STATIC", REFERENCE_CAISSE)
        .with_amount(1000u32)
        .encode()
        .unwrap();
    let report = validate(&payload);
    assert!(report.valid);
    assert!(report.errors.is_empty());

    let data = report.data.unwrap();
    assert_eq!(data.alias, ALIAS);
    assert_eq!(data.country_code, "CI");
    assert_eq!(data.qr_type, QrType::Static);
    assert_eq!(data.reference_label, REFERENCE_CAISSE);
    assert_eq!(data.amount.as_deref(), Some("1000"));
}

#[test]
fn corrupted_checksum() {
    let payload = base_payload();
    let corrupted = format!("{}Z", &payload[..payload.len() - 1]);
    let report = validate(&corrupted);
    assert!(!report.valid);
    assert!(report.has(&Finding::InvalidChecksum));
    assert_eq!(report.data, None);
}

#[test]
fn mutation_before_checksum_is_detected() {
    let payload = base_payload();
    let mut entries = entries(&payload);
    set(&mut entries, "59", "Y".into());
    // Keep the old checksum so only the sum disagrees.
    let body: String = entries
        .iter()
        .map(|(t, v)| format!("{t}{:02}{v}", v.chars().count()))
        .collect();
    assert_eq!(validate(&body).errors, vec![Finding::InvalidChecksum]);
}

#[test]
fn missing_merchant_info() {
    let report = validate("0002010102126304BEEF");
    assert!(!report.valid);
    assert!(report.has(&Finding::MerchantInfoMissing));
    assert!(report
        .messages()
        .contains(&"tag 36 (merchant account information) missing".to_string()));
}

#[test]
fn format_indicator_problems() {
    let mut list = entries(&base_payload());
    set(&mut list, "00", "02".into());
    assert_eq!(
        validate(&rebuild(&list)).errors,
        vec![Finding::InvalidFormatIndicator]
    );

    let list: Vec<_> = entries(&base_payload())
        .into_iter()
        .filter(|(tag, _)| tag != "00")
        .collect();
    assert_eq!(
        validate(&rebuild(&list)).errors,
        vec![Finding::FormatIndicatorMissing]
    );
}

#[test]
fn alias_missing() {
    let mut list = entries(&base_payload());
    let merchant = nested_without(&list[1].1, "01");
    set(&mut list, "36", merchant);
    assert_eq!(validate(&rebuild(&list)).errors, vec![Finding::AliasMissing]);
}

#[test]
fn merchant_info_analysis_failure() {
    let mut list = entries(&base_payload());
    set(&mut list, "36", "0004AB".into());
    let report = validate(&rebuild(&list));
    assert!(!report.valid);
    assert!(report
        .messages()
        .iter()
        .any(|message| message.contains("merchant information analysis error")));
}

#[test]
fn additional_data_problems() {
    let additional = |list: &[(String, String)]| {
        list.iter()
            .find(|(tag, _)| tag == "62")
            .map(|(_, value)| value.clone())
            .unwrap()
    };

    let mut list = entries(&base_payload());
    let value = nested_without(&additional(&list), "05");
    set(&mut list, "62", value);
    assert_eq!(
        validate(&rebuild(&list)).errors,
        vec![Finding::ReferenceLabelMissing]
    );

    let mut list = entries(&base_payload());
    let value = nested_without(&additional(&list), "11");
    set(&mut list, "62", value);
    assert_eq!(
        validate(&rebuild(&list)).errors,
        vec![Finding::MerchantChannelMissing]
    );

    let mut list = entries(&base_payload());
    set(&mut list, "62", "00AATEST".into());
    assert_eq!(
        validate(&rebuild(&list)).errors,
        vec![Finding::AdditionalData(TlvError::InvalidLength("00".into()))]
    );
}

#[test]
fn checksum_missing() {
    let body: String = entries(&base_payload())
        .into_iter()
        .filter(|(tag, _)| tag != "63")
        .map(|(t, v)| format!("{t}{:02}{v}", v.chars().count()))
        .collect();
    assert!(validate(&body).has(&Finding::ChecksumMissing));
}

#[test]
fn invalid_length_and_truncation() {
    let payload = base_payload();
    let index = payload.find("36").unwrap();

    let mutated = format!("{}AA{}", &payload[..index + 2], &payload[index + 4..]);
    assert_eq!(
        validate(&mutated).messages(),
        vec!["invalid length for tag 36".to_string()]
    );

    let truncated = &payload[..index + 4 + 10];
    assert_eq!(
        validate(truncated).messages(),
        vec!["segment 36 truncated".to_string()]
    );
}

#[test]
fn empty_and_short_payloads() {
    let report = validate("");
    assert!(!report.valid);
    assert_eq!(
        report.messages(),
        vec!["payload must be a non-empty string".to_string()]
    );

    let report = validate("000201");
    assert!(!report.valid);
    assert_eq!(report.errors, vec![Finding::PayloadTooShort]);
}

#[test]
fn merchant_channel_mapping() {
    let mut list = entries(&base_payload());
    let additional = list[list.len() - 2].1.replace("1103000", "1103999");
    set(&mut list, "62", additional);
    let report = validate(&rebuild(&list));
    assert!(report.valid);
    assert_eq!(report.data.unwrap().qr_type, QrType::Static);

    let payload = encode(&input("DYNAMIC", REFERENCE_TX)).unwrap();
    assert_eq!(validate(&payload).data.unwrap().qr_type, QrType::Dynamic);
}

#[test]
fn custom_tags_sort_ignoring_case() {
    let payload = PaymentInput::builder(ALIAS, "CI", "STATIC", REFERENCE_CAISSE)
        .with_custom("AB", "1")
        .with_custom("aa", "1")
        .encode()
        .unwrap();
    let segments = parse_segments(&payload).unwrap();
    assert!(segments["62"].ends_with("aa011AB011"));
}

#[test]
fn astral_reference_label_round_trip() {
    let input = input("STATIC", "😀A");
    let payload = encode(&input).unwrap();
    assert!(payload.contains("0502😀A1103000"));

    let report = validate(&payload);
    assert!(report.valid, "{:?}", report.errors);
    assert_eq!(report.data.unwrap().reference_label, "😀A");
}
