use loadprep::{
    anomaly::AnomalyKind,
    classify::{TypeTag, classify},
    error::ProfileError,
    profile::{Profile, ScanOptions, Verdict, profile_text},
    render::cast_expression,
};

fn profile(text: &str) -> Profile {
    profile_text(text, b',', &ScanOptions::default()).expect("profile text")
}

#[test]
fn three_integer_columns_are_clean() {
    let profile = profile("a,b,c\n1,2,3\n4,5,6\n7,8,9\n");
    assert!(profile.anomalies.is_empty());
    assert_eq!(profile.verdict(), Verdict::Clean);
    let names: Vec<&str> = profile.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
    for field in &profile.fields {
        assert_eq!(field.type_tag, TypeTag::Int);
        assert_eq!(field.max_length, 1);
    }
}

#[test]
fn accounting_negative_becomes_float_with_sign_branch() {
    let profile = profile("id,amount\n1,\"(1,234.56)\"\n2,10.5\n");
    let amount = profile.field("amount").expect("amount field");
    assert_eq!(amount.type_tag, TypeTag::Float);
    assert!(amount.quirks.has_parentheses);
    assert!(amount.quirks.has_comma);
    assert_eq!(amount.whole_digits, Some(4));
    assert_eq!(amount.fraction_digits, Some(2));

    let expr = cast_expression(amount).expect("cast expression");
    assert!(expr.contains("WHEN CHARINDEX('(',[amount]) > 0 THEN"));
    assert!(expr.contains("* -1.0"));
    assert!(expr.ends_with("AS DECIMAL(7,2))"));
}

#[test]
fn wide_record_halts_before_rendering() {
    let profile = profile("a,b,c\n1,2,3\n4,5,6,7\n8,9,10\n");
    assert_eq!(profile.anomalies.len(), 1);
    let anomaly = &profile.anomalies[0];
    assert_eq!(anomaly.kind, AnomalyKind::IncorrectFieldCount);
    assert_eq!(anomaly.line, 2);
    assert_eq!(anomaly.log_row()[3], "4 fields instead of 3");
    assert_eq!(profile.verdict(), Verdict::Structural);
}

#[test]
fn leading_zero_code_is_text() {
    assert_eq!(classify("007"), TypeTag::Text);
    let profile = profile("code\n007\n");
    assert_eq!(profile.fields[0].type_tag, TypeTag::Text);
}

#[test]
fn dash_placeholder_maps_to_zero() {
    let profile = profile("qty\n5\n-\n12\n");
    let qty = &profile.fields[0];
    assert_eq!(qty.type_tag, TypeTag::Int);
    assert!(qty.quirks.has_dash_placeholder);
    let expr = cast_expression(qty).expect("cast expression");
    assert!(expr.contains("= '-' THEN 0\n"));
}

#[test]
fn ineligible_records_do_not_touch_statistics() {
    let clean = profile("a,b\n1,2\n3,4\n5,6\n");
    let noisy = profile("a,b\n1,2\n3,4\nCafé long text,2024-01-01,extra\n5,6\n");
    assert_eq!(noisy.verdict(), Verdict::Structural);
    for (left, right) in clean.fields.iter().zip(&noisy.fields) {
        assert_eq!(left.type_tag, right.type_tag);
        assert_eq!(left.max_length, right.max_length);
        assert_eq!(left.quirks, right.quirks);
    }
}

#[test]
fn final_type_does_not_depend_on_record_order() {
    let rows = ["12", "3.5", "", "1,000", "2024-03-01"];
    let forward = format!("v\n{}\n", rows.join("\n"));
    let mut reversed_rows = rows;
    reversed_rows.reverse();
    let backward = format!("v\n{}\n", reversed_rows.join("\n"));
    assert_eq!(
        profile(&forward).fields[0].type_tag,
        profile(&backward).fields[0].type_tag
    );
    assert_eq!(profile(&forward).fields[0].type_tag, TypeTag::Float);
}

#[test]
fn float_fields_carry_an_envelope() {
    let profile = profile("ratio,price\n0.25,$1.50\n12.125,$10\n");
    for field in &profile.fields {
        assert_eq!(field.type_tag, TypeTag::Float);
        assert!(field.whole_digits.unwrap_or(0) >= 1);
        assert!(field.fraction_digits.is_some());
    }
    assert!(profile.validate().is_ok());
    assert!(profile.field("price").expect("price").quirks.has_dollar_sign);
}

#[test]
fn blank_column_stays_blank() {
    let profile = profile("a,b\n1,\n2,\n");
    assert_eq!(profile.fields[1].type_tag, TypeTag::Blank);
    assert_eq!(profile.fields[1].max_length, 0);
}

#[test]
fn dates_and_datetimes_are_recognized() {
    let profile = profile("d,ts\n2024-01-15,2024-01-15 08:30:00\n2023-12-31,2023-12-31T23:59:59\n");
    assert_eq!(profile.fields[0].type_tag, TypeTag::Date);
    assert_eq!(profile.fields[1].type_tag, TypeTag::DateTime);
}

#[test]
fn non_ascii_character_is_logged_with_its_name() {
    let profile = profile("id,name\n1,Café\n");
    assert_eq!(profile.verdict(), Verdict::ContentOnly);
    let row = profile.anomalies[0].log_row();
    assert_eq!(row[0], AnomalyKind::NonPrintableCharacter.label());
    assert_eq!(row[2], "name");
    assert_eq!(row[3], "2");
    assert_eq!(row[5], "é");
    assert_eq!(row[6], "LATIN SMALL LETTER E WITH ACUTE");
    assert_eq!(row[7], "233");
}

#[test]
fn character_check_can_be_disabled() {
    let options = ScanOptions {
        sample_cap: None,
        check_characters: false,
    };
    let profile = profile_text("id,name\n1,Café\n", b',', &options).expect("profile");
    assert!(profile.anomalies.is_empty());
    assert_eq!(profile.verdict(), Verdict::Clean);
}

#[test]
fn overflowing_float_fails_validation_with_field_name() {
    let profile = profile("id,x\n1,1e999\n");
    let x = profile.field("x").expect("x field");
    assert_eq!(x.type_tag, TypeTag::Float);
    assert_eq!(x.whole_digits, None);
    let err = profile.validate().unwrap_err();
    assert!(matches!(
        err,
        ProfileError::MissingDigitEnvelope { ref field } if field == "x"
    ));
    assert!(cast_expression(x).is_err());
}

#[test]
fn header_width_mismatch_blocks_rendering_in_both_directions() {
    for text in ["a,b\n1,2,3\n4,5,6\n", "a,b,c\n1,2\n4,5\n"] {
        let profile = profile(text);
        assert_eq!(profile.verdict(), Verdict::Structural, "{text:?}");
        assert_eq!(profile.anomalies[0].kind, AnomalyKind::IncorrectFieldCount);
        assert_eq!(profile.anomalies[0].line, 0);
    }
}
