use super::*;

// -----------------------------------------------------------------------
// clean_text
// -----------------------------------------------------------------------

#[test]
fn clean_text_strips_tags_and_collapses_whitespace() {
    let raw = "<p>Great   lecturer,</p>\n\n<b>tough</b>\tgrader ";
    assert_eq!(clean_text(raw), "Great lecturer, tough grader");
}

#[test]
fn clean_text_strips_emoji_without_leaving_double_spaces() {
    let raw = "Loved it 😀 👍🏽 would take again ❤️";
    let cleaned = clean_text(raw);
    assert_eq!(cleaned, "Loved it would take again");
}

#[test]
fn clean_text_strips_symbol_emoji_and_keycap_sequences() {
    let raw = "Great class \u{203C}\u{FE0F} go \u{25B6}\u{FE0F} rank 1\u{FE0F}\u{20E3} \
               back \u{21A9}\u{FE0F} \u{2B50} end \u{00A9}\u{00AE} \u{2194}\u{25AA}";
    let cleaned = clean_text(raw);
    assert_eq!(cleaned, "Great class go rank 1 back end");
    let leftovers = ['\u{203C}', '\u{25B6}', '\u{20E3}', '\u{21A9}', '\u{FE0F}', '\u{200D}'];
    assert!(!cleaned.chars().any(|c| leftovers.contains(&c)), "{cleaned:?}");
}

#[test]
fn clean_text_strips_joined_emoji_sequences() {
    // family: man, zero-width joiner, woman, zero-width joiner, girl
    let raw = "Office hours \u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467} on Fridays";
    assert_eq!(clean_text(raw), "Office hours on Fridays");
}

#[test]
fn clean_text_output_has_no_markup_or_whitespace_runs() {
    let inputs = [
        "<div class=\"x\">a <span>b</span></div>",
        "a < b > c",
        "line one\r\n\r\nline two\u{200B}\u{FEFF}",
        "🎉<br/>🎉",
        "  \u{7}bell\u{0}null  ",
    ];
    for raw in inputs {
        let cleaned = clean_text(raw);
        assert!(!cleaned.contains('<') && !cleaned.contains('>'), "{cleaned:?}");
        assert!(!cleaned.contains("  "), "{cleaned:?}");
        assert!(!cleaned.chars().any(char::is_control), "{cleaned:?}");
        assert_eq!(cleaned, cleaned.trim());
    }
}

#[test]
fn clean_text_keeps_accented_letters() {
    assert_eq!(clean_text("José  Muñoz"), "José Muñoz");
}

#[test]
fn clean_text_empty_after_cleaning_is_empty_string() {
    assert_eq!(clean_text("<br/> 🙂 \n"), "");
    assert_eq!(clean_text(""), "");
}

// -----------------------------------------------------------------------
// parse_number
// -----------------------------------------------------------------------

#[test]
fn parse_number_handles_missing_markers() {
    assert_eq!(parse_number("N/A"), None);
    assert_eq!(parse_number("n/a"), None);
    assert_eq!(parse_number(""), None);
    assert_eq!(parse_number("   "), None);
    assert_eq!(parse_number("--"), None);
}

#[test]
fn parse_number_strips_out_of_five_suffix() {
    assert_eq!(parse_number("4.8/5"), Some(4.8));
    assert_eq!(parse_number(" 3 / 5 "), Some(3.0));
}

#[test]
fn parse_number_reads_leading_value_from_label() {
    assert_eq!(parse_number("3.2 level of difficulty"), Some(3.2));
    assert_eq!(parse_number("QUALITY 4.5"), Some(4.5));
}

#[test]
fn parse_number_unparseable_is_none() {
    assert_eq!(parse_number("awesome"), None);
    assert_eq!(parse_number("."), None);
}

// -----------------------------------------------------------------------
// parse_percentage
// -----------------------------------------------------------------------

#[test]
fn parse_percentage_reads_leading_integer() {
    assert_eq!(parse_percentage("87%"), Some(87));
    assert_eq!(parse_percentage("87 % Would take again"), Some(87));
    assert_eq!(parse_percentage("66.6%"), Some(67));
    assert_eq!(parse_percentage("0%"), Some(0));
}

#[test]
fn parse_percentage_na_and_out_of_range_are_none() {
    assert_eq!(parse_percentage("N/A"), None);
    assert_eq!(parse_percentage("N/A would take again"), None);
    assert_eq!(parse_percentage(""), None);
    assert_eq!(parse_percentage("140%"), None);
}

// -----------------------------------------------------------------------
// parse_boolean / parse_count / dedup_cleaned
// -----------------------------------------------------------------------

#[test]
fn parse_boolean_truthy_vocabulary() {
    for raw in ["yes", "YES", " Yes ", "true", "y", "1", "on", "Enabled"] {
        assert!(parse_boolean(raw), "{raw}");
    }
    for raw in ["no", "false", "", "maybe", "mandatory"] {
        assert!(!parse_boolean(raw), "{raw}");
    }
}

#[test]
fn parse_count_handles_separators() {
    assert_eq!(parse_count("1,204 ratings"), Some(1204));
    assert_eq!(parse_count("Helpful 7"), Some(7));
    assert_eq!(parse_count("no ratings yet"), None);
}

#[test]
fn dedup_cleaned_keeps_first_occurrence_in_order() {
    let tags = dedup_cleaned([" Tough grader ", "Caring", "Tough  grader", "", "Caring"]);
    assert_eq!(tags, vec!["Tough grader".to_string(), "Caring".to_string()]);
}
