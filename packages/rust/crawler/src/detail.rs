//! Posting detail page extraction.
//!
//! The detail page carries structured facts in a `<dl>`: each `<dt>` label is
//! followed by its `<dd>` value. The salary is the value after the label
//! configured as `site.salary_label`.

use std::borrow::Cow;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static LABEL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dl dt").expect("valid selector"));

/// Find the salary text on a detail page.
///
/// Returns the trimmed text of the element right after the last `<dt>` whose
/// text contains `label`, or `None` if there is no such label or the value is
/// blank. Labels are compared after [`fold_label`], so the match survives
/// mis-decoded or decomposed diacritics but stays case-sensitive.
pub fn extract_salary_text(markup: &str, label: &str) -> Option<String> {
    let doc = Html::parse_document(markup);
    let wanted = fold_label(label);

    let mut value = None;
    for dt in doc.select(&LABEL_SEL) {
        let text = dt.text().collect::<String>();
        if fold_label(&text).contains(&wanted) {
            value = next_element_sibling(dt);
        }
    }

    value
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn next_element_sibling(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Fold a label to a comparison form.
///
/// Repairs UTF-8 that was read as Latin-1, drops combining marks and maps
/// Slovene/Croatian letters with diacritics to their ASCII base letter.
pub fn fold_label(text: &str) -> String {
    repair_latin1_mojibake(text)
        .chars()
        .filter(|c| !is_combining_mark(*c))
        .map(fold_char)
        .collect()
}

fn repair_latin1_mojibake(text: &str) -> Cow<'_, str> {
    let all_latin1 = text.chars().all(|c| (c as u32) < 0x100);
    let has_high = text.chars().any(|c| (c as u32) >= 0x80);
    if all_latin1 && has_high {
        let bytes: Vec<u8> = text.chars().map(|c| c as u8).collect();
        if let Ok(repaired) = String::from_utf8(bytes) {
            return Cow::Owned(repaired);
        }
    }
    Cow::Borrowed(text)
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F)
}

fn fold_char(c: char) -> char {
    match c {
        'č' | 'ć' => 'c',
        'Č' | 'Ć' => 'C',
        'š' => 's',
        'Š' => 'S',
        'ž' => 'z',
        'Ž' => 'Z',
        'đ' => 'd',
        'Đ' => 'D',
        other => other,
    }
}
