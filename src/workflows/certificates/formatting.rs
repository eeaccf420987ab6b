use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// `DD.MM.YYYY`, used on annual, roadworthiness and abandoned certificates.
pub fn dotted_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%d.%m.%Y").to_string()
}

/// `DD/MM/YYYY`, used on vehicle approval certificates.
pub fn slashed_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%d/%m/%Y").to_string()
}

/// `D MMMM YYYY`, used for the issue date reported alongside a generated document.
pub fn long_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%-d %B %Y").to_string()
}

/// Renders `Last, First` as `First Last`.
///
/// Only a single comma followed by one space is reversed; any other shape, including
/// `Last,First`, is returned unchanged.
pub fn display_name(raw: &str) -> String {
    if raw.matches(',').count() != 1 {
        return raw.to_string();
    }

    match raw.split_once(", ") {
        Some((surname, forename)) => format!("{forename} {surname}"),
        None => raw.to_string(),
    }
}

/// Splits free text into sentences on `". "`.
///
/// A period whose second predecessor is also a period (`e.g. `, `i.e. `) is treated as
/// part of an abbreviation and does not end the sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut index = 0;

    while index < chars.len() {
        let at_boundary = chars[index] == '.' && chars.get(index + 1) == Some(&' ');
        let abbreviation = index >= 2 && chars[index - 2] == '.';

        if at_boundary && !abbreviation {
            sentences.push(std::mem::take(&mut current));
            index += 2;
            continue;
        }

        current.push(chars[index]);
        index += 1;
    }

    sentences.push(current);
    sentences
}

/// Numeric-aware, case-insensitive ordering: `"2"` sorts before `"10"`.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let left_chunks = chunks(left);
    let right_chunks = chunks(right);

    for (a, b) in left_chunks.iter().zip(right_chunks.iter()) {
        let ordering = match (a, b) {
            (Chunk::Number(x), Chunk::Number(y)) => compare_digits(x, y),
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    left_chunks.len().cmp(&right_chunks.len())
}

enum Chunk {
    Number(String),
    Text(String),
}

fn chunks(value: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut numeric = false;

    for ch in value.chars() {
        let is_digit = ch.is_ascii_digit();
        if !buffer.is_empty() && is_digit != numeric {
            chunks.push(finish_chunk(std::mem::take(&mut buffer), numeric));
        }
        numeric = is_digit;
        buffer.extend(ch.to_lowercase());
    }

    if !buffer.is_empty() {
        chunks.push(finish_chunk(buffer, numeric));
    }
    chunks
}

fn finish_chunk(buffer: String, numeric: bool) -> Chunk {
    if numeric {
        Chunk::Number(buffer)
    } else {
        Chunk::Text(buffer)
    }
}

fn compare_digits(left: &str, right: &str) -> Ordering {
    let left = left.trim_start_matches('0');
    let right = right.trim_start_matches('0');
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_dates_for_each_certificate_family() {
        let timestamp = Utc
            .with_ymd_and_hms(2024, 3, 7, 14, 5, 0)
            .single()
            .expect("valid timestamp");

        assert_eq!(dotted_date(&timestamp), "07.03.2024");
        assert_eq!(slashed_date(&timestamp), "07/03/2024");
        assert_eq!(long_date(&timestamp), "7 March 2024");
    }

    #[test]
    fn display_name_reverses_surname_first_names() {
        assert_eq!(display_name("Smith, Jane"), "Jane Smith");
        assert_eq!(display_name("Jane Smith"), "Jane Smith");
        assert_eq!(display_name("Smith, Jane, Doe"), "Smith, Jane, Doe");
        assert_eq!(display_name("Smith,Jane"), "Smith,Jane");
    }

    #[test]
    fn split_sentences_keeps_abbreviations_together() {
        let reasons = split_sentences(
            "The vehicle was not submitted for test at the appointed time. The relevant test fee e.g. the fee has not been paid. Other",
        );

        assert_eq!(
            reasons,
            vec![
                "The vehicle was not submitted for test at the appointed time".to_string(),
                "The relevant test fee e.g. the fee has not been paid".to_string(),
                "Other".to_string(),
            ]
        );
    }

    #[test]
    fn split_sentences_returns_single_entry_without_boundaries() {
        assert_eq!(split_sentences("Brakes seized"), vec!["Brakes seized"]);
    }

    #[test]
    fn natural_cmp_orders_numeric_runs_by_value() {
        let mut refs = vec!["2.1", "10.2", "1.3"];
        refs.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(refs, vec!["1.3", "2.1", "10.2"]);
    }

    #[test]
    fn natural_cmp_ignores_case() {
        assert_eq!(natural_cmp("1a", "1A"), Ordering::Equal);
        assert_eq!(natural_cmp("1a", "1b"), Ordering::Less);
        assert_eq!(natural_cmp("9", "09"), Ordering::Equal);
    }
}
