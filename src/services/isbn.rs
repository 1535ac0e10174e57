//! ISBN cleanup for lookup replies.

/// Returns a valid ISBN-13 for `raw`, converting a valid ISBN-10 when needed
pub fn to_isbn13(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect::<String>()
        .to_uppercase();

    match cleaned.len() {
        13 if is_valid_isbn13(&cleaned) => Some(cleaned),
        10 if is_valid_isbn10(&cleaned) => {
            let body = format!("978{}", &cleaned[..9]);
            let check = isbn13_check_digit(&body)?;
            Some(format!("{}{}", body, check))
        }
        _ => None,
    }
}

/// Picks the best ISBN out of a lookup's list; ISBN-13s win over converted ISBN-10s
pub fn best_isbn13<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut converted = None;
    for raw in candidates {
        let digits = raw.chars().filter(|c| c.is_ascii_alphanumeric()).count();
        match to_isbn13(raw) {
            Some(isbn) if digits == 13 => return Some(isbn),
            Some(isbn) if converted.is_none() => converted = Some(isbn),
            _ => {}
        }
    }
    converted
}

fn isbn13_check_digit(first_twelve: &str) -> Option<u32> {
    let mut sum = 0;
    for (i, c) in first_twelve.chars().enumerate() {
        let digit = c.to_digit(10)?;
        sum += if i % 2 == 0 { digit } else { digit * 3 };
    }
    Some((10 - sum % 10) % 10)
}

fn is_valid_isbn13(isbn: &str) -> bool {
    if !isbn.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match (isbn13_check_digit(&isbn[..12]), isbn[12..].parse::<u32>()) {
        (Some(expected), Ok(actual)) => expected == actual,
        _ => false,
    }
}

fn is_valid_isbn10(isbn: &str) -> bool {
    let mut sum = 0;
    for (i, c) in isbn.chars().enumerate() {
        let value = match c {
            'X' if i == 9 => 10,
            _ => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}
