/// Format a dollar amount for display.
///
/// `$X.YM` at a million and up, `$XK` at a thousand and up, `$X` with
/// thousands separators below that. Zero renders as `$0`.
pub fn format_money(amount: f64) -> String {
    if amount >= 1_000_000.0 {
        format!("${:.1}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("${:.0}K", amount / 1_000.0)
    } else {
        format!("${}", group_thousands(amount.round() as i64))
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Capitalize the first letter of each word, lowercasing the rest.
/// Disclosure sources report names in all caps.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }
    result
}

/// Round to cents for serialized amounts.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money_millions() {
        assert_eq!(format_money(1_500_000.0), "$1.5M");
        assert_eq!(format_money(10_000_000.0), "$10.0M");
    }

    #[test]
    fn test_format_money_thousands() {
        assert_eq!(format_money(50_000.0), "$50K");
        assert_eq!(format_money(1_000.0), "$1K");
    }

    #[test]
    fn test_format_money_small() {
        assert_eq!(format_money(500.0), "$500");
        assert_eq!(format_money(0.0), "$0");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ACME WIDGETS LLC"), "Acme Widgets Llc");
        assert_eq!(title_case("o'neill"), "O'Neill");
        assert_eq!(title_case("JANE DOE-SMITH"), "Jane Doe-Smith");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1234.567), 1234.57);
        assert_eq!(round2(10.0), 10.0);
    }
}
