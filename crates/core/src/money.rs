use rust_decimal::Decimal;

/// Formats a price for display: whole sums, thousands grouped with spaces,
/// currency word appended. `150000000` renders as `150 000 000 сум`.
pub fn format_price(price: Decimal) -> String {
    let rounded = price.round();
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, ch) in digits.chars().rev().enumerate() {
        if index > 0 && index % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    let body: String = grouped.chars().rev().collect();

    if negative {
        format!("-{body} сум")
    } else {
        format!("{body} сум")
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::format_price;

    #[test]
    fn groups_thousands_with_spaces() {
        assert_eq!(format_price(Decimal::new(150_000_000, 0)), "150 000 000 сум");
        assert_eq!(format_price(Decimal::new(1_000, 0)), "1 000 сум");
        assert_eq!(format_price(Decimal::new(999, 0)), "999 сум");
        assert_eq!(format_price(Decimal::ZERO), "0 сум");
    }

    #[test]
    fn rounds_fractional_prices_to_whole_sums() {
        assert_eq!(format_price(Decimal::new(1_234_560, 2)), "12 346 сум");
    }
}
