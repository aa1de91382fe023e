use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;

lazy_static! {
    // "$1,234.56", "1234", "$ 0.25"
    static ref PRICE_REGEX: Regex = Regex::new(r"\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap();

    // Marker the price page wraps the ungraded price in
    static ref PRICE_SELECTOR: Selector = Selector::parse("span.price").unwrap();
}

/// Extract the first parsable price from a price page.
///
/// Placeholder cells ("-", "N/A") are skipped, so a page that lists no
/// price at all yields `None`.
pub fn extract_price(html: &str) -> Option<Decimal> {
    let document = Html::parse_document(html);

    document
        .select(&PRICE_SELECTOR)
        .map(|element| element.text().collect::<String>())
        .find_map(|text| parse_price_text(&text))
}

/// Parse a displayed price like "$1,234.56" into a decimal.
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let captures = PRICE_REGEX.captures(text.trim())?;
    let digits = captures[1].replace(',', "");
    Decimal::from_str(&digits).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_extract_price() {
        let html = r#"
            <table><tr>
              <td id="used_price"><span class="price js-price">$1,234.56</span></td>
              <td id="complete_price"><span class="price js-price">$2,000.00</span></td>
            </tr></table>
        "#;
        assert_eq!(extract_price(html), Some(dec!(1234.56)));
    }

    #[test]
    fn test_extract_price_skips_placeholders() {
        let html = r#"<span class="price">-</span><span class="price js-price"> $0.25 </span>"#;
        assert_eq!(extract_price(html), Some(dec!(0.25)));
    }

    #[test]
    fn test_extract_price_missing_marker() {
        assert_eq!(extract_price("<html><body>No results</body></html>"), None);
        assert_eq!(extract_price(r#"<span class="price">N/A</span>"#), None);
    }

    #[test]
    fn test_parse_price_text() {
        assert_eq!(parse_price_text("$12"), Some(dec!(12)));
        assert_eq!(parse_price_text("  $ 7.5 "), Some(dec!(7.5)));
        assert_eq!(parse_price_text("free"), None);
    }
}
