//! Lookup key derivation for the price source.
//!
//! Keys look like `pokemon-base-set/pikachu-025`: a normalized set segment
//! and a normalized `name-number` segment.

use crate::models::card::CatalogItem;

/// Prefix of every set segment
pub const GAME_PREFIX: &str = "pokemon";

/// Set segment used for any set whose name mentions "promo"
pub const PROMO_SET_KEY: &str = "promo";

/// Lowercase, spaces to `-`, then drop apostrophes and anything outside
/// `[a-z0-9-&]`. Separators are kept as they are, so `" / "` becomes `--`.
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter_map(|ch| match ch {
            ' ' => Some('-'),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '&' => Some(c),
            _ => None,
        })
        .collect()
}

pub fn is_promo_set(set_name: &str) -> bool {
    set_name.to_lowercase().contains("promo")
}

pub fn set_segment(set_name: &str) -> String {
    if is_promo_set(set_name) {
        format!("{}-{}", GAME_PREFIX, PROMO_SET_KEY)
    } else {
        format!("{}-{}", GAME_PREFIX, normalize(set_name))
    }
}

pub fn card_segment(name: &str, number: &str) -> String {
    let name = normalize(name);
    let number = if number.trim().is_empty() {
        String::new()
    } else {
        normalize(number)
    };

    match (name.is_empty(), number.is_empty()) {
        (_, true) => name,
        (true, false) => number,
        (false, false) => format!("{}-{}", name, number),
    }
}

pub fn derive_lookup_key(item: &CatalogItem) -> String {
    format!(
        "{}/{}",
        set_segment(&item.set_name),
        card_segment(&item.name, &item.number)
    )
}
