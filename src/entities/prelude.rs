//! `SeaORM` Entity prelude

pub use super::card_prices::Entity as CardPrices;
pub use super::cards::Entity as Cards;
pub use super::daily_card_prices::Entity as DailyCardPrices;
pub use super::monthly_card_prices::Entity as MonthlyCardPrices;
pub use super::sets::Entity as Sets;
pub use super::sync_status::Entity as SyncStatus;
