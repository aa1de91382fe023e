pub mod card;
pub mod job;
pub mod price;
pub mod response;
