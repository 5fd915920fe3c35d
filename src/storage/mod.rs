mod foods;
mod history;
mod preferences;
mod schema;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, FoodRecord, HistoryRecord, HistoryWithFood, NewFoodRow};
