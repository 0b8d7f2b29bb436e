pub mod attempt;
pub mod bot;
pub mod composer;
pub mod filter;
pub mod journal;
pub mod poster;
pub mod scheduler;
pub mod scorer;
pub mod scraper;
pub mod state;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
