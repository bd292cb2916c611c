pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod config;
mod parser;
pub mod scraper;
pub mod session;
pub mod types;
pub mod utils;

pub use aggregate::{Drilldown, RollCallMatrix, drilldown, roll_call_matrix};
pub use config::{ColumnSchema, Motion, SiteConfig, TopicConfig};
pub use parser::{
    is_bill_url, merge_contacts, parse_bill_metadata, parse_contacts, parse_roster,
    parse_vote_history,
};
pub use scraper::{FetchError, HttpSource, PageSource};
pub use session::Session;
