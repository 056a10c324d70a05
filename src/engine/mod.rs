//! Market engine: instrument catalog, price generation, the feed aggregator
//! and the portfolio ledger.

pub mod catalog;
pub mod feed;
pub mod generator;
pub mod ledger;
pub mod live;

pub use catalog::FeedMode;
pub use feed::{FeedAggregator, FeedConfig, FeedSink, FeedStatus};
pub use ledger::{Ledger, LedgerConfig, LedgerError, PortfolioView};
pub use live::{BinanceConnector, LiveConnector};
