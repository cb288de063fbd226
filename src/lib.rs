pub mod config;
pub mod decode;
pub mod history;
pub mod monitor;
pub mod types;
pub mod view;

pub use config::{create_default_config, load_config};
pub use decode::{AbstainReason, Outcome, TradeDecoder, TradeRecord};
pub use history::Backfill;
pub use monitor::{MonitorError, MonitorResult, StreamListener};
pub use types::{MonitorConfig, Venue};
pub use view::{RawTransactionView, ViewError};
