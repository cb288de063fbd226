pub mod error;
pub mod stream;

pub use error::{MonitorError, MonitorResult};
pub use stream::StreamListener;
