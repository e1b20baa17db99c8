use anyhow::Result;
use ticker_demos::ohlc::{self, Ohlc};
use ticker_engine::logging::{init_logging, LoggingConfig};
use ticker_engine::window::Runtime;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    Runtime::run(ohlc::app_desc(), Ohlc::init)
}
