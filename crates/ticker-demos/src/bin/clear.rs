use anyhow::Result;
use ticker_demos::clear::{self, Clear};
use ticker_engine::logging::{init_logging, LoggingConfig};
use ticker_engine::window::Runtime;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    Runtime::run(clear::app_desc(), Clear::init)
}
