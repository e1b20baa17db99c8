use anyhow::Result;
use ticker_demos::attributes::{self, Attributes};
use ticker_engine::logging::{init_logging, LoggingConfig};
use ticker_engine::window::Runtime;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    Runtime::run(attributes::app_desc(), Attributes::init)
}
