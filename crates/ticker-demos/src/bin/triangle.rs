use anyhow::Result;
use ticker_demos::triangle::{self, Triangle};
use ticker_engine::logging::{init_logging, LoggingConfig};
use ticker_engine::window::Runtime;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    Runtime::run(triangle::app_desc(), Triangle::init)
}
