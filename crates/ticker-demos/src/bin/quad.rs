use anyhow::Result;
use ticker_demos::quad::{self, Quad};
use ticker_engine::logging::{init_logging, LoggingConfig};
use ticker_engine::window::Runtime;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    Runtime::run(quad::app_desc(), Quad::init)
}
