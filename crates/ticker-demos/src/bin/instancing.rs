use anyhow::Result;
use ticker_demos::instancing::{self, Instancing};
use ticker_engine::logging::{init_logging, LoggingConfig};
use ticker_engine::window::Runtime;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    Runtime::run(instancing::app_desc(), Instancing::init)
}
