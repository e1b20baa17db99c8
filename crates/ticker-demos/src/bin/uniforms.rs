use anyhow::Result;
use ticker_demos::uniforms::{self, Uniforms};
use ticker_engine::logging::{init_logging, LoggingConfig};
use ticker_engine::window::Runtime;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    Runtime::run(uniforms::app_desc(), Uniforms::init)
}
