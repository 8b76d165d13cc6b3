use thiserror::Error;

/// Fatal errors raised while building a simulation.
///
/// Admission rejections are not errors; they travel as
/// `fogsim_scheduler::Admission` values.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error(
        "unknown scheduling policy '{0}', expected one of \
         fifo, emergency-first, static-priority, sla-dynamic"
    )]
    UnknownPolicy(String),
}
