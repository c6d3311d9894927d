// Application Layer - Use Cases and Business Logic

pub mod extractor;
pub mod filter_engine;
pub mod panic_guard;
pub mod poll_loop;
pub mod settings_reader;
pub mod url_cache;

// Re-exports
pub use extractor::JobRecordExtractor;
pub use filter_engine::JobFilterEngine;
pub use poll_loop::{
    shutdown_channel, PagePorts, PollConfig, PollLoop, ResolutionMode, ShutdownSender, ShutdownToken,
};
pub use settings_reader::SettingsReader;
pub use url_cache::JobUrlCache;
