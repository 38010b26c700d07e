pub mod config;
pub mod data;
pub mod preview;
pub mod util;

pub use config::Config;
pub use data::{AppStateStore, Database};
pub use preview::{
    FrameFactory, HostEffect, Intent, PreviewError, PreviewSession, SessionDriver, SessionHandle,
    SessionMode, SessionProps, SessionView,
};
