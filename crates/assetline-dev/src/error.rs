//! Error types for the watch loop and development server

use std::path::PathBuf;

use thiserror::Error;

use assetline_tasks::GraphError;

/// Watch loop errors
#[derive(Error, Debug)]
pub enum WatchError {
    /// File watcher could not be created
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(#[source] notify::Error),

    /// A directory could not be watched
    #[error("Failed to watch {}: {source}", path.display())]
    WatchPath {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A watch rule glob is invalid
    #[error("Invalid watch rule '{glob}': {message}")]
    InvalidRule { glob: String, message: String },

    /// A watch rule names a task the graph does not have
    #[error(transparent)]
    UnknownTask(#[from] GraphError),

    /// The watcher stopped delivering events
    #[error("File watcher channel closed")]
    ChannelClosed,
}

/// Development server errors
#[derive(Error, Debug)]
pub enum ServeError {
    /// Address could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server stopped with an error
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}
