//! Output sinks for build progress and container I/O.

use std::path::PathBuf;

use serde::Serialize;

/// Destination of one build output stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "path")]
pub enum Sink {
    Stdout,
    Stderr,
    /// Append to a log file
    File(PathBuf),
    /// Drop everything written
    Discard,
}

impl std::fmt::Display for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Discard => write!(f, "discard"),
        }
    }
}

/// Streams wired into the build engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildStreams {
    /// Forward the process's standard input to RUN steps
    pub stdin: bool,
    pub out: Sink,
    pub err: Sink,
    /// Progress report ("STEP 1/4: FROM ...")
    pub report: Sink,
}

impl Default for BuildStreams {
    fn default() -> Self {
        Self {
            stdin: false,
            out: Sink::Stdout,
            err: Sink::Stderr,
            report: Sink::Stderr,
        }
    }
}

impl BuildStreams {
    /// Send every output stream to the given log file.
    pub fn redirect_to(mut self, log_file: impl Into<PathBuf>) -> Self {
        let log_file = log_file.into();
        self.out = Sink::File(log_file.clone());
        self.err = Sink::File(log_file.clone());
        self.report = Sink::File(log_file);
        self
    }

    /// Replace the progress report sink with a discard sink.
    pub fn quiet(mut self) -> Self {
        self.report = Sink::Discard;
        self
    }
}
