use thiserror::Error;

/// Failures at the selector boundary. The navigator treats all of them as
/// "back out at the root", so none of these ever reaches the user.
#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("failed to launch selector `{binary}`: {source}")]
    Launch {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("selector produced {lines} line(s), expected query and key")]
    Malformed { lines: usize },
}
