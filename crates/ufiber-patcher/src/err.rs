use thiserror::Error as TError;

#[derive(Debug, TError)]
pub enum Error {
    /// Input path has no file name to derive the output name from
    #[error("Can't derive the output file name from {0}")]
    OutputName(String),

    /// ufiber-nvram error
    #[error("NVRAM error: {0}")]
    Nvram(#[from] ufiber_nvram::err::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
