use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("win32 error: {0}")]
    Win32(#[from] windows::core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] whispr_core::Error),
}
