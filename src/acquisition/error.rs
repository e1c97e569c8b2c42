use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("failed to open serial port {port}: {source}")]
    Connect {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial read failed: {0}")]
    Io(#[from] std::io::Error),
}
