#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),
}
