/// Everything that can go wrong while locating, opening, or reading from a repository.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Discover(#[from] gitmeta_discover::Error),
    #[error(transparent)]
    Config(#[from] gitmeta_config::Error),
    #[error(transparent)]
    Reference(#[from] gitmeta_ref::Error),
    #[error("reference string {0:?} is not valid UTF-8")]
    InvalidReferenceString(Vec<u8>),
}
