pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to fit the ADR polynomial: {0}")]
    AdrFit(String),
    #[error("Cannot triangulate {0} point(s)")]
    Triangulation(usize),
    #[error("Shape mismatch for {what}: expected {expected:?}, found {found:?}")]
    Shape {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

impl Error {
    pub(crate) fn shape(
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    ) -> Self {
        Error::Shape {
            what,
            expected,
            found,
        }
    }
}
