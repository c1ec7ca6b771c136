use crate::adapter::TreeError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Functional component {component} did not settle after {depth} expansions")]
    RecursiveComponent { component: String, depth: usize },

    #[error("Component {component} finished rendering without a live node")]
    MissingBase { component: String },
}
