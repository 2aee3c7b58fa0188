/// Errors raised while compiling a model.
///
/// Both kinds surface synchronously at compile time, before any record is
/// constructed. Unknown type names and unresolved projection sources are not
/// errors; they degrade to untyped attributes and undefined values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    #[error("no attribute name can be derived from {context}")]
    InvalidSpec { context: String },
    #[error("multiple inheritance is not supported (extends lists {count} models)")]
    UnsupportedMultipleInheritance { count: usize },
}

pub type Result<T> = std::result::Result<T, BindingError>;
