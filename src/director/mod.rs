/// Animation planning.
pub(crate) mod plan;

pub(crate) mod completion;
pub(crate) mod transition;
