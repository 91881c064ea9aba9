pub(crate) mod evaluate;
pub(crate) mod helpers;
pub(crate) mod inverse;
pub(crate) mod plan;
