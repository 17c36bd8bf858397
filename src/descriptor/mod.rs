pub(crate) mod json;
pub(crate) mod model;
pub(crate) mod source;
