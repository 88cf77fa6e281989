mod ids;
mod registry;

pub(crate) use ids::IdAllocator;
pub(crate) use registry::{Entry, Registry};
