pub(crate) mod correspond;
