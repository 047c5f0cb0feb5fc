pub(crate) mod diff;
