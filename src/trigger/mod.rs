pub(crate) mod binder;
