pub(crate) mod geocode;
pub(crate) mod show;
