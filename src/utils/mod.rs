pub(crate) mod file_io;
pub(crate) mod key;
