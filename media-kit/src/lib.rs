pub mod attributes;
pub mod error;
pub mod event;
pub mod kit;
pub mod vendor;

#[cfg(test)]
mod test_utils;
