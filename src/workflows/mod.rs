pub mod batch;
pub mod grabber;
pub mod matchers;

#[cfg(test)]
pub(crate) mod testing;
