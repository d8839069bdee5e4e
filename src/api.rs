pub mod media;
pub mod swagger_main;
pub mod todo;
pub mod verification;

#[cfg(test)]
pub mod test_util;
