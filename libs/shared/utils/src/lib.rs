pub mod jwt;
pub mod storage;
pub mod test_utils;
pub mod validation;
