// Each test binary uses a different subset of the helpers.
#[allow(dead_code)]
pub mod test_utils;
