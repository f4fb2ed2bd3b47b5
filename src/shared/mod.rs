pub mod admin_key;
pub mod constants;
pub mod markup;
pub mod profanity;
#[cfg(test)]
pub mod test_helpers;
pub mod types;
pub mod validation;
