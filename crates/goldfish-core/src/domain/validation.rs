use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{CoreError, CoreResult};

lazy_static! {
    // local part, then a dotted domain whose labels neither start nor end with '-'
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$"
    ).unwrap();
}

/// Check that a string is a syntactically valid email address
pub fn validate_email(email: &str) -> CoreResult<()> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(CoreError::ValidationError(format!(
            "owner_email '{}' is not a valid email address",
            email
        )))
    }
}
