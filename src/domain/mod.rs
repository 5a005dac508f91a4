mod portal_url;
mod snowflake;

pub use portal_url::*;
pub use snowflake::*;
