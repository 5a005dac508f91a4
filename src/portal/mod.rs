//! Everything that talks to the grade portal: the session, login and the
//! HTML extraction of courses and their items.

mod browser;
mod extractor;
mod fetcher;
mod page;

pub use browser::{Browser, HttpBrowser};
pub use extractor::{course_items, course_links, extract_snapshot};
pub use fetcher::{PASSWORD_FIELD, PortalAccess, USERNAME_FIELD, connect};
pub use page::{Form, FormMethod, Page};
