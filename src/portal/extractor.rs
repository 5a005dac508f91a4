use super::browser::Browser;
use super::page::Page;
use crate::diff::Snapshot;
use crate::domain::PortalUrl;
use crate::error::{ConnectionError, CycleError, ParseError};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;
use tracing::{debug, info};

const CONTAINER: &str = "#contenu_principal";
const ROWS: &str = "#contenu_principal table tbody tr";
const FOOTER_CLASS: &str = "footer";

static CONTAINER_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(CONTAINER).expect("valid selector"));
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(ROWS).expect("valid selector"));
static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Course name -> detail link, from the listing page.
///
/// Courses without a link in their last cell are not navigable yet and are
/// left out.
pub fn course_links(page: &Page) -> Result<BTreeMap<String, String>, ParseError> {
    let document = page.document();
    if document.select(&CONTAINER_SELECTOR).next().is_none() {
        return Err(ParseError::MissingContainer(CONTAINER, page.url().to_string()));
    }

    let mut links = BTreeMap::new();
    for (index, row) in document.select(&ROW_SELECTOR).enumerate() {
        let cells: Vec<ElementRef<'_>> = row.select(&CELL_SELECTOR).collect();
        let (Some(first), Some(last)) = (cells.first(), cells.last()) else {
            return Err(ParseError::MissingCell {
                row: index,
                url: page.url().to_string(),
            });
        };
        let course = cell_text(*first);
        match last
            .select(&LINK_SELECTOR)
            .next()
            .and_then(|a| a.value().attr("href"))
        {
            Some(href) => {
                links.insert(course, href.to_string());
            }
            None => debug!(course = %course, "course has no detail link yet"),
        }
    }
    Ok(links)
}

/// Item titles of a course detail page, footer rows excluded.
pub fn course_items(page: &Page) -> Result<Vec<String>, ParseError> {
    let document = page.document();
    let mut titles = Vec::new();
    for (index, row) in document.select(&ROW_SELECTOR).enumerate() {
        if row.value().classes().any(|class| class == FOOTER_CLASS) {
            continue;
        }
        let first = row
            .select(&CELL_SELECTOR)
            .next()
            .ok_or_else(|| ParseError::MissingCell {
                row: index,
                url: page.url().to_string(),
            })?;
        titles.push(cell_text(first));
    }
    Ok(titles)
}

/// Concatenation of every stripped text fragment of a cell, so titles split
/// across several spans come out whole.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().map(str::trim).filter(|part| !part.is_empty()).collect()
}

/// Visits every course detail page with the logged-in session.
pub async fn extract_snapshot<B: Browser>(
    browser: &B,
    listing: &Page,
    base: &PortalUrl,
) -> Result<Snapshot, CycleError> {
    let links = course_links(listing)?;
    info!(courses = links.len(), "parsed course listing");

    let mut snapshot = Snapshot::new();
    for (course, link) in links {
        let url = base
            .join(&link)
            .map_err(|source| ConnectionError::InvalidUrl { url: link, source })?;
        let page = browser.open(&url).await?;
        let items = course_items(&page)?;
        debug!(course = %course, items = items.len(), "parsed course page");
        snapshot.insert(course, items);
    }
    Ok(snapshot)
}
