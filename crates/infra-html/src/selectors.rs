// Structural CSS selectors for the hosted pages

use scraper::{ElementRef, Selector};
use tracing::warn;

/// One posting in the jobs search list
pub const JOB_CARD: &str = "li.jobs-search-results__list-item";
/// Attribute on the card carrying the job id
pub const JOB_ID_ATTR: &str = "data-occludable-job-id";
pub const JOB_TITLE: &str = ".job-card-list__title";
pub const JOB_COMPANY: &str = ".artdeco-entity-lockup__subtitle";
pub const JOB_FOOTER: &str = ".job-card-container__footer-wrapper";
/// Platform logo inside the footer marks a simple-apply posting
pub const JOB_SIMPLE_APPLY: &str = ".job-card-container__footer-wrapper li-icon[type='linkedin-bug']";

/// Home feed scroll container
pub const FEED_CONTAINER: &str = "div.scaffold-finite-scroll__content";

/// Pending connection invitation
pub const INVITATION_CARD: &str = "li.invitation-card";
pub const INVITATION_ID_ATTR: &str = "data-invitation-id";

/// Parse a selector, logging instead of failing on bad CSS
pub fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(selector = css, error = %e, "Invalid CSS selector");
            None
        }
    }
}

/// Whitespace-collapsed text of the first match under `scope`
pub fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let selector = selector(css)?;
    let element = scope.select(&selector).next()?;
    let text = collapse_whitespace(&element.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
