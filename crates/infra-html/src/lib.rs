// Jobsweep Infrastructure - Page Adapters
// Implements: PageContext, DomJobSource, FeedSurface, NetworkSurface (HtmlPage)
//             UrlResolver (HttpUrlResolver)

mod page;
mod resolver;
mod selectors;

pub use page::{HtmlPage, HtmlPosting};
pub use resolver::{find_url_attribute, HttpUrlResolver, ResolverSettings};
