//! HtmlPage - the hosted page as an HTML snapshot plus a mutation overlay
//!
//! The document text is immutable between loads. Removals, annotations, the
//! feed placeholder and accepted invitations are recorded in an overlay that
//! every read consults, and that a new `load` discards. Parsing happens per
//! call, so no parsed tree is held across threads.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use jobsweep_core::domain::PostingAnnotation;
use jobsweep_core::error::{AppError, Result};
use jobsweep_core::port::{DomJobSource, FeedSurface, NetworkSurface, PageContext, PostingElement};
use scraper::{ElementRef, Html};
use tracing::{debug, info};

use crate::selectors::{self, first_text, selector};

#[derive(Debug, Default)]
struct PageDocument {
    url: Option<String>,
    html: String,
    removed: HashSet<String>,
    annotations: HashMap<String, PostingAnnotation>,
    feed_hidden: bool,
    accepted: HashSet<String>,
}

/// Posting fields read from one job card while the document was parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlPosting {
    pub job_id: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub simple_apply: bool,
    pub footer_text: Option<String>,
}

impl HtmlPosting {
    fn read(card: ElementRef<'_>) -> Self {
        let job_id = card
            .value()
            .attr(selectors::JOB_ID_ATTR)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Self {
            job_id,
            company: first_text(card, selectors::JOB_COMPANY),
            title: first_text(card, selectors::JOB_TITLE),
            simple_apply: selector(selectors::JOB_SIMPLE_APPLY)
                .is_some_and(|s| card.select(&s).next().is_some()),
            footer_text: first_text(card, selectors::JOB_FOOTER),
        }
    }
}

impl PostingElement for HtmlPosting {
    fn job_id(&self) -> Option<String> {
        self.job_id.clone()
    }
    fn company(&self) -> Option<String> {
        self.company.clone()
    }
    fn title(&self) -> Option<String> {
        self.title.clone()
    }
    fn is_simple_apply(&self) -> bool {
        self.simple_apply
    }
    fn footer_text(&self) -> Option<String> {
        self.footer_text.clone()
    }
}

#[derive(Default)]
pub struct HtmlPage {
    document: RwLock<PageDocument>,
}

impl HtmlPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of postings detached since the last load
    pub fn removed_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().removed.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn annotation(&self, job_id: &str) -> Option<PostingAnnotation> {
        self.read().annotations.get(job_id).cloned()
    }

    pub fn is_feed_hidden(&self) -> bool {
        self.read().feed_hidden
    }

    fn read(&self) -> RwLockReadGuard<'_, PageDocument> {
        self.document.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, PageDocument> {
        self.document.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attached cards in document order, read into owned postings
    fn cards(&self) -> Vec<HtmlPosting> {
        let doc = self.read();
        let Some(card_selector) = selector(selectors::JOB_CARD) else {
            return Vec::new();
        };

        let html = Html::parse_document(&doc.html);
        html.select(&card_selector)
            .map(HtmlPosting::read)
            .filter(|p| p.job_id.as_ref().map_or(true, |id| !doc.removed.contains(id)))
            .collect()
    }

    fn has_card(&self, job_id: &str) -> bool {
        self.cards()
            .iter()
            .any(|p| p.job_id.as_deref() == Some(job_id))
    }

    fn matches_any(&self, css: &str) -> bool {
        let Some(sel) = selector(css) else {
            return false;
        };
        Html::parse_document(&self.read().html)
            .select(&sel)
            .next()
            .is_some()
    }
}

impl PageContext for HtmlPage {
    fn current_url(&self) -> Option<String> {
        self.read().url.clone()
    }

    fn load(&self, url: &str, document: String) -> Result<()> {
        url::Url::parse(url)
            .map_err(|e| AppError::Validation(format!("invalid page url {}: {}", url, e)))?;

        let mut doc = self.write();
        *doc = PageDocument {
            url: Some(url.to_string()),
            html: document,
            ..Default::default()
        };
        info!(url = %url, bytes = doc.html.len(), "Page loaded");
        Ok(())
    }
}

impl DomJobSource for HtmlPage {
    fn postings(&self) -> Vec<Box<dyn PostingElement>> {
        self.cards()
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn PostingElement>)
            .collect()
    }

    fn remove_posting(&self, job_id: &str) -> bool {
        if !self.has_card(job_id) {
            return false;
        }
        self.write().removed.insert(job_id.to_string())
    }

    fn annotate_posting(&self, job_id: &str, annotation: &PostingAnnotation) -> bool {
        if !self.has_card(job_id) {
            return false;
        }
        let mut doc = self.write();
        if doc.annotations.contains_key(job_id) {
            return false;
        }
        debug!(job_id = %job_id, domain = %annotation.domain, "Posting annotated");
        doc.annotations.insert(job_id.to_string(), annotation.clone());
        true
    }
}

impl FeedSurface for HtmlPage {
    fn show_focus_placeholder(&self) -> bool {
        if !self.matches_any(selectors::FEED_CONTAINER) {
            return false;
        }
        self.write().feed_hidden = true;
        true
    }

    fn restore_feed(&self) -> bool {
        std::mem::replace(&mut self.write().feed_hidden, false)
    }
}

impl NetworkSurface for HtmlPage {
    fn pending_invitations(&self) -> Vec<String> {
        let Some(sel) = selector(selectors::INVITATION_CARD) else {
            return Vec::new();
        };
        let doc = self.read();
        Html::parse_document(&doc.html)
            .select(&sel)
            .filter_map(|card| card.value().attr(selectors::INVITATION_ID_ATTR))
            .filter(|id| !doc.accepted.contains(*id))
            .map(str::to_string)
            .collect()
    }

    fn accept_invitation(&self, invitation_id: &str) -> bool {
        if !self.pending_invitations().iter().any(|id| id == invitation_id) {
            return false;
        }
        self.write().accepted.insert(invitation_id.to_string())
    }
}
