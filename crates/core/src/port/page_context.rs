// Page Ports - hosted page context and the non-job surfaces the poll loop drives

use crate::error::Result;

/// The hosting page: where we are and what document is loaded
pub trait PageContext: Send + Sync {
    /// Current page URL (`None` before anything was loaded)
    fn current_url(&self) -> Option<String>;

    /// Replace the hosted document (navigation). Prior DOM mutations are discarded.
    fn load(&self, url: &str, document: String) -> Result<()>;
}

/// Home feed surface
pub trait FeedSurface: Send + Sync {
    /// Hide the feed behind the focus placeholder. False if no feed container exists.
    fn show_focus_placeholder(&self) -> bool;

    /// Undo `show_focus_placeholder`. False if nothing was hidden.
    fn restore_feed(&self) -> bool;
}

/// Network-growth (invitation manager) surface
pub trait NetworkSurface: Send + Sync {
    /// Identifiers of pending connection invitations, in DOM order
    fn pending_invitations(&self) -> Vec<String>;

    /// Click "accept" on one invitation. False if it is no longer pending.
    fn accept_invitation(&self, invitation_id: &str) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Page with a settable URL
    #[derive(Default)]
    pub struct MockPageContext {
        url: Mutex<Option<String>>,
    }

    impl MockPageContext {
        pub fn at(url: &str) -> Self {
            Self {
                url: Mutex::new(Some(url.to_string())),
            }
        }

        pub fn navigate(&self, url: &str) {
            *self.url.lock().unwrap() = Some(url.to_string());
        }
    }

    impl PageContext for MockPageContext {
        fn current_url(&self) -> Option<String> {
            self.url.lock().unwrap().clone()
        }

        fn load(&self, url: &str, _document: String) -> Result<()> {
            self.navigate(url);
            Ok(())
        }
    }

    /// Feed that counts placeholder renders
    #[derive(Default)]
    pub struct MockFeedSurface {
        hidden: Mutex<bool>,
        renders: AtomicUsize,
    }

    impl MockFeedSurface {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn render_count(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }

        pub fn is_hidden(&self) -> bool {
            *self.hidden.lock().unwrap()
        }
    }

    impl FeedSurface for MockFeedSurface {
        fn show_focus_placeholder(&self) -> bool {
            *self.hidden.lock().unwrap() = true;
            self.renders.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn restore_feed(&self) -> bool {
            std::mem::replace(&mut *self.hidden.lock().unwrap(), false)
        }
    }

    /// Invitation list that empties as invitations are accepted
    #[derive(Default)]
    pub struct MockNetworkSurface {
        pending: Mutex<Vec<String>>,
        accepted: Mutex<Vec<String>>,
    }

    impl MockNetworkSurface {
        pub fn new(pending: &[&str]) -> Self {
            Self {
                pending: Mutex::new(pending.iter().map(|s| s.to_string()).collect()),
                accepted: Mutex::new(Vec::new()),
            }
        }

        pub fn accepted(&self) -> Vec<String> {
            self.accepted.lock().unwrap().clone()
        }
    }

    impl NetworkSurface for MockNetworkSurface {
        fn pending_invitations(&self) -> Vec<String> {
            self.pending.lock().unwrap().clone()
        }

        fn accept_invitation(&self, invitation_id: &str) -> bool {
            let mut pending = self.pending.lock().unwrap();
            let Some(pos) = pending.iter().position(|id| id == invitation_id) else {
                return false;
            };
            pending.remove(pos);
            self.accepted.lock().unwrap().push(invitation_id.to_string());
            true
        }
    }
}
