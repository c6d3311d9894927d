// DOM Job Source Port
// Capability interface over the live job list so selector logic can be swapped or mocked.

use crate::domain::PostingAnnotation;

/// One posting element of the job-list container.
///
/// Each read may come back empty when the DOM shape does not match; reads
/// are independent and may be attempted in any order.
pub trait PostingElement: Send {
    fn job_id(&self) -> Option<String>;
    fn company(&self) -> Option<String>;
    fn title(&self) -> Option<String>;
    fn is_simple_apply(&self) -> bool;
    fn footer_text(&self) -> Option<String>;
}

/// Read and mutate the job-list portion of the current page
pub trait DomJobSource: Send + Sync {
    /// Posting elements currently attached, in DOM order
    fn postings(&self) -> Vec<Box<dyn PostingElement>>;

    /// Detach the posting node for `job_id`.
    ///
    /// Returns false when the node is already gone (not an error).
    fn remove_posting(&self, job_id: &str) -> bool;

    /// Append a favicon + domain label to a posting.
    ///
    /// Returns false when the posting is absent or already annotated.
    fn annotate_posting(&self, job_id: &str, annotation: &PostingAnnotation) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Posting with fixed field values
    #[derive(Debug, Clone, Default)]
    pub struct ScriptedPosting {
        pub job_id: Option<String>,
        pub company: Option<String>,
        pub title: Option<String>,
        pub simple_apply: bool,
        pub footer_text: Option<String>,
        /// Panic on field access (simulates a broken selector)
        pub panics: bool,
    }

    impl ScriptedPosting {
        pub fn new(job_id: &str, company: &str, title: &str) -> Self {
            Self {
                job_id: Some(job_id.to_string()),
                company: Some(company.to_string()),
                title: Some(title.to_string()),
                ..Default::default()
            }
        }

        pub fn with_footer(mut self, footer: &str) -> Self {
            self.footer_text = Some(footer.to_string());
            self
        }

        pub fn simple_apply(mut self) -> Self {
            self.simple_apply = true;
            self
        }

        pub fn panicking() -> Self {
            Self {
                panics: true,
                ..Default::default()
            }
        }
    }

    impl PostingElement for ScriptedPosting {
        fn job_id(&self) -> Option<String> {
            if self.panics {
                panic!("selector blew up");
            }
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

    /// In-memory job list; removed postings disappear from `postings()`
    #[derive(Default)]
    pub struct MockDomJobSource {
        postings: Mutex<Vec<ScriptedPosting>>,
        removed: Mutex<Vec<String>>,
        annotations: Mutex<HashMap<String, PostingAnnotation>>,
    }

    impl MockDomJobSource {
        pub fn new(postings: Vec<ScriptedPosting>) -> Self {
            Self {
                postings: Mutex::new(postings),
                ..Default::default()
            }
        }

        pub fn set_postings(&self, postings: Vec<ScriptedPosting>) {
            *self.postings.lock().unwrap() = postings;
        }

        pub fn removed(&self) -> Vec<String> {
            self.removed.lock().unwrap().clone()
        }

        pub fn annotation(&self, job_id: &str) -> Option<PostingAnnotation> {
            self.annotations.lock().unwrap().get(job_id).cloned()
        }

        pub fn annotation_count(&self) -> usize {
            self.annotations.lock().unwrap().len()
        }
    }

    impl DomJobSource for MockDomJobSource {
        fn postings(&self) -> Vec<Box<dyn PostingElement>> {
            self.postings
                .lock()
                .unwrap()
                .iter()
                .cloned()
                .map(|p| Box::new(p) as Box<dyn PostingElement>)
                .collect()
        }

        fn remove_posting(&self, job_id: &str) -> bool {
            let mut postings = self.postings.lock().unwrap();
            let before = postings.len();
            postings.retain(|p| p.panics || p.job_id.as_deref() != Some(job_id));
            if postings.len() == before {
                return false;
            }
            self.removed.lock().unwrap().push(job_id.to_string());
            true
        }

        fn annotate_posting(&self, job_id: &str, annotation: &PostingAnnotation) -> bool {
            let present = self
                .postings
                .lock()
                .unwrap()
                .iter()
                .any(|p| !p.panics && p.job_id.as_deref() == Some(job_id));
            if !present {
                return false;
            }
            let mut annotations = self.annotations.lock().unwrap();
            if annotations.contains_key(job_id) {
                return false;
            }
            annotations.insert(job_id.to_string(), annotation.clone());
            true
        }
    }
}
