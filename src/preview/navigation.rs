//! Active page and URL tracking.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::channel::FrameMessageChannel;

/// A page of the previewed application. Identity is `page_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "pagePath")]
    pub page_path: String,
    /// Anything else the host attaches to the page
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Page {
    pub fn new(page_path: impl Into<String>) -> Self {
        Self {
            page_path: page_path.into(),
            metadata: Map::new(),
        }
    }

    /// Path this page is served under, rooted at `/`
    pub fn url(&self) -> String {
        format!("/{}", self.page_path)
    }
}

/// Where the preview server is reachable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOrigin {
    pub host: String,
    pub port: i32,
}

impl PreviewOrigin {
    pub fn new(host: impl Into<String>, port: i32) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn qualify(&self, relative: &str) -> String {
        format!("{}{}", self.base(), relative)
    }

    /// Strip this origin from a full URL. URLs on another origin come back unchanged.
    pub fn relativize(&self, full: &str) -> String {
        full.strip_prefix(&self.base()).unwrap_or(full).to_string()
    }

    /// Non-positive ports mean no server, so no frame
    pub fn is_mountable(&self) -> bool {
        self.port > 0
    }
}

/// Who asked for a URL change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlSource {
    /// Typed, searched or selected by the operator; the frame is told to load it
    Operator,
    /// Reported by the frame itself; nothing is loaded
    Frame,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub active_page: Option<Page>,
    /// Always rooted at `/`
    pub active_url: String,
    /// Relative location the frame last reported; `None` until it is ready
    pub frame_reported_url: Option<String>,
}

impl NavigationState {
    /// False when the URL has moved away from the selected page.
    ///
    /// Direct navigation leaves `active_page` alone, so the two can diverge.
    pub fn page_matches_url(&self) -> bool {
        self.active_page
            .as_ref()
            .map_or(true, |page| page.url() == self.active_url)
    }
}

fn normalize_url(url: &str) -> String {
    if url.starts_with('/') {
        url.to_string()
    } else {
        format!("/{url}")
    }
}

#[derive(Debug)]
pub struct NavigationController {
    pages: Vec<Page>,
    origin: PreviewOrigin,
    state: NavigationState,
}

impl NavigationController {
    /// Start on the index page if the application has one, else the first page.
    pub fn new(pages: Vec<Page>, origin: PreviewOrigin, index_page: &str) -> Self {
        let active_page = pages
            .iter()
            .find(|p| p.page_path == index_page)
            .or_else(|| pages.first())
            .cloned();
        let active_url = active_page
            .as_ref()
            .map_or_else(|| "/".to_string(), Page::url);

        Self {
            pages,
            origin,
            state: NavigationState {
                active_page,
                active_url,
                frame_reported_url: None,
            },
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn origin(&self) -> &PreviewOrigin {
        &self.origin
    }

    /// Full URL the frame should be showing
    pub fn active_address(&self) -> String {
        self.origin.qualify(&self.state.active_url)
    }

    /// Select a page, or `None` to keep the current URL, and load it.
    pub fn select_page(&mut self, page: Option<Page>, channel: &mut FrameMessageChannel) {
        let url = page
            .as_ref()
            .map_or_else(|| self.state.active_url.clone(), Page::url);
        self.state.active_page = page;
        self.set_url_direct(&url, UrlSource::Operator, channel);
    }

    /// Move to `url` without touching the page selection.
    pub fn set_url_direct(
        &mut self,
        url: &str,
        source: UrlSource,
        channel: &mut FrameMessageChannel,
    ) {
        self.state.active_url = normalize_url(url);
        match source {
            UrlSource::Operator => channel.load(&self.active_address()),
            UrlSource::Frame => {
                tracing::debug!(url = %self.state.active_url, "Frame reported navigation");
            }
        }
    }

    /// Record where the frame says it is. Never feeds back into `active_url`.
    pub fn on_frame_ready(&mut self, full_url: Option<&str>) {
        let reported = full_url.map_or_else(String::new, |u| self.origin.relativize(u));
        self.state.frame_reported_url = Some(reported);
    }

    /// Address to open outside the host, once the frame has reported a location
    pub fn external_url(&self) -> Option<String> {
        self.state
            .frame_reported_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| self.origin.qualify(u))
    }

    /// Point at a new server. The old frame's report no longer applies.
    pub fn set_origin(&mut self, origin: PreviewOrigin) {
        self.origin = origin;
        self.state.frame_reported_url = None;
    }
}
