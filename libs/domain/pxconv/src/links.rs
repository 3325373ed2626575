use once_cell::sync::Lazy;
use pxdom::tree::{Document, NodeId, TreeError};
use regex::Regex;

// -----------------------------------------------------------------------------
// LinkTarget
// LinkGroup
// -----------------------------------------------------------------------------
/// One external search destination keyed off the page title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTarget {
    pub title: &'static str,
    /// URL prefix the normalized title is appended to.
    pub url: &'static str,
    /// Query-string tail appended after the title, possibly empty.
    pub url_suffix: &'static str,
}

/// A labeled set of link targets injected together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkGroup {
    pub label: &'static str,
    pub targets: &'static [LinkTarget],
}

/// Store search pages offered next to a product page.
pub const STORE_PAGES: LinkGroup = LinkGroup {
    label: "Store Pages",
    targets: &[
        LinkTarget {
            title: "GOG",
            url: "https://www.gog.com/fr/games?query=",
            url_suffix: "&order=desc%3Ascore",
        },
        LinkTarget {
            title: "EA",
            url: "https://www.ea.com/games/library/",
            url_suffix: "",
        },
        LinkTarget {
            title: "XBOX",
            url: "https://www.xbox.com/en-us/Search/Results?q=",
            url_suffix: "",
        },
        LinkTarget {
            title: "EPIC",
            url: "https://store.epicgames.com/en-US/browse?q=",
            url_suffix: "&sortBy=relevancy&sortDir=DESC&count=40",
        },
    ],
};

// -----------------------------------------------------------------------------
// title normalization
// -----------------------------------------------------------------------------
/// Normalize a page title into a URL-safe search term.
///
/// Whitespace runs collapse to a single space, anything outside
/// `[A-Za-z0-9_]` and whitespace becomes a hyphen, the result is
/// lower-cased and percent-encoded.
///
/// ```
/// use pxconv::links::normalize_title;
///
/// assert_eq!(normalize_title("  Héllo,  World! "), "h-llo-%20world-");
/// ```
pub fn normalize_title(title: &str) -> String {
    static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s]").unwrap());

    let collapsed = WHITESPACE.replace_all(title.trim(), " ");
    let hyphened = NON_WORD.replace_all(&collapsed, "-");
    urlencoding::encode(&hyphened.to_lowercase()).into_owned()
}

/// Full search URL of `target` for the given page title.
pub fn search_url(target: &LinkTarget, title: &str) -> String {
    format!("{}{}{}", target.url, normalize_title(title), target.url_suffix)
}

// -----------------------------------------------------------------------------
// injection
// -----------------------------------------------------------------------------
/// Append one anchor per target of `group` under `container`, hrefs built
/// from `title`.
///
/// Runs with the journal paused so the watcher does not observe its own
/// insertions. Returns the created anchor nodes.
///
/// # Errors
/// - [`TreeError::NotAnElement`]: `container` is a text node.
pub fn inject_links(
    doc: &mut Document,
    container: NodeId,
    group: &LinkGroup,
    title: &str,
) -> Result<Vec<NodeId>, TreeError> {
    doc.with_journal_paused(|doc| {
        let mut anchors = Vec::with_capacity(group.targets.len());
        for target in group.targets {
            let anchor = doc.create_element("a");
            let data = doc.element_mut(anchor).expect("anchor is an element");
            data.attrs
                .push(("href".to_owned(), search_url(target, title)));
            data.attrs.push(("target".to_owned(), "_blank".to_owned()));
            let label = doc.create_text(target.title);
            doc.append_child(anchor, label)
                .expect("anchor accepts children");
            doc.append_child(container, anchor)?;
            anchors.push(anchor);
        }
        log::info!(
            "injected {} {} links under {container}",
            anchors.len(),
            group.label
        );
        Ok(anchors)
    })
}
