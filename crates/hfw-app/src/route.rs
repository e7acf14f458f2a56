//! Composite state URLs
//!
//! A route addresses the frame, view and layout, the snap-in shown in each
//! pane outlet and the optional mode:
//!
//! ```text
//! /{frame}/{view}/{layout}(pane:snapIn//pane:snapIn)?mode={mode}
//! ```
//!
//! Every segment is percent-encoded.

use std::fmt;
use std::sync::LazyLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use url::Url;

/// Characters that would break the route grammar inside a segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'(')
    .add(b')')
    .add(b'+')
    .add(b'/')
    .add(b':')
    .add(b'=')
    .add(b'?');

static ROUTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([^/()?]+)/([^/()?]+)/([^/()?]+)(?:\(([^)]*)\))?(?:\?(.*))?$")
        .expect("Invalid ROUTE_REGEX")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteState {
    pub frame_id: String,
    pub view_id: String,
    pub layout_id: String,
    /// `(pane id, snap-in id)` in outlet order
    pub outlets: Vec<(String, String)>,
    pub mode: Option<String>,
}

impl RouteState {
    pub fn new(
        frame_id: impl Into<String>,
        view_id: impl Into<String>,
        layout_id: impl Into<String>,
    ) -> Self {
        Self {
            frame_id: frame_id.into(),
            view_id: view_id.into(),
            layout_id: layout_id.into(),
            ..Default::default()
        }
    }

    /// Parse a route. Returns `None` for anything outside the grammar.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = ROUTE_REGEX.captures(input)?;

        let decode = |raw: &str| -> Option<String> {
            percent_decode_str(raw)
                .decode_utf8()
                .ok()
                .map(|s| s.into_owned())
        };

        let mut outlets = Vec::new();
        if let Some(raw) = caps.get(4).map(|m| m.as_str()) {
            for outlet in raw.split("//").filter(|o| !o.is_empty()) {
                let (pane, snap_in) = outlet.split_once(':')?;
                outlets.push((decode(pane)?, decode(snap_in)?));
            }
        }

        let mode = match caps.get(5) {
            Some(_) => Url::parse("http://shell.invalid/")
                .and_then(|base| base.join(input))
                .ok()?
                .query_pairs()
                .find(|(key, _)| key == "mode")
                .map(|(_, value)| value.into_owned()),
            None => None,
        };

        Some(Self {
            frame_id: decode(&caps[1])?,
            view_id: decode(&caps[2])?,
            layout_id: decode(&caps[3])?,
            outlets,
            mode,
        })
    }

    pub fn outlet(&self, pane_id: &str) -> Option<&str> {
        self.outlets
            .iter()
            .find(|(pane, _)| pane == pane_id)
            .map(|(_, snap_in)| snap_in.as_str())
    }

    /// The same route with one pane outlet pointing at `snap_in_id`.
    pub fn with_outlet(&self, pane_id: &str, snap_in_id: &str) -> Self {
        let mut next = self.clone();
        match next.outlets.iter_mut().find(|(pane, _)| pane == pane_id) {
            Some((_, snap_in)) => *snap_in = snap_in_id.to_string(),
            None => next
                .outlets
                .push((pane_id.to_string(), snap_in_id.to_string())),
        }
        next
    }

    pub fn with_mode(mut self, mode: Option<String>) -> Self {
        self.mode = mode;
        self
    }
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enc = |s: &str| utf8_percent_encode(s, SEGMENT).to_string();

        write!(
            f,
            "/{}/{}/{}",
            enc(&self.frame_id),
            enc(&self.view_id),
            enc(&self.layout_id)
        )?;

        if !self.outlets.is_empty() {
            let outlets: Vec<String> = self
                .outlets
                .iter()
                .map(|(pane, snap_in)| format!("{}:{}", enc(pane), enc(snap_in)))
                .collect();
            write!(f, "({})", outlets.join("//"))?;
        }

        if let Some(mode) = &self.mode {
            write!(f, "?mode={}", enc(mode))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RouteState {
        RouteState {
            outlets: vec![
                ("selection".into(), "tree".into()),
                ("primary".into(), "props".into()),
            ],
            mode: Some("edit".into()),
            ..RouteState::new("main", "default", "2-pane")
        }
    }

    #[test]
    fn test_display() {
        insta::assert_snapshot!(
            sample().to_string(),
            @"/main/default/2-pane(selection:tree//primary:props)?mode=edit"
        );
        insta::assert_snapshot!(
            RouteState::new("main", "v", "1-pane").to_string(),
            @"/main/v/1-pane"
        );
    }

    #[test]
    fn test_display_encodes_segments() {
        let route = RouteState::new("my frame", "v/1", "a(b)").with_outlet("p:1", "s");
        insta::assert_snapshot!(route.to_string(), @"/my%20frame/v%2F1/a%28b%29(p%3A1:s)");
    }

    #[test]
    fn test_parse() {
        let parsed = RouteState::parse("/main/default/2-pane(selection:tree//primary:props)?mode=edit");
        assert_eq!(parsed, Some(sample()));

        let bare = RouteState::parse("/main/v/1-pane").unwrap();
        assert!(bare.outlets.is_empty());
        assert!(bare.mode.is_none());
    }

    #[test]
    fn test_parse_decodes_segments() {
        let parsed = RouteState::parse("/my%20frame/v%2F1/a%28b%29(p%3A1:s)?mode=a%20b").unwrap();
        assert_eq!(parsed.frame_id, "my frame");
        assert_eq!(parsed.view_id, "v/1");
        assert_eq!(parsed.layout_id, "a(b)");
        assert_eq!(parsed.outlet("p:1"), Some("s"));
        assert_eq!(parsed.mode.as_deref(), Some("a b"));
    }

    #[test]
    fn test_plus_survives_round_trip() {
        let route = RouteState::new("main", "v+1", "l").with_mode(Some("view+edit".into()));
        insta::assert_snapshot!(route.to_string(), @"/main/v%2B1/l?mode=view%2Bedit");

        let parsed = RouteState::parse(&route.to_string()).unwrap();
        assert_eq!(parsed, route);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(RouteState::parse(""), None);
        assert_eq!(RouteState::parse("/main/v"), None);
        assert_eq!(RouteState::parse("main/v/l"), None);
        assert_eq!(RouteState::parse("/main/v/l(nocolon)"), None);
    }

    #[test]
    fn test_with_outlet_replaces_or_appends() {
        let route = sample();

        let replaced = route.with_outlet("primary", "details");
        assert_eq!(replaced.outlet("primary"), Some("details"));
        assert_eq!(replaced.outlets.len(), 2);

        let appended = route.with_outlet("secondary", "graph");
        assert_eq!(appended.outlets.last().unwrap().0, "secondary");
        assert_eq!(route.outlet("primary"), Some("props"));
    }
}
