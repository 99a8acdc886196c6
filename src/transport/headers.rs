//! Parsing for the handful of response headers ACME resources consume.

use jiff::Timestamp;
use std::collections::HashMap;
use std::time::Duration;

/// Parses a (possibly repeated) `Link` header set into `rel -> [url]`.
/// Multiple headers and multiple comma-separated values within one header
/// are both folded into the same map.
pub fn parse_links(values: &[String]) -> HashMap<String, Vec<String>> {
    let mut links: HashMap<String, Vec<String>> = HashMap::new();
    for value in values {
        for entry in split_link_header(value) {
            if let Some((url, rel)) = parse_link_entry(&entry) {
                links.entry(rel).or_default().push(url);
            }
        }
    }
    links
}

fn split_link_header(value: &str) -> Vec<String> {
    // Entries are comma-separated, but URLs are angle-bracketed so a
    // comma never appears unescaped inside the <...> part; splitting on
    // "," between entries (",  <" boundary) is sufficient for the simple
    // `Link` headers ACME servers emit.
    value.split(", <").enumerate().map(|(i, part)| {
        if i == 0 {
            part.to_string()
        } else {
            format!("<{part}")
        }
    }).collect()
}

fn parse_link_entry(entry: &str) -> Option<(String, String)> {
    let url_end = entry.find('>')?;
    let url = entry[1..url_end].to_string();
    let rel_marker = "rel=\"";
    let rel_start = entry[url_end..].find(rel_marker)? + url_end + rel_marker.len();
    let rel_end = entry[rel_start..].find('"')? + rel_start;
    Some((url, entry[rel_start..rel_end].to_string()))
}

/// Parses `Retry-After` as either a delta-seconds integer or an HTTP-date,
/// returning a duration measured from `now`.
pub fn parse_retry_after(value: &str, now: Timestamp) -> Option<Duration> {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    parse_http_date(value).map(|at| {
        let delta = at.as_second() - now.as_second();
        Duration::from_secs(delta.max(0) as u64)
    })
}

/// Minimal RFC 7231 HTTP-date parser (IMF-fixdate only, e.g.
/// `Tue, 15 Nov 1994 08:12:31 GMT`), the only form ACME servers emit.
fn parse_http_date(value: &str) -> Option<Timestamp> {
    let fmt = "%a, %d %b %Y %H:%M:%S GMT";
    jiff::fmt::strtime::parse(fmt, value.trim())
        .ok()?
        .to_timestamp()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_link_rels() {
        let header = vec![
            r#"<https://example.com/new-tos>; rel="terms-of-service", <https://example.com/index>; rel="index""#
                .to_string(),
        ];
        let links = parse_links(&header);
        assert_eq!(
            links.get("terms-of-service").unwrap(),
            &vec!["https://example.com/new-tos".to_string()]
        );
        assert_eq!(
            links.get("index").unwrap(),
            &vec!["https://example.com/index".to_string()]
        );
    }

    #[test]
    fn parses_seconds_retry_after() {
        let now = Timestamp::from_second(1_700_000_000).unwrap();
        let duration = parse_retry_after("120", now).unwrap();
        assert_eq!(duration, Duration::from_secs(120));
    }
}
