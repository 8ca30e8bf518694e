use std::time::Duration;

use crate::geo_core::RegionFilter;

/// Build the Overpass QL query for every node, way and relation in `region`
///
/// With `required_tag` set, only elements carrying that key are selected on
/// the server. Output is `out body geom;` so ways and relation members carry
/// their coordinates inline and no node lookup is needed on our side. The
/// server timeout is set to the client's per-attempt timeout.
pub fn build_query(region: &RegionFilter, required_tag: Option<&str>, timeout: Duration) -> String {
    let header = format!("[out:json][timeout:{}];", timeout.as_secs().max(1));
    let tag = required_tag
        .map(|key| format!(r#"["{}"]"#, escape(key)))
        .unwrap_or_default();

    match region {
        RegionFilter::NamedArea { name, admin_level } => format!(
            r#"{header}
area["name"="{}"]["admin_level"="{admin_level}"]->.searchArea;
(
  node(area.searchArea){tag};
  way(area.searchArea){tag};
  relation(area.searchArea){tag};
);
out body geom;"#,
            escape(name)
        ),
        RegionFilter::BoundingBox(bbox) => format!(
            r#"{header}
(
  node({bbox}){tag};
  way({bbox}){tag};
  relation({bbox}){tag};
);
out body geom;"#
        ),
    }
}

/// Escape a value for use inside a double-quoted Overpass string
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_core::BoundingBox;

    #[test]
    fn test_named_area_query() {
        let region = RegionFilter::country("Iran").unwrap();
        let query = build_query(&region, None, Duration::from_secs(300));
        assert!(query.starts_with("[out:json][timeout:300];"));
        assert!(query.contains(r#"area["name"="Iran"]["admin_level"="2"]->.searchArea;"#));
        assert!(query.contains("node(area.searchArea);"));
        assert!(query.contains("way(area.searchArea);"));
        assert!(query.contains("relation(area.searchArea);"));
        assert!(query.ends_with("out body geom;"));
    }

    #[test]
    fn test_bbox_query() {
        let bbox = BoundingBox::new(24.396308, 44.031311, 39.771722, 63.333557).unwrap();
        let query = build_query(&bbox.into(), None, Duration::from_secs(60));
        assert!(query.starts_with("[out:json][timeout:60];"));
        assert!(query.contains("node(24.396308,44.031311,39.771722,63.333557);"));
        assert!(query.contains("way(24.396308,44.031311,39.771722,63.333557);"));
        assert!(query.contains("relation(24.396308,44.031311,39.771722,63.333557);"));
        assert!(!query.contains("area"));
    }

    #[test]
    fn test_area_name_is_escaped() {
        let region = RegionFilter::named_area(r#"Say "hi" \o/"#, 4).unwrap();
        let query = build_query(&region, None, Duration::from_secs(10));
        assert!(query.contains(r#"area["name"="Say \"hi\" \\o/"]["admin_level"="4"]"#));
    }

    #[test]
    fn test_sub_second_timeout_rounds_up() {
        let region = RegionFilter::country("Iran").unwrap();
        let query = build_query(&region, None, Duration::from_millis(200));
        assert!(query.starts_with("[out:json][timeout:1];"));
    }

    #[test]
    fn test_required_tag_filters_on_server() {
        let region = RegionFilter::country("Iran").unwrap();
        let query = build_query(&region, Some("highway"), Duration::from_secs(300));
        assert!(query.contains(r#"node(area.searchArea)["highway"];"#));
        assert!(query.contains(r#"way(area.searchArea)["highway"];"#));
        assert!(query.contains(r#"relation(area.searchArea)["highway"];"#));

        let bbox = BoundingBox::new(35.0, 51.0, 36.0, 52.0).unwrap();
        let query = build_query(&bbox.into(), Some("highway"), Duration::from_secs(60));
        assert!(query.contains(r#"way(35,51,36,52)["highway"];"#));
    }

    #[test]
    fn test_required_tag_is_escaped() {
        let bbox = BoundingBox::new(35.0, 51.0, 36.0, 52.0).unwrap();
        let query = build_query(&bbox.into(), Some(r#"odd"key"#), Duration::from_secs(60));
        assert!(query.contains(r#"node(35,51,36,52)["odd\"key"];"#));
    }

    #[test]
    fn test_no_tag_selects_everything() {
        let region = RegionFilter::country("Iran").unwrap();
        let query = build_query(&region, None, Duration::from_secs(300));
        assert!(!query.contains("[\"highway\"]"));
        assert!(query.contains("way(area.searchArea);"));
    }
}
