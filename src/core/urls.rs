use crate::utils::error::{AdapterError, Result};
use url::Url;

pub fn parse_base_url(base: &str) -> Result<Url> {
    let url = Url::parse(base).map_err(|e| AdapterError::InvalidConfigValue {
        field: "url".to_string(),
        value: base.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })?;
    if url.cannot_be_a_base() {
        return Err(AdapterError::InvalidConfigValue {
            field: "url".to_string(),
            value: base.to_string(),
            reason: "URL cannot carry a path".to_string(),
        });
    }
    Ok(url)
}

/// `{base}/{collection}[/{segment}]`, every segment percent-encoded.
pub fn collection_url(base: &Url, collection: &str, segment: Option<&str>) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| AdapterError::InvalidConfigValue {
                field: "url".to_string(),
                value: base.to_string(),
                reason: "URL cannot carry a path".to_string(),
            })?;
        segments.pop_if_empty();
        segments.extend(collection.split('/').filter(|s| !s.is_empty()));
        if let Some(segment) = segment {
            segments.push(segment);
        }
    }
    Ok(url)
}

pub fn with_refresh(mut url: Url) -> Url {
    url.query_pairs_mut().append_pair("refresh", "true");
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        parse_base_url(s).unwrap()
    }

    #[test]
    fn test_document_url() {
        let url = collection_url(&base("http://localhost:9200"), "people/person", Some("1")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/people/person/1");
    }

    #[test]
    fn test_collection_url_without_segment() {
        let url = collection_url(&base("http://localhost:9200"), "people/person", None).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/people/person");
    }

    #[test]
    fn test_base_with_path_and_stray_slashes() {
        let url = collection_url(&base("http://proxy.local/es/"), "/tasks/task/", Some("_search")).unwrap();
        assert_eq!(url.as_str(), "http://proxy.local/es/tasks/task/_search");
    }

    #[test]
    fn test_ids_are_percent_encoded() {
        let url = collection_url(&base("http://localhost:9200"), "people/person", Some("a/b c")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/people/person/a%2Fb%20c");
    }

    #[test]
    fn test_with_refresh() {
        let url = collection_url(&base("http://localhost:9200"), "people/person", Some("3")).unwrap();
        assert_eq!(
            with_refresh(url).as_str(),
            "http://localhost:9200/people/person/3?refresh=true"
        );
    }

    #[test]
    fn test_rejects_non_base_urls() {
        assert!(parse_base_url("mailto:someone@example.com").is_err());
        assert!(parse_base_url("not a url").is_err());
    }
}
