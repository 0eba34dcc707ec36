use axum::extract::Request;
use axum::http::Uri;

/// Format-suffix negotiation: accept an optional `.json` suffix on any path.
///
/// `/menus/1.json` and `/menus/1.json/` are rewritten to `/menus/1/` before
/// routing. JSON is the only representation served, so the suffix is purely
/// a path alias.
pub async fn strip_format_suffix(mut request: Request) -> Request {
    let path = request.uri().path();

    let base = if let Some(p) = path.strip_suffix(".json/") {
        p
    } else if let Some(p) = path.strip_suffix(".json") {
        p
    } else {
        return request;
    };

    let new_path = format!("{}/", base);
    let path_and_query = match request.uri().query() {
        Some(q) => format!("{}?{}", new_path, q),
        None => new_path,
    };

    let mut parts = request.uri().clone().into_parts();
    match path_and_query.parse() {
        Ok(pq) => parts.path_and_query = Some(pq),
        Err(_) => return request,
    }
    if let Ok(new_uri) = Uri::from_parts(parts) {
        *request.uri_mut() = new_uri;
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn strips_suffix_on_member_path() {
        let req = strip_format_suffix(request("/menus/1.json")).await;
        assert_eq!(req.uri().path(), "/menus/1/");
    }

    #[tokio::test]
    async fn strips_suffix_with_trailing_slash() {
        let req = strip_format_suffix(request("/menus.json/")).await;
        assert_eq!(req.uri().path(), "/menus/");
    }

    #[tokio::test]
    async fn preserves_query_string() {
        let req = strip_format_suffix(request("/skills.json?page=2")).await;
        assert_eq!(req.uri().path(), "/skills/");
        assert_eq!(req.uri().query(), Some("page=2"));
    }

    #[tokio::test]
    async fn leaves_plain_paths_alone() {
        let req = strip_format_suffix(request("/menus/1/")).await;
        assert_eq!(req.uri().path(), "/menus/1/");
    }
}
