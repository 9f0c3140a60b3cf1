use super::*;

#[test]
fn join_url_collapses_slashes() {
    assert_eq!(join_url("http://localhost:8080", "/user/me"), "http://localhost:8080/user/me");
    assert_eq!(join_url("http://localhost:8080/", "user/me"), "http://localhost:8080/user/me");
    assert_eq!(join_url("https://api.test/v1/", "//auth/refresh-token"), "https://api.test/v1/auth/refresh-token");
}

#[test]
fn bearer_header_formats_token() {
    assert_eq!(bearer_header("tok-123"), "Bearer tok-123");
}

#[test]
fn method_parse_is_case_insensitive() {
    assert_eq!(Method::parse("patch"), Some(Method::Patch));
    assert_eq!(Method::parse("DELETE"), Some(Method::Delete));
    assert_eq!(Method::parse("TRACE"), None);
    assert_eq!(Method::Put.to_string(), "PUT");
}

#[test]
fn request_builders_accumulate_query_and_body() {
    let req = ApiRequest::post("/user/resetPassword")
        .with_query("token", "abc")
        .with_json(serde_json::json!("n3wPass!"));
    assert_eq!(req.method, Method::Post);
    assert_eq!(req.query, vec![("token".to_owned(), "abc".to_owned())]);
    assert_eq!(req.body, Some(serde_json::json!("n3wPass!")));
}

#[test]
fn error_for_status_keeps_body() {
    assert!(ApiResponse::new(204, "").error_for_status().is_ok());
    match ApiResponse::new(500, "boom").error_for_status() {
        Err(AuthError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn reqwest_transport_builds_from_default_config() {
    let transport = ReqwestTransport::new(&ClientConfig::default()).unwrap();
    assert_eq!(transport.base_url, "http://localhost:8080");
    assert_eq!(transport.request_timeout, Duration::from_secs(30));
}
