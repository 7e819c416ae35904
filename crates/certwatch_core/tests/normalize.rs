use certwatch_core::{host_of, normalize_url};

#[test]
fn bare_host_gets_https_scheme() {
    assert_eq!(normalize_url("example.com"), "https://example.com");
}

#[test]
fn case_scheme_and_trailing_slash_are_canonicalized() {
    assert_eq!(
        normalize_url("HTTPS://Example.com/"),
        normalize_url("https://example.com")
    );
    assert_eq!(normalize_url("  https://Example.com///  "), "https://example.com");
}

#[test]
fn plain_http_scheme_is_kept() {
    assert_eq!(normalize_url("HTTP://intranet.local/"), "http://intranet.local");
}

#[test]
fn paths_survive_apart_from_trailing_slashes() {
    assert_eq!(
        normalize_url("example.com/Status/"),
        "https://example.com/status"
    );
}

#[test]
fn malformed_input_passes_through_lexically() {
    assert_eq!(normalize_url("not a url"), "https://not a url");
    assert_eq!(normalize_url("ftp://example.com"), "https://ftp://example.com");
}

#[test]
fn normalization_is_idempotent() {
    let inputs = [
        "example.com",
        "HTTPS://Example.com/",
        "http://a.b/c//",
        "https://",
        "http:///",
        "",
        "   ",
        "example.com /",
        "a/ /",
        "https://https://",
        "ÄBC.example/",
        "\texample.com\n",
    ];
    for input in inputs {
        let once = normalize_url(input);
        assert_eq!(normalize_url(&once), once, "input {input:?}");
    }
}

#[test]
fn host_of_extracts_hostname_or_falls_back() {
    assert_eq!(host_of("https://example.com/path"), "example.com");
    assert_eq!(host_of("https://example.com:8443"), "example.com");
    assert_eq!(host_of("https://not a url"), "https://not a url");
}
